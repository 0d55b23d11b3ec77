//! Projection implementations (read model builders).
//!
//! Projections consume published token events and build query-optimized read
//! models. All projections are:
//! - **Rebuildable**: can be reconstructed from the event stream
//! - **Idempotent**: safe for at-least-once delivery (per-stream cursors)

pub mod cursor;
pub mod holder_balances;
pub mod mint_records;

pub use cursor::{ProjectionError, StreamCursors};
pub use holder_balances::{HolderBalance, HolderBalancesProjection};
pub use mint_records::{CustomerMintBalance, MintRecordsProjection, RecordKey, TransactionMintRecord};
