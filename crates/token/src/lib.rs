//! Token ledger domain module (event-sourced).
//!
//! Business rules for an ERC20-style token with role-gated minting, pausing,
//! burning and upgrade authorization, implemented as deterministic domain
//! logic (no IO, no storage).
//!
//! The [`Token`] aggregate is a composition of three collaborators plus the
//! minting core:
//!
//! - [`AssetLedger`]: balances, allowances, total supply, pause flag
//! - [`RoleRegistry`](mintledger_access::RoleRegistry): capability checks
//! - [`UpgradeGate`]: the swappable implementation pointer
//! - [`MintingLedger`]: supply limit and the customer / transaction side ledgers

pub mod asset;
pub mod commands;
pub mod constants;
pub mod error;
pub mod events;
pub mod minting;
pub mod token;
pub mod upgrade;

pub use asset::{AssetLedger, FungibleAssetLedger, TokenMetadata};
pub use commands::{
    Approve, Burn, BurnFrom, GrantRole, Initialize, Mint, MintWithCustomerIdAndTransactionId,
    Pause, RenounceRole, RevokeRole, TokenCommand, TransferFrom, TransferTokens, Unpause,
    UpgradeTo,
};
pub use constants::*;
pub use error::TokenError;
pub use events::{
    Approval, Initialized, Paused, RoleGranted, RoleRevoked, TokenEvent, TokensMinted,
    TokensMintedWithCustomerId, TokensMintedWithTransactionId, Transfer, Unpaused, Upgraded,
};
pub use minting::MintingLedger;
pub use token::Token;
pub use upgrade::UpgradeGate;
