use chrono::{DateTime, Utc};

use mintledger_core::TokenId;

/// A fact recorded on one token's stream.
///
/// Events are immutable once appended and carry a schema version so payloads
/// can evolve without rewriting history.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable name, e.g. `"token.tokens_minted"`.
    fn event_type(&self) -> &'static str;

    fn version(&self) -> u32;

    /// Stream the event belongs to.
    fn token_id(&self) -> TokenId;

    /// Business time at which the originating command was issued.
    fn occurred_at(&self) -> DateTime<Utc>;
}
