use mintledger_core::TokenId;

/// A command targets a specific token stream.
///
/// Commands represent **intent** ("mint 5 to X") and are transient. Accepted
/// commands turn into events (facts) which are persisted; rejected commands
/// leave no trace.
///
/// Each command operates on exactly one token aggregate, which is the
/// transaction boundary: all of its effects commit together or not at all.
pub trait Command: Clone + core::fmt::Debug + Send + Sync + 'static {
    fn target_token_id(&self) -> TokenId;

    /// Stable command name used in logs (e.g. "token.mint").
    fn command_type(&self) -> &'static str;
}
