/// Aggregate type recorded on every stored event of a token stream.
pub const TOKEN_AGGREGATE_TYPE: &str = "token";

/// Decimals used when the deployment does not override them.
pub const DEFAULT_DECIMALS: u8 = 18;

/// Implementation pointer recorded at initialization unless configured.
pub const INITIAL_IMPLEMENTATION: &str = "v1";

/// Upper bound (bytes) for customer and transaction identifiers.
pub const MAX_IDENTIFIER_LEN: usize = 128;

/// Metadata limits.
pub const MAX_NAME_LEN: usize = 64;
pub const MAX_SYMBOL_LEN: usize = 16;
