use thiserror::Error;

use mintledger_access::{AccessError, Role};
use mintledger_core::{Address, Amount, TokenId};

/// Every way a token command can be rejected.
///
/// All variants are terminal caller-side precondition failures: a rejected
/// command produces no events, so no state changes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is not initialized")]
    NotInitialized,

    #[error("token is already initialized")]
    AlreadyInitialized,

    #[error("command targets token {found}, aggregate is {expected}")]
    TokenMismatch { expected: TokenId, found: TokenId },

    #[error("invalid supply limit: {0} whole tokens")]
    InvalidSupplyLimit(Amount),

    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("capability denied: {account} lacks '{role}'")]
    CapabilityDenied { account: Address, role: Role },

    #[error("bad confirmation: {caller} cannot renounce on behalf of {confirmation}")]
    BadConfirmation { caller: Address, confirmation: Address },

    #[error("supply limit exceeded: {total_supply} + {amount} > {limit}")]
    SupplyLimitExceeded {
        total_supply: Amount,
        amount: Amount,
        limit: Amount,
    },

    #[error("customer id cannot be empty")]
    EmptyCustomerId,

    #[error("customer id is {len} bytes (max {max})")]
    CustomerIdTooLong { len: usize, max: usize },

    #[error("transaction id cannot be empty")]
    EmptyTransactionId,

    #[error("transaction id is {len} bytes (max {max})")]
    TransactionIdTooLong { len: usize, max: usize },

    #[error("transaction id '{0}' was already used for minting")]
    DuplicateTransactionId(String),

    #[error("token is paused")]
    Paused,

    #[error("token is already paused")]
    AlreadyPaused,

    #[error("token is not paused")]
    NotPaused,

    #[error("invalid receiver {0}")]
    InvalidReceiver(Address),

    #[error("invalid sender {0}")]
    InvalidSender(Address),

    #[error("invalid approver {0}")]
    InvalidApprover(Address),

    #[error("invalid spender {0}")]
    InvalidSpender(Address),

    #[error("insufficient balance: {account} has {balance}, needs {needed}")]
    InsufficientBalance {
        account: Address,
        balance: Amount,
        needed: Amount,
    },

    #[error("insufficient allowance: {spender} may spend {allowance}, needs {needed}")]
    InsufficientAllowance {
        spender: Address,
        allowance: Amount,
        needed: Amount,
    },

    #[error("invalid implementation: {0}")]
    InvalidImplementation(String),

    #[error("arithmetic overflow")]
    ArithmeticOverflow,
}

impl From<AccessError> for TokenError {
    fn from(value: AccessError) -> Self {
        match value {
            AccessError::MissingRole { account, role } => TokenError::CapabilityDenied { account, role },
            AccessError::BadConfirmation {
                caller,
                confirmation,
            } => TokenError::BadConfirmation {
                caller,
                confirmation,
            },
        }
    }
}
