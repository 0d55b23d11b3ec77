use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mintledger_access::Role;
use mintledger_core::{Address, Amount, TokenId};
use mintledger_events::Event;

use crate::asset::TokenMetadata;

/// Event: Initialized.
///
/// Role grants made during initialization follow as separate `RoleGranted`
/// events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Initialized {
    pub token_id: TokenId,
    pub initializer: Address,
    pub metadata: TokenMetadata,
    /// Smallest units (already scaled by decimals).
    pub supply_limit: Amount,
    pub implementation: String,
    pub version: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: Transfer. `from == 0x0` is a mint, `to == 0x0` a burn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub token_id: TokenId,
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
    pub occurred_at: DateTime<Utc>,
}

/// Event: Approval. Carries the allowance after the change, not a delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub token_id: TokenId,
    pub owner: Address,
    pub spender: Address,
    pub amount: Amount,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paused {
    pub token_id: TokenId,
    pub account: Address,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unpaused {
    pub token_id: TokenId,
    pub account: Address,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGranted {
    pub token_id: TokenId,
    pub role: Role,
    pub account: Address,
    pub sender: Address,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRevoked {
    pub token_id: TokenId,
    pub role: Role,
    pub account: Address,
    pub sender: Address,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upgraded {
    pub token_id: TokenId,
    pub implementation: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokensMinted {
    pub token_id: TokenId,
    pub to: Address,
    pub amount: Amount,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokensMintedWithCustomerId {
    pub token_id: TokenId,
    pub to: Address,
    pub amount: Amount,
    pub customer_id: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokensMintedWithTransactionId {
    pub token_id: TokenId,
    pub to: Address,
    pub amount: Amount,
    pub transaction_id: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenEvent {
    Initialized(Initialized),
    Transfer(Transfer),
    Approval(Approval),
    Paused(Paused),
    Unpaused(Unpaused),
    RoleGranted(RoleGranted),
    RoleRevoked(RoleRevoked),
    Upgraded(Upgraded),
    TokensMinted(TokensMinted),
    TokensMintedWithCustomerId(TokensMintedWithCustomerId),
    TokensMintedWithTransactionId(TokensMintedWithTransactionId),
}

impl Event for TokenEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TokenEvent::Initialized(_) => "token.initialized",
            TokenEvent::Transfer(_) => "token.transfer",
            TokenEvent::Approval(_) => "token.approval",
            TokenEvent::Paused(_) => "token.paused",
            TokenEvent::Unpaused(_) => "token.unpaused",
            TokenEvent::RoleGranted(_) => "token.role_granted",
            TokenEvent::RoleRevoked(_) => "token.role_revoked",
            TokenEvent::Upgraded(_) => "token.upgraded",
            TokenEvent::TokensMinted(_) => "token.tokens_minted",
            TokenEvent::TokensMintedWithCustomerId(_) => "token.tokens_minted_with_customer_id",
            TokenEvent::TokensMintedWithTransactionId(_) => {
                "token.tokens_minted_with_transaction_id"
            }
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn token_id(&self) -> TokenId {
        match self {
            TokenEvent::Initialized(e) => e.token_id,
            TokenEvent::Transfer(e) => e.token_id,
            TokenEvent::Approval(e) => e.token_id,
            TokenEvent::Paused(e) => e.token_id,
            TokenEvent::Unpaused(e) => e.token_id,
            TokenEvent::RoleGranted(e) => e.token_id,
            TokenEvent::RoleRevoked(e) => e.token_id,
            TokenEvent::Upgraded(e) => e.token_id,
            TokenEvent::TokensMinted(e) => e.token_id,
            TokenEvent::TokensMintedWithCustomerId(e) => e.token_id,
            TokenEvent::TokensMintedWithTransactionId(e) => e.token_id,
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            TokenEvent::Initialized(e) => e.occurred_at,
            TokenEvent::Transfer(e) => e.occurred_at,
            TokenEvent::Approval(e) => e.occurred_at,
            TokenEvent::Paused(e) => e.occurred_at,
            TokenEvent::Unpaused(e) => e.occurred_at,
            TokenEvent::RoleGranted(e) => e.occurred_at,
            TokenEvent::RoleRevoked(e) => e.occurred_at,
            TokenEvent::Upgraded(e) => e.occurred_at,
            TokenEvent::TokensMinted(e) => e.occurred_at,
            TokenEvent::TokensMintedWithCustomerId(e) => e.occurred_at,
            TokenEvent::TokensMintedWithTransactionId(e) => e.occurred_at,
        }
    }
}
