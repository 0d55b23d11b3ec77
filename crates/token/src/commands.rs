use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mintledger_access::Role;
use mintledger_core::{Address, Amount, TokenId};
use mintledger_events::Command;

use crate::asset::TokenMetadata;

/// Command: Initialize.
///
/// `max_supply_limit` is in whole tokens; it is scaled by `10^decimals`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Initialize {
    pub token_id: TokenId,
    pub caller: Address,
    pub default_admin: Address,
    pub pauser: Address,
    pub minter: Address,
    pub upgrader: Address,
    pub max_supply_limit: Amount,
    pub metadata: TokenMetadata,
    pub implementation: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Pause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pause {
    pub token_id: TokenId,
    pub caller: Address,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Unpause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unpause {
    pub token_id: TokenId,
    pub caller: Address,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mint {
    pub token_id: TokenId,
    pub caller: Address,
    pub to: Address,
    pub amount: Amount,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MintWithCustomerIdAndTransactionId.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintWithCustomerIdAndTransactionId {
    pub token_id: TokenId,
    pub caller: Address,
    pub to: Address,
    pub amount: Amount,
    pub customer_id: String,
    pub transaction_id: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: TransferTokens (ERC20 `transfer`, `caller` is the sender).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferTokens {
    pub token_id: TokenId,
    pub caller: Address,
    pub to: Address,
    pub amount: Amount,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Approve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approve {
    pub token_id: TokenId,
    pub caller: Address,
    pub spender: Address,
    pub amount: Amount,
    pub occurred_at: DateTime<Utc>,
}

/// Command: TransferFrom (`caller` is the spender).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferFrom {
    pub token_id: TokenId,
    pub caller: Address,
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Burn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Burn {
    pub token_id: TokenId,
    pub caller: Address,
    pub amount: Amount,
    pub occurred_at: DateTime<Utc>,
}

/// Command: BurnFrom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnFrom {
    pub token_id: TokenId,
    pub caller: Address,
    pub account: Address,
    pub amount: Amount,
    pub occurred_at: DateTime<Utc>,
}

/// Command: GrantRole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRole {
    pub token_id: TokenId,
    pub caller: Address,
    pub role: Role,
    pub account: Address,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RevokeRole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokeRole {
    pub token_id: TokenId,
    pub caller: Address,
    pub role: Role,
    pub account: Address,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RenounceRole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenounceRole {
    pub token_id: TokenId,
    pub caller: Address,
    pub role: Role,
    pub caller_confirmation: Address,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpgradeTo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeTo {
    pub token_id: TokenId,
    pub caller: Address,
    pub implementation: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenCommand {
    Initialize(Initialize),
    Pause(Pause),
    Unpause(Unpause),
    Mint(Mint),
    MintWithCustomerIdAndTransactionId(MintWithCustomerIdAndTransactionId),
    Transfer(TransferTokens),
    Approve(Approve),
    TransferFrom(TransferFrom),
    Burn(Burn),
    BurnFrom(BurnFrom),
    GrantRole(GrantRole),
    RevokeRole(RevokeRole),
    RenounceRole(RenounceRole),
    UpgradeTo(UpgradeTo),
}

impl TokenCommand {
    pub fn caller(&self) -> Address {
        match self {
            TokenCommand::Initialize(c) => c.caller,
            TokenCommand::Pause(c) => c.caller,
            TokenCommand::Unpause(c) => c.caller,
            TokenCommand::Mint(c) => c.caller,
            TokenCommand::MintWithCustomerIdAndTransactionId(c) => c.caller,
            TokenCommand::Transfer(c) => c.caller,
            TokenCommand::Approve(c) => c.caller,
            TokenCommand::TransferFrom(c) => c.caller,
            TokenCommand::Burn(c) => c.caller,
            TokenCommand::BurnFrom(c) => c.caller,
            TokenCommand::GrantRole(c) => c.caller,
            TokenCommand::RevokeRole(c) => c.caller,
            TokenCommand::RenounceRole(c) => c.caller,
            TokenCommand::UpgradeTo(c) => c.caller,
        }
    }
}

impl Command for TokenCommand {
    fn target_token_id(&self) -> TokenId {
        match self {
            TokenCommand::Initialize(c) => c.token_id,
            TokenCommand::Pause(c) => c.token_id,
            TokenCommand::Unpause(c) => c.token_id,
            TokenCommand::Mint(c) => c.token_id,
            TokenCommand::MintWithCustomerIdAndTransactionId(c) => c.token_id,
            TokenCommand::Transfer(c) => c.token_id,
            TokenCommand::Approve(c) => c.token_id,
            TokenCommand::TransferFrom(c) => c.token_id,
            TokenCommand::Burn(c) => c.token_id,
            TokenCommand::BurnFrom(c) => c.token_id,
            TokenCommand::GrantRole(c) => c.token_id,
            TokenCommand::RevokeRole(c) => c.token_id,
            TokenCommand::RenounceRole(c) => c.token_id,
            TokenCommand::UpgradeTo(c) => c.token_id,
        }
    }

    fn command_type(&self) -> &'static str {
        match self {
            TokenCommand::Initialize(_) => "token.initialize",
            TokenCommand::Pause(_) => "token.pause",
            TokenCommand::Unpause(_) => "token.unpause",
            TokenCommand::Mint(_) => "token.mint",
            TokenCommand::MintWithCustomerIdAndTransactionId(_) => {
                "token.mint_with_customer_id_and_transaction_id"
            }
            TokenCommand::Transfer(_) => "token.transfer",
            TokenCommand::Approve(_) => "token.approve",
            TokenCommand::TransferFrom(_) => "token.transfer_from",
            TokenCommand::Burn(_) => "token.burn",
            TokenCommand::BurnFrom(_) => "token.burn_from",
            TokenCommand::GrantRole(_) => "token.grant_role",
            TokenCommand::RevokeRole(_) => "token.revoke_role",
            TokenCommand::RenounceRole(_) => "token.renounce_role",
            TokenCommand::UpgradeTo(_) => "token.upgrade_to",
        }
    }
}
