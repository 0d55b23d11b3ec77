//! Public surface of one deployed token.
//!
//! Every mutating operation runs under a single write lock, so operations on
//! the ledger are admitted strictly one at a time and each one fully commits
//! or commits nothing. Reads take no lock: they rehydrate from the store,
//! which only ever exposes whole committed batches.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use serde_json::Value as JsonValue;

use mintledger_access::Role;
use mintledger_core::{Address, Amount, TokenId};
use mintledger_events::{Command, EventBus, EventEnvelope, InMemoryEventBus};
use mintledger_token::{
    Approve, Burn, BurnFrom, GrantRole, Initialize, Mint, MintWithCustomerIdAndTransactionId,
    Pause, RenounceRole, RevokeRole, TOKEN_AGGREGATE_TYPE, Token, TokenCommand, TokenError,
    TokenMetadata, TransferFrom, TransferTokens, Unpause, UpgradeTo,
};

use crate::command_dispatcher::{CommandDispatcher, DispatchError};
use crate::config::{LedgerConfig, RoleAssignments};
use crate::event_store::{EventStore, InMemoryEventStore, StoredEvent};

pub type ServiceResult<T> = Result<T, DispatchError<TokenError>>;

pub type InMemoryBus = Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>;
pub type InMemoryTokenService = TokenService<Arc<InMemoryEventStore>, InMemoryBus>;

#[derive(Debug)]
pub struct TokenService<S, B> {
    token_id: TokenId,
    dispatcher: CommandDispatcher<S, B>,
    writes: Mutex<()>,
}

impl InMemoryTokenService {
    /// Service over a fresh in-memory store and bus; the bus is returned so
    /// projections can subscribe before the first write.
    pub fn in_memory(token_id: TokenId) -> (Self, InMemoryBus) {
        let bus: InMemoryBus = Arc::new(InMemoryEventBus::new());
        let dispatcher = CommandDispatcher::new(Arc::new(InMemoryEventStore::new()), bus.clone());
        (Self::new(token_id, dispatcher), bus)
    }
}

impl<S, B> TokenService<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn new(token_id: TokenId, dispatcher: CommandDispatcher<S, B>) -> Self {
        Self {
            token_id,
            dispatcher,
            writes: Mutex::new(()),
        }
    }

    pub fn token_id(&self) -> TokenId {
        self.token_id
    }

    pub fn dispatcher(&self) -> &CommandDispatcher<S, B> {
        &self.dispatcher
    }

    fn execute(&self, command: TokenCommand) -> ServiceResult<Vec<StoredEvent>> {
        let command_type = command.command_type();
        let caller = command.caller();

        // The guarded value is `()`, so a poisoned lock carries no broken state.
        let _guard = self.writes.lock().unwrap_or_else(PoisonError::into_inner);

        match self
            .dispatcher
            .dispatch(TOKEN_AGGREGATE_TYPE, command, Token::empty)
        {
            Ok(committed) => {
                tracing::info!(
                    token_id = %self.token_id,
                    command = command_type,
                    %caller,
                    events = committed.len(),
                    "command committed"
                );
                Ok(committed)
            }
            Err(DispatchError::Domain(err)) => {
                tracing::debug!(
                    token_id = %self.token_id,
                    command = command_type,
                    %caller,
                    error = %err,
                    "command rejected"
                );
                Err(DispatchError::Domain(err))
            }
            Err(err) => {
                tracing::warn!(
                    token_id = %self.token_id,
                    command = command_type,
                    error = %err,
                    "command failed"
                );
                Err(err)
            }
        }
    }

    // ── lifecycle ───────────────────────────────────────────────────────────

    /// One-time setup: metadata, supply limit (whole tokens) and the four role holders.
    pub fn initialize(
        &self,
        caller: Address,
        roles: &RoleAssignments,
        max_supply_limit: Amount,
        metadata: TokenMetadata,
        implementation: impl Into<String>,
    ) -> ServiceResult<Vec<StoredEvent>> {
        self.execute(TokenCommand::Initialize(Initialize {
            token_id: self.token_id,
            caller,
            default_admin: roles.default_admin,
            pauser: roles.pauser,
            minter: roles.minter,
            upgrader: roles.upgrader,
            max_supply_limit,
            metadata,
            implementation: implementation.into(),
            occurred_at: Utc::now(),
        }))
    }

    /// Initialize from deployment config; the default admin acts as initializer.
    pub fn initialize_from_config(&self, config: &LedgerConfig) -> ServiceResult<Vec<StoredEvent>> {
        self.initialize(
            config.roles.default_admin,
            &config.roles,
            config.max_supply_limit,
            config.metadata(),
            config.implementation.clone(),
        )
    }

    pub fn pause(&self, caller: Address) -> ServiceResult<Vec<StoredEvent>> {
        self.execute(TokenCommand::Pause(Pause {
            token_id: self.token_id,
            caller,
            occurred_at: Utc::now(),
        }))
    }

    pub fn unpause(&self, caller: Address) -> ServiceResult<Vec<StoredEvent>> {
        self.execute(TokenCommand::Unpause(Unpause {
            token_id: self.token_id,
            caller,
            occurred_at: Utc::now(),
        }))
    }

    pub fn upgrade_to(
        &self,
        caller: Address,
        implementation: impl Into<String>,
    ) -> ServiceResult<Vec<StoredEvent>> {
        self.execute(TokenCommand::UpgradeTo(UpgradeTo {
            token_id: self.token_id,
            caller,
            implementation: implementation.into(),
            occurred_at: Utc::now(),
        }))
    }

    // ── minting ─────────────────────────────────────────────────────────────

    pub fn mint(&self, caller: Address, to: Address, amount: Amount) -> ServiceResult<Vec<StoredEvent>> {
        self.execute(TokenCommand::Mint(Mint {
            token_id: self.token_id,
            caller,
            to,
            amount,
            occurred_at: Utc::now(),
        }))
    }

    pub fn mint_with_customer_id_and_transaction_id(
        &self,
        caller: Address,
        to: Address,
        amount: Amount,
        customer_id: impl Into<String>,
        transaction_id: impl Into<String>,
    ) -> ServiceResult<Vec<StoredEvent>> {
        self.execute(TokenCommand::MintWithCustomerIdAndTransactionId(
            MintWithCustomerIdAndTransactionId {
                token_id: self.token_id,
                caller,
                to,
                amount,
                customer_id: customer_id.into(),
                transaction_id: transaction_id.into(),
                occurred_at: Utc::now(),
            },
        ))
    }

    // ── fungible asset ──────────────────────────────────────────────────────

    pub fn transfer(&self, caller: Address, to: Address, amount: Amount) -> ServiceResult<Vec<StoredEvent>> {
        self.execute(TokenCommand::Transfer(TransferTokens {
            token_id: self.token_id,
            caller,
            to,
            amount,
            occurred_at: Utc::now(),
        }))
    }

    pub fn approve(&self, caller: Address, spender: Address, amount: Amount) -> ServiceResult<Vec<StoredEvent>> {
        self.execute(TokenCommand::Approve(Approve {
            token_id: self.token_id,
            caller,
            spender,
            amount,
            occurred_at: Utc::now(),
        }))
    }

    pub fn transfer_from(
        &self,
        caller: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> ServiceResult<Vec<StoredEvent>> {
        self.execute(TokenCommand::TransferFrom(TransferFrom {
            token_id: self.token_id,
            caller,
            from,
            to,
            amount,
            occurred_at: Utc::now(),
        }))
    }

    pub fn burn(&self, caller: Address, amount: Amount) -> ServiceResult<Vec<StoredEvent>> {
        self.execute(TokenCommand::Burn(Burn {
            token_id: self.token_id,
            caller,
            amount,
            occurred_at: Utc::now(),
        }))
    }

    pub fn burn_from(&self, caller: Address, account: Address, amount: Amount) -> ServiceResult<Vec<StoredEvent>> {
        self.execute(TokenCommand::BurnFrom(BurnFrom {
            token_id: self.token_id,
            caller,
            account,
            amount,
            occurred_at: Utc::now(),
        }))
    }

    // ── access control ──────────────────────────────────────────────────────

    pub fn grant_role(&self, caller: Address, role: Role, account: Address) -> ServiceResult<Vec<StoredEvent>> {
        self.execute(TokenCommand::GrantRole(GrantRole {
            token_id: self.token_id,
            caller,
            role,
            account,
            occurred_at: Utc::now(),
        }))
    }

    pub fn revoke_role(&self, caller: Address, role: Role, account: Address) -> ServiceResult<Vec<StoredEvent>> {
        self.execute(TokenCommand::RevokeRole(RevokeRole {
            token_id: self.token_id,
            caller,
            role,
            account,
            occurred_at: Utc::now(),
        }))
    }

    pub fn renounce_role(
        &self,
        caller: Address,
        role: Role,
        caller_confirmation: Address,
    ) -> ServiceResult<Vec<StoredEvent>> {
        self.execute(TokenCommand::RenounceRole(RenounceRole {
            token_id: self.token_id,
            caller,
            role,
            caller_confirmation,
            occurred_at: Utc::now(),
        }))
    }

    // ── reads (lock-free) ───────────────────────────────────────────────────

    /// Current state, rebuilt from the committed stream.
    pub fn snapshot(&self) -> ServiceResult<Token> {
        self.dispatcher.load(self.token_id, Token::empty)
    }

    pub fn total_supply_limit(&self) -> ServiceResult<Amount> {
        Ok(self.snapshot()?.total_supply_limit())
    }

    pub fn total_supply(&self) -> ServiceResult<Amount> {
        Ok(self.snapshot()?.total_supply())
    }

    pub fn balance_of(&self, account: Address) -> ServiceResult<Amount> {
        Ok(self.snapshot()?.balance_of(account))
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> ServiceResult<Amount> {
        Ok(self.snapshot()?.allowance(owner, spender))
    }

    pub fn paused(&self) -> ServiceResult<bool> {
        Ok(self.snapshot()?.is_paused())
    }

    pub fn metadata(&self) -> ServiceResult<TokenMetadata> {
        Ok(self.snapshot()?.metadata().clone())
    }

    pub fn name(&self) -> ServiceResult<String> {
        Ok(self.snapshot()?.metadata().name.clone())
    }

    pub fn symbol(&self) -> ServiceResult<String> {
        Ok(self.snapshot()?.metadata().symbol.clone())
    }

    pub fn decimals(&self) -> ServiceResult<u8> {
        Ok(self.snapshot()?.metadata().decimals)
    }

    pub fn balance_of_customer_id(&self, customer_id: &str) -> ServiceResult<Amount> {
        Ok(self.snapshot()?.balance_of_customer_id(customer_id))
    }

    pub fn minted_amount_by_transaction_id(&self, transaction_id: &str) -> ServiceResult<Amount> {
        Ok(self.snapshot()?.minted_amount_by_transaction_id(transaction_id))
    }

    pub fn is_transaction_id_used(&self, transaction_id: &str) -> ServiceResult<bool> {
        Ok(self.snapshot()?.is_transaction_id_used(transaction_id))
    }

    pub fn has_role(&self, role: &Role, account: Address) -> ServiceResult<bool> {
        Ok(self.snapshot()?.has_role(role, account))
    }

    pub fn role_admin(&self, role: &Role) -> ServiceResult<Role> {
        Ok(self.snapshot()?.role_admin(role))
    }

    pub fn implementation(&self) -> ServiceResult<String> {
        Ok(self.snapshot()?.implementation().to_string())
    }
}
