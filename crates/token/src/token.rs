use chrono::{DateTime, Utc};

use mintledger_access::{
    AccessRegistry, Role, RoleRegistry, authorize, authorize_role_admin, check_renounce,
};
use mintledger_core::{Aggregate, AggregateRoot, Address, Amount, TokenId};

use crate::asset::{AssetLedger, FungibleAssetLedger, TokenMetadata};
use crate::commands::{
    Approve, Burn, BurnFrom, GrantRole, Initialize, Mint, MintWithCustomerIdAndTransactionId,
    Pause, RenounceRole, RevokeRole, TokenCommand, TransferFrom, TransferTokens, Unpause,
    UpgradeTo,
};
use crate::error::TokenError;
use crate::events::{
    Approval, Initialized, Paused, RoleGranted, RoleRevoked, TokenEvent, TokensMinted,
    TokensMintedWithCustomerId, TokensMintedWithTransactionId, Transfer, Unpaused, Upgraded,
};
use crate::minting::MintingLedger;
use crate::upgrade::UpgradeGate;

/// Aggregate root: Token.
///
/// One deployed token, composed of its collaborators. The aggregate only
/// coordinates them: every rule lives in the collaborator that owns the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    id: TokenId,
    initialized: bool,
    assets: AssetLedger,
    roles: RoleRegistry,
    minting: MintingLedger,
    upgrade: UpgradeGate,
    version: u64,
}

impl Token {
    /// Create an empty, not-yet-initialized aggregate instance for rehydration.
    pub fn empty(id: TokenId) -> Self {
        Self {
            id,
            initialized: false,
            assets: AssetLedger::default(),
            roles: RoleRegistry::new(),
            minting: MintingLedger::default(),
            upgrade: UpgradeGate::default(),
            version: 0,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn assets(&self) -> &AssetLedger {
        &self.assets
    }

    pub fn roles(&self) -> &RoleRegistry {
        &self.roles
    }

    pub fn minting(&self) -> &MintingLedger {
        &self.minting
    }

    pub fn upgrade_gate(&self) -> &UpgradeGate {
        &self.upgrade
    }

    pub fn metadata(&self) -> &TokenMetadata {
        self.assets.metadata()
    }

    pub fn total_supply_limit(&self) -> Amount {
        self.minting.supply_limit()
    }

    pub fn total_supply(&self) -> Amount {
        self.assets.total_supply()
    }

    pub fn balance_of(&self, account: Address) -> Amount {
        self.assets.balance_of(account)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> Amount {
        self.assets.allowance(owner, spender)
    }

    pub fn is_paused(&self) -> bool {
        self.assets.is_paused()
    }

    pub fn balance_of_customer_id(&self, customer_id: &str) -> Amount {
        self.minting.balance_of_customer_id(customer_id)
    }

    pub fn minted_amount_by_transaction_id(&self, transaction_id: &str) -> Amount {
        self.minting.minted_amount_by_transaction_id(transaction_id)
    }

    pub fn is_transaction_id_used(&self, transaction_id: &str) -> bool {
        self.minting.is_transaction_id_used(transaction_id)
    }

    pub fn has_role(&self, role: &Role, account: Address) -> bool {
        self.roles.has_role(role, account)
    }

    pub fn role_admin(&self, role: &Role) -> Role {
        self.roles.role_admin(role)
    }

    pub fn implementation(&self) -> &str {
        self.upgrade.implementation()
    }
}

impl AggregateRoot for Token {
    type Id = TokenId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Aggregate for Token {
    type Command = TokenCommand;
    type Event = TokenEvent;
    type Error = TokenError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            TokenEvent::Initialized(e) => {
                self.id = e.token_id;
                self.assets = AssetLedger::new(e.metadata.clone());
                self.minting = MintingLedger::new(e.supply_limit);
                self.upgrade = UpgradeGate::new(e.implementation.clone());
                self.initialized = true;
            }
            TokenEvent::Transfer(e) => self.assets.apply_transfer(e.from, e.to, e.amount),
            TokenEvent::Approval(e) => self.assets.set_allowance(e.owner, e.spender, e.amount),
            TokenEvent::Paused(_) => self.assets.set_paused(true),
            TokenEvent::Unpaused(_) => self.assets.set_paused(false),
            TokenEvent::RoleGranted(e) => {
                self.roles.grant(e.role.clone(), e.account);
            }
            TokenEvent::RoleRevoked(e) => {
                self.roles.revoke(&e.role, e.account);
            }
            TokenEvent::Upgraded(e) => self.upgrade.point_to(e.implementation.clone()),
            // Supply and balances move with the paired `Transfer`.
            TokenEvent::TokensMinted(_) => {}
            TokenEvent::TokensMintedWithCustomerId(e) => {
                self.minting.record_customer_mint(&e.customer_id, e.amount);
            }
            TokenEvent::TokensMintedWithTransactionId(e) => {
                self.minting.record_transaction_mint(&e.transaction_id, e.amount);
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            TokenCommand::Initialize(cmd) => self.handle_initialize(cmd),
            TokenCommand::Pause(cmd) => self.handle_pause(cmd),
            TokenCommand::Unpause(cmd) => self.handle_unpause(cmd),
            TokenCommand::Mint(cmd) => self.handle_mint(cmd),
            TokenCommand::MintWithCustomerIdAndTransactionId(cmd) => self.handle_tagged_mint(cmd),
            TokenCommand::Transfer(cmd) => self.handle_transfer(cmd),
            TokenCommand::Approve(cmd) => self.handle_approve(cmd),
            TokenCommand::TransferFrom(cmd) => self.handle_transfer_from(cmd),
            TokenCommand::Burn(cmd) => self.handle_burn(cmd),
            TokenCommand::BurnFrom(cmd) => self.handle_burn_from(cmd),
            TokenCommand::GrantRole(cmd) => self.handle_grant_role(cmd),
            TokenCommand::RevokeRole(cmd) => self.handle_revoke_role(cmd),
            TokenCommand::RenounceRole(cmd) => self.handle_renounce_role(cmd),
            TokenCommand::UpgradeTo(cmd) => self.handle_upgrade_to(cmd),
        }
    }
}

impl Token {
    fn ensure_token_id(&self, token_id: TokenId) -> Result<(), TokenError> {
        if self.id != token_id {
            return Err(TokenError::TokenMismatch {
                expected: self.id,
                found: token_id,
            });
        }
        Ok(())
    }

    fn ensure_live(&self, token_id: TokenId) -> Result<(), TokenError> {
        self.ensure_token_id(token_id)?;
        if !self.initialized {
            return Err(TokenError::NotInitialized);
        }
        Ok(())
    }

    fn handle_initialize(&self, cmd: &Initialize) -> Result<Vec<TokenEvent>, TokenError> {
        self.ensure_token_id(cmd.token_id)?;
        if self.initialized {
            return Err(TokenError::AlreadyInitialized);
        }

        cmd.metadata.validate()?;
        if cmd.max_supply_limit.is_zero() {
            return Err(TokenError::InvalidSupplyLimit(cmd.max_supply_limit));
        }
        let supply_limit = cmd
            .max_supply_limit
            .scaled_by_decimals(cmd.metadata.decimals)
            .ok_or(TokenError::InvalidSupplyLimit(cmd.max_supply_limit))?;
        if cmd.implementation.trim().is_empty() {
            return Err(TokenError::InvalidImplementation(
                "implementation cannot be empty".to_string(),
            ));
        }

        let mut events = vec![TokenEvent::Initialized(Initialized {
            token_id: cmd.token_id,
            initializer: cmd.caller,
            metadata: cmd.metadata.clone(),
            supply_limit,
            implementation: cmd.implementation.clone(),
            version: 1,
            occurred_at: cmd.occurred_at,
        })];

        let grants = [
            (Role::DEFAULT_ADMIN, cmd.default_admin),
            (Role::PAUSER, cmd.pauser),
            (Role::MINTER, cmd.minter),
            (Role::UPGRADER, cmd.upgrader),
        ];
        events.extend(grants.into_iter().map(|(role, account)| {
            TokenEvent::RoleGranted(RoleGranted {
                token_id: cmd.token_id,
                role,
                account,
                sender: cmd.caller,
                occurred_at: cmd.occurred_at,
            })
        }));

        Ok(events)
    }

    fn handle_pause(&self, cmd: &Pause) -> Result<Vec<TokenEvent>, TokenError> {
        self.ensure_live(cmd.token_id)?;
        authorize(&self.roles, &Role::PAUSER, cmd.caller)?;
        if self.assets.is_paused() {
            return Err(TokenError::AlreadyPaused);
        }

        Ok(vec![TokenEvent::Paused(Paused {
            token_id: cmd.token_id,
            account: cmd.caller,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_unpause(&self, cmd: &Unpause) -> Result<Vec<TokenEvent>, TokenError> {
        self.ensure_live(cmd.token_id)?;
        authorize(&self.roles, &Role::PAUSER, cmd.caller)?;
        if !self.assets.is_paused() {
            return Err(TokenError::NotPaused);
        }

        Ok(vec![TokenEvent::Unpaused(Unpaused {
            token_id: cmd.token_id,
            account: cmd.caller,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_mint(&self, cmd: &Mint) -> Result<Vec<TokenEvent>, TokenError> {
        self.ensure_live(cmd.token_id)?;
        self.minting
            .check_mint(&self.roles, &self.assets, cmd.caller, cmd.amount)?;
        self.assets.check_mint(cmd.to, cmd.amount)?;

        Ok(vec![
            self.mint_transfer(cmd.token_id, cmd.to, cmd.amount, cmd.occurred_at),
            TokenEvent::TokensMinted(TokensMinted {
                token_id: cmd.token_id,
                to: cmd.to,
                amount: cmd.amount,
                occurred_at: cmd.occurred_at,
            }),
        ])
    }

    fn handle_tagged_mint(
        &self,
        cmd: &MintWithCustomerIdAndTransactionId,
    ) -> Result<Vec<TokenEvent>, TokenError> {
        self.ensure_live(cmd.token_id)?;
        self.minting.check_tagged_mint(
            &self.roles,
            &self.assets,
            cmd.caller,
            cmd.amount,
            &cmd.customer_id,
            &cmd.transaction_id,
        )?;
        self.assets.check_mint(cmd.to, cmd.amount)?;

        Ok(vec![
            self.mint_transfer(cmd.token_id, cmd.to, cmd.amount, cmd.occurred_at),
            TokenEvent::TokensMintedWithCustomerId(TokensMintedWithCustomerId {
                token_id: cmd.token_id,
                to: cmd.to,
                amount: cmd.amount,
                customer_id: cmd.customer_id.clone(),
                occurred_at: cmd.occurred_at,
            }),
            TokenEvent::TokensMintedWithTransactionId(TokensMintedWithTransactionId {
                token_id: cmd.token_id,
                to: cmd.to,
                amount: cmd.amount,
                transaction_id: cmd.transaction_id.clone(),
                occurred_at: cmd.occurred_at,
            }),
        ])
    }

    fn mint_transfer(
        &self,
        token_id: TokenId,
        to: Address,
        amount: Amount,
        occurred_at: DateTime<Utc>,
    ) -> TokenEvent {
        TokenEvent::Transfer(Transfer {
            token_id,
            from: Address::ZERO,
            to,
            amount,
            occurred_at,
        })
    }

    fn handle_transfer(&self, cmd: &TransferTokens) -> Result<Vec<TokenEvent>, TokenError> {
        self.ensure_live(cmd.token_id)?;
        self.assets.check_transfer(cmd.caller, cmd.to, cmd.amount)?;

        Ok(vec![TokenEvent::Transfer(Transfer {
            token_id: cmd.token_id,
            from: cmd.caller,
            to: cmd.to,
            amount: cmd.amount,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_approve(&self, cmd: &Approve) -> Result<Vec<TokenEvent>, TokenError> {
        self.ensure_live(cmd.token_id)?;
        self.assets.check_approve(cmd.caller, cmd.spender)?;

        Ok(vec![TokenEvent::Approval(Approval {
            token_id: cmd.token_id,
            owner: cmd.caller,
            spender: cmd.spender,
            amount: cmd.amount,
            occurred_at: cmd.occurred_at,
        })])
    }

    /// Allowance decrease for `spender` spending `owner`'s tokens, if finite.
    fn spend_allowance(
        &self,
        token_id: TokenId,
        owner: Address,
        spender: Address,
        amount: Amount,
        occurred_at: DateTime<Utc>,
    ) -> Result<Option<TokenEvent>, TokenError> {
        let Some(remaining) = self.assets.check_spend_allowance(owner, spender, amount)? else {
            return Ok(None);
        };
        self.assets.check_approve(owner, spender)?;

        Ok(Some(TokenEvent::Approval(Approval {
            token_id,
            owner,
            spender,
            amount: remaining,
            occurred_at,
        })))
    }

    fn handle_transfer_from(&self, cmd: &TransferFrom) -> Result<Vec<TokenEvent>, TokenError> {
        self.ensure_live(cmd.token_id)?;
        let approval =
            self.spend_allowance(cmd.token_id, cmd.from, cmd.caller, cmd.amount, cmd.occurred_at)?;
        self.assets.check_transfer(cmd.from, cmd.to, cmd.amount)?;

        let mut events: Vec<TokenEvent> = approval.into_iter().collect();
        events.push(TokenEvent::Transfer(Transfer {
            token_id: cmd.token_id,
            from: cmd.from,
            to: cmd.to,
            amount: cmd.amount,
            occurred_at: cmd.occurred_at,
        }));
        Ok(events)
    }

    fn handle_burn(&self, cmd: &Burn) -> Result<Vec<TokenEvent>, TokenError> {
        self.ensure_live(cmd.token_id)?;
        self.assets.check_burn(cmd.caller, cmd.amount)?;

        Ok(vec![TokenEvent::Transfer(Transfer {
            token_id: cmd.token_id,
            from: cmd.caller,
            to: Address::ZERO,
            amount: cmd.amount,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_burn_from(&self, cmd: &BurnFrom) -> Result<Vec<TokenEvent>, TokenError> {
        self.ensure_live(cmd.token_id)?;
        let approval = self.spend_allowance(
            cmd.token_id,
            cmd.account,
            cmd.caller,
            cmd.amount,
            cmd.occurred_at,
        )?;
        self.assets.check_burn(cmd.account, cmd.amount)?;

        let mut events: Vec<TokenEvent> = approval.into_iter().collect();
        events.push(TokenEvent::Transfer(Transfer {
            token_id: cmd.token_id,
            from: cmd.account,
            to: Address::ZERO,
            amount: cmd.amount,
            occurred_at: cmd.occurred_at,
        }));
        Ok(events)
    }

    fn handle_grant_role(&self, cmd: &GrantRole) -> Result<Vec<TokenEvent>, TokenError> {
        self.ensure_live(cmd.token_id)?;
        authorize_role_admin(&self.roles, &cmd.role, cmd.caller)?;
        if self.roles.has_role(&cmd.role, cmd.account) {
            return Ok(Vec::new());
        }

        Ok(vec![TokenEvent::RoleGranted(RoleGranted {
            token_id: cmd.token_id,
            role: cmd.role.clone(),
            account: cmd.account,
            sender: cmd.caller,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_revoke_role(&self, cmd: &RevokeRole) -> Result<Vec<TokenEvent>, TokenError> {
        self.ensure_live(cmd.token_id)?;
        authorize_role_admin(&self.roles, &cmd.role, cmd.caller)?;
        Ok(self.revocation(cmd.token_id, &cmd.role, cmd.account, cmd.caller, cmd.occurred_at))
    }

    fn handle_renounce_role(&self, cmd: &RenounceRole) -> Result<Vec<TokenEvent>, TokenError> {
        self.ensure_live(cmd.token_id)?;
        check_renounce(cmd.caller, cmd.caller_confirmation)?;
        Ok(self.revocation(cmd.token_id, &cmd.role, cmd.caller, cmd.caller, cmd.occurred_at))
    }

    fn revocation(
        &self,
        token_id: TokenId,
        role: &Role,
        account: Address,
        sender: Address,
        occurred_at: DateTime<Utc>,
    ) -> Vec<TokenEvent> {
        if !self.roles.has_role(role, account) {
            return Vec::new();
        }
        vec![TokenEvent::RoleRevoked(RoleRevoked {
            token_id,
            role: role.clone(),
            account,
            sender,
            occurred_at,
        })]
    }

    fn handle_upgrade_to(&self, cmd: &UpgradeTo) -> Result<Vec<TokenEvent>, TokenError> {
        self.ensure_live(cmd.token_id)?;
        self.upgrade
            .check_upgrade(&self.roles, cmd.caller, &cmd.implementation)?;

        Ok(vec![TokenEvent::Upgraded(Upgraded {
            token_id: cmd.token_id,
            implementation: cmd.implementation.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::INITIAL_IMPLEMENTATION;
    use mintledger_events::{Event, execute};
    use proptest::prelude::*;
    use std::collections::HashMap;

    const ONE_TOKEN: u128 = 1_000_000_000_000_000_000;

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; 20])
    }

    fn admin() -> Address {
        addr(0xa1)
    }
    fn pauser() -> Address {
        addr(0xb2)
    }
    fn minter() -> Address {
        addr(0xc3)
    }
    fn upgrader() -> Address {
        addr(0xd4)
    }

    fn init_with(id: TokenId, limit: u128, decimals: u8) -> TokenCommand {
        TokenCommand::Initialize(Initialize {
            token_id: id,
            caller: admin(),
            default_admin: admin(),
            pauser: pauser(),
            minter: minter(),
            upgrader: upgrader(),
            max_supply_limit: Amount::new(limit),
            metadata: TokenMetadata::new("Mint Ledger", "MLT", decimals),
            implementation: INITIAL_IMPLEMENTATION.to_string(),
            occurred_at: Utc::now(),
        })
    }

    fn init_cmd(id: TokenId, limit: u128) -> TokenCommand {
        init_with(id, limit, 18)
    }

    fn initialized(limit: u128) -> (TokenId, Token) {
        let id = TokenId::new();
        let mut token = Token::empty(id);
        execute(&mut token, &init_cmd(id, limit)).unwrap();
        (id, token)
    }

    fn mint(id: TokenId, caller: Address, to: Address, amount: u128) -> TokenCommand {
        TokenCommand::Mint(Mint {
            token_id: id,
            caller,
            to,
            amount: Amount::new(amount),
            occurred_at: Utc::now(),
        })
    }

    fn tagged(id: TokenId, to: Address, amount: u128, cust: &str, tx: &str) -> TokenCommand {
        TokenCommand::MintWithCustomerIdAndTransactionId(MintWithCustomerIdAndTransactionId {
            token_id: id,
            caller: minter(),
            to,
            amount: Amount::new(amount),
            customer_id: cust.to_string(),
            transaction_id: tx.to_string(),
            occurred_at: Utc::now(),
        })
    }

    fn pause(id: TokenId, caller: Address) -> TokenCommand {
        TokenCommand::Pause(Pause {
            token_id: id,
            caller,
            occurred_at: Utc::now(),
        })
    }

    #[test]
    fn initialize_scales_limit_and_grants_roles() {
        let (_, token) = initialized(1000);

        assert_eq!(token.total_supply_limit(), Amount::new(1000 * ONE_TOKEN));
        assert!(token.has_role(&Role::DEFAULT_ADMIN, admin()));
        assert!(token.has_role(&Role::PAUSER, pauser()));
        assert!(token.has_role(&Role::MINTER, minter()));
        assert!(token.has_role(&Role::UPGRADER, upgrader()));
        assert_eq!(token.implementation(), INITIAL_IMPLEMENTATION);
        // Initialized + four grants.
        assert_eq!(token.version(), 5);
    }

    #[test]
    fn initialize_twice_is_rejected() {
        let (id, mut token) = initialized(1000);
        assert_eq!(
            execute(&mut token, &init_cmd(id, 1000)),
            Err(TokenError::AlreadyInitialized)
        );
    }

    #[test]
    fn zero_or_overflowing_limit_is_rejected() {
        let id = TokenId::new();
        let token = Token::empty(id);
        assert_eq!(
            token.handle(&init_cmd(id, 0)),
            Err(TokenError::InvalidSupplyLimit(Amount::ZERO))
        );
        assert!(matches!(
            token.handle(&init_cmd(id, u128::MAX)),
            Err(TokenError::InvalidSupplyLimit(_))
        ));
    }

    #[test]
    fn commands_before_initialize_fail() {
        let id = TokenId::new();
        let token = Token::empty(id);
        assert_eq!(
            token.handle(&mint(id, minter(), addr(1), 1)),
            Err(TokenError::NotInitialized)
        );
    }

    #[test]
    fn command_for_another_token_is_rejected() {
        let (_, token) = initialized(1000);
        assert!(matches!(
            token.handle(&mint(TokenId::new(), minter(), addr(1), 1)),
            Err(TokenError::TokenMismatch { .. })
        ));
    }

    #[test]
    fn minter_mints_one_token() {
        let (id, mut token) = initialized(1000);
        let x = addr(0x11);

        let events = execute(&mut token, &mint(id, minter(), x, ONE_TOKEN)).unwrap();

        assert_eq!(token.total_supply(), Amount::new(ONE_TOKEN));
        assert_eq!(token.balance_of(x), Amount::new(ONE_TOKEN));
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[1],
            TokenEvent::TokensMinted(e) if e.to == x && e.amount == Amount::new(ONE_TOKEN)
        ));
    }

    #[test]
    fn non_minter_is_denied() {
        let (id, mut token) = initialized(1000);
        let err = execute(&mut token, &mint(id, addr(0x99), addr(1), 1)).unwrap_err();
        assert_eq!(
            err,
            TokenError::CapabilityDenied {
                account: addr(0x99),
                role: Role::MINTER
            }
        );
        assert_eq!(token.total_supply(), Amount::ZERO);
    }

    #[test]
    fn mint_past_limit_changes_nothing() {
        let (id, mut token) = initialized(1);
        execute(&mut token, &tagged(id, addr(1), ONE_TOKEN, "c", "t1")).unwrap();
        let before = token.clone();

        let err = execute(&mut token, &tagged(id, addr(1), 1, "c", "t2")).unwrap_err();
        assert!(matches!(err, TokenError::SupplyLimitExceeded { .. }));
        assert_eq!(token, before);
        assert_eq!(token.minted_amount_by_transaction_id("t2"), Amount::ZERO);
    }

    #[test]
    fn duplicate_transaction_id_is_rejected() {
        let (id, mut token) = initialized(1000);
        let x = addr(0x22);

        let events = execute(&mut token, &tagged(id, x, 5, "cust1", "tx1")).unwrap();
        let types: Vec<_> = events.iter().map(|e| e.event_type()).collect();
        assert_eq!(
            types,
            vec![
                "token.transfer",
                "token.tokens_minted_with_customer_id",
                "token.tokens_minted_with_transaction_id"
            ]
        );

        let err = execute(&mut token, &tagged(id, x, 5, "cust1", "tx1")).unwrap_err();
        assert_eq!(err, TokenError::DuplicateTransactionId("tx1".to_string()));
        assert_eq!(token.balance_of_customer_id("cust1"), Amount::new(5));
        assert_eq!(token.minted_amount_by_transaction_id("tx1"), Amount::new(5));
        assert_eq!(token.total_supply(), Amount::new(5));
    }

    #[test]
    fn unknown_ids_read_as_zero() {
        let (_, token) = initialized(1000);
        assert_eq!(token.balance_of_customer_id("nobody"), Amount::ZERO);
        assert_eq!(token.minted_amount_by_transaction_id("nothing"), Amount::ZERO);
    }

    #[test]
    fn minting_checks_run_before_ledger_checks() {
        let (id, mut token) = initialized(1000);
        execute(&mut token, &pause(id, pauser())).unwrap();

        // Empty customer id wins over the zero receiver and the pause.
        assert_eq!(
            token.handle(&tagged(id, Address::ZERO, 1, "", "tx")),
            Err(TokenError::EmptyCustomerId)
        );
        assert_eq!(
            token.handle(&tagged(id, Address::ZERO, 1, "c", "tx")),
            Err(TokenError::InvalidReceiver(Address::ZERO))
        );
        assert_eq!(
            token.handle(&tagged(id, addr(1), 1, "c", "tx")),
            Err(TokenError::Paused)
        );
    }

    #[test]
    fn pause_toggle_is_gated_and_strict() {
        let (id, mut token) = initialized(1000);

        assert!(matches!(
            execute(&mut token, &pause(id, addr(0x42))),
            Err(TokenError::CapabilityDenied { .. })
        ));
        execute(&mut token, &pause(id, pauser())).unwrap();
        assert!(token.is_paused());
        assert_eq!(
            execute(&mut token, &pause(id, pauser())),
            Err(TokenError::AlreadyPaused)
        );

        let unpause = TokenCommand::Unpause(Unpause {
            token_id: id,
            caller: pauser(),
            occurred_at: Utc::now(),
        });
        execute(&mut token, &unpause).unwrap();
        assert!(!token.is_paused());
        assert_eq!(execute(&mut token, &unpause), Err(TokenError::NotPaused));
    }

    #[test]
    fn transfer_from_spends_allowance() {
        let (id, mut token) = initialized(1000);
        let (owner, spender, dest) = (addr(1), addr(2), addr(3));
        execute(&mut token, &mint(id, minter(), owner, 100)).unwrap();

        let approve = TokenCommand::Approve(Approve {
            token_id: id,
            caller: owner,
            spender,
            amount: Amount::new(30),
            occurred_at: Utc::now(),
        });
        execute(&mut token, &approve).unwrap();

        let transfer_from = |amount: u128| {
            TokenCommand::TransferFrom(TransferFrom {
                token_id: id,
                caller: spender,
                from: owner,
                to: dest,
                amount: Amount::new(amount),
                occurred_at: Utc::now(),
            })
        };

        let events = execute(&mut token, &transfer_from(20)).unwrap();
        assert!(matches!(&events[0], TokenEvent::Approval(a) if a.amount == Amount::new(10)));
        assert!(matches!(&events[1], TokenEvent::Transfer(_)));
        assert_eq!(token.balance_of(dest), Amount::new(20));
        assert_eq!(token.allowance(owner, spender), Amount::new(10));

        assert!(matches!(
            execute(&mut token, &transfer_from(11)),
            Err(TokenError::InsufficientAllowance { .. })
        ));
    }

    #[test]
    fn infinite_allowance_emits_no_approval() {
        let (id, mut token) = initialized(1000);
        let (owner, spender) = (addr(1), addr(2));
        execute(&mut token, &mint(id, minter(), owner, 50)).unwrap();
        execute(
            &mut token,
            &TokenCommand::Approve(Approve {
                token_id: id,
                caller: owner,
                spender,
                amount: Amount::MAX,
                occurred_at: Utc::now(),
            }),
        )
        .unwrap();

        let burn_from = TokenCommand::BurnFrom(BurnFrom {
            token_id: id,
            caller: spender,
            account: owner,
            amount: Amount::new(20),
            occurred_at: Utc::now(),
        });
        let events = execute(&mut token, &burn_from).unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(token.allowance(owner, spender), Amount::MAX);
        assert_eq!(token.total_supply(), Amount::new(30));
    }

    #[test]
    fn burn_reduces_supply_and_frees_headroom() {
        let (id, mut token) = initialized(1);
        execute(&mut token, &mint(id, minter(), addr(1), ONE_TOKEN)).unwrap();

        let burn = TokenCommand::Burn(Burn {
            token_id: id,
            caller: addr(1),
            amount: Amount::new(ONE_TOKEN / 2),
            occurred_at: Utc::now(),
        });
        execute(&mut token, &burn).unwrap();

        assert_eq!(token.total_supply(), Amount::new(ONE_TOKEN / 2));
        assert!(execute(&mut token, &mint(id, minter(), addr(1), ONE_TOKEN / 2)).is_ok());
    }

    #[test]
    fn role_changes_require_admin_and_skip_no_ops() {
        let (id, mut token) = initialized(1000);
        let new_minter = addr(0x55);

        let grant = |caller| {
            TokenCommand::GrantRole(GrantRole {
                token_id: id,
                caller,
                role: Role::MINTER,
                account: new_minter,
                occurred_at: Utc::now(),
            })
        };

        assert!(matches!(
            execute(&mut token, &grant(addr(0x66))),
            Err(TokenError::CapabilityDenied { .. })
        ));
        assert_eq!(execute(&mut token, &grant(admin())).unwrap().len(), 1);
        assert!(execute(&mut token, &grant(admin())).unwrap().is_empty());
        assert!(token.has_role(&Role::MINTER, new_minter));

        let renounce = TokenCommand::RenounceRole(RenounceRole {
            token_id: id,
            caller: new_minter,
            role: Role::MINTER,
            caller_confirmation: admin(),
            occurred_at: Utc::now(),
        });
        assert!(matches!(
            execute(&mut token, &renounce),
            Err(TokenError::BadConfirmation { .. })
        ));

        let revoke = TokenCommand::RevokeRole(RevokeRole {
            token_id: id,
            caller: admin(),
            role: Role::MINTER,
            account: new_minter,
            occurred_at: Utc::now(),
        });
        execute(&mut token, &revoke).unwrap();
        assert!(!token.has_role(&Role::MINTER, new_minter));
    }

    #[test]
    fn upgrade_keeps_ledger_state() {
        let (id, mut token) = initialized(1000);
        execute(&mut token, &tagged(id, addr(1), 7, "c", "tx")).unwrap();

        let upgrade = TokenCommand::UpgradeTo(UpgradeTo {
            token_id: id,
            caller: upgrader(),
            implementation: "v2".to_string(),
            occurred_at: Utc::now(),
        });
        execute(&mut token, &upgrade).unwrap();

        assert_eq!(token.implementation(), "v2");
        assert_eq!(token.balance_of(addr(1)), Amount::new(7));
        assert_eq!(token.balance_of_customer_id("c"), Amount::new(7));
        assert_eq!(token.minted_amount_by_transaction_id("tx"), Amount::new(7));
    }

    #[test]
    fn rehydration_from_events_matches_live_state() {
        let id = TokenId::new();
        let mut live = Token::empty(id);
        let mut history = Vec::new();

        for cmd in [
            init_cmd(id, 1000),
            tagged(id, addr(1), 3, "a", "t1"),
            tagged(id, addr(2), 4, "a", "t2"),
            mint(id, minter(), addr(3), 5),
        ] {
            history.extend(execute(&mut live, &cmd).unwrap());
        }

        let mut replay = Token::empty(id);
        for ev in &history {
            replay.apply(ev);
        }

        assert_eq!(replay, live);
        assert_eq!(replay.balance_of_customer_id("a"), Amount::new(7));
        assert_eq!(replay.total_supply(), Amount::new(12));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Plain(u128),
        Tagged { amount: u128, customer: usize, tx: u8 },
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u128..400).prop_map(Op::Plain),
            (0u128..400, 0usize..3, 0u8..6)
                .prop_map(|(amount, customer, tx)| Op::Tagged { amount, customer, tx }),
        ]
    }

    proptest! {
        #[test]
        fn mint_sequences_preserve_ledger_invariants(ops in prop::collection::vec(op_strategy(), 1..40)) {
            // Zero decimals keeps the limit small enough to hit.
            let id = TokenId::new();
            let mut token = Token::empty(id);
            execute(&mut token, &init_with(id, 2_000, 0)).unwrap();

            let mut minted = 0u128;
            let mut per_customer = [0u128; 3];
            let mut used_tx: HashMap<String, u128> = HashMap::new();

            for op in ops {
                match op {
                    Op::Plain(amount) => {
                        if execute(&mut token, &mint(id, minter(), addr(1), amount)).is_ok() {
                            minted += amount;
                        }
                    }
                    Op::Tagged { amount, customer, tx } => {
                        let cust = format!("cust{customer}");
                        let tx_id = format!("tx{tx}");
                        let before = token.minted_amount_by_transaction_id(&tx_id);
                        match execute(&mut token, &tagged(id, addr(2), amount, &cust, &tx_id)) {
                            Ok(_) => {
                                prop_assert!(!used_tx.contains_key(&tx_id));
                                used_tx.insert(tx_id, amount);
                                minted += amount;
                                per_customer[customer] += amount;
                            }
                            Err(TokenError::DuplicateTransactionId(_)) => {
                                prop_assert!(used_tx.contains_key(&tx_id));
                                prop_assert_eq!(token.minted_amount_by_transaction_id(&tx_id), before);
                            }
                            Err(TokenError::SupplyLimitExceeded { .. }) => {}
                            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
                        }
                    }
                }

                prop_assert_eq!(token.total_supply(), Amount::new(minted));
                prop_assert!(token.total_supply() <= token.total_supply_limit());
            }

            for (i, expected) in per_customer.iter().enumerate() {
                prop_assert_eq!(
                    token.balance_of_customer_id(&format!("cust{i}")),
                    Amount::new(*expected)
                );
            }
            for (tx_id, amount) in used_tx {
                prop_assert_eq!(token.minted_amount_by_transaction_id(&tx_id), Amount::new(amount));
            }
        }
    }
}
