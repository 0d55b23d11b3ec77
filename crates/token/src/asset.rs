//! Fungible asset ledger: balances, allowances, supply and the pause switch.
//!
//! Checks (`check_*`) are pure and run during command handling; mutations run
//! only when events are applied.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use mintledger_core::{Address, Amount};

use crate::constants::{DEFAULT_DECIMALS, MAX_NAME_LEN, MAX_SYMBOL_LEN};
use crate::error::TokenError;

/// Name, symbol and decimals, fixed at initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl TokenMetadata {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
        }
    }

    pub fn validate(&self) -> Result<(), TokenError> {
        if self.name.trim().is_empty() {
            return Err(TokenError::InvalidMetadata("name cannot be empty".to_string()));
        }
        if self.name.len() > MAX_NAME_LEN {
            return Err(TokenError::InvalidMetadata(format!(
                "name too long (max {MAX_NAME_LEN} bytes)"
            )));
        }
        if self.symbol.trim().is_empty() {
            return Err(TokenError::InvalidMetadata("symbol cannot be empty".to_string()));
        }
        if self.symbol.len() > MAX_SYMBOL_LEN {
            return Err(TokenError::InvalidMetadata(format!(
                "symbol too long (max {MAX_SYMBOL_LEN} bytes)"
            )));
        }
        Ok(())
    }
}

impl Default for TokenMetadata {
    fn default() -> Self {
        Self {
            name: String::new(),
            symbol: String::new(),
            decimals: DEFAULT_DECIMALS,
        }
    }
}

/// Read side of the asset ledger, as consumed by the minting core.
pub trait FungibleAssetLedger {
    fn total_supply(&self) -> Amount;
    fn balance_of(&self, account: Address) -> Amount;
    fn allowance(&self, owner: Address, spender: Address) -> Amount;
    fn decimals(&self) -> u8;
    fn is_paused(&self) -> bool;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetLedger {
    metadata: TokenMetadata,
    balances: HashMap<Address, Amount>,
    allowances: HashMap<(Address, Address), Amount>,
    total_supply: Amount,
    paused: bool,
}

impl AssetLedger {
    pub fn new(metadata: TokenMetadata) -> Self {
        Self {
            metadata,
            ..Self::default()
        }
    }

    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    // ── checks ──────────────────────────────────────────────────────────────

    /// Core balance update rules shared by mint, burn and transfer.
    ///
    /// `from == ZERO` means new supply; otherwise `from` must cover `amount`.
    pub fn check_update(&self, from: Address, amount: Amount) -> Result<(), TokenError> {
        if self.paused {
            return Err(TokenError::Paused);
        }

        if from.is_zero() {
            self.total_supply
                .checked_add(amount)
                .ok_or(TokenError::ArithmeticOverflow)?;
        } else {
            let balance = self.balance_of(from);
            if balance < amount {
                return Err(TokenError::InsufficientBalance {
                    account: from,
                    balance,
                    needed: amount,
                });
            }
        }

        // Balances never exceed total supply, so crediting `to` cannot overflow.
        Ok(())
    }

    pub fn check_transfer(&self, from: Address, to: Address, amount: Amount) -> Result<(), TokenError> {
        if from.is_zero() {
            return Err(TokenError::InvalidSender(from));
        }
        if to.is_zero() {
            return Err(TokenError::InvalidReceiver(to));
        }
        self.check_update(from, amount)
    }

    pub fn check_mint(&self, to: Address, amount: Amount) -> Result<(), TokenError> {
        if to.is_zero() {
            return Err(TokenError::InvalidReceiver(to));
        }
        self.check_update(Address::ZERO, amount)
    }

    pub fn check_burn(&self, from: Address, amount: Amount) -> Result<(), TokenError> {
        if from.is_zero() {
            return Err(TokenError::InvalidSender(from));
        }
        self.check_update(from, amount)
    }

    pub fn check_approve(&self, owner: Address, spender: Address) -> Result<(), TokenError> {
        if owner.is_zero() {
            return Err(TokenError::InvalidApprover(owner));
        }
        if spender.is_zero() {
            return Err(TokenError::InvalidSpender(spender));
        }
        Ok(())
    }

    /// Validate spending `amount` of `owner`'s allowance to `spender`.
    ///
    /// Returns the allowance left afterwards, or `None` for an infinite
    /// (`Amount::MAX`) allowance which is never decreased.
    pub fn check_spend_allowance(
        &self,
        owner: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<Option<Amount>, TokenError> {
        let current = self.allowance(owner, spender);
        if current == Amount::MAX {
            return Ok(None);
        }
        current
            .checked_sub(amount)
            .map(Some)
            .ok_or(TokenError::InsufficientAllowance {
                spender,
                allowance: current,
                needed: amount,
            })
    }

    // ── mutations (event application only) ─────────────────────────────────

    /// Route a `Transfer(from, to, amount)` fact to the matching mutation.
    pub fn apply_transfer(&mut self, from: Address, to: Address, amount: Amount) {
        match (from.is_zero(), to.is_zero()) {
            (true, false) => self.credit_and_increase_supply(to, amount),
            (false, true) => self.debit_and_decrease_supply(from, amount),
            (false, false) => {
                self.debit(from, amount);
                self.credit(to, amount);
            }
            (true, true) => {}
        }
    }

    pub fn credit_and_increase_supply(&mut self, to: Address, amount: Amount) {
        self.total_supply = self.total_supply.saturating_add(amount);
        self.credit(to, amount);
    }

    pub fn debit_and_decrease_supply(&mut self, from: Address, amount: Amount) {
        self.debit(from, amount);
        self.total_supply = self.total_supply.saturating_sub(amount);
    }

    pub fn set_allowance(&mut self, owner: Address, spender: Address, amount: Amount) {
        if amount.is_zero() {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), amount);
        }
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    fn credit(&mut self, account: Address, amount: Amount) {
        let balance = self.balances.entry(account).or_default();
        *balance = balance.saturating_add(amount);
    }

    fn debit(&mut self, account: Address, amount: Amount) {
        let remaining = self.balance_of(account).saturating_sub(amount);
        if remaining.is_zero() {
            self.balances.remove(&account);
        } else {
            self.balances.insert(account, remaining);
        }
    }
}

impl FungibleAssetLedger for AssetLedger {
    fn total_supply(&self) -> Amount {
        self.total_supply
    }

    fn balance_of(&self, account: Address) -> Amount {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    fn allowance(&self, owner: Address, spender: Address) -> Amount {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    fn decimals(&self) -> u8 {
        self.metadata.decimals
    }

    fn is_paused(&self) -> bool {
        self.paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; 20])
    }

    fn ledger_with(account: Address, amount: u128) -> AssetLedger {
        let mut ledger = AssetLedger::new(TokenMetadata::new("Test", "TST", 18));
        ledger.credit_and_increase_supply(account, Amount::new(amount));
        ledger
    }

    #[test]
    fn transfer_moves_balance_without_touching_supply() {
        let mut ledger = ledger_with(addr(1), 100);
        ledger.check_transfer(addr(1), addr(2), Amount::new(40)).unwrap();
        ledger.apply_transfer(addr(1), addr(2), Amount::new(40));

        assert_eq!(ledger.balance_of(addr(1)), Amount::new(60));
        assert_eq!(ledger.balance_of(addr(2)), Amount::new(40));
        assert_eq!(ledger.total_supply(), Amount::new(100));
    }

    #[test]
    fn transfer_beyond_balance_is_rejected() {
        let ledger = ledger_with(addr(1), 10);
        let err = ledger.check_transfer(addr(1), addr(2), Amount::new(11)).unwrap_err();
        assert_eq!(
            err,
            TokenError::InsufficientBalance {
                account: addr(1),
                balance: Amount::new(10),
                needed: Amount::new(11),
            }
        );
    }

    #[test]
    fn zero_addresses_are_rejected() {
        let ledger = ledger_with(addr(1), 10);
        assert_eq!(
            ledger.check_transfer(addr(1), Address::ZERO, Amount::new(1)),
            Err(TokenError::InvalidReceiver(Address::ZERO))
        );
        assert_eq!(
            ledger.check_mint(Address::ZERO, Amount::new(1)),
            Err(TokenError::InvalidReceiver(Address::ZERO))
        );
        assert_eq!(
            ledger.check_approve(addr(1), Address::ZERO),
            Err(TokenError::InvalidSpender(Address::ZERO))
        );
    }

    #[test]
    fn paused_ledger_blocks_every_balance_update() {
        let mut ledger = ledger_with(addr(1), 10);
        ledger.set_paused(true);

        assert_eq!(ledger.check_mint(addr(2), Amount::new(1)), Err(TokenError::Paused));
        assert_eq!(ledger.check_burn(addr(1), Amount::new(1)), Err(TokenError::Paused));
        assert_eq!(
            ledger.check_transfer(addr(1), addr(2), Amount::new(1)),
            Err(TokenError::Paused)
        );
        // Approvals are not balance updates.
        assert!(ledger.check_approve(addr(1), addr(2)).is_ok());
    }

    #[test]
    fn burn_decreases_supply() {
        let mut ledger = ledger_with(addr(1), 10);
        ledger.check_burn(addr(1), Amount::new(4)).unwrap();
        ledger.apply_transfer(addr(1), Address::ZERO, Amount::new(4));

        assert_eq!(ledger.total_supply(), Amount::new(6));
        assert_eq!(ledger.balance_of(addr(1)), Amount::new(6));
    }

    #[test]
    fn infinite_allowance_is_not_spent() {
        let mut ledger = ledger_with(addr(1), 10);
        ledger.set_allowance(addr(1), addr(2), Amount::MAX);
        assert_eq!(
            ledger.check_spend_allowance(addr(1), addr(2), Amount::new(5)),
            Ok(None)
        );

        ledger.set_allowance(addr(1), addr(3), Amount::new(5));
        assert_eq!(
            ledger.check_spend_allowance(addr(1), addr(3), Amount::new(5)),
            Ok(Some(Amount::ZERO))
        );
        assert!(matches!(
            ledger.check_spend_allowance(addr(1), addr(3), Amount::new(6)),
            Err(TokenError::InsufficientAllowance { .. })
        ));
    }

    #[test]
    fn mint_overflowing_supply_is_rejected() {
        let ledger = ledger_with(addr(1), u128::MAX);
        assert_eq!(
            ledger.check_mint(addr(2), Amount::new(1)),
            Err(TokenError::ArithmeticOverflow)
        );
    }

    #[test]
    fn metadata_validation() {
        assert!(TokenMetadata::new("Token", "TKN", 18).validate().is_ok());
        assert!(TokenMetadata::new(" ", "TKN", 18).validate().is_err());
        assert!(TokenMetadata::new("Token", "", 18).validate().is_err());
        assert!(TokenMetadata::new("Token", "X".repeat(MAX_SYMBOL_LEN + 1), 18).validate().is_err());
    }
}
