//! Minting core: supply limit plus the customer / transaction side ledgers.
//!
//! Both mint paths check, in this order, and stop at the first failure:
//!
//! 1. caller holds `MINTER_ROLE`
//! 2. `total_supply + amount <= supply_limit`
//! 3. (tagged only) customer id non-empty and within bounds
//! 4. (tagged only) transaction id non-empty and within bounds
//! 5. (tagged only) transaction id never used before
//!
//! Transaction ids are tracked by presence, so a zero-amount tagged mint still
//! consumes its id. Identifiers are compared byte-for-byte (case-sensitive,
//! never trimmed).

use std::collections::HashMap;

use mintledger_access::{AccessRegistry, Role, authorize};
use mintledger_core::{Address, Amount};

use crate::asset::FungibleAssetLedger;
use crate::constants::MAX_IDENTIFIER_LEN;
use crate::error::TokenError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MintingLedger {
    supply_limit: Amount,
    customer_balances: HashMap<String, Amount>,
    transaction_records: HashMap<String, Amount>,
}

impl MintingLedger {
    pub fn new(supply_limit: Amount) -> Self {
        Self {
            supply_limit,
            ..Self::default()
        }
    }

    /// Maximum total supply in smallest units (already scaled by decimals).
    pub fn supply_limit(&self) -> Amount {
        self.supply_limit
    }

    /// Sum of all tagged mints for `customer_id`; zero for unknown ids.
    pub fn balance_of_customer_id(&self, customer_id: &str) -> Amount {
        self.customer_balances
            .get(customer_id)
            .copied()
            .unwrap_or_default()
    }

    /// Amount minted under `transaction_id`; zero for unknown ids.
    pub fn minted_amount_by_transaction_id(&self, transaction_id: &str) -> Amount {
        self.transaction_records
            .get(transaction_id)
            .copied()
            .unwrap_or_default()
    }

    pub fn is_transaction_id_used(&self, transaction_id: &str) -> bool {
        self.transaction_records.contains_key(transaction_id)
    }

    pub fn customer_count(&self) -> usize {
        self.customer_balances.len()
    }

    pub fn transaction_count(&self) -> usize {
        self.transaction_records.len()
    }

    /// Preconditions of a plain mint.
    pub fn check_mint<R, L>(
        &self,
        registry: &R,
        assets: &L,
        caller: Address,
        amount: Amount,
    ) -> Result<(), TokenError>
    where
        R: AccessRegistry + ?Sized,
        L: FungibleAssetLedger + ?Sized,
    {
        authorize(registry, &Role::MINTER, caller)?;
        self.check_supply_limit(assets.total_supply(), amount)
    }

    /// Preconditions of a mint tagged with customer and transaction ids.
    pub fn check_tagged_mint<R, L>(
        &self,
        registry: &R,
        assets: &L,
        caller: Address,
        amount: Amount,
        customer_id: &str,
        transaction_id: &str,
    ) -> Result<(), TokenError>
    where
        R: AccessRegistry + ?Sized,
        L: FungibleAssetLedger + ?Sized,
    {
        self.check_mint(registry, assets, caller, amount)?;

        if customer_id.is_empty() {
            return Err(TokenError::EmptyCustomerId);
        }
        if customer_id.len() > MAX_IDENTIFIER_LEN {
            return Err(TokenError::CustomerIdTooLong {
                len: customer_id.len(),
                max: MAX_IDENTIFIER_LEN,
            });
        }
        if transaction_id.is_empty() {
            return Err(TokenError::EmptyTransactionId);
        }
        if transaction_id.len() > MAX_IDENTIFIER_LEN {
            return Err(TokenError::TransactionIdTooLong {
                len: transaction_id.len(),
                max: MAX_IDENTIFIER_LEN,
            });
        }
        if self.is_transaction_id_used(transaction_id) {
            return Err(TokenError::DuplicateTransactionId(transaction_id.to_string()));
        }

        Ok(())
    }

    fn check_supply_limit(&self, total_supply: Amount, amount: Amount) -> Result<(), TokenError> {
        match total_supply.checked_add(amount) {
            Some(next) if next <= self.supply_limit => Ok(()),
            _ => Err(TokenError::SupplyLimitExceeded {
                total_supply,
                amount,
                limit: self.supply_limit,
            }),
        }
    }

    pub fn record_customer_mint(&mut self, customer_id: &str, amount: Amount) {
        let balance = self
            .customer_balances
            .entry(customer_id.to_string())
            .or_default();
        *balance = balance.saturating_add(amount);
    }

    /// First write wins; `check_tagged_mint` rejects any later reuse.
    pub fn record_transaction_mint(&mut self, transaction_id: &str, amount: Amount) {
        self.transaction_records
            .entry(transaction_id.to_string())
            .or_insert(amount);
    }
}
