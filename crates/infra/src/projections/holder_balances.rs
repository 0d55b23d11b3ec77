//! Holder balances projection: per-address balances from `Transfer` events.

use serde_json::Value as JsonValue;

use mintledger_core::{Address, Amount, TokenId};
use mintledger_events::EventEnvelope;
use mintledger_token::TokenEvent;

use crate::projections::cursor::{ProjectionError, StreamCursors};
use crate::projections::mint_records::{ensure_stream, sorted_for_replay};
use crate::read_model::ReadModelStore;

/// Read model: one holder's balance of one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolderBalance {
    pub token_id: TokenId,
    pub account: Address,
    pub balance: Amount,
}

#[derive(Debug)]
pub struct HolderBalancesProjection<S>
where
    S: ReadModelStore<(TokenId, Address), HolderBalance>,
{
    store: S,
    cursors: StreamCursors,
}

impl<S> HolderBalancesProjection<S>
where
    S: ReadModelStore<(TokenId, Address), HolderBalance>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: StreamCursors::new(),
        }
    }

    pub fn balance_of(&self, token_id: TokenId, account: Address) -> Amount {
        self.store
            .get(&(token_id, account))
            .map(|h| h.balance)
            .unwrap_or_default()
    }

    /// Non-zero holders of a token, largest balance first.
    pub fn holders(&self, token_id: TokenId) -> Vec<HolderBalance> {
        let mut out: Vec<_> = self
            .store
            .list()
            .into_iter()
            .filter(|((t, _), h)| *t == token_id && !h.balance.is_zero())
            .map(|(_, h)| h)
            .collect();
        out.sort_by(|a, b| b.balance.cmp(&a.balance).then(a.account.cmp(&b.account)));
        out
    }

    /// Sum of all holder balances, which equals the token's total supply.
    pub fn total_supply(&self, token_id: TokenId) -> Amount {
        self.holders(token_id)
            .iter()
            .fold(Amount::ZERO, |acc, h| acc.saturating_add(h.balance))
    }

    pub fn cursor(&self, token_id: TokenId) -> u64 {
        self.cursors.position(token_id)
    }

    pub fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError> {
        let token_id = envelope.token_id();
        let seq = envelope.sequence_number();

        self.cursors.advance(token_id, seq, || {
            let event: TokenEvent = serde_json::from_value(envelope.payload().clone())
                .map_err(|e| ProjectionError::Deserialize(e.to_string()))?;

            if let TokenEvent::Transfer(e) = event {
                ensure_stream(token_id, e.token_id)?;
                if !e.from.is_zero() {
                    self.adjust(token_id, e.from, |b| b.saturating_sub(e.amount));
                }
                if !e.to.is_zero() {
                    self.adjust(token_id, e.to, |b| b.saturating_add(e.amount));
                }
            }
            Ok(())
        })?;

        Ok(())
    }

    fn adjust(&self, token_id: TokenId, account: Address, f: impl FnOnce(Amount) -> Amount) {
        let key = (token_id, account);
        let mut rm = self.store.get(&key).unwrap_or(HolderBalance {
            token_id,
            account,
            balance: Amount::ZERO,
        });
        rm.balance = f(rm.balance);
        self.store.upsert(key, rm);
    }

    pub fn rebuild_from_scratch(
        &self,
        envelopes: impl IntoIterator<Item = EventEnvelope<JsonValue>>,
    ) -> Result<(), ProjectionError> {
        self.cursors.clear();
        self.store.clear();

        for env in &sorted_for_replay(envelopes) {
            self.apply_envelope(env)?;
        }
        Ok(())
    }
}
