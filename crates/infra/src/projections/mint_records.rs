//! Mint records projection.
//!
//! Mirrors the minting ledger's two side lookups (customer balances and
//! transaction records) as queryable read models, fed from published events.

use serde_json::Value as JsonValue;

use mintledger_core::{Address, Amount, TokenId};
use mintledger_events::EventEnvelope;
use mintledger_token::TokenEvent;

use crate::projections::cursor::{ProjectionError, StreamCursors};
use crate::read_model::ReadModelStore;

/// Read model: cumulative tagged-mint total for one customer of one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerMintBalance {
    pub token_id: TokenId,
    pub customer_id: String,
    pub balance: Amount,
    pub mint_count: u64,
}

/// Read model: the single mint recorded under a transaction id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionMintRecord {
    pub token_id: TokenId,
    pub transaction_id: String,
    pub to: Address,
    pub amount: Amount,
    /// Stream position of the recording event.
    pub sequence_number: u64,
}

pub type RecordKey = (TokenId, String);

#[derive(Debug)]
pub struct MintRecordsProjection<C, T>
where
    C: ReadModelStore<RecordKey, CustomerMintBalance>,
    T: ReadModelStore<RecordKey, TransactionMintRecord>,
{
    customers: C,
    transactions: T,
    cursors: StreamCursors,
}

impl<C, T> MintRecordsProjection<C, T>
where
    C: ReadModelStore<RecordKey, CustomerMintBalance>,
    T: ReadModelStore<RecordKey, TransactionMintRecord>,
{
    pub fn new(customers: C, transactions: T) -> Self {
        Self {
            customers,
            transactions,
            cursors: StreamCursors::new(),
        }
    }

    pub fn customer(&self, token_id: TokenId, customer_id: &str) -> Option<CustomerMintBalance> {
        self.customers.get(&(token_id, customer_id.to_string()))
    }

    /// Zero for customers never minted to.
    pub fn balance_of_customer_id(&self, token_id: TokenId, customer_id: &str) -> Amount {
        self.customer(token_id, customer_id)
            .map(|c| c.balance)
            .unwrap_or_default()
    }

    pub fn transaction(&self, token_id: TokenId, transaction_id: &str) -> Option<TransactionMintRecord> {
        self.transactions.get(&(token_id, transaction_id.to_string()))
    }

    /// Zero for unknown transaction ids.
    pub fn minted_amount_by_transaction_id(&self, token_id: TokenId, transaction_id: &str) -> Amount {
        self.transaction(token_id, transaction_id)
            .map(|t| t.amount)
            .unwrap_or_default()
    }

    /// Customers of one token, ordered by id.
    pub fn customers_of(&self, token_id: TokenId) -> Vec<CustomerMintBalance> {
        let mut out: Vec<_> = self
            .customers
            .list()
            .into_iter()
            .filter(|((t, _), _)| *t == token_id)
            .map(|(_, v)| v)
            .collect();
        out.sort_by(|a, b| a.customer_id.cmp(&b.customer_id));
        out
    }

    pub fn cursor(&self, token_id: TokenId) -> u64 {
        self.cursors.position(token_id)
    }

    /// Apply a published envelope.
    ///
    /// Idempotent for at-least-once delivery: envelopes at or below the
    /// stream cursor are ignored, gaps are rejected.
    pub fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError> {
        let token_id = envelope.token_id();
        let seq = envelope.sequence_number();

        self.cursors.advance(token_id, seq, || {
            let event: TokenEvent = serde_json::from_value(envelope.payload().clone())
                .map_err(|e| ProjectionError::Deserialize(e.to_string()))?;

            match event {
                TokenEvent::TokensMintedWithCustomerId(e) => {
                    ensure_stream(token_id, e.token_id)?;
                    let key = (token_id, e.customer_id.clone());
                    let mut rm = self.customers.get(&key).unwrap_or(CustomerMintBalance {
                        token_id,
                        customer_id: e.customer_id,
                        balance: Amount::ZERO,
                        mint_count: 0,
                    });
                    rm.balance = rm.balance.saturating_add(e.amount);
                    rm.mint_count += 1;
                    self.customers.upsert(key, rm);
                }
                TokenEvent::TokensMintedWithTransactionId(e) => {
                    ensure_stream(token_id, e.token_id)?;
                    let key = (token_id, e.transaction_id.clone());
                    // First write wins, as in the ledger.
                    if self.transactions.get(&key).is_none() {
                        self.transactions.upsert(
                            key,
                            TransactionMintRecord {
                                token_id,
                                transaction_id: e.transaction_id,
                                to: e.to,
                                amount: e.amount,
                                sequence_number: seq,
                            },
                        );
                    }
                }
                _ => {}
            }
            Ok(())
        })?;

        Ok(())
    }

    /// Rebuild the read models from scratch by replaying envelopes.
    pub fn rebuild_from_scratch(
        &self,
        envelopes: impl IntoIterator<Item = EventEnvelope<JsonValue>>,
    ) -> Result<(), ProjectionError> {
        self.cursors.clear();
        self.customers.clear();
        self.transactions.clear();

        for env in &sorted_for_replay(envelopes) {
            self.apply_envelope(env)?;
        }
        Ok(())
    }
}

pub(crate) fn ensure_stream(envelope_token: TokenId, event_token: TokenId) -> Result<(), ProjectionError> {
    if envelope_token != event_token {
        return Err(ProjectionError::StreamMismatch(format!(
            "event token_id {event_token} does not match envelope token_id {envelope_token}"
        )));
    }
    Ok(())
}

/// Deterministic replay order: token, then sequence.
pub(crate) fn sorted_for_replay(
    envelopes: impl IntoIterator<Item = EventEnvelope<JsonValue>>,
) -> Vec<EventEnvelope<JsonValue>> {
    let mut envs: Vec<_> = envelopes.into_iter().collect();
    envs.sort_by_key(|e| (*e.token_id().as_uuid().as_bytes(), e.sequence_number()));
    envs
}
