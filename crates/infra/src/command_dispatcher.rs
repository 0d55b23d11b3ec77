//! Command execution pipeline (application-level orchestration).
//!
//! ```text
//! Command
//!   ↓
//! 1. Load the token stream from the store
//!   ↓
//! 2. Validate + rehydrate (apply historical events to rebuild state)
//!   ↓
//! 3. Handle command (pure decision logic, every precondition, produces events)
//!   ↓
//! 4. Append events (all-or-nothing, optimistic concurrency check)
//!   ↓
//! 5. Publish committed events to the bus
//! ```
//!
//! A rejected command stops at step 3 and appends nothing. A writer that lost a
//! race stops at step 4 with `Concurrency` instead of interleaving.
//!
//! This module contains no IO itself; it composes infrastructure traits.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use mintledger_core::{Aggregate, ExpectedVersion, TokenId};
use mintledger_events::{Command, EventBus, EventEnvelope};

use crate::event_store::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};

/// Failure of one dispatch.
///
/// `E` is the aggregate's own error type, kept intact so callers can match
/// on the exact rejection.
#[derive(Debug, Error)]
pub enum DispatchError<E>
where
    E: std::error::Error + 'static,
{
    /// The aggregate rejected the command (deterministic, nothing appended).
    #[error(transparent)]
    Domain(E),

    /// Optimistic concurrency failure (another writer appended first).
    #[error("concurrency conflict: {0}")]
    Concurrency(String),

    /// A loaded stream was malformed (wrong token, bad sequence).
    #[error("corrupt stream: {0}")]
    CorruptStream(String),

    /// Failed to deserialize historical event payloads into the aggregate event type.
    #[error("failed to deserialize stored event: {0}")]
    Deserialize(String),

    /// Persisting to the event store failed.
    #[error(transparent)]
    Store(EventStoreError),

    /// Publication failed after a successful append (at-least-once; events are persisted).
    #[error("event publication failed: {0}")]
    Publish(String),
}

impl<E> DispatchError<E>
where
    E: std::error::Error + 'static,
{
    /// The aggregate's rejection, if that is what this is.
    pub fn domain(&self) -> Option<&E> {
        match self {
            DispatchError::Domain(e) => Some(e),
            _ => None,
        }
    }
}

impl<E> From<EventStoreError> for DispatchError<E>
where
    E: std::error::Error + 'static,
{
    fn from(value: EventStoreError) -> Self {
        match value {
            EventStoreError::Concurrency(msg) => DispatchError::Concurrency(msg),
            other => DispatchError::Store(other),
        }
    }
}

/// Reusable command execution engine for event-sourced aggregates.
///
/// ## Execution Guarantees
///
/// - **Atomicity**: events are appended as one batch; nothing is published if append fails
/// - **Consistency**: the append expects the exact version the decision was made on
/// - **Isolation**: each command operates on a single token stream
///
/// If publication fails after a successful append the error is returned, but
/// the events stay committed. Consumers see at-least-once delivery.
#[derive(Debug)]
pub struct CommandDispatcher<S, B> {
    store: S,
    bus: B,
}

impl<S, B> CommandDispatcher<S, B> {
    pub fn new(store: S, bus: B) -> Self {
        Self { store, bus }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn into_parts(self) -> (S, B) {
        (self.store, self.bus)
    }
}

impl<S, B> CommandDispatcher<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Dispatch a command through the full event-sourcing pipeline.
    ///
    /// `make_aggregate` builds the empty aggregate that history is applied to
    /// (e.g. `Token::empty`). Returns the committed events with their sequence
    /// numbers; an accepted command that decided no events returns an empty
    /// vector without touching the store.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(command = command.command_type(), token_id = %command.target_token_id())
    )]
    pub fn dispatch<A>(
        &self,
        aggregate_type: &str,
        command: A::Command,
        make_aggregate: impl FnOnce(TokenId) -> A,
    ) -> Result<Vec<StoredEvent>, DispatchError<A::Error>>
    where
        A: Aggregate,
        A::Command: Command,
        A::Event: mintledger_events::Event + Serialize + DeserializeOwned,
        A::Error: std::error::Error + 'static,
    {
        let token_id = command.target_token_id();

        // 1) Load history
        let history = self.store.load_stream(token_id)?;
        validate_loaded_stream(token_id, &history)?;
        let expected = ExpectedVersion::Exact(stream_version(&history));

        // 2) Rehydrate
        let mut aggregate = make_aggregate(token_id);
        apply_history(&mut aggregate, &history)?;

        // 3) Decide (no mutation)
        let decided = aggregate.handle(&command).map_err(|e| {
            tracing::debug!(error = %e, "command rejected");
            DispatchError::Domain(e)
        })?;
        if decided.is_empty() {
            tracing::debug!("command accepted with no state change");
            return Ok(vec![]);
        }

        // 4) Persist
        let uncommitted = decided
            .iter()
            .map(|ev| UncommittedEvent::from_typed(token_id, aggregate_type, Uuid::now_v7(), ev))
            .collect::<Result<Vec<_>, _>>()?;

        let committed = self.store.append(uncommitted, expected).map_err(|e| {
            tracing::warn!(error = %e, "append failed");
            DispatchError::from(e)
        })?;

        // 5) Publish (after append)
        for stored in &committed {
            self.bus
                .publish(stored.to_envelope())
                .map_err(|e| DispatchError::Publish(format!("{e:?}")))?;
        }

        tracing::debug!(
            committed = committed.len(),
            version = stream_version(&committed),
            "command committed"
        );
        Ok(committed)
    }

    /// Rebuild an aggregate from its stream without dispatching anything.
    pub fn load<A>(
        &self,
        token_id: TokenId,
        make_aggregate: impl FnOnce(TokenId) -> A,
    ) -> Result<A, DispatchError<A::Error>>
    where
        A: Aggregate,
        A::Event: DeserializeOwned,
        A::Error: std::error::Error + 'static,
    {
        let history = self.store.load_stream(token_id)?;
        validate_loaded_stream(token_id, &history)?;

        let mut aggregate = make_aggregate(token_id);
        apply_history(&mut aggregate, &history)?;
        Ok(aggregate)
    }
}

fn stream_version(stream: &[StoredEvent]) -> u64 {
    stream.last().map(|e| e.sequence_number).unwrap_or(0)
}

fn validate_loaded_stream<E>(token_id: TokenId, stream: &[StoredEvent]) -> Result<(), DispatchError<E>>
where
    E: std::error::Error + 'static,
{
    // The stream must be this token's, numbered 1, 2, 3, ...
    for (idx, e) in stream.iter().enumerate() {
        if e.token_id != token_id {
            return Err(DispatchError::CorruptStream(format!(
                "loaded stream contains wrong token_id at index {idx}"
            )));
        }
        let expected = idx as u64 + 1;
        if e.sequence_number != expected {
            return Err(DispatchError::CorruptStream(format!(
                "expected sequence_number {expected} at index {idx}, found {}",
                e.sequence_number
            )));
        }
    }
    Ok(())
}

fn apply_history<A>(aggregate: &mut A, history: &[StoredEvent]) -> Result<(), DispatchError<A::Error>>
where
    A: Aggregate,
    A::Event: DeserializeOwned,
    A::Error: std::error::Error + 'static,
{
    for stored in history {
        let ev: A::Event = serde_json::from_value(stored.payload.clone())
            .map_err(|e| DispatchError::Deserialize(e.to_string()))?;
        aggregate.apply(&ev);
    }

    Ok(())
}
