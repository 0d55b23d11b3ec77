//! Per-stream sequence cursors shared by the projections.

use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

use mintledger_core::TokenId;

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("failed to deserialize token event: {0}")]
    Deserialize(String),

    #[error("stream mismatch: {0}")]
    StreamMismatch(String),

    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },

    #[error("projection cursor lock poisoned")]
    Poisoned,
}

/// Last applied sequence number per token stream.
///
/// Delivery is at-least-once, so a projection must tolerate replays
/// (`seq <= last`, ignored) but never skip ahead (`seq > last + 1`, rejected).
#[derive(Debug, Default)]
pub struct StreamCursors {
    inner: RwLock<HashMap<TokenId, u64>>,
}

impl StreamCursors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self, token_id: TokenId) -> u64 {
        self.inner
            .read()
            .map(|c| c.get(&token_id).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Run `apply` for `seq` if it is the next position of `token_id`'s stream.
    ///
    /// The cursor lock is held across `apply`, so envelopes of one projection
    /// are applied one at a time. The cursor only moves if `apply` succeeds.
    /// Returns `Ok(false)` for an ignored replay.
    pub fn advance<F>(&self, token_id: TokenId, seq: u64, apply: F) -> Result<bool, ProjectionError>
    where
        F: FnOnce() -> Result<(), ProjectionError>,
    {
        let mut cursors = self.inner.write().map_err(|_| ProjectionError::Poisoned)?;
        let last = cursors.get(&token_id).copied().unwrap_or(0);

        if seq == 0 {
            return Err(ProjectionError::NonMonotonicSequence { last, found: seq });
        }
        if seq <= last {
            return Ok(false);
        }
        if seq != last + 1 {
            return Err(ProjectionError::NonMonotonicSequence { last, found: seq });
        }

        apply()?;
        cursors.insert(token_id, seq);
        Ok(true)
    }

    pub fn clear(&self) {
        if let Ok(mut cursors) = self.inner.write() {
            cursors.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_are_ignored_and_gaps_rejected() {
        let cursors = StreamCursors::new();
        let id = TokenId::new();

        assert!(cursors.advance(id, 1, || Ok(())).unwrap());
        assert!(!cursors.advance(id, 1, || Ok(())).unwrap());
        assert!(matches!(
            cursors.advance(id, 3, || Ok(())),
            Err(ProjectionError::NonMonotonicSequence { last: 1, found: 3 })
        ));
        assert_eq!(cursors.position(id), 1);
    }

    #[test]
    fn failed_apply_keeps_cursor() {
        let cursors = StreamCursors::new();
        let id = TokenId::new();

        let result = cursors.advance(id, 1, || Err(ProjectionError::Deserialize("bad".into())));
        assert!(result.is_err());
        assert_eq!(cursors.position(id), 0);
    }
}
