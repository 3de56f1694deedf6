use std::collections::HashMap;

use thiserror::Error;

use teeforge_core::AggregateId;

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("failed to deserialize event payload: {0}")]
    Deserialize(String),

    #[error("event targets {found}, envelope stream is {expected}")]
    StreamMismatch {
        expected: AggregateId,
        found: AggregateId,
    },

    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },

    #[error("projection cursor lock poisoned")]
    LockPoisoned,
}

/// Outcome of checking an envelope against the stream cursor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CursorCheck {
    Apply,
    /// Duplicate or replay at/below the cursor.
    Skip,
}

/// Last applied sequence number per aggregate stream.
#[derive(Debug, Default)]
pub struct StreamCursors {
    last: HashMap<AggregateId, u64>,
}

impl StreamCursors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence numbers start at 1 and must advance one at a time; the
    /// first envelope seen for a stream may start anywhere above zero.
    pub fn check(&self, aggregate_id: AggregateId, seq: u64) -> Result<CursorCheck, ProjectionError> {
        let last = self.last.get(&aggregate_id).copied().unwrap_or(0);

        if seq == 0 {
            return Err(ProjectionError::NonMonotonicSequence { last, found: seq });
        }
        if seq <= last {
            return Ok(CursorCheck::Skip);
        }
        if last != 0 && seq != last + 1 {
            return Err(ProjectionError::NonMonotonicSequence { last, found: seq });
        }
        Ok(CursorCheck::Apply)
    }

    pub fn advance(&mut self, aggregate_id: AggregateId, seq: u64) {
        self.last.insert(aggregate_id, seq);
    }

    pub fn clear(&mut self) {
        self.last.clear();
    }
}
