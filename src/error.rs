//! Error type shared by every layer of the crate.

use thiserror::Error;

use crate::policies::PolicyType;

/// Errors surfaced by backends, controllers and the adaptive cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Construction was rejected (zero capacity, out-of-range hyperparameter).
    #[error("invalid configuration: {0}")]
    Config(String),

    /// `put` was called on a backend whose capacity is zero.
    #[error("cannot insert into a zero-capacity store")]
    Capacity,

    /// A backend's bookkeeping no longer matches its primary store.
    #[error("{policy} store is inconsistent: {detail}")]
    Consistency { policy: PolicyType, detail: String },

    /// Reading a trace failed.
    #[error("failed to read trace: {0}")]
    Io(#[from] std::io::Error),

    /// A trace line could not be turned into a key.
    #[error("malformed trace line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

impl CacheError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        CacheError::Config(msg.into())
    }

    pub(crate) fn consistency(policy: PolicyType, detail: impl Into<String>) -> Self {
        CacheError::Consistency {
            policy,
            detail: detail.into(),
        }
    }

    /// True for errors that indicate corrupted internal state.
    pub fn is_consistency(&self) -> bool {
        matches!(self, CacheError::Consistency { .. })
    }
}
