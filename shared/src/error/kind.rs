//! Coarse failure taxonomy
//!
//! Every [`ErrorCode`](super::ErrorCode) belongs to exactly one kind.
//! Callers that only care about "what sort of failure" match on the kind
//! instead of on individual codes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input rejected before any state was touched
    Validation,
    /// Referenced record does not exist
    NotFound,
    /// Operation not legal in the record's current state
    InvalidState,
    /// Concurrent claim on a shared resource (table, open session)
    Conflict,
    /// Tendered cash below the order total
    InsufficientPayment,
    /// Actor role may not perform the operation
    Permission,
    /// Persistence layer failed; nothing was retried
    StorageUnavailable,
    /// Unexpected internal failure
    Internal,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::InvalidState => "invalid_state",
            Self::Conflict => "conflict",
            Self::InsufficientPayment => "insufficient_payment",
            Self::Permission => "permission",
            Self::StorageUnavailable => "storage_unavailable",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
