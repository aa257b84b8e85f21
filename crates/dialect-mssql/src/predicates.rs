use sqlforge_core::{DeadlockPredicate, LostConnectionPredicate, UniqueConstraintPredicate};

const LOST_CONNECTION_MESSAGES: &[&str] = &[
    "communication link failure",
    "connection was already closed",
    "connection reset by peer",
    "error occurred while attempting to establish a connection",
    "the semaphore timeout period has expired",
    "the server is terminating this connection",
    "transport-level error",
];

pub(crate) fn lost_connection() -> LostConnectionPredicate {
    LostConnectionPredicate::new(|message| LOST_CONNECTION_MESSAGES.iter().any(|needle| message.contains(needle)))
}

/// SQL Server error 2601 is a duplicate key on a unique index, 2627 a
/// `PRIMARY KEY`/`UNIQUE` constraint violation.
pub(crate) fn unique_constraint() -> UniqueConstraintPredicate {
    UniqueConstraintPredicate::new(|message| message.contains("2601") || message.contains("2627") || message.contains("Violation of"))
}

/// Error 1205 is `"Transaction (Process ID %d) was deadlocked"`.
pub(crate) fn deadlock() -> DeadlockPredicate {
    DeadlockPredicate::new(|message| message.contains("1205") || message.contains("deadlocked"))
}
