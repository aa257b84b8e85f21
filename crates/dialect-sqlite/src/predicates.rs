use sqlforge_core::{DeadlockPredicate, LostConnectionPredicate, UniqueConstraintPredicate};

const LOST_CONNECTION_MESSAGES: &[&str] =
    &["disk i/o error", "database disk image is malformed", "unable to open database file"];

pub(crate) fn lost_connection() -> LostConnectionPredicate {
    LostConnectionPredicate::new(|message| LOST_CONNECTION_MESSAGES.iter().any(|needle| message.contains(needle)))
}

pub(crate) fn unique_constraint() -> UniqueConstraintPredicate {
    UniqueConstraintPredicate::new(|message| {
        message.contains("UNIQUE constraint failed") || message.contains("PRIMARY KEY constraint failed")
    })
}

/// SQLite reports lock contention as `SQLITE_BUSY`/`SQLITE_LOCKED`
/// rather than distinguishing a true deadlock; treated as the closest
/// analogue since retry-the-transaction is the correct response either
/// way.
pub(crate) fn deadlock() -> DeadlockPredicate {
    DeadlockPredicate::new(|message| message.contains("database is locked") || message.contains("database table is locked"))
}
