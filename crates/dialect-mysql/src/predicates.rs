use sqlforge_core::{DeadlockPredicate, LostConnectionPredicate, UniqueConstraintPredicate};

const LOST_CONNECTION_MESSAGES: &[&str] = &[
    "server has gone away",
    "no connection to the server",
    "lost connection",
    "is dead or not enabled",
    "error while sending",
    "decryption failed or bad record mac",
    "broken pipe",
    "ssl connection has been closed unexpectedly",
    "error writing data to the connection",
    "resource deadlock avoided",
    "failed to fetch row",
    "failed to connect",
];

pub(crate) fn lost_connection() -> LostConnectionPredicate {
    LostConnectionPredicate::new(|message| LOST_CONNECTION_MESSAGES.iter().any(|needle| message.contains(needle)))
}

/// MySQL error 1062 is `ER_DUP_ENTRY`.
pub(crate) fn unique_constraint() -> UniqueConstraintPredicate {
    UniqueConstraintPredicate::new(|message| message.contains("1062") || message.contains("Duplicate entry"))
}

/// MySQL error 1213 is `ER_LOCK_DEADLOCK`.
pub(crate) fn deadlock() -> DeadlockPredicate {
    DeadlockPredicate::new(|message| message.contains("1213") || message.contains("Deadlock found"))
}
