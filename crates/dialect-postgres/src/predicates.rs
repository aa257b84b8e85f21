use sqlforge_core::{DeadlockPredicate, LostConnectionPredicate, UniqueConstraintPredicate};

/// Messages `postgres::Error::to_string()` renders for a severed
/// connection — there is no stable SQLSTATE for "the socket died
/// mid-request", so this matches on libpq's own wording the way the
/// upstream connector's lost-connection detector does.
const LOST_CONNECTION_MESSAGES: &[&str] =
    &["connection closed", "connection reset by peer", "broken pipe", "could not receive data from server", "server closed the connection unexpectedly"];

pub(crate) fn lost_connection() -> LostConnectionPredicate {
    LostConnectionPredicate::new(|message| LOST_CONNECTION_MESSAGES.iter().any(|needle| message.contains(needle)))
}

/// SQLSTATE `23505` is `unique_violation`.
pub(crate) fn unique_constraint() -> UniqueConstraintPredicate {
    UniqueConstraintPredicate::new(|message| message.contains("23505") || message.contains("duplicate key value"))
}

/// SQLSTATE `40P01` is `deadlock_detected`, `40001` is
/// `serialization_failure` under `SERIALIZABLE` isolation.
pub(crate) fn deadlock() -> DeadlockPredicate {
    DeadlockPredicate::new(|message| message.contains("40P01") || message.contains("40001") || message.contains("deadlock detected"))
}
