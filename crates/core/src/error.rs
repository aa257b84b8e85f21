use std::{error::Error as StdError, fmt};

type BoxedDriverError = Box<dyn StdError + Send + Sync + 'static>;

/// The caller-observable error taxonomy. `LostConnection` and
/// `UniqueConstraint` are deliberately absent as variants: both are
/// predicates evaluated over a [`Error::Query`] (see
/// `Error::is_lost_connection`/`Error::is_unique_constraint`), not separate
/// error kinds, so a dialect swap never changes which variant callers match
/// on.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Logic(String),

    #[error("scalar() row returned {columns} column(s), expected exactly 1")]
    MultipleColumnsSelected { columns: usize },

    #[error("query exception (connection: {connection}, SQL: {sql})")]
    Query {
        connection: String,
        /// SQL with bindings substituted in, for self-contained log lines.
        sql: String,
        #[source]
        source: BoxedDriverError,
    },

    #[error("connection to host list exhausted after {attempts} attempt(s)")]
    DsnExhausted { attempts: usize },
}

impl Error {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn logic(message: impl Into<String>) -> Self {
        Self::Logic(message.into())
    }

    pub fn query(
        connection: impl Into<String>,
        sql: impl Into<String>,
        source: impl Into<BoxedDriverError>,
    ) -> Self {
        Self::Query {
            connection: connection.into(),
            sql: sql.into(),
            source: source.into(),
        }
    }

    /// Evaluates the dialect-supplied lost-connection predicate against this
    /// error's driver message. Only meaningful for `Error::Query`.
    pub fn is_lost_connection(&self, predicate: &LostConnectionPredicate) -> bool {
        match self {
            Self::Query { source, .. } => predicate.matches(&source.to_string()),
            _ => false,
        }
    }

    /// Evaluates the dialect-supplied unique-constraint predicate against
    /// this error's driver message. Only meaningful for `Error::Query`.
    pub fn is_unique_constraint(&self, predicate: &UniqueConstraintPredicate) -> bool {
        match self {
            Self::Query { source, .. } => predicate.matches(&source.to_string()),
            _ => false,
        }
    }

    /// Evaluates the dialect-supplied deadlock predicate, used by
    /// `Connection::transaction` to decide whether a closure is retried.
    pub fn is_deadlock(&self, predicate: &DeadlockPredicate) -> bool {
        match self {
            Self::Query { source, .. } => predicate.matches(&source.to_string()),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// An injected predicate over a driver error message/code — a plain
/// function value each dialect crate supplies, rather than an inherited
/// mixin behavior.
pub struct LostConnectionPredicate(Box<dyn Fn(&str) -> bool + Send + Sync>);

impl LostConnectionPredicate {
    pub fn new(predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self(Box::new(predicate))
    }

    pub fn matches(&self, message: &str) -> bool {
        (self.0)(message)
    }
}

impl fmt::Debug for LostConnectionPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LostConnectionPredicate(..)")
    }
}

/// An injected predicate identifying a unique-constraint-violation driver
/// error (Postgres `23505`, SQLite's `UNIQUE constraint failed` message,
/// MySQL error code 1062, …).
pub struct UniqueConstraintPredicate(Box<dyn Fn(&str) -> bool + Send + Sync>);

impl UniqueConstraintPredicate {
    pub fn new(predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self(Box::new(predicate))
    }

    pub fn matches(&self, message: &str) -> bool {
        (self.0)(message)
    }
}

impl fmt::Debug for UniqueConstraintPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UniqueConstraintPredicate(..)")
    }
}

/// An injected predicate identifying a deadlock/serialization-failure driver
/// error, consulted by `Connection::transaction`'s retry loop.
pub struct DeadlockPredicate(Box<dyn Fn(&str) -> bool + Send + Sync>);

impl DeadlockPredicate {
    pub fn new(predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self(Box::new(predicate))
    }

    pub fn matches(&self, message: &str) -> bool {
        (self.0)(message)
    }
}

impl fmt::Debug for DeadlockPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DeadlockPredicate(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lost_connection_predicate_inspects_query_error_message() {
        let predicate =
            LostConnectionPredicate::new(|message| message.contains("server has gone away"));
        let error = Error::query("default", "select 1", "MySQL server has gone away");

        assert!(error.is_lost_connection(&predicate));
    }

    #[test]
    fn predicate_never_matches_non_query_errors() {
        let predicate = LostConnectionPredicate::new(|_| true);
        let error = Error::invalid_argument("bad operator");

        assert!(!error.is_lost_connection(&predicate));
    }
}
