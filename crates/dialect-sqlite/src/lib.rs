//! SQLite dialect for sqlforge: `SqliteGrammar` compiles queries and
//! schema blueprints (batching unsupported `ALTER` forms into a
//! rebuild), `SqliteConnector` wires a `rusqlite::Connection` into a
//! `sqlforge_core::Connection`.

mod adapter;
mod connector;
mod grammar;
mod predicates;
mod processor;
mod schema_grammar;

pub use connector::SqliteConnector;
pub use grammar::SqliteGrammar;
pub use processor::SqliteProcessor;
