//! PostgreSQL dialect for sqlforge: `PostgresGrammar` compiles queries and
//! schema blueprints, `PostgresConnector` wires a `postgres::Client` into a
//! `sqlforge_core::Connection`.

mod adapter;
mod connector;
mod grammar;
mod predicates;
mod processor;
mod schema_grammar;

pub use connector::PostgresConnector;
pub use grammar::PostgresGrammar;
pub use processor::PostgresProcessor;
