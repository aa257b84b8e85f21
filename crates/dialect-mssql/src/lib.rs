//! SQL Server dialect for sqlforge: `MssqlGrammar` compiles queries and
//! schema blueprints (bracketed identifiers, `TOP`/`OFFSET..FETCH`
//! pagination, `MERGE`-based upserts), `MssqlConnector` wires a blocking
//! `tiberius::Client` into a `sqlforge_core::Connection`.

mod adapter;
mod connector;
mod grammar;
mod predicates;
mod processor;
mod schema_grammar;

pub use connector::MssqlConnector;
pub use grammar::MssqlGrammar;
pub use processor::MssqlProcessor;
