//! MySQL/MariaDB dialect for sqlforge: `MysqlGrammar` compiles queries and
//! schema blueprints, `MysqlConnector` wires a `mysql::Pool` connection
//! into a `sqlforge_core::Connection`.

mod adapter;
mod connector;
mod grammar;
mod predicates;
mod processor;
mod schema_grammar;

pub use connector::MysqlConnector;
pub use grammar::MysqlGrammar;
pub use processor::MysqlProcessor;
