//! Dialect-agnostic query/schema AST, grammar traits, and connection
//! orchestration for sqlforge. Dialect crates (`sqlforge-dialect-postgres`,
//! `-mysql`, `-sqlite`, `-mssql`) implement [`Grammar`]/[`query::QueryGrammar`]/
//! [`schema::SchemaGrammar`]/[`driver::Driver`] atop this crate's traits.

pub mod binding;
pub mod connection;
pub mod driver;
pub mod error;
pub mod grammar;
pub mod ident;
pub mod processor;
pub mod query;
pub mod schema;
pub mod value;

pub use binding::{BindingKind, Bindings};
pub use connection::{
    Connection, ConnectionConfig, ConnectionFactory, Connector, ConnectorHandles, DriverRegistry,
    HostList,
};
pub use driver::{BindKey, Driver, FetchMode, Row, Statement, Version};
pub use error::{DeadlockPredicate, Error, LostConnectionPredicate, Result, UniqueConstraintPredicate};
pub use grammar::Grammar;
pub use ident::{Expression, Ident};
pub use processor::{ColumnInfo, ForeignKeyInfo, GeneratedKind, IndexInfo, Processor};
pub use query::{
    Aggregate, AggregateFn, Boolean, DateUnit, Distinct, FromClause, FulltextMode, JoinClause,
    JoinType, Lock, OrderBy, QueryBuilder, QueryGrammar, SortDirection, UnionClause, Where,
    WriteIntent,
};
pub use schema::{
    BlueprintState, Blueprint, Command, CommandEntry, ColumnDefinition, ColumnType,
    ForeignKeyCommand, GeneratedExpression, IndexCommand, IndexKind, IndexRequest, SchemaGrammar,
};
pub use value::{Bound, Value};
