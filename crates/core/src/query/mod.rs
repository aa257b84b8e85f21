mod builder;
mod clauses;
mod grammar;
mod where_clause;

pub use builder::{QueryBuilder, WriteIntent};
pub use clauses::{
    Aggregate, AggregateFn, Distinct, FromClause, JoinClause, JoinType, Lock, OrderBy,
    SortDirection, UnionClause,
};
pub use grammar::QueryGrammar;
pub use where_clause::{Boolean, DateUnit, FulltextMode, Where};

pub(crate) use builder::where_bound_values;
