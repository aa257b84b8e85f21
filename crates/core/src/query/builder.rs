use crate::{
    BindingKind, Bindings, Bound, Ident, Value,
    query::{
        Aggregate, AggregateFn, Boolean, DateUnit, Distinct, FromClause, FulltextMode, JoinClause,
        JoinType, Lock, OrderBy, SortDirection, UnionClause, Where,
    },
};

/// Intent captured by the mutating family of builder calls
/// (`insert`/`update`/`delete`/`truncate`/…). A builder carries at most one;
/// setting a new one replaces whatever was there, since each of these
/// calls is terminal.
#[derive(Debug, Clone)]
pub enum WriteIntent {
    Insert {
        columns: Vec<Ident>,
        rows: Vec<Vec<Value>>,
        or_ignore: bool,
    },
    InsertGetId {
        columns: Vec<Ident>,
        row: Vec<Value>,
    },
    Upsert {
        columns: Vec<Ident>,
        rows: Vec<Vec<Value>>,
        unique_by: Vec<Ident>,
        update_columns: Vec<Ident>,
    },
    Update {
        assignments: Vec<(Ident, Bound)>,
    },
    Delete,
    Truncate,
}

/// The fluent query AST: a `SELECT`/insert/update/delete/truncate intention
/// plus every clause family listed in the data model. Short-lived, built
/// per operation, never shared across threads.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    pub from: Option<FromClause>,
    pub columns: Vec<Ident>,
    pub distinct: Distinct,
    pub joins: Vec<JoinClause>,
    pub wheres: Vec<Where>,
    pub groups: Vec<Ident>,
    pub havings: Vec<Where>,
    pub orders: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub unions: Vec<UnionClause>,
    pub union_orders: Vec<OrderBy>,
    pub union_limit: Option<u64>,
    pub union_offset: Option<u64>,
    pub lock: Lock,
    pub aggregate: Option<Aggregate>,
    pub bindings: Bindings,
    pub write: Option<WriteIntent>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(mut self, table: impl Into<Ident>) -> Self {
        self.from = Some(FromClause::Table(table.into()));
        self
    }

    pub fn from_sub(mut self, query: QueryBuilder, alias: impl Into<String>) -> Self {
        self.bindings.merge(&query.bindings);
        self.from = Some(FromClause::Sub {
            query: Box::new(query),
            alias: alias.into(),
        });
        self
    }

    pub fn from_raw(mut self, sql: impl Into<String>) -> Self {
        self.from = Some(FromClause::Raw(sql.into()));
        self
    }

    pub fn select(mut self, columns: impl IntoIterator<Item = impl Into<Ident>>) -> Self {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn add_select(mut self, column: impl Into<Ident>) -> Self {
        self.columns.push(column.into());
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = Distinct::All;
        self
    }

    pub fn distinct_on(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.distinct = Distinct::On(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn join(
        self,
        table: impl Into<Ident>,
        first: impl Into<Ident>,
        operator: impl Into<String>,
        second: impl Into<Ident>,
    ) -> Self {
        self.join_as(JoinType::Inner, table, first, operator, second)
    }

    pub fn left_join(
        self,
        table: impl Into<Ident>,
        first: impl Into<Ident>,
        operator: impl Into<String>,
        second: impl Into<Ident>,
    ) -> Self {
        self.join_as(JoinType::Left, table, first, operator, second)
    }

    pub fn right_join(
        self,
        table: impl Into<Ident>,
        first: impl Into<Ident>,
        operator: impl Into<String>,
        second: impl Into<Ident>,
    ) -> Self {
        self.join_as(JoinType::Right, table, first, operator, second)
    }

    pub fn cross_join(mut self, table: impl Into<Ident>) -> Self {
        self.joins
            .push(JoinClause::new(JoinType::Cross, FromClause::Table(table.into())));
        self
    }

    fn join_as(
        mut self,
        kind: JoinType,
        table: impl Into<Ident>,
        first: impl Into<Ident>,
        operator: impl Into<String>,
        second: impl Into<Ident>,
    ) -> Self {
        let mut join = JoinClause::new(kind, FromClause::Table(table.into()));
        join.wheres.push(Where::Column {
            first: first.into(),
            operator: operator.into(),
            second: second.into(),
            boolean: Boolean::And,
        });
        self.joins.push(join);
        self
    }

    pub fn join_sub(
        mut self,
        query: QueryBuilder,
        alias: impl Into<String>,
        first: impl Into<Ident>,
        operator: impl Into<String>,
        second: impl Into<Ident>,
    ) -> Self {
        self.bindings.merge(&query.bindings);
        let mut join = JoinClause::new(
            JoinType::Inner,
            FromClause::Sub {
                query: Box::new(query),
                alias: alias.into(),
            },
        );
        join.wheres.push(Where::Column {
            first: first.into(),
            operator: operator.into(),
            second: second.into(),
            boolean: Boolean::And,
        });
        self.joins.push(join);
        self
    }

    pub fn cross_join_sub(mut self, query: QueryBuilder, alias: impl Into<String>) -> Self {
        self.bindings.merge(&query.bindings);
        self.joins.push(JoinClause::new(
            JoinType::Cross,
            FromClause::Sub {
                query: Box::new(query),
                alias: alias.into(),
            },
        ));
        self
    }

    pub fn join_lateral(mut self, query: QueryBuilder, alias: impl Into<String>) -> Self {
        self.bindings.merge(&query.bindings);
        self.joins.push(JoinClause::new(
            JoinType::Lateral,
            FromClause::Sub {
                query: Box::new(query),
                alias: alias.into(),
            },
        ));
        self
    }

    pub fn where_op(
        self,
        column: impl Into<Ident>,
        operator: impl Into<String>,
        value: impl Into<Bound>,
    ) -> Self {
        self.where_op_bool(column, operator, value, Boolean::And)
    }

    pub fn or_where_op(
        self,
        column: impl Into<Ident>,
        operator: impl Into<String>,
        value: impl Into<Bound>,
    ) -> Self {
        self.where_op_bool(column, operator, value, Boolean::Or)
    }

    fn where_op_bool(
        self,
        column: impl Into<Ident>,
        operator: impl Into<String>,
        value: impl Into<Bound>,
        boolean: Boolean,
    ) -> Self {
        let clause = Where::Basic {
            column: column.into(),
            operator: operator.into(),
            value: value.into(),
            boolean,
        };
        self.wheres_push_binding(clause, BindingKind::Where)
    }

    /// `where(col, val)`, equivalent to `where_op(col, "=", val)` per the
    /// argument-normalization contract.
    pub fn where_eq(self, column: impl Into<Ident>, value: impl Into<Bound>) -> Self {
        self.where_op(column, "=", value)
    }

    pub fn or_where_eq(self, column: impl Into<Ident>, value: impl Into<Bound>) -> Self {
        self.or_where_op(column, "=", value)
    }

    pub fn where_in(self, column: impl Into<Ident>, values: Vec<Value>) -> Self {
        self.where_in_bool(column, values, false, Boolean::And)
    }

    pub fn where_not_in(self, column: impl Into<Ident>, values: Vec<Value>) -> Self {
        self.where_in_bool(column, values, true, Boolean::And)
    }

    pub fn or_where_in(self, column: impl Into<Ident>, values: Vec<Value>) -> Self {
        self.where_in_bool(column, values, false, Boolean::Or)
    }

    fn where_in_bool(
        self,
        column: impl Into<Ident>,
        values: Vec<Value>,
        negated: bool,
        boolean: Boolean,
    ) -> Self {
        let clause = Where::In {
            column: column.into(),
            values,
            negated,
            boolean,
        };
        self.wheres_push_binding(clause, BindingKind::Where)
    }

    pub fn where_null(self, column: impl Into<Ident>) -> Self {
        self.where_null_bool(column, false, Boolean::And)
    }

    pub fn where_not_null(self, column: impl Into<Ident>) -> Self {
        self.where_null_bool(column, true, Boolean::And)
    }

    pub fn or_where_null(self, column: impl Into<Ident>) -> Self {
        self.where_null_bool(column, false, Boolean::Or)
    }

    fn where_null_bool(self, column: impl Into<Ident>, negated: bool, boolean: Boolean) -> Self {
        let clause = Where::Null {
            column: column.into(),
            negated,
            boolean,
        };
        self.wheres_push_binding(clause, BindingKind::Where)
    }

    pub fn where_between(
        self,
        column: impl Into<Ident>,
        low: impl Into<Bound>,
        high: impl Into<Bound>,
    ) -> Self {
        self.where_between_bool(column, low, high, false, Boolean::And)
    }

    pub fn where_not_between(
        self,
        column: impl Into<Ident>,
        low: impl Into<Bound>,
        high: impl Into<Bound>,
    ) -> Self {
        self.where_between_bool(column, low, high, true, Boolean::And)
    }

    fn where_between_bool(
        self,
        column: impl Into<Ident>,
        low: impl Into<Bound>,
        high: impl Into<Bound>,
        negated: bool,
        boolean: Boolean,
    ) -> Self {
        let clause = Where::Between {
            column: column.into(),
            low: low.into(),
            high: high.into(),
            negated,
            boolean,
        };
        self.wheres_push_binding(clause, BindingKind::Where)
    }

    fn where_date_like(
        self,
        unit: DateUnit,
        column: impl Into<Ident>,
        operator: impl Into<String>,
        value: impl Into<Bound>,
    ) -> Self {
        let clause = Where::DateLike {
            unit,
            column: column.into(),
            operator: operator.into(),
            value: value.into(),
            boolean: Boolean::And,
        };
        self.wheres_push_binding(clause, BindingKind::Where)
    }

    pub fn where_date(
        self,
        column: impl Into<Ident>,
        operator: impl Into<String>,
        value: impl Into<Bound>,
    ) -> Self {
        self.where_date_like(DateUnit::Date, column, operator, value)
    }

    pub fn where_time(
        self,
        column: impl Into<Ident>,
        operator: impl Into<String>,
        value: impl Into<Bound>,
    ) -> Self {
        self.where_date_like(DateUnit::Time, column, operator, value)
    }

    pub fn where_year(
        self,
        column: impl Into<Ident>,
        operator: impl Into<String>,
        value: impl Into<Bound>,
    ) -> Self {
        self.where_date_like(DateUnit::Year, column, operator, value)
    }

    pub fn where_month(
        self,
        column: impl Into<Ident>,
        operator: impl Into<String>,
        value: impl Into<Bound>,
    ) -> Self {
        self.where_date_like(DateUnit::Month, column, operator, value)
    }

    pub fn where_day(
        self,
        column: impl Into<Ident>,
        operator: impl Into<String>,
        value: impl Into<Bound>,
    ) -> Self {
        self.where_date_like(DateUnit::Day, column, operator, value)
    }

    pub fn where_column(
        self,
        first: impl Into<Ident>,
        operator: impl Into<String>,
        second: impl Into<Ident>,
    ) -> Self {
        self.wheres_push_no_binding(Where::Column {
            first: first.into(),
            operator: operator.into(),
            second: second.into(),
            boolean: Boolean::And,
        })
    }

    fn wheres_push_no_binding(mut self, clause: Where) -> Self {
        self.wheres.push(clause);
        self
    }

    pub fn where_raw(mut self, sql: impl Into<String>, bindings: Vec<Value>) -> Self {
        self.bindings.extend(BindingKind::Where, bindings);
        self.wheres.push(Where::Raw {
            sql: sql.into(),
            boolean: Boolean::And,
        });
        self
    }

    /// Builds a nested predicate group: `f` receives a fresh builder, and
    /// its wheres/bindings are folded into a single parenthesized entry.
    pub fn where_nested(mut self, f: impl FnOnce(QueryBuilder) -> QueryBuilder) -> Self {
        let nested = f(QueryBuilder::new());
        self.bindings.merge(&nested.bindings);
        self.wheres.push(Where::Nested {
            query: Box::new(nested),
            boolean: Boolean::And,
        });
        self
    }

    pub fn or_where_nested(mut self, f: impl FnOnce(QueryBuilder) -> QueryBuilder) -> Self {
        let nested = f(QueryBuilder::new());
        self.bindings.merge(&nested.bindings);
        self.wheres.push(Where::Nested {
            query: Box::new(nested),
            boolean: Boolean::Or,
        });
        self
    }

    pub fn where_sub(
        mut self,
        column: impl Into<Ident>,
        operator: impl Into<String>,
        f: impl FnOnce(QueryBuilder) -> QueryBuilder,
    ) -> Self {
        let sub = f(QueryBuilder::new());
        self.bindings.merge(&sub.bindings);
        self.wheres.push(Where::Sub {
            column: column.into(),
            operator: operator.into(),
            query: Box::new(sub),
            boolean: Boolean::And,
        });
        self
    }

    pub fn where_exists(mut self, f: impl FnOnce(QueryBuilder) -> QueryBuilder) -> Self {
        let sub = f(QueryBuilder::new());
        self.bindings.merge(&sub.bindings);
        self.wheres.push(Where::Exists {
            query: Box::new(sub),
            negated: false,
            boolean: Boolean::And,
        });
        self
    }

    pub fn where_not_exists(mut self, f: impl FnOnce(QueryBuilder) -> QueryBuilder) -> Self {
        let sub = f(QueryBuilder::new());
        self.bindings.merge(&sub.bindings);
        self.wheres.push(Where::Exists {
            query: Box::new(sub),
            negated: true,
            boolean: Boolean::And,
        });
        self
    }

    pub fn where_json_contains(self, column: impl Into<Ident>, value: impl Into<Value>) -> Self {
        self.wheres_push_binding(
            Where::JsonContains {
                column: column.into(),
                value: value.into(),
                negated: false,
                boolean: Boolean::And,
            },
            BindingKind::Where,
        )
    }

    pub fn where_json_contains_key(self, column: impl Into<Ident>) -> Self {
        self.wheres_push_no_binding(Where::JsonContainsKey {
            column: column.into(),
            negated: false,
            boolean: Boolean::And,
        })
    }

    pub fn where_json_length(
        self,
        column: impl Into<Ident>,
        operator: impl Into<String>,
        value: impl Into<Bound>,
    ) -> Self {
        self.wheres_push_binding(
            Where::JsonLength {
                column: column.into(),
                operator: operator.into(),
                value: value.into(),
                boolean: Boolean::And,
            },
            BindingKind::Where,
        )
    }

    pub fn where_fulltext(
        self,
        columns: impl IntoIterator<Item = impl Into<Ident>>,
        value: impl Into<String>,
        mode: FulltextMode,
        language: Option<String>,
    ) -> Self {
        self.wheres_push_binding(
            Where::Fulltext {
                columns: columns.into_iter().map(Into::into).collect(),
                value: value.into(),
                language,
                mode,
                boolean: Boolean::And,
            },
            BindingKind::Where,
        )
    }

    pub fn where_bitwise(
        self,
        column: impl Into<Ident>,
        operator: impl Into<String>,
        value: impl Into<Bound>,
    ) -> Self {
        self.wheres_push_binding(
            Where::Bitwise {
                column: column.into(),
                operator: operator.into(),
                value: value.into(),
                boolean: Boolean::And,
            },
            BindingKind::Where,
        )
    }

    fn wheres_push_binding(mut self, clause: Where, kind: BindingKind) -> Self {
        for value in where_bound_values(&clause) {
            self.bindings.push(kind, value);
        }
        self.wheres.push(clause);
        self
    }

    pub fn group_by(mut self, columns: impl IntoIterator<Item = impl Into<Ident>>) -> Self {
        self.groups.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn having(self, column: impl Into<Ident>, operator: impl Into<String>, value: impl Into<Bound>) -> Self {
        self.having_bool(column, operator, value, Boolean::And)
    }

    pub fn or_having(self, column: impl Into<Ident>, operator: impl Into<String>, value: impl Into<Bound>) -> Self {
        self.having_bool(column, operator, value, Boolean::Or)
    }

    fn having_bool(
        mut self,
        column: impl Into<Ident>,
        operator: impl Into<String>,
        value: impl Into<Bound>,
        boolean: Boolean,
    ) -> Self {
        let clause = Where::Basic {
            column: column.into(),
            operator: operator.into(),
            value: value.into(),
            boolean,
        };
        for value in where_bound_values(&clause) {
            self.bindings.push(BindingKind::Having, value);
        }
        self.havings.push(clause);
        self
    }

    pub fn order_by(mut self, column: impl Into<Ident>, direction: SortDirection) -> Self {
        self.orders.push(OrderBy::Column {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn order_by_raw(mut self, sql: impl Into<String>) -> Self {
        self.orders.push(OrderBy::Raw(sql.into()));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn union(mut self, query: QueryBuilder, all: bool) -> Self {
        self.bindings.merge(&query.bindings);
        self.unions.push(UnionClause {
            query: Box::new(query),
            all,
        });
        self
    }

    pub fn lock(mut self, lock: Lock) -> Self {
        self.lock = lock;
        self
    }

    pub fn count_aggregate(mut self, columns: impl IntoIterator<Item = impl Into<Ident>>) -> Self {
        self.aggregate = Some(Aggregate {
            function: AggregateFn::Count,
            columns: columns.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn min_aggregate(mut self, column: impl Into<Ident>) -> Self {
        self.aggregate = Some(Aggregate {
            function: AggregateFn::Min,
            columns: vec![column.into()],
        });
        self
    }

    pub fn max_aggregate(mut self, column: impl Into<Ident>) -> Self {
        self.aggregate = Some(Aggregate {
            function: AggregateFn::Max,
            columns: vec![column.into()],
        });
        self
    }

    pub fn sum_aggregate(mut self, column: impl Into<Ident>) -> Self {
        self.aggregate = Some(Aggregate {
            function: AggregateFn::Sum,
            columns: vec![column.into()],
        });
        self
    }

    pub fn avg_aggregate(mut self, column: impl Into<Ident>) -> Self {
        self.aggregate = Some(Aggregate {
            function: AggregateFn::Avg,
            columns: vec![column.into()],
        });
        self
    }

    pub fn insert(mut self, columns: Vec<Ident>, rows: Vec<Vec<Value>>) -> Self {
        for row in &rows {
            self.bindings.extend(BindingKind::From, row.iter().cloned());
        }
        self.write = Some(WriteIntent::Insert {
            columns,
            rows,
            or_ignore: false,
        });
        self
    }

    pub fn insert_or_ignore(mut self, columns: Vec<Ident>, rows: Vec<Vec<Value>>) -> Self {
        for row in &rows {
            self.bindings.extend(BindingKind::From, row.iter().cloned());
        }
        self.write = Some(WriteIntent::Insert {
            columns,
            rows,
            or_ignore: true,
        });
        self
    }

    pub fn insert_get_id(mut self, columns: Vec<Ident>, row: Vec<Value>) -> Self {
        self.bindings.extend(BindingKind::From, row.iter().cloned());
        self.write = Some(WriteIntent::InsertGetId { columns, row });
        self
    }

    pub fn upsert(
        mut self,
        columns: Vec<Ident>,
        rows: Vec<Vec<Value>>,
        unique_by: Vec<Ident>,
        update_columns: Vec<Ident>,
    ) -> Self {
        for row in &rows {
            self.bindings.extend(BindingKind::From, row.iter().cloned());
        }
        self.write = Some(WriteIntent::Upsert {
            columns,
            rows,
            unique_by,
            update_columns,
        });
        self
    }

    pub fn update(mut self, assignments: Vec<(Ident, Bound)>) -> Self {
        for (_, value) in &assignments {
            if let Bound::Value(value) = value {
                self.bindings.push(BindingKind::From, value.clone());
            }
        }
        self.write = Some(WriteIntent::Update { assignments });
        self
    }

    pub fn delete(mut self) -> Self {
        self.write = Some(WriteIntent::Delete);
        self
    }

    pub fn truncate(mut self) -> Self {
        self.write = Some(WriteIntent::Truncate);
        self
    }
}

/// The scalar values a where clause binds, in the order they must be
/// emitted — used both to populate `Bindings` at build time and (via the
/// same traversal the compiler performs) to keep placeholder count and
/// binding count in lockstep.
pub(crate) fn where_bound_values(where_clause: &Where) -> Vec<Value> {
    match where_clause {
        Where::Basic { value, .. } => bound_as_values(value),
        Where::In { values, .. } => values.clone(),
        Where::Null { .. } => vec![],
        Where::Between { low, high, .. } => {
            let mut values = bound_as_values(low);
            values.extend(bound_as_values(high));
            values
        }
        Where::DateLike { value, .. } => bound_as_values(value),
        Where::Column { .. } => vec![],
        Where::Nested { .. } => vec![],
        Where::Sub { .. } => vec![],
        Where::Exists { .. } => vec![],
        Where::JsonContains { value, .. } => vec![value.clone()],
        Where::JsonContainsKey { .. } => vec![],
        Where::JsonLength { value, .. } => bound_as_values(value),
        Where::Fulltext { value, .. } => vec![Value::Text(value.clone())],
        Where::Bitwise { value, .. } => bound_as_values(value),
        Where::Raw { .. } => vec![],
    }
}

fn bound_as_values(bound: &Bound) -> Vec<Value> {
    match bound {
        Bound::Value(value) => vec![value.clone()],
        Bound::Raw(_) => vec![],
    }
}
