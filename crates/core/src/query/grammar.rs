use crate::{
    Bound, Error, Grammar, Ident, Result, Value,
    query::{
        Aggregate, Boolean, DateUnit, Distinct, FromClause, FulltextMode, JoinClause, JoinType,
        Lock, OrderBy, QueryBuilder, UnionClause, Where, WriteIntent,
    },
};

/// Compiles a [`QueryBuilder`] into a SQL string in a fixed traversal
/// order: aggregate/columns, from, joins, wheres,
/// groups, havings, orders, limit, offset, lock, unions, union orders,
/// union limit/offset. Every method has a dialect-agnostic default body;
/// dialects override only where they diverge (JSON wheres, fulltext,
/// upsert, insert-or-ignore, update-with-join/limit rewrite, operator
/// whitelist).
pub trait QueryGrammar: Grammar {
    /// The operator whitelist this dialect accepts in `where`/`having`
    /// clauses. Anything outside this list fails with
    /// [`Error::invalid_argument`].
    fn operators(&self) -> &'static [&'static str] {
        &[
            "=", "<", ">", "<=", ">=", "<>", "!=", "like", "not like", "ilike", "in", "not in",
            "between", "not between", "is", "is not", "&", "|", "^", "<<", ">>",
        ]
    }

    fn ensure_valid_operator(&self, operator: &str) -> Result<()> {
        if self.operators().contains(&operator.to_ascii_lowercase().as_str()) {
            Ok(())
        } else {
            Err(Error::invalid_argument(format!("invalid operator: {operator}")))
        }
    }

    /// Compiles a full `SELECT` statement, returning the SQL and its
    /// flattened bindings in clause order.
    fn compile_select(&self, query: &QueryBuilder) -> Result<(String, Vec<Value>)> {
        let mut parts = Vec::new();
        parts.push(self.compile_columns(query)?);
        if let Some(from) = &query.from {
            parts.push(self.compile_from(from)?);
        }
        if !query.joins.is_empty() {
            parts.push(self.compile_joins(&query.joins)?);
        }
        if !query.wheres.is_empty() {
            parts.push(self.compile_wheres(&query.wheres)?);
        }
        if !query.groups.is_empty() {
            parts.push(format!("group by {}", self.columnize(&query.groups)));
        }
        if !query.havings.is_empty() {
            parts.push(self.compile_havings(&query.havings)?);
        }
        if !query.orders.is_empty() {
            parts.push(self.compile_orders(&query.orders)?);
        }
        if let Some(limit) = query.limit {
            parts.push(self.compile_limit(limit));
        }
        if let Some(offset) = query.offset {
            parts.push(self.compile_offset(offset));
        }
        parts.push(self.compile_lock(query.lock));
        if !query.unions.is_empty() {
            parts.push(self.compile_unions(&query.unions)?);
        }
        if !query.union_orders.is_empty() {
            parts.push(self.compile_orders(&query.union_orders)?);
        }
        if let Some(limit) = query.union_limit {
            parts.push(self.compile_limit(limit));
        }
        if let Some(offset) = query.union_offset {
            parts.push(self.compile_offset(offset));
        }

        let sql = parts.into_iter().filter(|part| !part.is_empty()).collect::<Vec<_>>().join(" ");
        Ok((sql, query.bindings.flatten()))
    }

    fn compile_columns(&self, query: &QueryBuilder) -> Result<String> {
        if let Some(aggregate) = &query.aggregate {
            return Ok(self.compile_aggregate(aggregate, &query.distinct));
        }
        let distinct = match &query.distinct {
            Distinct::None => "",
            Distinct::All => "distinct ",
            Distinct::On(_) => "",
        };
        let columns = if query.columns.is_empty() {
            "*".to_string()
        } else {
            self.columnize(&query.columns)
        };
        match &query.distinct {
            Distinct::On(cols) if !cols.is_empty() => Ok(format!(
                "select distinct on ({}) {columns}",
                cols.iter().map(|c| self.wrap(&Ident::plain(c.clone()))).collect::<Vec<_>>().join(", ")
            )),
            _ => Ok(format!("select {distinct}{columns}")),
        }
    }

    fn compile_aggregate(&self, aggregate: &Aggregate, distinct: &Distinct) -> String {
        let distinct = if matches!(distinct, Distinct::All) { "distinct " } else { "" };
        let columns = self.columnize(&aggregate.columns);
        format!("select {}({distinct}{columns}) as aggregate", aggregate.function.as_sql())
    }

    fn compile_from(&self, from: &FromClause) -> Result<String> {
        Ok(format!("from {}", self.compile_from_clause(from)?))
    }

    fn compile_from_clause(&self, from: &FromClause) -> Result<String> {
        match from {
            FromClause::Table(ident) => Ok(self.wrap_table(ident)),
            FromClause::Sub { query, alias } => {
                let (sql, _) = self.compile_select(query)?;
                Ok(format!("({sql}) as {}", self.wrap_segment(alias)))
            }
            FromClause::Raw(sql) => Ok(sql.clone()),
        }
    }

    fn compile_joins(&self, joins: &[JoinClause]) -> Result<String> {
        let mut compiled = Vec::with_capacity(joins.len());
        for join in joins {
            let keyword = match join.kind {
                JoinType::Inner => "inner join",
                JoinType::Left => "left join",
                JoinType::Right => "right join",
                JoinType::Cross => "cross join",
                JoinType::Lateral => "inner join lateral",
                JoinType::Natural => "natural join",
            };
            let table = self.compile_from_clause(&join.table)?;
            if join.wheres.is_empty() {
                compiled.push(format!("{keyword} {table}"));
            } else {
                let on = self.compile_wheres(&join.wheres)?;
                let on = on.strip_prefix("where ").unwrap_or(&on);
                compiled.push(format!("{keyword} {table} on {on}"));
            }
        }
        Ok(compiled.join(" "))
    }

    /// Compiles a non-empty where/having list into `"where <conditions>"`
    /// (or `"having <conditions>"` via [`QueryGrammar::compile_havings`]),
    /// stripping the leading boolean of the first entry.
    fn compile_wheres(&self, wheres: &[Where]) -> Result<String> {
        let body = self.compile_conditions(wheres)?;
        Ok(format!("where {body}"))
    }

    fn compile_havings(&self, havings: &[Where]) -> Result<String> {
        let body = self.compile_conditions(havings)?;
        Ok(format!("having {body}"))
    }

    fn compile_conditions(&self, wheres: &[Where]) -> Result<String> {
        let mut sql = String::new();
        for (index, clause) in wheres.iter().enumerate() {
            let compiled = self.compile_where(clause)?;
            if index == 0 {
                sql.push_str(&compiled);
            } else {
                let keyword = match clause.boolean() {
                    Boolean::And => "and",
                    Boolean::Or => "or",
                };
                sql.push(' ');
                sql.push_str(keyword);
                sql.push(' ');
                sql.push_str(&compiled);
            }
        }
        Ok(sql)
    }

    fn compile_where(&self, clause: &Where) -> Result<String> {
        match clause {
            Where::Basic { column, operator, value, .. } => {
                self.ensure_valid_operator(operator)?;
                let operator = operator.replace('?', "??");
                Ok(format!("{} {operator} {}", self.wrap(column), self.parameter(value)))
            }
            Where::In { column, values, negated, .. } => {
                if values.is_empty() {
                    return Ok(if *negated { "1 = 1".to_string() } else { "0 = 1".to_string() });
                }
                let keyword = if *negated { "not in" } else { "in" };
                let placeholders = std::iter::repeat_n("?", values.len()).collect::<Vec<_>>().join(", ");
                Ok(format!("{} {keyword} ({placeholders})", self.wrap(column)))
            }
            Where::Null { column, negated, .. } => {
                let keyword = if *negated { "is not null" } else { "is null" };
                Ok(format!("{} {keyword}", self.wrap(column)))
            }
            Where::Between { column, negated, .. } => {
                let keyword = if *negated { "not between" } else { "between" };
                Ok(format!("{} {keyword} ? and ?", self.wrap(column)))
            }
            Where::DateLike { unit, column, operator, value, .. } => {
                self.ensure_valid_operator(operator)?;
                self.compile_date_based_where(*unit, column, operator, value)
            }
            Where::Column { first, operator, second, .. } => {
                self.ensure_valid_operator(operator)?;
                let operator = operator.replace('?', "??");
                Ok(format!("{} {operator} {}", self.wrap(first), self.wrap(second)))
            }
            Where::Nested { query, .. } => {
                let body = self.compile_conditions(&query.wheres)?;
                Ok(format!("({body})"))
            }
            Where::Sub { column, operator, query, .. } => {
                self.ensure_valid_operator(operator)?;
                let operator = operator.replace('?', "??");
                let (sql, _) = self.compile_select(query)?;
                Ok(format!("{} {operator} ({sql})", self.wrap(column)))
            }
            Where::Exists { query, negated, .. } => {
                let keyword = if *negated { "not exists" } else { "exists" };
                let (sql, _) = self.compile_select(query)?;
                Ok(format!("{keyword} ({sql})"))
            }
            Where::JsonContains { column, negated, .. } => {
                let compiled = self.compile_json_contains(column)?;
                Ok(if *negated { format!("not {compiled}") } else { compiled })
            }
            Where::JsonContainsKey { column, negated, .. } => {
                let compiled = self.compile_json_contains_key(column)?;
                Ok(if *negated { format!("not {compiled}") } else { compiled })
            }
            Where::JsonLength { column, operator, .. } => {
                self.ensure_valid_operator(operator)?;
                self.compile_json_length(column, operator)
            }
            Where::Fulltext { columns, mode, language, .. } => {
                self.compile_fulltext(columns, *mode, language.as_deref())
            }
            Where::Bitwise { column, operator, .. } => {
                Ok(format!("{} {operator} ?", self.wrap(column)))
            }
            Where::Raw { sql, .. } => Ok(sql.clone()),
        }
    }

    /// `whereDate`/`whereTime`/`whereYear`/`whereMonth`/`whereDay`: wraps
    /// the column in the dialect's date-part extraction before comparing.
    /// ANSI default uses `strftime`-flavored casts; dialects override for
    /// native date-part functions.
    fn compile_date_based_where(
        &self,
        unit: DateUnit,
        column: &Ident,
        operator: &str,
        value: &Bound,
    ) -> Result<String> {
        let part = match unit {
            DateUnit::Date => "date",
            DateUnit::Time => "time",
            DateUnit::Year => "year",
            DateUnit::Month => "month",
            DateUnit::Day => "day",
        };
        Ok(format!(
            "{part}({}) {operator} {}",
            self.wrap(column),
            self.parameter(value)
        ))
    }

    fn compile_json_contains(&self, column: &Ident) -> Result<String> {
        Err(Error::logic(format!(
            "whereJsonContains is not supported for column {}",
            self.wrap(column)
        )))
    }

    fn compile_json_contains_key(&self, column: &Ident) -> Result<String> {
        Err(Error::logic(format!(
            "whereJsonContainsKey is not supported for column {}",
            self.wrap(column)
        )))
    }

    fn compile_json_length(&self, column: &Ident, operator: &str) -> Result<String> {
        let _ = operator;
        Err(Error::logic(format!(
            "whereJsonLength is not supported for column {}",
            self.wrap(column)
        )))
    }

    fn compile_fulltext(
        &self,
        columns: &[Ident],
        mode: FulltextMode,
        language: Option<&str>,
    ) -> Result<String> {
        let _ = (mode, language);
        Err(Error::logic(format!(
            "whereFulltext is not supported for columns {}",
            self.columnize(columns)
        )))
    }

    fn compile_orders(&self, orders: &[OrderBy]) -> Result<String> {
        let compiled = orders
            .iter()
            .map(|order| match order {
                OrderBy::Column { column, direction } => {
                    format!("{} {}", self.wrap(column), direction.as_sql())
                }
                OrderBy::Raw(sql) => sql.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("order by {compiled}"))
    }

    fn compile_limit(&self, limit: u64) -> String {
        format!("limit {limit}")
    }

    fn compile_offset(&self, offset: u64) -> String {
        format!("offset {offset}")
    }

    fn compile_lock(&self, lock: Lock) -> String {
        match lock {
            Lock::None => String::new(),
            Lock::ForUpdate => "for update".to_string(),
            Lock::ForShare => "for share".to_string(),
        }
    }

    fn compile_unions(&self, unions: &[UnionClause]) -> Result<String> {
        let mut compiled = Vec::with_capacity(unions.len());
        for union in unions {
            let (sql, _) = self.compile_select(&union.query)?;
            let keyword = if union.all { "union all" } else { "union" };
            compiled.push(format!("{keyword} {sql}"));
        }
        Ok(compiled.join(" "))
    }

    /// Compiles the write intent (insert/insertGetId/upsert/update/delete/
    /// truncate) a builder carries, returning one or more statements with
    /// their bindings. Insert/update/delete default bodies are ANSI-generic;
    /// `upsert`/`insert_or_ignore`/update-with-join rewrite are dialect-only
    /// (no sane ANSI default exists).
    fn compile_insert(&self, query: &QueryBuilder, columns: &[Ident], rows: &[Vec<Value>]) -> Result<(String, Vec<Value>)> {
        let table = self.compile_from_clause(query.from.as_ref().expect("insert requires from"))?;
        if rows.is_empty() {
            return Ok((format!("insert into {table} default values"), Vec::new()));
        }
        let columns_sql = self.columnize(columns);
        let row_placeholder = format!("({})", std::iter::repeat_n("?", columns.len()).collect::<Vec<_>>().join(", "));
        let rows_sql = std::iter::repeat_n(row_placeholder, rows.len()).collect::<Vec<_>>().join(", ");
        let sql = format!("insert into {table} ({columns_sql}) values {rows_sql}");
        let bindings = rows.iter().flatten().cloned().collect();
        Ok((sql, bindings))
    }

    fn compile_insert_or_ignore(&self, query: &QueryBuilder, columns: &[Ident], rows: &[Vec<Value>]) -> Result<(String, Vec<Value>)> {
        let _ = (query, columns, rows);
        Err(Error::logic("insertOrIgnore is not supported by this dialect"))
    }

    fn compile_insert_get_id(
        &self,
        query: &QueryBuilder,
        columns: &[Ident],
        row: &[Value],
        _key_name: &str,
    ) -> Result<(String, Vec<Value>)> {
        let rows = vec![row.to_vec()];
        self.compile_insert(query, columns, &rows)
    }

    fn compile_upsert(
        &self,
        query: &QueryBuilder,
        columns: &[Ident],
        rows: &[Vec<Value>],
        unique_by: &[Ident],
        update_columns: &[Ident],
    ) -> Result<(String, Vec<Value>)> {
        let _ = (query, columns, rows, unique_by, update_columns);
        Err(Error::logic("upsert is not supported by this dialect"))
    }

    fn compile_update(&self, query: &QueryBuilder, assignments: &[(Ident, Bound)]) -> Result<(String, Vec<Value>)> {
        if !query.joins.is_empty() || query.limit.is_some() {
            return self.compile_update_with_joins_or_limit(query, assignments);
        }
        let table = self.compile_from_clause(query.from.as_ref().expect("update requires from"))?;
        let assignments_sql = assignments
            .iter()
            .map(|(column, value)| format!("{} = {}", self.wrap(column), self.parameter(value)))
            .collect::<Vec<_>>()
            .join(", ");
        let mut bindings: Vec<Value> = assignments
            .iter()
            .filter_map(|(_, value)| match value {
                Bound::Value(value) => Some(value.clone()),
                Bound::Raw(_) => None,
            })
            .collect();
        let mut sql = format!("update {table} set {assignments_sql}");
        if !query.wheres.is_empty() {
            sql.push(' ');
            sql.push_str(&self.compile_wheres(&query.wheres)?);
            bindings.extend(query.bindings.slot(crate::BindingKind::Where).iter().cloned());
        }
        Ok((sql, bindings))
    }

    fn compile_update_with_joins_or_limit(
        &self,
        query: &QueryBuilder,
        assignments: &[(Ident, Bound)],
    ) -> Result<(String, Vec<Value>)> {
        let _ = (query, assignments);
        Err(Error::logic("update with joins or a limit is not supported by this dialect"))
    }

    fn compile_delete(&self, query: &QueryBuilder) -> Result<(String, Vec<Value>)> {
        let table = self.compile_from_clause(query.from.as_ref().expect("delete requires from"))?;
        let mut sql = format!("delete from {table}");
        let mut bindings = Vec::new();
        if !query.wheres.is_empty() {
            sql.push(' ');
            sql.push_str(&self.compile_wheres(&query.wheres)?);
            bindings.extend(query.bindings.slot(crate::BindingKind::Where).iter().cloned());
        }
        Ok((sql, bindings))
    }

    fn compile_truncate(&self, query: &QueryBuilder) -> Result<Vec<String>> {
        let table = self.compile_from_clause(query.from.as_ref().expect("truncate requires from"))?;
        Ok(vec![format!("truncate table {table}")])
    }

    /// Dispatches a builder carrying a write intent to the matching
    /// compiler. Panics if `query.write` is `None` — callers (the
    /// `Connection`) only reach this after checking the intent is set.
    fn compile_write(&self, query: &QueryBuilder) -> Result<(String, Vec<Value>)> {
        match query.write.as_ref().expect("compile_write requires a write intent") {
            WriteIntent::Insert { columns, rows, or_ignore } => {
                if *or_ignore {
                    self.compile_insert_or_ignore(query, columns, rows)
                } else {
                    self.compile_insert(query, columns, rows)
                }
            }
            WriteIntent::InsertGetId { columns, row } => {
                self.compile_insert_get_id(query, columns, row, "id")
            }
            WriteIntent::Upsert { columns, rows, unique_by, update_columns } => {
                self.compile_upsert(query, columns, rows, unique_by, update_columns)
            }
            WriteIntent::Update { assignments } => self.compile_update(query, assignments),
            WriteIntent::Delete => self.compile_delete(query),
            WriteIntent::Truncate => {
                let statements = self.compile_truncate(query)?;
                Ok((statements.join("; "), Vec::new()))
            }
        }
    }
}
