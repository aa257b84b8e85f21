use sqlforge_core::{
    Bound, Distinct, Error, FulltextMode, Grammar, Ident, QueryBuilder, QueryGrammar, Result, Value,
};

/// The SQL Server `QueryGrammar`/`Grammar` implementation: `[bracket]`
/// identifiers, `JSON_VALUE`/`OPENJSON` for JSON access, `TOP`/`OFFSET …
/// FETCH NEXT` pagination in place of `LIMIT`/`OFFSET`, and `MERGE` for
/// upsert and the emulated `insertOrIgnore` (SQL Server has neither `ON
/// CONFLICT` nor `INSERT IGNORE`).
#[derive(Debug, Clone)]
pub struct MssqlGrammar {
    table_prefix: String,
}

impl MssqlGrammar {
    pub fn new(table_prefix: impl Into<String>) -> Self {
        Self { table_prefix: table_prefix.into() }
    }
}

impl Default for MssqlGrammar {
    fn default() -> Self {
        Self::new("")
    }
}

const OPERATORS: &[&str] =
    &["=", "<", ">", "<=", ">=", "<>", "!=", "like", "not like", "in", "not in", "between", "not between", "is", "is not", "&", "|", "^"];

impl Grammar for MssqlGrammar {
    fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    fn wrap_segment(&self, segment: &str) -> String {
        if segment == "*" {
            return "*".to_string();
        }
        format!("[{}]", segment.replace(']', "]]"))
    }

    fn wrap_json_path(&self, column: &str, path: &[String]) -> String {
        let path_expression = path.iter().map(|segment| format!(".{segment}")).collect::<String>();
        format!("json_value({}, '${path_expression}')", self.wrap_segment(column))
    }

    fn date_format(&self) -> &'static str {
        "%Y-%m-%d %H:%M:%S"
    }
}

impl QueryGrammar for MssqlGrammar {
    fn operators(&self) -> &'static [&'static str] {
        OPERATORS
    }

    fn compile_columns(&self, query: &QueryBuilder) -> Result<String> {
        if let Some(aggregate) = &query.aggregate {
            return Ok(self.compile_aggregate(aggregate, &query.distinct));
        }
        let distinct = match &query.distinct {
            Distinct::None => "",
            Distinct::All | Distinct::On(_) => "distinct ",
        };
        let top = match (query.limit, query.offset) {
            (Some(limit), None) => format!("top ({limit}) "),
            _ => String::new(),
        };
        let columns = if query.columns.is_empty() { "*".to_string() } else { self.columnize(&query.columns) };
        Ok(format!("select {distinct}{top}{columns}"))
    }

    /// `TOP` is folded into the column list by [`Self::compile_columns`];
    /// `OFFSET … FETCH NEXT` requires an `ORDER BY`, which MSSQL demands
    /// whenever a query paginates by offset (unlike every other
    /// supported dialect, where `LIMIT`/`OFFSET` need no ordering).
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
        } else if query.offset.is_some() {
            parts.push("order by (select 0)".to_string());
        }
        if let Some(offset) = query.offset {
            parts.push(format!("offset {offset} rows"));
            if let Some(limit) = query.limit {
                parts.push(format!("fetch next {limit} rows only"));
            }
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

    fn compile_lock(&self, lock: sqlforge_core::Lock) -> String {
        match lock {
            sqlforge_core::Lock::None => String::new(),
            sqlforge_core::Lock::ForUpdate => String::new(),
            sqlforge_core::Lock::ForShare => String::new(),
        }
    }

    fn compile_json_contains(&self, column: &Ident) -> Result<String> {
        Ok(format!("exists (select 1 from openjson({}) where value = ?)", self.wrap(column)))
    }

    fn compile_json_contains_key(&self, column: &Ident) -> Result<String> {
        Ok(format!("{} is not null", self.wrap(column)))
    }

    fn compile_json_length(&self, column: &Ident, operator: &str) -> Result<String> {
        Ok(format!("(select count(*) from openjson({})) {operator} ?", self.wrap(column)))
    }

    fn compile_fulltext(&self, columns: &[Ident], mode: FulltextMode, _language: Option<&str>) -> Result<String> {
        let wrapped = columns.iter().map(|c| self.wrap(c)).collect::<Vec<_>>().join(", ");
        Ok(match mode {
            FulltextMode::Boolean => format!("contains(({wrapped}), ?)"),
            FulltextMode::Natural | FulltextMode::Phrase | FulltextMode::Websearch => {
                format!("freetext(({wrapped}), ?)")
            }
        })
    }

    /// SQL Server has no `INSERT IGNORE`/`ON CONFLICT`; emulated with a
    /// `MERGE` matched on every inserted column, so an identical existing
    /// row is left alone and nothing is inserted twice.
    fn compile_insert_or_ignore(&self, query: &QueryBuilder, columns: &[Ident], rows: &[Vec<Value>]) -> Result<(String, Vec<Value>)> {
        if rows.len() != 1 {
            return Err(Error::logic("insertOrIgnore on SQL Server is emulated one row at a time"));
        }
        let table = self.compile_from_clause(query.from.as_ref().ok_or_else(|| Error::logic("insert requires from"))?)?;
        let column_list = columns.iter().map(|c| self.wrap(c)).collect::<Vec<_>>().join(", ");
        let source_list = columns.iter().map(|c| format!("source.{}", self.wrap(c))).collect::<Vec<_>>().join(", ");
        let source_aliases = columns.iter().map(|c| self.wrap(c)).collect::<Vec<_>>().join(", ");
        let placeholders = columns.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let match_predicate = columns
            .iter()
            .map(|c| format!("target.{} = source.{}", self.wrap(c), self.wrap(c)))
            .collect::<Vec<_>>()
            .join(" and ");

        let sql = format!(
            "merge into {table} as target using (values ({placeholders})) as source ({source_aliases}) \
             on {match_predicate} when not matched then insert ({column_list}) values ({source_list});"
        );
        Ok((sql, rows[0].clone()))
    }

    /// SQL Server has no `RETURNING`; the `OUTPUT inserted.{key}` clause
    /// hands the generated key back in the same round trip instead.
    fn compile_insert_get_id(
        &self,
        query: &QueryBuilder,
        columns: &[Ident],
        row: &[Value],
        key_name: &str,
    ) -> Result<(String, Vec<Value>)> {
        let (insert_sql, bindings) = self.compile_insert(query, columns, std::slice::from_ref(&row.to_vec()))?;
        let marker = " values (";
        let Some(position) = insert_sql.find(marker) else {
            return Err(Error::logic("insertGetId: could not locate values clause"));
        };
        let output = format!(" output inserted.{}", self.wrap_segment(key_name));
        let mut sql = insert_sql;
        sql.insert_str(position, &output);
        Ok((sql, bindings))
    }

    fn compile_upsert(
        &self,
        query: &QueryBuilder,
        columns: &[Ident],
        rows: &[Vec<Value>],
        unique_by: &[Ident],
        update_columns: &[Ident],
    ) -> Result<(String, Vec<Value>)> {
        let table = self.compile_from_clause(query.from.as_ref().ok_or_else(|| Error::logic("upsert requires from"))?)?;
        let source_aliases = columns.iter().map(|c| self.wrap(c)).collect::<Vec<_>>().join(", ");
        let column_list = columns.iter().map(|c| self.wrap(c)).collect::<Vec<_>>().join(", ");
        let source_list = columns.iter().map(|c| format!("source.{}", self.wrap(c))).collect::<Vec<_>>().join(", ");
        let match_predicate = unique_by
            .iter()
            .map(|c| format!("target.{} = source.{}", self.wrap(c), self.wrap(c)))
            .collect::<Vec<_>>()
            .join(" and ");

        let mut bindings = Vec::new();
        let mut values_rows = Vec::with_capacity(rows.len());
        for row in rows {
            let placeholders = row.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
            values_rows.push(format!("({placeholders})"));
            bindings.extend(row.iter().cloned());
        }
        let values = values_rows.join(", ");

        let mut sql = format!(
            "merge into {table} as target using (values {values}) as source ({source_aliases}) on {match_predicate} "
        );
        if !update_columns.is_empty() {
            let assignments = update_columns
                .iter()
                .map(|c| format!("{} = source.{}", self.wrap(c), self.wrap(c)))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!("when matched then update set {assignments} "));
        }
        sql.push_str(&format!("when not matched then insert ({column_list}) values ({source_list});"));
        Ok((sql, bindings))
    }

    /// MSSQL supports `UPDATE ... FROM t JOIN ... WHERE ...` natively;
    /// a row cap uses `UPDATE TOP (n)` rather than a trailing `LIMIT`.
    fn compile_update_with_joins_or_limit(
        &self,
        query: &QueryBuilder,
        assignments: &[(Ident, Bound)],
    ) -> Result<(String, Vec<Value>)> {
        let from = query.from.as_ref().ok_or_else(|| Error::logic("update requires from"))?;
        let table = self.compile_from_clause(from)?;
        let assignments_sql = assignments
            .iter()
            .map(|(column, value)| format!("{} = {}", self.wrap(column), self.parameter(value)))
            .collect::<Vec<_>>()
            .join(", ");
        let top = query.limit.map(|limit| format!("top ({limit}) ")).unwrap_or_default();
        let mut sql = format!("update {top}{table} set {assignments_sql}");

        if !query.joins.is_empty() {
            sql.push_str(&format!(" from {table} {}", self.compile_joins(&query.joins)?));
        }
        if !query.wheres.is_empty() {
            sql.push_str(&format!(" {}", self.compile_wheres(&query.wheres)?));
        }

        // assignment values already live in `query.bindings` under `From`
        // (pushed there by `QueryBuilder::update`), ordered ahead of `Where`.
        let bindings = query.bindings.flatten();

        Ok((sql, bindings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlforge_core::{FromClause, Ident, QueryBuilder};

    fn builder() -> QueryBuilder {
        let mut query = QueryBuilder::default();
        query.from = Some(FromClause::Table(Ident::plain("users")));
        query
    }

    #[test]
    fn identifiers_use_square_brackets() {
        let grammar = MssqlGrammar::default();
        assert_eq!(grammar.wrap(&Ident::plain("name")), "[name]");
    }

    #[test]
    fn limit_without_offset_uses_top() {
        let grammar = MssqlGrammar::default();
        let mut query = builder();
        query.limit = Some(5);
        let (sql, _) = grammar.compile_select(&query).unwrap();
        assert_eq!(sql, "select top (5) * from [users]");
    }

    #[test]
    fn offset_uses_fetch_next_and_requires_order_by() {
        let grammar = MssqlGrammar::default();
        let mut query = builder();
        query.limit = Some(10);
        query.offset = Some(20);
        let (sql, _) = grammar.compile_select(&query).unwrap();
        assert_eq!(sql, "select * from [users] order by (select 0) offset 20 rows fetch next 10 rows only");
    }

    #[test]
    fn insert_get_id_uses_output_inserted() {
        let grammar = MssqlGrammar::default();
        let query = builder();
        let columns = vec!["email".into()];
        let row = vec![Value::from("a@example.com")];
        let (sql, _) = grammar.compile_insert_get_id(&query, &columns, &row, "id").unwrap();
        assert_eq!(sql, "insert into [users] output inserted.[id] ([email]) values (?)");
    }
}
