use sqlforge_core::{Bound, Distinct, Error, FulltextMode, Grammar, Ident, QueryBuilder, QueryGrammar, Result, Value};

/// The SQLite `QueryGrammar`/`Grammar` implementation: double-quoted
/// identifiers, `json_extract` JSON paths, Postgres-style `on conflict`
/// upsert, and a `rowid`-subquery rewrite for `UPDATE ... JOIN`/`LIMIT`
/// (SQLite has neither without the non-default
/// `SQLITE_ENABLE_UPDATE_DELETE_LIMIT` compile flag).
#[derive(Debug, Clone)]
pub struct SqliteGrammar {
    table_prefix: String,
}

impl SqliteGrammar {
    pub fn new(table_prefix: impl Into<String>) -> Self {
        Self { table_prefix: table_prefix.into() }
    }
}

impl Default for SqliteGrammar {
    fn default() -> Self {
        Self::new("")
    }
}

const OPERATORS: &[&str] =
    &["=", "<", ">", "<=", ">=", "<>", "!=", "like", "not like", "glob", "not glob", "in", "not in", "between", "not between", "is", "is not", "&", "|", "<<", ">>"];

impl Grammar for SqliteGrammar {
    fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    fn wrap_segment(&self, segment: &str) -> String {
        if segment == "*" {
            return "*".to_string();
        }
        format!("\"{}\"", segment.replace('"', "\"\""))
    }

    fn wrap_json_path(&self, column: &str, path: &[String]) -> String {
        let path_expression = path.iter().map(|segment| format!(".{segment}")).collect::<String>();
        format!("json_extract({}, '${path_expression}')", self.wrap_segment(column))
    }

    fn date_format(&self) -> &'static str {
        "%Y-%m-%d %H:%M:%S"
    }
}

impl QueryGrammar for SqliteGrammar {
    fn operators(&self) -> &'static [&'static str] {
        OPERATORS
    }

    fn compile_columns(&self, query: &QueryBuilder) -> Result<String> {
        if let Some(aggregate) = &query.aggregate {
            return Ok(self.compile_aggregate(aggregate, &query.distinct));
        }
        let columns = if query.columns.is_empty() { "*".to_string() } else { self.columnize(&query.columns) };
        match &query.distinct {
            Distinct::All | Distinct::On(_) => Ok(format!("select distinct {columns}")),
            Distinct::None => Ok(format!("select {columns}")),
        }
    }

    fn compile_json_contains(&self, column: &Ident) -> Result<String> {
        Ok(format!("exists (select 1 from json_each({}) where json_each.value = ?)", self.wrap(column)))
    }

    fn compile_json_contains_key(&self, column: &Ident) -> Result<String> {
        Ok(format!("json_type({}) is not null", self.wrap(column)))
    }

    fn compile_json_length(&self, column: &Ident, operator: &str) -> Result<String> {
        Ok(format!("json_array_length({}) {operator} ?", self.wrap(column)))
    }

    fn compile_fulltext(&self, columns: &[Ident], _mode: FulltextMode, _language: Option<&str>) -> Result<String> {
        Err(Error::logic(format!(
            "whereFulltext requires an FTS5 virtual table; plain columns {} are not supported",
            self.columnize(columns)
        )))
    }

    fn compile_insert_or_ignore(&self, query: &QueryBuilder, columns: &[Ident], rows: &[Vec<Value>]) -> Result<(String, Vec<Value>)> {
        let (sql, bindings) = self.compile_insert(query, columns, rows)?;
        Ok((sql.replacen("insert into", "insert or ignore into", 1), bindings))
    }

    fn compile_insert_get_id(
        &self,
        query: &QueryBuilder,
        columns: &[Ident],
        row: &[Value],
        _key_name: &str,
    ) -> Result<(String, Vec<Value>)> {
        self.compile_insert(query, columns, std::slice::from_ref(&row.to_vec()))
    }

    fn compile_upsert(
        &self,
        query: &QueryBuilder,
        columns: &[Ident],
        rows: &[Vec<Value>],
        unique_by: &[Ident],
        update_columns: &[Ident],
    ) -> Result<(String, Vec<Value>)> {
        let (sql, bindings) = self.compile_insert(query, columns, rows)?;
        if update_columns.is_empty() {
            return Ok((format!("{sql} on conflict do nothing"), bindings));
        }
        let conflict_columns = self.columnize(unique_by);
        let assignments = update_columns
            .iter()
            .map(|column| {
                let wrapped = self.wrap(column);
                format!("{wrapped} = excluded.{wrapped}")
            })
            .collect::<Vec<_>>()
            .join(", ");
        Ok((format!("{sql} on conflict ({conflict_columns}) do update set {assignments}"), bindings))
    }

    fn compile_update_with_joins_or_limit(
        &self,
        query: &QueryBuilder,
        assignments: &[(Ident, Bound)],
    ) -> Result<(String, Vec<Value>)> {
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

        let mut inner = query.clone();
        inner.write = None;
        inner.columns = vec![Ident::expr("rowid")];
        inner.aggregate = None;
        inner.distinct = Distinct::None;
        let (inner_sql, _) = self.compile_select(&inner)?;

        bindings.extend(query.bindings.flatten());

        Ok((format!("update {table} set {assignments_sql} where rowid in ({inner_sql})"), bindings))
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
    fn json_path_uses_json_extract() {
        let grammar = SqliteGrammar::default();
        assert_eq!(grammar.wrap(&Ident::plain("data->profile->age")), "json_extract(\"data\", '$.profile.age')");
    }

    #[test]
    fn insert_or_ignore_rewrites_insert_into() {
        let grammar = SqliteGrammar::default();
        let query = builder();
        let columns = vec!["email".into()];
        let rows = vec![vec![Value::from("a@example.com")]];
        let (sql, _) = grammar.compile_insert_or_ignore(&query, &columns, &rows).unwrap();
        assert_eq!(sql, "insert or ignore into \"users\" (\"email\") values (?)");
    }

    #[test]
    fn fulltext_is_rejected_without_fts5() {
        let grammar = SqliteGrammar::default();
        let query = builder();
        let error = grammar.compile_fulltext(&[Ident::plain("body")], FulltextMode::Natural, None).unwrap_err();
        let _ = query;
        assert!(error.to_string().contains("FTS5"), "{error}");
    }
}
