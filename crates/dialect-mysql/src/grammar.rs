use sqlforge_core::{Bound, Distinct, FulltextMode, Grammar, Ident, QueryBuilder, QueryGrammar, Result, Value};

/// The MySQL/MariaDB `QueryGrammar`/`Grammar` implementation: backtick
/// identifiers, `json_unquote(json_extract(...))` JSON paths, `match ...
/// against` fulltext, `insert ignore`/`on duplicate key update` for
/// insert-or-ignore/upsert, and `last_insert_id()` for autoincrement ids.
#[derive(Debug, Clone)]
pub struct MysqlGrammar {
    table_prefix: String,
}

impl MysqlGrammar {
    pub fn new(table_prefix: impl Into<String>) -> Self {
        Self { table_prefix: table_prefix.into() }
    }
}

impl Default for MysqlGrammar {
    fn default() -> Self {
        Self::new("")
    }
}

const OPERATORS: &[&str] = &[
    "=", "<", ">", "<=", ">=", "<>", "!=", "<=>", "like", "like binary", "not like", "ilike", "in",
    "not in", "between", "not between", "is", "is not", "&", "|", "^", "<<", ">>", "rlike",
    "regexp", "not regexp", "sounds like",
];

impl Grammar for MysqlGrammar {
    fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    fn wrap_segment(&self, segment: &str) -> String {
        if segment == "*" {
            return "*".to_string();
        }
        format!("`{}`", segment.replace('`', "``"))
    }

    fn wrap_json_path(&self, column: &str, path: &[String]) -> String {
        let path_expression = path.iter().map(|segment| format!(".\"{segment}\"")).collect::<String>();
        format!("json_unquote(json_extract({}, '${path_expression}'))", self.wrap_segment(column))
    }

    fn date_format(&self) -> &'static str {
        "%Y-%m-%d %H:%M:%S"
    }
}

impl QueryGrammar for MysqlGrammar {
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
        Ok(format!("json_contains({}, ?)", self.wrap(column)))
    }

    fn compile_json_contains_key(&self, column: &Ident) -> Result<String> {
        Ok(format!("json_contains_path({}, 'one', ?)", self.wrap(column)))
    }

    fn compile_json_length(&self, column: &Ident, operator: &str) -> Result<String> {
        Ok(format!("json_length({}) {operator} ?", self.wrap(column)))
    }

    fn compile_fulltext(&self, columns: &[Ident], mode: FulltextMode, _language: Option<&str>) -> Result<String> {
        let columns = self.columnize(columns);
        let modifier = match mode {
            FulltextMode::Boolean => " in boolean mode",
            FulltextMode::Natural | FulltextMode::Phrase | FulltextMode::Websearch => " in natural language mode",
        };
        Ok(format!("match ({columns}) against (?{modifier})"))
    }

    fn compile_insert_or_ignore(&self, query: &QueryBuilder, columns: &[Ident], rows: &[Vec<Value>]) -> Result<(String, Vec<Value>)> {
        let (sql, bindings) = self.compile_insert(query, columns, rows)?;
        Ok((sql.replacen("insert into", "insert ignore into", 1), bindings))
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
        _unique_by: &[Ident],
        update_columns: &[Ident],
    ) -> Result<(String, Vec<Value>)> {
        let (sql, bindings) = self.compile_insert(query, columns, rows)?;
        if update_columns.is_empty() {
            return Ok((format!("{sql} on duplicate key update {} = {}", self.wrap(&columns[0]), self.wrap(&columns[0])), bindings));
        }
        let assignments = update_columns
            .iter()
            .map(|column| {
                let wrapped = self.wrap(column);
                format!("{wrapped} = values({wrapped})")
            })
            .collect::<Vec<_>>()
            .join(", ");
        Ok((format!("{sql} on duplicate key update {assignments}"), bindings))
    }

    fn compile_update_with_joins_or_limit(
        &self,
        query: &QueryBuilder,
        assignments: &[(Ident, Bound)],
    ) -> Result<(String, Vec<Value>)> {
        // MySQL natively supports `update t join ... set ... where ... limit n`.
        let table = self.compile_from_clause(query.from.as_ref().expect("update requires from"))?;
        let mut sql = format!("update {table}");
        if !query.joins.is_empty() {
            sql.push(' ');
            sql.push_str(&self.compile_joins(&query.joins)?);
        }
        let assignments_sql = assignments
            .iter()
            .map(|(column, value)| format!("{} = {}", self.wrap(column), self.parameter(value)))
            .collect::<Vec<_>>()
            .join(", ");
        sql.push_str(&format!(" set {assignments_sql}"));

        if !query.wheres.is_empty() {
            sql.push_str(&format!(" {}", self.compile_wheres(&query.wheres)?));
        }
        if let Some(limit) = query.limit {
            sql.push_str(&format!(" limit {limit}"));
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
    fn json_path_uses_json_unquote_extract() {
        let grammar = MysqlGrammar::default();
        assert_eq!(
            grammar.wrap(&Ident::plain("data->profile->age")),
            "json_unquote(json_extract(`data`, '$.\"profile\".\"age\"'))"
        );
    }

    #[test]
    fn insert_or_ignore_rewrites_insert_into() {
        let grammar = MysqlGrammar::default();
        let query = builder();
        let columns = vec!["email".into()];
        let rows = vec![vec![Value::from("a@example.com")]];
        let (sql, _) = grammar.compile_insert_or_ignore(&query, &columns, &rows).unwrap();
        assert_eq!(sql, "insert ignore into `users` (`email`) values (?)");
    }

    #[test]
    fn upsert_uses_on_duplicate_key_update_with_values() {
        let grammar = MysqlGrammar::default();
        let query = builder();
        let columns = vec!["email".into(), "name".into()];
        let rows = vec![vec![Value::from("a@example.com"), Value::from("Ada")]];
        let unique_by = vec!["email".into()];
        let update_columns = vec!["name".into()];
        let (sql, _) = grammar.compile_upsert(&query, &columns, &rows, &unique_by, &update_columns).unwrap();
        assert_eq!(
            sql,
            "insert into `users` (`email`, `name`) values (?, ?) on duplicate key update `name` = values(`name`)"
        );
    }
}
