use sqlforge_core::{
    Bound, Distinct, Error, FulltextMode, Grammar, Ident, QueryBuilder, QueryGrammar, Result, Value,
};

/// The PostgreSQL `QueryGrammar`/`Grammar` implementation: double-quoted
/// identifiers, `DISTINCT ON`, `col->'a'->>'b'` JSON paths, `@>`/`<@`/`?`/
/// `?|`/`?&` operators, `to_tsvector`/`plainto_tsquery` fulltext, and
/// `on conflict` upsert/insert-or-ignore.
#[derive(Debug, Clone)]
pub struct PostgresGrammar {
    table_prefix: String,
}

impl PostgresGrammar {
    pub fn new(table_prefix: impl Into<String>) -> Self {
        Self { table_prefix: table_prefix.into() }
    }
}

impl Default for PostgresGrammar {
    fn default() -> Self {
        Self::new("")
    }
}

const OPERATORS: &[&str] = &[
    "=", "<", ">", "<=", ">=", "<>", "!=", "like", "not like", "ilike", "not ilike", "in",
    "not in", "between", "not between", "is", "is not", "&", "|", "#", "<<", ">>", "@>", "<@",
    "?", "?|", "?&", "||", "-", "@?", "@@",
];

impl Grammar for PostgresGrammar {
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
        let mut sql = self.wrap_segment(column);
        for (index, segment) in path.iter().enumerate() {
            let arrow = if index == path.len() - 1 { "->>" } else { "->" };
            sql = format!("{sql}{arrow}'{segment}'");
        }
        sql
    }

    fn date_format(&self) -> &'static str {
        "%Y-%m-%d %H:%M:%S"
    }

    fn quote_literal(&self, value: &Value) -> String {
        match value {
            Value::Bool(value) => if *value { "true" } else { "false" }.to_string(),
            other => self.default_quote_literal(other),
        }
    }
}

impl PostgresGrammar {
    /// The default-grammar literal rendering, used as a fallback from the
    /// `Bool` override above (Postgres is the one dialect that does not
    /// render booleans as `0`/`1`).
    fn default_quote_literal(&self, value: &Value) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Bool(value) => if *value { "true" } else { "false" }.to_string(),
            Value::Int(value) => value.to_string(),
            Value::Float(value) => value.to_string(),
            Value::Text(value) => self.quote_string(value),
            Value::Bytes(bytes) => self.quote_string(&String::from_utf8_lossy(bytes)),
            Value::Date(date) => self.quote_string(&date.format(self.date_format()).to_string()),
            Value::DateTime(value) => self.quote_string(&value.format(self.date_format()).to_string()),
        }
    }
}

impl QueryGrammar for PostgresGrammar {
    fn operators(&self) -> &'static [&'static str] {
        OPERATORS
    }

    fn compile_columns(&self, query: &QueryBuilder) -> Result<String> {
        if let Some(aggregate) = &query.aggregate {
            return Ok(self.compile_aggregate(aggregate, &query.distinct));
        }
        let columns = if query.columns.is_empty() { "*".to_string() } else { self.columnize(&query.columns) };
        match &query.distinct {
            Distinct::On(cols) if !cols.is_empty() => Ok(format!(
                "select distinct on ({}) {columns}",
                cols.iter().map(|c| self.wrap(&Ident::plain(c.clone()))).collect::<Vec<_>>().join(", ")
            )),
            Distinct::All => Ok(format!("select distinct {columns}")),
            _ => Ok(format!("select {columns}")),
        }
    }

    fn compile_json_contains(&self, column: &Ident) -> Result<String> {
        Ok(format!("{} @> ?", self.wrap(column)))
    }

    fn compile_json_contains_key(&self, column: &Ident) -> Result<String> {
        // column->>'last_segment' is compiled by `wrap`, so split manually
        // to reach for `?` on the penultimate path rather than `->>`.
        // `?` is doubled so the placeholder scanner treats it as a literal,
        // not a binding slot.
        let (head, tail) = rsplit_json_path(column)?;
        Ok(format!("{head} ?? {}", self.quote_string(&tail)))
    }

    fn compile_json_length(&self, column: &Ident, operator: &str) -> Result<String> {
        Ok(format!("jsonb_array_length(({})::jsonb) {operator} ?", self.wrap(column)))
    }

    fn compile_fulltext(&self, columns: &[Ident], mode: FulltextMode, language: Option<&str>) -> Result<String> {
        let language = language.unwrap_or("english");
        let language = if is_known_language(language) { language } else { "english" };
        let vector = if columns.len() == 1 {
            format!("to_tsvector('{language}', {})", self.wrap(&columns[0]))
        } else {
            let concatenated = columns.iter().map(|c| self.wrap(c)).collect::<Vec<_>>().join(" || ' ' || ");
            format!("to_tsvector('{language}', {concatenated})")
        };
        let query_fn = match mode {
            FulltextMode::Phrase => "phraseto_tsquery",
            FulltextMode::Websearch => "websearch_to_tsquery",
            FulltextMode::Natural | FulltextMode::Boolean => "plainto_tsquery",
        };
        Ok(format!("{vector} @@ {query_fn}('{language}', ?)"))
    }

    fn compile_insert_or_ignore(&self, query: &QueryBuilder, columns: &[Ident], rows: &[Vec<Value>]) -> Result<(String, Vec<Value>)> {
        let (sql, bindings) = self.compile_insert(query, columns, rows)?;
        Ok((format!("{sql} on conflict do nothing"), bindings))
    }

    fn compile_insert_get_id(
        &self,
        query: &QueryBuilder,
        columns: &[Ident],
        row: &[Value],
        key_name: &str,
    ) -> Result<(String, Vec<Value>)> {
        let rows = vec![row.to_vec()];
        let (sql, bindings) = self.compile_insert(query, columns, &rows)?;
        Ok((format!("{sql} returning {}", self.wrap_segment(key_name)), bindings))
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
        // Postgres has no UPDATE ... JOIN/LIMIT; rewrite to
        // `update T set ... where ctid in (select ctid from T join ... where ... limit ...)`.
        let table = self.compile_from_clause(query.from.as_ref().expect("update requires from"))?;
        let assignments_sql = assignments
            .iter()
            .map(|(column, value)| format!("{} = {}", self.wrap(column), self.parameter(value)))
            .collect::<Vec<_>>()
            .join(", ");

        let mut inner = query.clone();
        inner.write = None;
        inner.columns = vec![Ident::expr("ctid")];
        inner.aggregate = None;
        inner.distinct = Distinct::None;
        let (inner_sql, _) = self.compile_select(&inner)?;

        // assignment values already live in `query.bindings` under `From`
        // (pushed there by `QueryBuilder::update`), ordered ahead of `Where`.
        let bindings = query.bindings.flatten();

        Ok((format!("update {table} set {assignments_sql} where ctid in ({inner_sql})"), bindings))
    }
}

fn is_known_language(language: &str) -> bool {
    matches!(
        language,
        "simple"
            | "english"
            | "french"
            | "german"
            | "spanish"
            | "portuguese"
            | "italian"
            | "dutch"
            | "russian"
            | "danish"
            | "finnish"
            | "hungarian"
            | "norwegian"
            | "romanian"
            | "swedish"
            | "turkish"
    )
}

fn rsplit_json_path(column: &Ident) -> Result<(String, String)> {
    let Ident::Plain(value) = column else {
        return Err(Error::invalid_argument("whereJsonContainsKey requires a plain column path"));
    };
    let Some(index) = value.rfind("->") else {
        return Err(Error::invalid_argument(format!("{value} is not a JSON path")));
    };
    let head = &value[..index];
    let tail = value[index..].trim_start_matches("->").trim_start_matches('>').trim_matches('\'');
    let grammar = PostgresGrammar::default();
    Ok((grammar.wrap(&Ident::plain(head.to_string())), tail.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlforge_core::{Ident, QueryBuilder};

    fn builder() -> QueryBuilder {
        let mut query = QueryBuilder::default();
        query.from = Some(sqlforge_core::FromClause::Table(Ident::plain("users")));
        query
    }

    #[test]
    fn distinct_on_renders_postgres_specific_clause() {
        let grammar = PostgresGrammar::default();
        let mut query = builder();
        query.distinct = Distinct::On(vec!["email".to_string()]);
        query.columns = vec![Ident::plain("email"), Ident::plain("id")];
        let sql = grammar.compile_columns(&query).unwrap();
        assert_eq!(sql, "select distinct on (\"email\") \"email\", \"id\"");
    }

    #[test]
    fn json_path_uses_arrow_and_double_arrow() {
        let grammar = PostgresGrammar::default();
        assert_eq!(grammar.wrap(&Ident::plain("data->profile->age")), "\"data\"->'profile'->>'age'");
    }

    #[test]
    fn boolean_literal_renders_true_false() {
        let grammar = PostgresGrammar::default();
        assert_eq!(grammar.quote_literal(&Value::Bool(true)), "true");
        assert_eq!(grammar.quote_literal(&Value::Bool(false)), "false");
    }
}
