use crate::{Bound, Ident, Value, ident::split_alias_str};

/// Dialect-agnostic compiler primitives shared by [`crate::query::QueryGrammar`]
/// and [`crate::schema::SchemaGrammar`]: identifier wrapping, placeholder
/// emission, and raw-SQL binding substitution. Required methods are the
/// handful of places dialects actually diverge; everything else has a
/// default body expressed in terms of them.
pub trait Grammar {
    /// Table prefix applied to the last dotted segment of table names.
    fn table_prefix(&self) -> &str;

    /// Quotes one already-split identifier segment. `*` must pass through
    /// callers before reaching this method.
    fn wrap_segment(&self, segment: &str) -> String;

    /// Compiles a JSON path access (`col->a->b`, detected upstream) for this
    /// dialect, e.g. MySQL's `json_unquote(json_extract(...))` or
    /// Postgres's `col->'a'->>'b'`.
    fn wrap_json_path(&self, column: &str, path: &[String]) -> String;

    /// `strftime`-style format string used when inlining date/time literals.
    fn date_format(&self) -> &'static str;

    /// Renders a scalar as a SQL literal, used by
    /// `substitute_bindings_into_raw_sql` and expression/default inlining.
    /// The MySQL/SQLite default renders booleans as `0`/`1`; Postgres
    /// overrides this to `true`/`false`.
    fn quote_literal(&self, value: &Value) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Bool(value) => if *value { "1" } else { "0" }.to_string(),
            Value::Int(value) => value.to_string(),
            Value::Float(value) => value.to_string(),
            Value::Text(value) => self.quote_string(value),
            Value::Bytes(bytes) => self.quote_string(&String::from_utf8_lossy(bytes)),
            Value::Date(date) => self.quote_string(&date.format(self.date_format()).to_string()),
            Value::DateTime(value) => {
                self.quote_string(&value.format(self.date_format()).to_string())
            }
        }
    }

    /// Single-quotes a string body, doubling embedded `'`.
    fn quote_string(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Wraps a column/table identifier, splitting on `.`, detecting an
    /// `as` alias, and dispatching JSON paths to `wrap_json_path`.
    /// [`Ident::Expression`] values are never escaped.
    fn wrap(&self, ident: &Ident) -> String {
        match ident {
            Ident::Expression(expr) => expr.as_str().to_string(),
            Ident::Plain(value) => {
                let (name, alias) = split_alias_str(value);
                let wrapped = match split_json_path(name) {
                    Some((column, path)) => self.wrap_json_path(column, &path),
                    None => self.wrap_qualified(name, false),
                };
                match alias {
                    Some(alias) => format!("{wrapped} as {}", self.wrap_segment(alias)),
                    None => wrapped,
                }
            }
        }
    }

    /// As [`Grammar::wrap`], but inserts `table_prefix()` before the last
    /// dotted segment (the actual table name, as opposed to a schema
    /// qualifier) and never attempts JSON-path detection.
    fn wrap_table(&self, ident: &Ident) -> String {
        match ident {
            Ident::Expression(expr) => expr.as_str().to_string(),
            Ident::Plain(value) => {
                let (name, alias) = split_alias_str(value);
                let wrapped = self.wrap_qualified(name, true);
                match alias {
                    Some(alias) => format!("{wrapped} as {}", self.wrap_segment(alias)),
                    None => wrapped,
                }
            }
        }
    }

    /// Splits `value` on `.` and wraps each segment, inserting
    /// `table_prefix()` ahead of the last segment when `is_table` is set.
    /// `*` passes through unwrapped.
    fn wrap_qualified(&self, value: &str, is_table: bool) -> String {
        let segments: Vec<&str> = value.split('.').collect();
        let last_index = segments.len() - 1;
        segments
            .iter()
            .enumerate()
            .map(|(index, segment)| {
                if *segment == "*" {
                    return "*".to_string();
                }
                if is_table && index == last_index && !self.table_prefix().is_empty() {
                    self.wrap_segment(&format!("{}{segment}", self.table_prefix()))
                } else {
                    self.wrap_segment(segment)
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    fn wrap_array(&self, idents: &[Ident]) -> Vec<String> {
        idents.iter().map(|ident| self.wrap(ident)).collect()
    }

    fn columnize(&self, idents: &[Ident]) -> String {
        self.wrap_array(idents).join(", ")
    }

    /// `?` for a bound value, or the raw SQL literally for `Bound::Raw`.
    fn parameter(&self, bound: &Bound) -> String {
        match bound {
            Bound::Value(_) => "?".to_string(),
            Bound::Raw(sql) => sql.clone(),
        }
    }

    fn parameterize(&self, bounds: &[Bound]) -> String {
        bounds
            .iter()
            .map(|bound| self.parameter(bound))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Scans `sql` left to right, replacing each unquoted, unescaped `?`
    /// with a dialect-quoted literal from `bindings`. Quoted string bodies
    /// and escaped `??` are passed through untouched.
    fn substitute_bindings_into_raw_sql(&self, sql: &str, bindings: &[Value]) -> String {
        let mut result = String::with_capacity(sql.len());
        let mut chars = sql.chars().peekable();
        let mut binding_iter = bindings.iter();
        let mut in_string = false;

        while let Some(c) = chars.next() {
            if in_string {
                result.push(c);
                if c == '\'' {
                    if chars.peek() == Some(&'\'') {
                        result.push(chars.next().expect("peeked"));
                    } else {
                        in_string = false;
                    }
                }
                continue;
            }

            match c {
                '\'' => {
                    in_string = true;
                    result.push(c);
                }
                '?' if chars.peek() == Some(&'?') => {
                    chars.next();
                    result.push('?');
                }
                '?' => match binding_iter.next() {
                    Some(value) => result.push_str(&self.quote_literal(value)),
                    None => result.push('?'),
                },
                other => result.push(other),
            }
        }

        result
    }
}

fn split_json_path(value: &str) -> Option<(&str, Vec<String>)> {
    let index = value.find("->")?;
    let column = &value[..index];
    let path = value[index..]
        .split("->")
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.trim_start_matches('>').trim_matches('\'').to_string())
        .collect();
    Some((column, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AnsiGrammar;

    impl Grammar for AnsiGrammar {
        fn table_prefix(&self) -> &str {
            ""
        }

        fn wrap_segment(&self, segment: &str) -> String {
            if segment == "*" {
                segment.to_string()
            } else {
                format!("\"{segment}\"")
            }
        }

        fn wrap_json_path(&self, column: &str, path: &[String]) -> String {
            let mut sql = self.wrap_segment(column);
            for segment in path {
                sql = format!("{sql}->'{segment}'");
            }
            sql
        }

        fn date_format(&self) -> &'static str {
            "%Y-%m-%d %H:%M:%S"
        }
    }

    #[test]
    fn wraps_dotted_identifier() {
        let grammar = AnsiGrammar;
        assert_eq!(grammar.wrap(&Ident::plain("users.name")), "\"users\".\"name\"");
    }

    #[test]
    fn preserves_expressions_verbatim() {
        let grammar = AnsiGrammar;
        assert_eq!(grammar.wrap(&Ident::expr("count(*)")), "count(*)");
    }

    #[test]
    fn wraps_alias() {
        let grammar = AnsiGrammar;
        assert_eq!(grammar.wrap(&Ident::plain("name as n")), "\"name\" as \"n\"");
    }

    #[test]
    fn wrap_table_inserts_prefix_on_last_segment_only() {
        struct Prefixed;
        impl Grammar for Prefixed {
            fn table_prefix(&self) -> &str {
                "wp_"
            }
            fn wrap_segment(&self, segment: &str) -> String {
                format!("\"{segment}\"")
            }
            fn wrap_json_path(&self, _: &str, _: &[String]) -> String {
                unimplemented!()
            }
            fn date_format(&self) -> &'static str {
                "%Y-%m-%d"
            }
        }
        let grammar = Prefixed;
        assert_eq!(
            grammar.wrap_table(&Ident::plain("public.users")),
            "\"public\".\"wp_users\""
        );
    }

    #[test]
    fn substitutes_bindings_skipping_quoted_bodies_and_escaped_marks() {
        let grammar = AnsiGrammar;
        let sql = "select * from t where a = ? and b = '?' and c = ?? and d = ?";
        let out = grammar.substitute_bindings_into_raw_sql(
            sql,
            &[Value::Int(1), Value::Text("x".to_string())],
        );
        assert_eq!(
            out,
            "select * from t where a = 1 and b = '?' and c = ? and d = 'x'"
        );
    }

    #[test]
    fn wraps_json_path() {
        let grammar = AnsiGrammar;
        assert_eq!(
            grammar.wrap(&Ident::plain("data->profile->age")),
            "\"data\"->'profile'->'age'"
        );
    }
}
