/// An opaque raw SQL fragment. Never escaped, never bound — spliced into
/// the compiled statement exactly as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expression(String);

impl Expression {
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A column/table identifier: either a plain (possibly dotted, possibly
/// aliased, possibly a JSON path) name, or a raw [`Expression`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ident {
    Plain(String),
    Expression(Expression),
}

impl Ident {
    pub fn plain(value: impl Into<String>) -> Self {
        Self::Plain(value.into())
    }

    pub fn expr(sql: impl Into<String>) -> Self {
        Self::Expression(Expression::new(sql))
    }

    pub fn is_expression(&self) -> bool {
        matches!(self, Self::Expression(_))
    }

    /// Splits `"a as b"` (case-insensitive) into `(a, Some(b))`. Only valid
    /// on `Plain` idents; expressions are never split.
    pub fn split_alias(&self) -> Option<(&str, Option<&str>)> {
        match self {
            Self::Plain(value) => Some(split_alias_str(value)),
            Self::Expression(_) => None,
        }
    }
}

pub(crate) fn split_alias_str(value: &str) -> (&str, Option<&str>) {
    if let Some(index) = find_as_keyword(value) {
        let (head, tail) = value.split_at(index);
        (head.trim_end(), Some(tail[4..].trim_start()))
    } else {
        (value, None)
    }
}

fn find_as_keyword(value: &str) -> Option<usize> {
    value.to_ascii_lowercase().find(" as ")
}

impl From<&str> for Ident {
    fn from(value: &str) -> Self {
        Self::Plain(value.to_string())
    }
}

impl From<String> for Ident {
    fn from(value: String) -> Self {
        Self::Plain(value)
    }
}

impl From<Expression> for Ident {
    fn from(value: Expression) -> Self {
        Self::Expression(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_alias_case_insensitively() {
        let ident = Ident::plain("users.name As n");
        assert_eq!(ident.split_alias(), Some(("users.name", Some("n"))));
    }

    #[test]
    fn no_alias_returns_whole_value() {
        let ident = Ident::plain("users.name");
        assert_eq!(ident.split_alias(), Some(("users.name", None)));
    }

    #[test]
    fn expressions_never_split() {
        let ident = Ident::expr("count(*) as total");
        assert_eq!(ident.split_alias(), None);
    }
}
