use crate::{Bound, Ident, Value, query::QueryBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boolean {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateUnit {
    Date,
    Time,
    Year,
    Month,
    Day,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FulltextMode {
    Natural,
    Boolean,
    Phrase,
    Websearch,
}

/// One tagged where/having predicate. Every variant carries the `boolean`
/// connective joining it to the previous entry; the first entry's boolean
/// is stripped at compile time (`removeLeadingBoolean`).
#[derive(Debug, Clone)]
pub enum Where {
    Basic {
        column: Ident,
        operator: String,
        value: Bound,
        boolean: Boolean,
    },
    In {
        column: Ident,
        values: Vec<Value>,
        negated: bool,
        boolean: Boolean,
    },
    Null {
        column: Ident,
        negated: bool,
        boolean: Boolean,
    },
    Between {
        column: Ident,
        low: Bound,
        high: Bound,
        negated: bool,
        boolean: Boolean,
    },
    DateLike {
        unit: DateUnit,
        column: Ident,
        operator: String,
        value: Bound,
        boolean: Boolean,
    },
    Column {
        first: Ident,
        operator: String,
        second: Ident,
        boolean: Boolean,
    },
    Nested {
        query: Box<QueryBuilder>,
        boolean: Boolean,
    },
    Sub {
        column: Ident,
        operator: String,
        query: Box<QueryBuilder>,
        boolean: Boolean,
    },
    Exists {
        query: Box<QueryBuilder>,
        negated: bool,
        boolean: Boolean,
    },
    JsonContains {
        column: Ident,
        value: Value,
        negated: bool,
        boolean: Boolean,
    },
    JsonContainsKey {
        column: Ident,
        negated: bool,
        boolean: Boolean,
    },
    JsonLength {
        column: Ident,
        operator: String,
        value: Bound,
        boolean: Boolean,
    },
    Fulltext {
        columns: Vec<Ident>,
        value: String,
        language: Option<String>,
        mode: FulltextMode,
        boolean: Boolean,
    },
    Bitwise {
        column: Ident,
        operator: String,
        value: Bound,
        boolean: Boolean,
    },
    Raw {
        sql: String,
        boolean: Boolean,
    },
}

impl Where {
    pub fn boolean(&self) -> Boolean {
        match self {
            Where::Basic { boolean, .. }
            | Where::In { boolean, .. }
            | Where::Null { boolean, .. }
            | Where::Between { boolean, .. }
            | Where::DateLike { boolean, .. }
            | Where::Column { boolean, .. }
            | Where::Nested { boolean, .. }
            | Where::Sub { boolean, .. }
            | Where::Exists { boolean, .. }
            | Where::JsonContains { boolean, .. }
            | Where::JsonContainsKey { boolean, .. }
            | Where::JsonLength { boolean, .. }
            | Where::Fulltext { boolean, .. }
            | Where::Bitwise { boolean, .. }
            | Where::Raw { boolean, .. } => *boolean,
        }
    }

    pub fn with_boolean(mut self, boolean: Boolean) -> Self {
        match &mut self {
            Where::Basic { boolean: b, .. }
            | Where::In { boolean: b, .. }
            | Where::Null { boolean: b, .. }
            | Where::Between { boolean: b, .. }
            | Where::DateLike { boolean: b, .. }
            | Where::Column { boolean: b, .. }
            | Where::Nested { boolean: b, .. }
            | Where::Sub { boolean: b, .. }
            | Where::Exists { boolean: b, .. }
            | Where::JsonContains { boolean: b, .. }
            | Where::JsonContainsKey { boolean: b, .. }
            | Where::JsonLength { boolean: b, .. }
            | Where::Fulltext { boolean: b, .. }
            | Where::Bitwise { boolean: b, .. }
            | Where::Raw { boolean: b, .. } => *b = boolean,
        }
        self
    }
}
