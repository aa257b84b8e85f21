/// The closed set of column types the schema builder understands. Each
/// dialect's `SchemaGrammar` maps every variant to its native SQL type via
/// `type_{variant}` dispatch; an unmapped variant is a compile error, not
/// a silent fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnType {
    Id,
    BigInteger,
    Integer,
    SmallInteger,
    TinyInteger,
    MediumInteger,
    Decimal { total: u16, places: u16 },
    Double,
    Float,
    String { length: u16 },
    Char { length: u16 },
    Text,
    MediumText,
    LongText,
    Boolean,
    Date,
    DateTime,
    Time,
    Timestamp,
    TimestampTz,
    Year,
    Binary,
    Json,
    Jsonb,
    Uuid,
    Ulid,
    Enum { allowed: Vec<String> },
    Set { allowed: Vec<String> },
    ForeignId { references: String },
    Geometry { subtype: Option<String>, srid: Option<u32> },
    IpAddress,
    MacAddress,
}

/// Marks how a generated column's expression is produced, shared between
/// `virtualAs`/`storedAs`/`generatedAs`.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedExpression {
    Virtual(String),
    Stored(String),
    /// Postgres identity column (`generated {always,by default} as identity`).
    Identity { always: bool, sequence_options: Option<String> },
}

/// A concrete attribute bag for one column declaration — every modifier
/// `ColumnDefinition`'s fluent API supports has a named field here, not
/// an open attribute map. Setters consume and
/// return `Self`; `Blueprint::add_implied_commands` observes the result
/// read-only and clears `primary`/`unique`/… after emitting the matching
/// index command.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub default: Option<crate::Value>,
    pub default_raw: Option<String>,
    pub auto_increment: bool,
    pub unsigned: bool,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub comment: Option<String>,
    pub after: Option<String>,
    pub first: bool,
    pub change: bool,
    pub generated: Option<GeneratedExpression>,
    pub use_current: bool,
    pub use_current_on_update: bool,
    pub invisible: bool,
    pub starting_value: Option<i64>,
    pub from_type: Option<ColumnType>,
    pub rename_to: Option<String>,
    /// `true`/`false`/named inline index requests. `None` means unset.
    pub primary: Option<IndexRequest>,
    pub unique: Option<IndexRequest>,
    pub index: Option<IndexRequest>,
    pub fulltext: Option<IndexRequest>,
    pub spatial_index: Option<IndexRequest>,
}

/// An inline fluent index marker on a column: `.primary()` (auto-named),
/// `.primary("name")` (explicit name), or, on a `change()` column,
/// `.primary(false)` (drop).
#[derive(Debug, Clone, PartialEq)]
pub enum IndexRequest {
    Auto,
    Named(String),
    Drop,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: false,
            default: None,
            default_raw: None,
            auto_increment: false,
            unsigned: false,
            charset: None,
            collation: None,
            comment: None,
            after: None,
            first: false,
            change: false,
            generated: None,
            use_current: false,
            use_current_on_update: false,
            invisible: false,
            starting_value: None,
            from_type: None,
            rename_to: None,
            primary: None,
            unique: None,
            index: None,
            fulltext: None,
            spatial_index: None,
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn default(mut self, value: impl Into<crate::Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn default_raw(mut self, sql: impl Into<String>) -> Self {
        self.default_raw = Some(sql.into());
        self
    }

    pub fn auto_increment(mut self, auto_increment: bool) -> Self {
        self.auto_increment = auto_increment;
        self
    }

    pub fn unsigned(mut self, unsigned: bool) -> Self {
        self.unsigned = unsigned;
        self
    }

    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    pub fn collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn after(mut self, column: impl Into<String>) -> Self {
        self.after = Some(column.into());
        self
    }

    pub fn first(mut self) -> Self {
        self.first = true;
        self
    }

    pub fn change(mut self) -> Self {
        self.change = true;
        self
    }

    pub fn virtual_as(mut self, expression: impl Into<String>) -> Self {
        self.generated = Some(GeneratedExpression::Virtual(expression.into()));
        self
    }

    pub fn stored_as(mut self, expression: impl Into<String>) -> Self {
        self.generated = Some(GeneratedExpression::Stored(expression.into()));
        self
    }

    pub fn generated_as(mut self, always: bool, sequence_options: Option<String>) -> Self {
        self.generated = Some(GeneratedExpression::Identity { always, sequence_options });
        self
    }

    pub fn use_current(mut self) -> Self {
        self.use_current = true;
        self
    }

    pub fn use_current_on_update(mut self) -> Self {
        self.use_current_on_update = true;
        self
    }

    pub fn invisible(mut self) -> Self {
        self.invisible = true;
        self
    }

    pub fn starting_value(mut self, value: i64) -> Self {
        self.starting_value = Some(value);
        self
    }

    pub fn from(mut self, column_type: ColumnType) -> Self {
        self.from_type = Some(column_type);
        self
    }

    pub fn rename_to(mut self, name: impl Into<String>) -> Self {
        self.rename_to = Some(name.into());
        self
    }

    pub fn primary(mut self, request: impl Into<IndexRequest>) -> Self {
        self.primary = Some(request.into());
        self
    }

    pub fn unique(mut self, request: impl Into<IndexRequest>) -> Self {
        self.unique = Some(request.into());
        self
    }

    pub fn index(mut self, request: impl Into<IndexRequest>) -> Self {
        self.index = Some(request.into());
        self
    }

    pub fn fulltext(mut self, request: impl Into<IndexRequest>) -> Self {
        self.fulltext = Some(request.into());
        self
    }

    pub fn spatial_index(mut self, request: impl Into<IndexRequest>) -> Self {
        self.spatial_index = Some(request.into());
        self
    }
}

impl From<bool> for IndexRequest {
    fn from(value: bool) -> Self {
        if value { IndexRequest::Auto } else { IndexRequest::Drop }
    }
}

impl From<&str> for IndexRequest {
    fn from(value: &str) -> Self {
        IndexRequest::Named(value.to_string())
    }
}

impl From<String> for IndexRequest {
    fn from(value: String) -> Self {
        IndexRequest::Named(value)
    }
}
