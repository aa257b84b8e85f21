use crate::{Result, Row, Value};

/// How a column's value is produced. Introspection queries can surface
/// both a generic type name and a generation-kind flag for the same
/// column; this collapses them into one surface instead of exposing both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedKind {
    Virtual,
    Stored,
    Identity,
}

/// The normalized shape of one introspected column, independent of which
/// dialect's information_schema/pragma it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub type_name: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub auto_increment: bool,
    pub collation: Option<String>,
    pub comment: Option<String>,
    pub generated: Option<GeneratedKind>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexInfo {
    pub name: String,
    pub columns: Vec<String>,
    pub kind: String,
    pub unique: bool,
    pub primary: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyInfo {
    pub columns: Vec<String>,
    pub foreign_schema: Option<String>,
    pub foreign_table: String,
    pub foreign_columns: Vec<String>,
    pub on_update: Option<String>,
    pub on_delete: Option<String>,
}

/// Post-processes driver results: `insertGetId` id extraction and
/// introspection-shape normalization. Each dialect crate
/// supplies one implementation grounded in how that driver actually
/// reports these things (a `returning` row on Postgres, `last_insert_id()`
/// on MySQL, `last_insert_rowid()` on SQLite).
pub trait Processor {
    fn process_insert_get_id(&self, rows: &[Row], statement_last_insert_id: Option<i64>) -> Result<i64>;
    fn process_columns(&self, rows: &[Row]) -> Result<Vec<ColumnInfo>>;
    fn process_indexes(&self, rows: &[Row]) -> Result<Vec<IndexInfo>>;
    fn process_foreign_keys(&self, rows: &[Row]) -> Result<Vec<ForeignKeyInfo>>;
}

pub(crate) fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Int(value) => Some(*value),
        Value::Text(text) => text.parse().ok(),
        _ => None,
    }
}
