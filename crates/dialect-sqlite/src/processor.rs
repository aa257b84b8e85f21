use sqlforge_core::{ColumnInfo, Error, ForeignKeyInfo, GeneratedKind, IndexInfo, Processor, Result, Row, Value};

/// Normalizes rows read from SQLite's `pragma_table_info`,
/// `pragma_index_list`/`pragma_index_info`, and
/// `pragma_foreign_key_list` table-valued functions into the
/// dialect-independent introspection shape.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteProcessor;

impl Processor for SqliteProcessor {
    fn process_insert_get_id(&self, _rows: &[Row], statement_last_insert_id: Option<i64>) -> Result<i64> {
        statement_last_insert_id
            .ok_or_else(|| Error::logic("insertGetId: driver did not report last_insert_rowid()"))
    }

    fn process_columns(&self, rows: &[Row]) -> Result<Vec<ColumnInfo>> {
        rows.iter()
            .map(|row| {
                let default = text(row, "dflt_value");
                Ok(ColumnInfo {
                    name: text(row, "name").unwrap_or_default(),
                    type_name: text(row, "type").unwrap_or_default(),
                    nullable: !is_true(row, "notnull"),
                    auto_increment: is_true(row, "pk")
                        && text(row, "type").map(|t| t.eq_ignore_ascii_case("integer")).unwrap_or(false),
                    default,
                    collation: None,
                    comment: None,
                    generated: match text(row, "hidden") {
                        Some(hidden) if hidden == "2" => Some(GeneratedKind::Virtual),
                        Some(hidden) if hidden == "3" => Some(GeneratedKind::Stored),
                        _ => None,
                    },
                })
            })
            .collect()
    }

    fn process_indexes(&self, rows: &[Row]) -> Result<Vec<IndexInfo>> {
        rows.iter()
            .map(|row| {
                let columns = text(row, "columns").map(|csv| split_csv(&csv)).unwrap_or_default();
                Ok(IndexInfo {
                    name: text(row, "name").unwrap_or_default(),
                    columns,
                    kind: "btree".to_string(),
                    unique: is_true(row, "unique"),
                    primary: text(row, "origin").map(|origin| origin == "pk").unwrap_or(false),
                })
            })
            .collect()
    }

    fn process_foreign_keys(&self, rows: &[Row]) -> Result<Vec<ForeignKeyInfo>> {
        rows.iter()
            .map(|row| {
                Ok(ForeignKeyInfo {
                    columns: text(row, "from").map(|c| vec![c]).unwrap_or_default(),
                    foreign_schema: None,
                    foreign_table: text(row, "table").unwrap_or_default(),
                    foreign_columns: text(row, "to").map(|c| vec![c]).unwrap_or_default(),
                    on_update: text(row, "on_update"),
                    on_delete: text(row, "on_delete"),
                })
            })
            .collect()
    }
}

fn split_csv(csv: &str) -> Vec<String> {
    csv.split(',').map(|c| c.trim().to_string()).collect()
}

fn text(row: &Row, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::Text(value) => Some(value.clone()),
        Value::Int(value) => Some(value.to_string()),
        _ => None,
    }
}

fn is_true(row: &Row, column: &str) -> bool {
    matches!(row.get(column), Some(Value::Bool(true)) | Some(Value::Int(1)))
}

/// The pragma-based introspection query text behind
/// [`SqliteProcessor::process_columns`], [`process_indexes`] and
/// [`process_foreign_keys`] — SQLite exposes schema metadata as
/// table-valued pragma functions rather than `information_schema` views.
pub mod introspection {
    pub fn column_listing_sql(table: &str) -> String {
        format!("select name, type, \"notnull\", dflt_value, pk, hidden from pragma_table_xinfo('{table}')")
    }

    pub fn index_listing_sql(table: &str) -> String {
        format!(
            "select il.name as name, il.\"unique\" as \"unique\", il.origin as origin, \
                group_concat(ii.name) as columns \
             from pragma_index_list('{table}') il \
             join pragma_index_info(il.name) ii on 1 = 1 \
             group by il.name, il.\"unique\", il.origin"
        )
    }

    pub fn foreign_key_listing_sql(table: &str) -> String {
        format!("select \"table\", \"from\", \"to\", on_update, on_delete from pragma_foreign_key_list('{table}')")
    }
}
