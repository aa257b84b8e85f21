use sqlforge_core::{ColumnInfo, Error, ForeignKeyInfo, GeneratedKind, IndexInfo, Processor, Result, Row, Value};

/// Normalizes rows read from `information_schema`. The insert-id path uses
/// the driver-reported `last_insert_id()` since MySQL has no `RETURNING`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MysqlProcessor;

impl Processor for MysqlProcessor {
    fn process_insert_get_id(&self, _rows: &[Row], statement_last_insert_id: Option<i64>) -> Result<i64> {
        statement_last_insert_id.ok_or_else(|| Error::logic("insertGetId: driver reported no last_insert_id"))
    }

    fn process_columns(&self, rows: &[Row]) -> Result<Vec<ColumnInfo>> {
        rows.iter()
            .map(|row| {
                let extra = text(row, "extra").unwrap_or_default();
                Ok(ColumnInfo {
                    name: text(row, "column_name").unwrap_or_default(),
                    type_name: text(row, "column_type").unwrap_or_default(),
                    nullable: text(row, "is_nullable").map(|v| v == "YES").unwrap_or(true),
                    default: text(row, "column_default"),
                    auto_increment: extra.contains("auto_increment"),
                    collation: text(row, "collation_name"),
                    comment: text(row, "column_comment").filter(|c| !c.is_empty()),
                    generated: if extra.contains("VIRTUAL GENERATED") {
                        Some(GeneratedKind::Virtual)
                    } else if extra.contains("STORED GENERATED") {
                        Some(GeneratedKind::Stored)
                    } else {
                        None
                    },
                })
            })
            .collect()
    }

    fn process_indexes(&self, rows: &[Row]) -> Result<Vec<IndexInfo>> {
        rows.iter()
            .map(|row| {
                let name = text(row, "index_name").unwrap_or_default();
                Ok(IndexInfo {
                    primary: name == "PRIMARY",
                    unique: !is_true(row, "non_unique"),
                    columns: text(row, "columns").map(|csv| split_csv(&csv)).unwrap_or_default(),
                    kind: text(row, "index_type").unwrap_or_else(|| "BTREE".to_string()),
                    name,
                })
            })
            .collect()
    }

    fn process_foreign_keys(&self, rows: &[Row]) -> Result<Vec<ForeignKeyInfo>> {
        rows.iter()
            .map(|row| {
                Ok(ForeignKeyInfo {
                    columns: text(row, "columns").map(|csv| split_csv(&csv)).unwrap_or_default(),
                    foreign_schema: text(row, "foreign_schema"),
                    foreign_table: text(row, "foreign_table").unwrap_or_default(),
                    foreign_columns: text(row, "foreign_columns").map(|csv| split_csv(&csv)).unwrap_or_default(),
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
