use sqlforge_core::{ColumnInfo, Error, ForeignKeyInfo, GeneratedKind, IndexInfo, Processor, Result, Row, Value};

/// Normalizes rows read from `sys.columns`/`sys.indexes`/`sys.foreign_keys`
/// into the dialect-independent introspection shape. The insert-id path
/// reads the `OUTPUT inserted.{key}` row `compile_insert_get_id` produces.
#[derive(Debug, Default, Clone, Copy)]
pub struct MssqlProcessor;

impl Processor for MssqlProcessor {
    fn process_insert_get_id(&self, rows: &[Row], statement_last_insert_id: Option<i64>) -> Result<i64> {
        if let Some(row) = rows.first() {
            if let Some(value) = row.values().first() {
                if let Some(id) = value_as_i64(value) {
                    return Ok(id);
                }
            }
        }
        statement_last_insert_id
            .ok_or_else(|| Error::logic("insertGetId: no OUTPUT row and no driver-reported identity value"))
    }

    fn process_columns(&self, rows: &[Row]) -> Result<Vec<ColumnInfo>> {
        rows.iter()
            .map(|row| {
                Ok(ColumnInfo {
                    name: text(row, "name").unwrap_or_default(),
                    type_name: text(row, "type_name").unwrap_or_default(),
                    nullable: is_true(row, "is_nullable"),
                    default: text(row, "default_definition"),
                    auto_increment: is_true(row, "is_identity"),
                    collation: text(row, "collation_name"),
                    comment: text(row, "comment"),
                    generated: if is_true(row, "is_computed") {
                        Some(if is_true(row, "is_persisted") { GeneratedKind::Stored } else { GeneratedKind::Virtual })
                    } else if is_true(row, "is_identity") {
                        Some(GeneratedKind::Identity)
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
                Ok(IndexInfo {
                    name: text(row, "name").unwrap_or_default(),
                    columns: text(row, "columns").map(|csv| split_csv(&csv)).unwrap_or_default(),
                    kind: text(row, "type_desc").unwrap_or_else(|| "NONCLUSTERED".to_string()),
                    unique: is_true(row, "is_unique"),
                    primary: is_true(row, "is_primary_key"),
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

fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Int(value) => Some(*value),
        Value::Text(text) => text.parse().ok(),
        _ => None,
    }
}

/// The `sys.*` catalog-view query text behind
/// [`MssqlProcessor::process_columns`], [`process_indexes`] and
/// [`process_foreign_keys`] — SQL Server exposes schema metadata as
/// catalog views rather than `information_schema` alone, since only the
/// views carry identity/computed-column flags.
pub mod introspection {
    pub fn column_listing_sql(table: &str) -> String {
        format!(
            "select c.name, t.name as type_name, c.is_nullable, c.is_identity, c.is_computed, \
                    cc.is_persisted, dc.definition as default_definition, \
                    cast(ep.value as nvarchar(max)) as comment, c.collation_name \
             from sys.columns c \
             join sys.types t on t.user_type_id = c.user_type_id \
             left join sys.computed_columns cc on cc.object_id = c.object_id and cc.column_id = c.column_id \
             left join sys.default_constraints dc on dc.object_id = c.default_object_id \
             left join sys.extended_properties ep on ep.major_id = c.object_id and ep.minor_id = c.column_id \
                 and ep.name = 'MS_Description' \
             where c.object_id = object_id('{table}') \
             order by c.column_id"
        )
    }

    pub fn index_listing_sql(table: &str) -> String {
        format!(
            "select i.name, i.type_desc, i.is_unique, i.is_primary_key, \
                    stuff((select ',' + c.name from sys.index_columns ic \
                           join sys.columns c on c.object_id = ic.object_id and c.column_id = ic.column_id \
                           where ic.object_id = i.object_id and ic.index_id = i.index_id \
                           order by ic.key_ordinal for xml path('')), 1, 1, '') as columns \
             from sys.indexes i \
             where i.object_id = object_id('{table}') and i.name is not null"
        )
    }

    pub fn foreign_key_listing_sql(table: &str) -> String {
        format!(
            "select fk.name, \
                    col_name(fkc.parent_object_id, fkc.parent_column_id) as columns, \
                    schema_name(ro.schema_id) as foreign_schema, \
                    object_name(fkc.referenced_object_id) as foreign_table, \
                    col_name(fkc.referenced_object_id, fkc.referenced_column_id) as foreign_columns, \
                    fk.update_referential_action_desc as on_update, \
                    fk.delete_referential_action_desc as on_delete \
             from sys.foreign_keys fk \
             join sys.foreign_key_columns fkc on fkc.constraint_object_id = fk.object_id \
             join sys.objects ro on ro.object_id = fk.referenced_object_id \
             where fk.parent_object_id = object_id('{table}')"
        )
    }
}
