use sqlforge_core::{ColumnInfo, Error, ForeignKeyInfo, GeneratedKind, IndexInfo, Processor, Result, Row, Value};

/// Normalizes rows read from `pg_catalog`/`information_schema` into the
/// dialect-independent introspection shape. The insert-id path simply
/// reads the `returning` row Postgres always produces for
/// `compile_insert_get_id`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresProcessor;

impl Processor for PostgresProcessor {
    fn process_insert_get_id(&self, rows: &[Row], statement_last_insert_id: Option<i64>) -> Result<i64> {
        if let Some(row) = rows.first() {
            if let Some(value) = row.values().first() {
                if let Some(id) = value_as_i64(value) {
                    return Ok(id);
                }
            }
        }
        statement_last_insert_id
            .ok_or_else(|| Error::logic("insertGetId: no RETURNING row and no driver-reported last insert id"))
    }

    fn process_columns(&self, rows: &[Row]) -> Result<Vec<ColumnInfo>> {
        rows.iter()
            .map(|row| {
                let generated = match text(row, "generation_expression") {
                    Some(expr) if !expr.is_empty() => {
                        if is_true(row, "is_identity") {
                            Some(GeneratedKind::Identity)
                        } else {
                            Some(GeneratedKind::Stored)
                        }
                    }
                    _ => None,
                };
                Ok(ColumnInfo {
                    name: text(row, "column_name").unwrap_or_default(),
                    type_name: text(row, "type_name").unwrap_or_default(),
                    nullable: text(row, "is_nullable").map(|v| v == "YES").unwrap_or(true),
                    default: text(row, "column_default"),
                    auto_increment: is_true(row, "is_identity")
                        || text(row, "column_default").map(|d| d.starts_with("nextval(")).unwrap_or(false),
                    collation: text(row, "collation_name"),
                    comment: text(row, "comment"),
                    generated,
                })
            })
            .collect()
    }

    fn process_indexes(&self, rows: &[Row]) -> Result<Vec<IndexInfo>> {
        rows.iter()
            .map(|row| {
                let columns = text(row, "columns")
                    .map(|csv| csv.split(',').map(|c| c.trim().to_string()).collect())
                    .unwrap_or_default();
                Ok(IndexInfo {
                    name: text(row, "index_name").unwrap_or_default(),
                    columns,
                    kind: text(row, "index_type").unwrap_or_else(|| "btree".to_string()),
                    unique: is_true(row, "is_unique"),
                    primary: is_true(row, "is_primary"),
                })
            })
            .collect()
    }

    fn process_foreign_keys(&self, rows: &[Row]) -> Result<Vec<ForeignKeyInfo>> {
        rows.iter()
            .map(|row| {
                let columns = text(row, "columns").map(|csv| split_csv(&csv)).unwrap_or_default();
                let foreign_columns = text(row, "foreign_columns").map(|csv| split_csv(&csv)).unwrap_or_default();
                Ok(ForeignKeyInfo {
                    columns,
                    foreign_schema: text(row, "foreign_schema"),
                    foreign_table: text(row, "foreign_table").unwrap_or_default(),
                    foreign_columns,
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
    matches!(row.get(column), Some(Value::Bool(true)))
}

fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Int(value) => Some(*value),
        Value::Text(text) => text.parse().ok(),
        _ => None,
    }
}

/// The `information_schema`/`pg_catalog` query text behind
/// [`PostgresProcessor::process_columns`], [`process_indexes`] and
/// [`process_foreign_keys`] — kept alongside the processor since the two
/// always change together.
pub mod introspection {
    pub fn column_listing_sql() -> &'static str {
        "select c.column_name, \
                format_type(a.atttypid, a.atttypmod) as type_name, \
                c.is_nullable, c.column_default, \
                coalesce(a.attidentity <> '', false) as is_identity, \
                col_description(a.attrelid, a.attnum) as comment, \
                co.collname as collation_name, \
                pg_get_expr(ad.adbin, ad.adrelid) as generation_expression \
         from information_schema.columns c \
         join pg_attribute a on a.attname = c.column_name \
         join pg_class cl on cl.oid = a.attrelid and cl.relname = c.table_name \
         left join pg_attrdef ad on ad.adrelid = a.attrelid and ad.adnum = a.attnum \
         left join pg_collation co on co.oid = a.attcollation \
         where c.table_schema = $1 and c.table_name = $2 \
         order by c.ordinal_position"
    }

    pub fn index_listing_sql() -> &'static str {
        "select i.relname as index_name, \
                array_to_string(array_agg(a.attname order by array_position(ix.indkey, a.attnum)), ',') as columns, \
                am.amname as index_type, \
                ix.indisunique as is_unique, \
                ix.indisprimary as is_primary \
         from pg_index ix \
         join pg_class t on t.oid = ix.indrelid \
         join pg_class i on i.oid = ix.indexrelid \
         join pg_am am on am.oid = i.relam \
         join pg_attribute a on a.attrelid = t.oid and a.attnum = any(ix.indkey) \
         where t.relname = $1 \
         group by i.relname, am.amname, ix.indisunique, ix.indisprimary"
    }

    pub fn foreign_key_listing_sql() -> &'static str {
        "select kcu.column_name as columns, \
                ccu.table_schema as foreign_schema, \
                ccu.table_name as foreign_table, \
                ccu.column_name as foreign_columns, \
                rc.update_rule as on_update, \
                rc.delete_rule as on_delete \
         from information_schema.table_constraints tc \
         join information_schema.key_column_usage kcu on kcu.constraint_name = tc.constraint_name \
         join information_schema.constraint_column_usage ccu on ccu.constraint_name = tc.constraint_name \
         join information_schema.referential_constraints rc on rc.constraint_name = tc.constraint_name \
         where tc.constraint_type = 'FOREIGN KEY' and tc.table_name = $1"
    }
}
