use sqlforge_core::{
    Blueprint, ColumnDefinition, ColumnType, Error, GeneratedExpression, Grammar, Ident, Result,
    SchemaGrammar,
};

use crate::grammar::PostgresGrammar;

impl SchemaGrammar for PostgresGrammar {
    /// PostgreSQL has no table-level charset/engine, only `temporary`.
    fn compile_create(&self, blueprint: &Blueprint) -> Result<Vec<String>> {
        let columns = blueprint
            .columns
            .iter()
            .map(|column| self.compile_column_definition(column, blueprint))
            .collect::<Result<Vec<_>>>()?;
        Ok(vec![format!(
            "{} table {} ({})",
            if blueprint.temporary { "create temporary" } else { "create" },
            self.wrap_table(&Ident::plain(blueprint.qualified_table())),
            columns.join(", ")
        )])
    }

    fn compile_column_type(&self, column: &ColumnDefinition) -> Result<String> {
        match &column.column_type {
            ColumnType::Id => Ok(serial_or_plain(column, "bigserial", "bigint")),
            ColumnType::BigInteger => Ok(serial_or_plain(column, "bigserial", "bigint")),
            ColumnType::Integer => Ok(serial_or_plain(column, "serial", "integer")),
            ColumnType::SmallInteger => Ok(serial_or_plain(column, "smallserial", "smallint")),
            ColumnType::TinyInteger => Ok("smallint".to_string()),
            ColumnType::MediumInteger => Ok("integer".to_string()),
            ColumnType::Decimal { total, places } => Ok(format!("numeric({total}, {places})")),
            ColumnType::Double => Ok("double precision".to_string()),
            ColumnType::Float => Ok("real".to_string()),
            ColumnType::String { length } => Ok(format!("varchar({length})")),
            ColumnType::Char { length } => Ok(format!("char({length})")),
            ColumnType::Text | ColumnType::MediumText | ColumnType::LongText => Ok("text".to_string()),
            ColumnType::Boolean => Ok("boolean".to_string()),
            ColumnType::Date => Ok("date".to_string()),
            ColumnType::DateTime => Ok("timestamp(0) without time zone".to_string()),
            ColumnType::Time => Ok("time(0) without time zone".to_string()),
            ColumnType::Timestamp => Ok("timestamp(0) without time zone".to_string()),
            ColumnType::TimestampTz => Ok("timestamp(0) with time zone".to_string()),
            ColumnType::Year => Ok("integer".to_string()),
            ColumnType::Binary => Ok("bytea".to_string()),
            ColumnType::Json => Ok("json".to_string()),
            ColumnType::Jsonb => Ok("jsonb".to_string()),
            ColumnType::Uuid => Ok("uuid".to_string()),
            ColumnType::Ulid => Ok("char(26)".to_string()),
            ColumnType::Enum { allowed } => {
                let quoted = allowed.iter().map(|value| self.quote_string(value)).collect::<Vec<_>>().join(", ");
                Ok(format!("varchar(255) check ({} in ({quoted}))", self.wrap_segment(&column.name)))
            }
            ColumnType::Set { .. } => Err(Error::logic("SET columns are not supported by PostgreSQL")),
            ColumnType::ForeignId { .. } => Ok("bigint".to_string()),
            ColumnType::Geometry { subtype, srid } => Ok(match (subtype, srid) {
                (Some(subtype), Some(srid)) => format!("geometry({subtype}, {srid})"),
                (Some(subtype), None) => format!("geometry({subtype})"),
                _ => "geometry".to_string(),
            }),
            ColumnType::IpAddress => Ok("inet".to_string()),
            ColumnType::MacAddress => Ok("macaddr".to_string()),
        }
    }

    fn compile_modifiers(&self, column: &ColumnDefinition, _blueprint: &Blueprint) -> Result<Vec<String>> {
        let mut modifiers = Vec::new();

        if let Some(collation) = &column.collation {
            modifiers.push(format!("collate {}", self.wrap_segment(collation)));
        }

        modifiers.push(if column.nullable { "null".to_string() } else { "not null".to_string() });

        if let Some(raw) = &column.default_raw {
            modifiers.push(format!("default {raw}"));
        } else if let Some(default) = &column.default {
            modifiers.push(format!("default {}", self.quote_literal(default)));
        } else if column.use_current {
            modifiers.push("default current_timestamp(0)".to_string());
        }

        match &column.generated {
            Some(GeneratedExpression::Virtual(_)) => {
                return Err(Error::logic("PostgreSQL does not support virtual generated columns"));
            }
            Some(GeneratedExpression::Stored(expression)) => {
                modifiers.push(format!("generated always as ({expression}) stored"));
            }
            Some(GeneratedExpression::Identity { always, sequence_options }) => {
                let kind = if *always { "always" } else { "by default" };
                match sequence_options {
                    Some(options) => modifiers.push(format!("generated {kind} as identity ({options})")),
                    None => modifiers.push(format!("generated {kind} as identity")),
                }
            }
            None => {}
        }

        if column.auto_increment && is_serial_eligible(&column.column_type) {
            modifiers.push("primary key".to_string());
        }

        Ok(modifiers)
    }

    fn comment_is_inline(&self) -> bool {
        false
    }

    fn compile_auto_increment_starting_value(&self, blueprint: &Blueprint, column: &str, value: i64) -> Result<Vec<String>> {
        Ok(vec![format!("alter sequence {}_{column}_seq restart with {value}", blueprint.qualified_table())])
    }
}

fn is_serial_eligible(column_type: &ColumnType) -> bool {
    matches!(
        column_type,
        ColumnType::Id | ColumnType::BigInteger | ColumnType::Integer | ColumnType::SmallInteger
    )
}

fn serial_or_plain(column: &ColumnDefinition, serial: &str, plain: &str) -> String {
    if column.auto_increment { serial.to_string() } else { plain.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlforge_core::ColumnDefinition;

    #[test]
    fn increments_maps_to_serial_with_inline_primary_key() {
        let grammar = PostgresGrammar::default();
        let column = ColumnDefinition::new("id", ColumnType::Integer).auto_increment(true).unsigned(true);
        let blueprint = Blueprint::new("users");
        let sql = grammar.compile_column_definition(&column, &blueprint).unwrap();
        assert_eq!(sql, "\"id\" serial not null primary key");
    }

    #[test]
    fn string_column_with_collation() {
        let grammar = PostgresGrammar::default();
        let column = ColumnDefinition::new("name", ColumnType::String { length: 255 }).collation("nb_NO.utf8");
        let blueprint = Blueprint::new("users");
        let sql = grammar.compile_column_definition(&column, &blueprint).unwrap();
        assert_eq!(sql, "\"name\" varchar(255) collate \"nb_NO.utf8\" not null");
    }

    #[test]
    fn temporary_blueprint_emits_create_temporary_table() {
        let grammar = PostgresGrammar::default();
        let mut blueprint = Blueprint::new("scratch").temporary();
        blueprint.columns.push(ColumnDefinition::new("id", ColumnType::Integer));
        let statements = grammar.compile_create(&blueprint).unwrap();
        assert_eq!(statements, vec!["create temporary table \"scratch\" (\"id\" integer not null)"]);
    }
}
