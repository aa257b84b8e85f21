use sqlforge_core::{
    Blueprint, ColumnDefinition, ColumnType, Error, GeneratedExpression, Grammar, Ident, Result,
    SchemaGrammar,
};

use crate::grammar::MysqlGrammar;

impl SchemaGrammar for MysqlGrammar {
    /// `create [temporary] table ... (cols) default character set ...
    /// collate ... engine = ...` — MySQL hangs table-level charset,
    /// collation and storage engine off the end of `CREATE TABLE` rather
    /// than as column modifiers.
    fn compile_create(&self, blueprint: &Blueprint) -> Result<Vec<String>> {
        let columns = blueprint
            .columns
            .iter()
            .map(|column| self.compile_column_definition(column, blueprint))
            .collect::<Result<Vec<_>>>()?;
        let mut sql = format!(
            "{} table {} ({})",
            if blueprint.temporary { "create temporary" } else { "create" },
            self.wrap_table(&Ident::plain(blueprint.qualified_table())),
            columns.join(", ")
        );
        if let Some(charset) = &blueprint.charset {
            sql.push_str(&format!(" default character set {charset}"));
        }
        if let Some(collation) = &blueprint.collation {
            sql.push_str(&format!(" collate {}", self.quote_string(collation)));
        }
        if let Some(engine) = &blueprint.engine {
            sql.push_str(&format!(" engine = {engine}"));
        }
        Ok(vec![sql])
    }

    fn compile_column_type(&self, column: &ColumnDefinition) -> Result<String> {
        let unsigned = if column.unsigned { " unsigned" } else { "" };
        Ok(match &column.column_type {
            ColumnType::Id | ColumnType::BigInteger => format!("bigint{unsigned}"),
            ColumnType::Integer => format!("int{unsigned}"),
            ColumnType::SmallInteger => format!("smallint{unsigned}"),
            ColumnType::TinyInteger => format!("tinyint{unsigned}"),
            ColumnType::MediumInteger => format!("mediumint{unsigned}"),
            ColumnType::Decimal { total, places } => format!("decimal({total}, {places}){unsigned}"),
            ColumnType::Double => format!("double{unsigned}"),
            ColumnType::Float => format!("float{unsigned}"),
            ColumnType::String { length } => format!("varchar({length})"),
            ColumnType::Char { length } => format!("char({length})"),
            ColumnType::Text => "text".to_string(),
            ColumnType::MediumText => "mediumtext".to_string(),
            ColumnType::LongText => "longtext".to_string(),
            ColumnType::Boolean => "tinyint(1)".to_string(),
            ColumnType::Date => "date".to_string(),
            ColumnType::DateTime => "datetime".to_string(),
            ColumnType::Time => "time".to_string(),
            ColumnType::Timestamp => "timestamp".to_string(),
            ColumnType::TimestampTz => "timestamp".to_string(),
            ColumnType::Year => "year".to_string(),
            ColumnType::Binary => "blob".to_string(),
            ColumnType::Json => "json".to_string(),
            ColumnType::Jsonb => "json".to_string(),
            ColumnType::Uuid => "char(36)".to_string(),
            ColumnType::Ulid => "char(26)".to_string(),
            ColumnType::Enum { allowed } => {
                format!("enum({})", allowed.iter().map(|value| self.quote_string(value)).collect::<Vec<_>>().join(", "))
            }
            ColumnType::Set { allowed } => {
                format!("set({})", allowed.iter().map(|value| self.quote_string(value)).collect::<Vec<_>>().join(", "))
            }
            ColumnType::ForeignId { .. } => format!("bigint{unsigned}"),
            ColumnType::Geometry { subtype, .. } => subtype.clone().unwrap_or_else(|| "geometry".to_string()),
            ColumnType::IpAddress => "varchar(45)".to_string(),
            ColumnType::MacAddress => "varchar(17)".to_string(),
        })
    }

    fn compile_modifiers(&self, column: &ColumnDefinition, blueprint: &Blueprint) -> Result<Vec<String>> {
        // MySQL's fixed modifier order: Charset, Collate, VirtualAs,
        // StoredAs, Nullable, Default, OnUpdate, Invisible, Increment,
        // Comment, After, First.
        let mut modifiers = Vec::new();

        if let Some(charset) = &column.charset {
            modifiers.push(format!("character set {charset}"));
        }
        if let Some(collation) = &column.collation {
            modifiers.push(format!("collate {collation}"));
        }

        match &column.generated {
            Some(GeneratedExpression::Virtual(expression)) => {
                modifiers.push(format!("as ({expression}) virtual"));
            }
            Some(GeneratedExpression::Stored(expression)) => {
                modifiers.push(format!("as ({expression}) stored"));
            }
            Some(GeneratedExpression::Identity { .. }) => {
                return Err(Error::logic("MySQL does not support SQL-standard identity columns"));
            }
            None => {}
        }

        if column.generated.is_none() {
            modifiers.push(if column.nullable { "null".to_string() } else { "not null".to_string() });

            if let Some(raw) = &column.default_raw {
                modifiers.push(format!("default {raw}"));
            } else if let Some(default) = &column.default {
                modifiers.push(format!("default {}", self.quote_literal(default)));
            } else if column.use_current {
                modifiers.push("default current_timestamp".to_string());
            }

            if column.use_current_on_update {
                modifiers.push("on update current_timestamp".to_string());
            }
        }

        if column.invisible {
            modifiers.push("invisible".to_string());
        }

        if column.auto_increment
            && matches!(column.column_type, ColumnType::Id | ColumnType::BigInteger | ColumnType::Integer)
        {
            modifiers.push("auto_increment".to_string());
            if !self.skip_inline_primary_for_autoincrement_change(column) {
                modifiers.push("primary key".to_string());
            }
        }

        if let Some(comment) = &column.comment {
            modifiers.push(format!("comment {}", self.quote_string(comment)));
        }

        if let Some(after) = &column.after {
            modifiers.push(format!("after {}", self.wrap_segment(after)));
        } else if column.first {
            modifiers.push("first".to_string());
        }

        let _ = blueprint;
        Ok(modifiers)
    }

    fn comment_is_inline(&self) -> bool {
        true
    }

    fn skip_inline_primary_for_autoincrement_change(&self, column: &ColumnDefinition) -> bool {
        column.change
    }

    fn compile_auto_increment_starting_value(&self, blueprint: &Blueprint, _column: &str, value: i64) -> Result<Vec<String>> {
        Ok(vec![format!("alter table {} auto_increment = {value}", self.wrap_table(&sqlforge_core::Ident::plain(blueprint.qualified_table())))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlforge_core::ColumnDefinition;

    #[test]
    fn increments_emits_auto_increment_primary_key() {
        let grammar = MysqlGrammar::default();
        let column = ColumnDefinition::new("id", ColumnType::Id).auto_increment(true).unsigned(true);
        let blueprint = Blueprint::new("users");
        let sql = grammar.compile_column_definition(&column, &blueprint).unwrap();
        assert_eq!(sql, "`id` bigint unsigned not null auto_increment primary key");
    }

    #[test]
    fn string_column_with_charset_and_collation() {
        let grammar = MysqlGrammar::default();
        let column = ColumnDefinition::new("name", ColumnType::String { length: 255 })
            .charset("utf8mb4")
            .collation("utf8mb4_unicode_ci");
        let blueprint = Blueprint::new("users");
        let sql = grammar.compile_column_definition(&column, &blueprint).unwrap();
        assert_eq!(sql, "`name` varchar(255) character set utf8mb4 collate utf8mb4_unicode_ci not null");
    }

    #[test]
    fn identity_generated_column_is_rejected() {
        let grammar = MysqlGrammar::default();
        let mut column = ColumnDefinition::new("id", ColumnType::BigInteger);
        column.generated = Some(GeneratedExpression::Identity { always: true, sequence_options: None });
        let blueprint = Blueprint::new("users");
        let error = grammar.compile_column_definition(&column, &blueprint).unwrap_err();
        assert!(error.to_string().contains("identity"), "{error}");
    }

    #[test]
    fn create_table_appends_charset_collation_and_engine() {
        let grammar = MysqlGrammar::default();
        let mut blueprint = Blueprint::new("users").charset("utf8mb4").collation("utf8mb4_unicode_ci").engine("InnoDB");
        blueprint.columns.push(ColumnDefinition::new("id", ColumnType::Id).auto_increment(true).unsigned(true));
        let statements = grammar.compile_create(&blueprint).unwrap();
        assert_eq!(
            statements,
            vec![
                "create table `users` (`id` bigint unsigned not null auto_increment primary key) \
                 default character set utf8mb4 collate 'utf8mb4_unicode_ci' engine = InnoDB"
            ]
        );
    }

    #[test]
    fn temporary_blueprint_emits_create_temporary_table() {
        let grammar = MysqlGrammar::default();
        let mut blueprint = Blueprint::new("scratch").temporary();
        blueprint.columns.push(ColumnDefinition::new("id", ColumnType::Integer));
        let statements = grammar.compile_create(&blueprint).unwrap();
        assert!(statements[0].starts_with("create temporary table `scratch`"), "{statements:?}");
    }
}
