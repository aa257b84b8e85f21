use sqlforge_core::{
    Blueprint, ColumnDefinition, ColumnType, Error, GeneratedExpression, Grammar, Ident, IndexKind,
    Result, SchemaGrammar,
};

use crate::grammar::MssqlGrammar;

impl SchemaGrammar for MssqlGrammar {
    /// SQL Server has no `CREATE TEMPORARY TABLE`; a temp table is just a
    /// regular table whose name is prefixed with `#`.
    fn compile_create(&self, blueprint: &Blueprint) -> Result<Vec<String>> {
        let columns = blueprint
            .columns
            .iter()
            .map(|column| self.compile_column_definition(column, blueprint))
            .collect::<Result<Vec<_>>>()?;
        let table_name = if blueprint.temporary {
            format!("#{}", blueprint.qualified_table())
        } else {
            blueprint.qualified_table()
        };
        Ok(vec![format!(
            "create table {} ({})",
            self.wrap_table(&Ident::plain(table_name)),
            columns.join(", ")
        )])
    }

    fn compile_column_type(&self, column: &ColumnDefinition) -> Result<String> {
        Ok(match &column.column_type {
            ColumnType::Id | ColumnType::BigInteger => "bigint".to_string(),
            ColumnType::Integer => "int".to_string(),
            ColumnType::SmallInteger => "smallint".to_string(),
            ColumnType::TinyInteger => "tinyint".to_string(),
            ColumnType::MediumInteger => "int".to_string(),
            ColumnType::Decimal { total, places } => format!("decimal({total}, {places})"),
            ColumnType::Double => "float".to_string(),
            ColumnType::Float => "real".to_string(),
            ColumnType::String { length } => format!("nvarchar({length})"),
            ColumnType::Char { length } => format!("nchar({length})"),
            ColumnType::Text | ColumnType::MediumText | ColumnType::LongText => "nvarchar(max)".to_string(),
            ColumnType::Boolean => "bit".to_string(),
            ColumnType::Date => "date".to_string(),
            ColumnType::DateTime => "datetime2".to_string(),
            ColumnType::Time => "time".to_string(),
            ColumnType::Timestamp => "datetime2".to_string(),
            ColumnType::TimestampTz => "datetimeoffset".to_string(),
            ColumnType::Year => "int".to_string(),
            ColumnType::Binary => "varbinary(max)".to_string(),
            ColumnType::Json => "nvarchar(max)".to_string(),
            ColumnType::Jsonb => "nvarchar(max)".to_string(),
            ColumnType::Uuid => "uniqueidentifier".to_string(),
            ColumnType::Ulid => "nchar(26)".to_string(),
            ColumnType::Enum { allowed } => {
                let quoted = allowed.iter().map(|value| self.quote_string(value)).collect::<Vec<_>>().join(", ");
                format!("nvarchar(255) check ({} in ({quoted}))", self.wrap_segment(&column.name))
            }
            ColumnType::Set { .. } => return Err(Error::logic("SET columns are not supported by SQL Server")),
            ColumnType::ForeignId { .. } => "bigint".to_string(),
            ColumnType::Geometry { .. } => "geometry".to_string(),
            ColumnType::IpAddress => "nvarchar(45)".to_string(),
            ColumnType::MacAddress => "nvarchar(17)".to_string(),
        })
    }

    fn compile_modifiers(&self, column: &ColumnDefinition, _blueprint: &Blueprint) -> Result<Vec<String>> {
        let mut modifiers = Vec::new();

        if let Some(collation) = &column.collation {
            modifiers.push(format!("collate {collation}"));
        }

        match &column.generated {
            Some(GeneratedExpression::Virtual(expression)) => {
                modifiers.push(format!("as ({expression})"));
                return Ok(modifiers);
            }
            Some(GeneratedExpression::Stored(expression)) => {
                modifiers.push(format!("as ({expression}) persisted"));
                return Ok(modifiers);
            }
            Some(GeneratedExpression::Identity { .. }) => {
                return Err(Error::logic("SQL Server does not support SQL-standard identity column syntax; use auto_increment"));
            }
            None => {}
        }

        modifiers.push(if column.nullable { "null".to_string() } else { "not null".to_string() });

        if column.auto_increment && is_identity_eligible(&column.column_type) {
            modifiers.push("identity".to_string());
        }

        if let Some(raw) = &column.default_raw {
            modifiers.push(format!("default {raw}"));
        } else if let Some(default) = &column.default {
            modifiers.push(format!("default {}", self.quote_literal(default)));
        } else if column.use_current {
            modifiers.push("default getdate()".to_string());
        }

        Ok(modifiers)
    }

    fn comment_is_inline(&self) -> bool {
        false
    }

    /// SQL Server exposes no `comment on column`; extended properties are
    /// the native mechanism, set through `sp_addextendedproperty` rather
    /// than inline DDL.
    fn compile_column_comment(&self, blueprint: &Blueprint, column: &str, comment: &str) -> Result<Vec<String>> {
        Ok(vec![format!(
            "exec sp_addextendedproperty 'MS_Description', {}, 'SCHEMA', 'dbo', 'TABLE', {}, 'COLUMN', {}",
            self.quote_string(comment),
            self.quote_string(&blueprint.qualified_table()),
            self.wrap_segment(column)
        )])
    }

    /// SQL Server has no `ALTER SEQUENCE`; an `IDENTITY` seed can only be
    /// set at column-creation time (`IDENTITY(seed, increment)`), so a
    /// starting value on an already-created table requires `DBCC
    /// CHECKIDENT`.
    fn compile_auto_increment_starting_value(&self, blueprint: &Blueprint, _column: &str, value: i64) -> Result<Vec<String>> {
        Ok(vec![format!(
            "dbcc checkident ('{}', reseed, {})",
            blueprint.qualified_table(),
            value - 1
        )])
    }

    fn compile_index(&self, blueprint: &Blueprint, index: &sqlforge_core::IndexCommand) -> Result<Vec<String>> {
        let table = self.wrap_table(&Ident::plain(blueprint.qualified_table()));
        let columns = index.columns.iter().map(|c| self.wrap_segment(c)).collect::<Vec<_>>().join(", ");
        let name = self.wrap_segment(&index.name);
        match index.kind {
            IndexKind::Primary => Ok(vec![format!("alter table {table} add primary key ({columns})")]),
            IndexKind::Unique => Ok(vec![format!("create unique index {name} on {table} ({columns})")]),
            IndexKind::Index => Ok(vec![format!("create index {name} on {table} ({columns})")]),
            IndexKind::Fulltext => {
                Err(Error::logic("fulltext indexes require a full-text catalog and are not inferred by this dialect"))
            }
            IndexKind::Spatial => Ok(vec![format!("create spatial index {name} on {table} ({columns})")]),
        }
    }

    /// SQL Server drops an index with `drop index {index} on {table}`
    /// rather than a bare `drop index {name}`.
    fn compile_drop_index(&self, blueprint: &Blueprint, kind: IndexKind, name: &str) -> Result<Vec<String>> {
        let table = self.wrap_table(&Ident::plain(blueprint.qualified_table()));
        let name = self.wrap_segment(name);
        match kind {
            IndexKind::Primary => Ok(vec![format!("alter table {table} drop constraint {name}")]),
            IndexKind::Unique => Ok(vec![format!("drop index {name} on {table}")]),
            _ => Ok(vec![format!("drop index {name} on {table}")]),
        }
    }
}

fn is_identity_eligible(column_type: &ColumnType) -> bool {
    matches!(
        column_type,
        ColumnType::Id | ColumnType::BigInteger | ColumnType::Integer | ColumnType::SmallInteger | ColumnType::TinyInteger
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlforge_core::ColumnDefinition;

    #[test]
    fn increments_maps_to_bigint_identity() {
        let grammar = MssqlGrammar::default();
        let column = ColumnDefinition::new("id", ColumnType::Id).auto_increment(true);
        let blueprint = Blueprint::new("users");
        let sql = grammar.compile_column_definition(&column, &blueprint).unwrap();
        assert_eq!(sql, "[id] bigint not null identity");
    }

    #[test]
    fn string_column_with_collation() {
        let grammar = MssqlGrammar::default();
        let column = ColumnDefinition::new("name", ColumnType::String { length: 255 }).collation("Latin1_General_CI_AS");
        let blueprint = Blueprint::new("users");
        let sql = grammar.compile_column_definition(&column, &blueprint).unwrap();
        assert_eq!(sql, "[name] nvarchar(255) collate Latin1_General_CI_AS not null");
    }

    #[test]
    fn identity_generated_column_is_rejected() {
        let grammar = MssqlGrammar::default();
        let mut column = ColumnDefinition::new("id", ColumnType::BigInteger);
        column.generated = Some(GeneratedExpression::Identity { always: true, sequence_options: None });
        let blueprint = Blueprint::new("users");
        let error = grammar.compile_column_definition(&column, &blueprint).unwrap_err();
        assert!(error.to_string().contains("identity"), "{error}");
    }

    #[test]
    fn drop_index_qualifies_with_on_table() {
        let grammar = MssqlGrammar::default();
        let blueprint = Blueprint::new("users");
        let statements = grammar.compile_drop_index(&blueprint, IndexKind::Index, "users_email_index").unwrap();
        assert_eq!(statements, vec!["drop index [users_email_index] on [users]"]);
    }

    #[test]
    fn temporary_blueprint_prefixes_table_name_with_hash() {
        let grammar = MssqlGrammar::default();
        let mut blueprint = Blueprint::new("scratch").temporary();
        blueprint.columns.push(ColumnDefinition::new("id", ColumnType::Integer));
        let statements = grammar.compile_create(&blueprint).unwrap();
        assert_eq!(statements, vec!["create table [#scratch] ([id] int not null)"]);
    }
}
