use sqlforge_core::{
    Blueprint, BlueprintState, Command, CommandEntry, ColumnDefinition, ColumnType, Error,
    GeneratedExpression, Grammar, Ident, Result, SchemaGrammar,
};

use crate::grammar::SqliteGrammar;

impl SchemaGrammar for SqliteGrammar {
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
        Ok(match &column.column_type {
            ColumnType::Id | ColumnType::BigInteger => "integer".to_string(),
            ColumnType::Integer | ColumnType::SmallInteger | ColumnType::TinyInteger | ColumnType::MediumInteger => {
                "integer".to_string()
            }
            ColumnType::Decimal { total, places } => format!("numeric({total}, {places})"),
            ColumnType::Double | ColumnType::Float => "real".to_string(),
            ColumnType::String { length } => format!("varchar({length})"),
            ColumnType::Char { length } => format!("char({length})"),
            ColumnType::Text | ColumnType::MediumText | ColumnType::LongText => "text".to_string(),
            ColumnType::Boolean => "tinyint(1)".to_string(),
            ColumnType::Date => "date".to_string(),
            ColumnType::DateTime | ColumnType::Timestamp | ColumnType::TimestampTz => "datetime".to_string(),
            ColumnType::Time => "time".to_string(),
            ColumnType::Year => "integer".to_string(),
            ColumnType::Binary => "blob".to_string(),
            ColumnType::Json | ColumnType::Jsonb => "text".to_string(),
            ColumnType::Uuid | ColumnType::Ulid => "varchar(36)".to_string(),
            ColumnType::Enum { .. } | ColumnType::Set { .. } => "varchar(255)".to_string(),
            ColumnType::ForeignId { .. } => "integer".to_string(),
            ColumnType::Geometry { .. } => "geometry".to_string(),
            ColumnType::IpAddress => "varchar(45)".to_string(),
            ColumnType::MacAddress => "varchar(17)".to_string(),
        })
    }

    fn compile_modifiers(&self, column: &ColumnDefinition, _blueprint: &Blueprint) -> Result<Vec<String>> {
        let mut modifiers = Vec::new();

        match &column.generated {
            Some(GeneratedExpression::Virtual(expression)) => {
                modifiers.push(format!("as ({expression})"));
                return Ok(modifiers);
            }
            Some(GeneratedExpression::Stored(expression)) => {
                modifiers.push(format!("as ({expression}) stored"));
                return Ok(modifiers);
            }
            Some(GeneratedExpression::Identity { .. }) => {
                return Err(Error::logic("SQLite does not support SQL-standard identity columns"));
            }
            None => {}
        }

        modifiers.push(if column.nullable { "null".to_string() } else { "not null".to_string() });

        if let Some(raw) = &column.default_raw {
            modifiers.push(format!("default {raw}"));
        } else if let Some(default) = &column.default {
            modifiers.push(format!("default {}", self.quote_literal(default)));
        } else if column.use_current {
            modifiers.push("default current_timestamp".to_string());
        }

        if column.auto_increment && matches!(column.column_type, ColumnType::Id | ColumnType::BigInteger) {
            modifiers.push("primary key autoincrement".to_string());
        }

        if let Some(comment) = &column.comment {
            modifiers.push(format!("-- {comment}"));
        }

        Ok(modifiers)
    }

    fn comment_is_inline(&self) -> bool {
        true
    }

    /// SQLite (≥3.35) has native `ALTER TABLE ... DROP COLUMN`/`RENAME
    /// COLUMN`, but no `ALTER COLUMN`, no dropping a primary key, and no
    /// `ADD`/`DROP FOREIGN KEY`. Batches exactly those (via
    /// [`Command::is_alter_class`]) into one [`Command::Rebuild`] against
    /// the pre-image snapshot, the same "create temp table, copy rows,
    /// swap" strategy every SQLite migration tool uses.
    fn batch_alter_commands(&self, blueprint: &mut Blueprint, pre_image: Option<BlueprintState>) -> Result<()> {
        if blueprint.has_create_command() {
            return Ok(());
        }
        let alter_class: Vec<Command> = blueprint
            .commands
            .iter()
            .filter(|entry| !entry.should_be_skipped && entry.command.is_alter_class())
            .map(|entry| entry.command.clone())
            .collect();
        if alter_class.is_empty() {
            return Ok(());
        }
        let Some(pre_image) = pre_image else {
            return Err(Error::logic("SQLite rebuild-alter requires a live-schema pre_image snapshot"));
        };

        for entry in &mut blueprint.commands {
            if !entry.should_be_skipped && entry.command.is_alter_class() {
                entry.should_be_skipped = true;
            }
        }
        blueprint.commands.push(CommandEntry::new(Command::Rebuild { pre_image, batched: alter_class }));
        Ok(())
    }

    fn compile_rebuild(&self, blueprint: &Blueprint, pre_image: &BlueprintState, batched: &[Command]) -> Result<Vec<String>> {
        let temp_table = format!("__temp__{}", blueprint.table);
        let mut columns = pre_image.columns.clone();
        apply_batched(&mut columns, batched);

        let mut rebuilt = Blueprint::new(temp_table.clone()).create();
        rebuilt.columns = columns.clone();

        let mut statements = self.compile_create(&rebuilt)?;

        let column_names = columns.iter().map(|c| self.wrap_segment(&c.name)).collect::<Vec<_>>().join(", ");
        statements.push(format!(
            "insert into {} ({column_names}) select {column_names} from {}",
            self.wrap_table(&Ident::plain(temp_table.clone())),
            self.wrap_table(&Ident::plain(blueprint.qualified_table()))
        ));
        statements.push(format!("drop table {}", self.wrap_table(&Ident::plain(blueprint.qualified_table()))));
        statements.push(format!(
            "alter table {} rename to {}",
            self.wrap_table(&Ident::plain(temp_table)),
            self.wrap_segment(&blueprint.table)
        ));

        for fk in &pre_image.foreign_keys {
            statements.extend(self.compile_foreign(blueprint, fk)?);
        }

        Ok(statements)
    }
}

fn apply_batched(columns: &mut Vec<ColumnDefinition>, batched: &[Command]) {
    for command in batched {
        match command {
            Command::Change(column) => {
                if let Some(existing) = columns.iter_mut().find(|c| c.name == column.name) {
                    *existing = column.clone();
                }
            }
            Command::DropForeign { .. } | Command::Foreign(_) => {
                // Foreign keys are rebuilt separately from `pre_image.foreign_keys`.
            }
            Command::Index(_) | Command::DropIndex { .. } => {}
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlforge_core::ColumnDefinition;

    #[test]
    fn increments_emits_autoincrement_primary_key() {
        let grammar = SqliteGrammar::default();
        let column = ColumnDefinition::new("id", ColumnType::Id).auto_increment(true);
        let blueprint = Blueprint::new("users");
        let sql = grammar.compile_column_definition(&column, &blueprint).unwrap();
        assert_eq!(sql, "\"id\" integer not null primary key autoincrement");
    }

    #[test]
    fn change_command_batches_into_rebuild() {
        let grammar = SqliteGrammar::default();
        let mut blueprint = Blueprint::new("users");
        let mut email = ColumnDefinition::new("email", ColumnType::String { length: 255 });
        email.change = true;
        blueprint.commands.push(CommandEntry::new(Command::Change(email)));

        let pre_image = BlueprintState {
            columns: vec![ColumnDefinition::new("email", ColumnType::String { length: 100 })],
            indexes: vec![],
            foreign_keys: vec![],
        };
        let statements = blueprint.to_sql(&grammar, Some(pre_image)).unwrap();
        assert!(statements[0].starts_with("create table \"__temp__users\""), "{statements:?}");
        assert!(statements.iter().any(|s| s.starts_with("alter table \"__temp__users\" rename to \"users\"")));
    }

    #[test]
    fn temporary_blueprint_emits_create_temporary_table() {
        let grammar = SqliteGrammar::default();
        let mut blueprint = Blueprint::new("scratch").temporary();
        blueprint.columns.push(ColumnDefinition::new("id", ColumnType::Integer));
        let statements = grammar.compile_create(&blueprint).unwrap();
        assert_eq!(statements, vec!["create temporary table \"scratch\" (\"id\" integer not null)"]);
    }
}
