use crate::{
    Error, Grammar, Ident, Result,
    schema::{
        Blueprint, BlueprintState, Command, ColumnDefinition, ForeignKeyCommand, IndexCommand,
        IndexKind,
    },
};

/// Compiles a [`Blueprint`] into an ordered DDL statement list.
/// Every method has a default body; dialects override the ones
/// where their DDL actually diverges — column type mapping, modifier
/// order, and whichever alter-class commands their engine lacks native
/// support for.
pub trait SchemaGrammar: Grammar {
    /// Renders one column's type, e.g. `varchar(255)`, `serial`,
    /// `nvarchar(255)`. The one method every dialect must supply — there
    /// is no sane ANSI default across four engines this different.
    fn compile_column_type(&self, column: &ColumnDefinition) -> Result<String>;

    /// Renders this column's modifiers, already in the dialect's fixed
    /// order (MySQL: `Unsigned, Charset, Collate,
    /// VirtualAs, StoredAs, Nullable, Default, OnUpdate, Invisible,
    /// Increment, Comment, After, First`; Postgres's shorter list; …).
    fn compile_modifiers(&self, column: &ColumnDefinition, blueprint: &Blueprint) -> Result<Vec<String>>;

    fn compile_column_definition(&self, column: &ColumnDefinition, blueprint: &Blueprint) -> Result<String> {
        let mut sql = format!("{} {}", self.wrap_segment(&column.name), self.compile_column_type(column)?);
        for modifier in self.compile_modifiers(column, blueprint)? {
            if !modifier.is_empty() {
                sql.push(' ');
                sql.push_str(&modifier);
            }
        }
        Ok(sql)
    }

    /// `true` when this dialect renders `comment '...'` inline as a column
    /// modifier (MySQL, SQLite) rather than as a separate
    /// `comment on column` statement (Postgres).
    fn comment_is_inline(&self) -> bool {
        true
    }

    /// `true` when an `autoIncrement` column marked `.change()` should not
    /// also emit a standalone `primary` command, because this dialect
    /// inlines the primary key into the column's own DDL (MySQL).
    fn skip_inline_primary_for_autoincrement_change(&self, column: &ColumnDefinition) -> bool {
        let _ = column;
        false
    }

    /// `addFluentCommands`: appends dialect-specific commands derived from
    /// plain column fields — `startingValue` → `AutoIncrementStartingValue`,
    /// and (when [`SchemaGrammar::comment_is_inline`] is false) `comment` →
    /// `ColumnComment`.
    fn add_fluent_commands(&self, blueprint: &mut Blueprint) {
        let starting_values: Vec<(String, i64)> = blueprint
            .columns
            .iter()
            .filter_map(|c| c.starting_value.map(|v| (c.name.clone(), v)))
            .collect();
        for (column, value) in starting_values {
            blueprint
                .commands
                .push(crate::schema::CommandEntry::new(Command::AutoIncrementStartingValue { column, value }));
        }

        if !self.comment_is_inline() {
            let comments: Vec<(String, String)> = blueprint
                .columns
                .iter()
                .filter_map(|c| c.comment.clone().map(|comment| (c.name.clone(), comment)))
                .collect();
            for (column, comment) in comments {
                blueprint
                    .commands
                    .push(crate::schema::CommandEntry::new(Command::ColumnComment { column, comment }));
            }
        }
    }

    /// SQLite's `addAlterCommands`: groups consecutive alter-class
    /// commands lacking a native `ALTER` into a single `Command::Rebuild`
    /// against `pre_image`. A no-op for dialects with full native `ALTER`
    /// support.
    fn batch_alter_commands(&self, blueprint: &mut Blueprint, pre_image: Option<BlueprintState>) -> Result<()> {
        let _ = (blueprint, pre_image);
        Ok(())
    }

    fn compile_command(&self, blueprint: &Blueprint, command: &Command) -> Result<Vec<String>> {
        match command {
            Command::Create => self.compile_create(blueprint),
            Command::Add(column) => self.compile_add(blueprint, column),
            Command::Change(column) => self.compile_change(blueprint, column),
            Command::RenameColumn { from, to } => self.compile_rename_column(blueprint, from, to),
            Command::DropColumn { columns } => self.compile_drop_column(blueprint, columns),
            Command::Index(index) => self.compile_index(blueprint, index),
            Command::DropIndex { kind, name } => self.compile_drop_index(blueprint, *kind, name),
            Command::Foreign(fk) => self.compile_foreign(blueprint, fk),
            Command::DropForeign { name } => self.compile_drop_foreign(blueprint, name),
            Command::AutoIncrementStartingValue { column, value } => {
                self.compile_auto_increment_starting_value(blueprint, column, *value)
            }
            Command::Comment(comment) => self.compile_table_comment(blueprint, comment),
            Command::ColumnComment { column, comment } => {
                self.compile_column_comment(blueprint, column, comment)
            }
            Command::Rename { to } => self.compile_rename(blueprint, to),
            Command::Drop => self.compile_drop(blueprint),
            Command::DropIfExists => self.compile_drop_if_exists(blueprint),
            Command::Rebuild { pre_image, batched } => self.compile_rebuild(blueprint, pre_image, batched),
        }
    }

    fn compile_create(&self, blueprint: &Blueprint) -> Result<Vec<String>> {
        let columns = blueprint
            .columns
            .iter()
            .map(|column| self.compile_column_definition(column, blueprint))
            .collect::<Result<Vec<_>>>()?;
        Ok(vec![format!(
            "create table {} ({})",
            self.wrap_table(&Ident::plain(blueprint.qualified_table())),
            columns.join(", ")
        )])
    }

    fn compile_add(&self, blueprint: &Blueprint, column: &ColumnDefinition) -> Result<Vec<String>> {
        Ok(vec![format!(
            "alter table {} add column {}",
            self.wrap_table(&Ident::plain(blueprint.qualified_table())),
            self.compile_column_definition(column, blueprint)?
        )])
    }

    fn compile_change(&self, blueprint: &Blueprint, column: &ColumnDefinition) -> Result<Vec<String>> {
        Ok(vec![format!(
            "alter table {} alter column {}",
            self.wrap_table(&Ident::plain(blueprint.qualified_table())),
            self.compile_column_definition(column, blueprint)?
        )])
    }

    fn compile_rename_column(&self, blueprint: &Blueprint, from: &str, to: &str) -> Result<Vec<String>> {
        Ok(vec![format!(
            "alter table {} rename column {} to {}",
            self.wrap_table(&Ident::plain(blueprint.qualified_table())),
            self.wrap_segment(from),
            self.wrap_segment(to)
        )])
    }

    fn compile_drop_column(&self, blueprint: &Blueprint, columns: &[String]) -> Result<Vec<String>> {
        let dropped = columns
            .iter()
            .map(|column| format!("drop column {}", self.wrap_segment(column)))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(vec![format!(
            "alter table {} {dropped}",
            self.wrap_table(&Ident::plain(blueprint.qualified_table()))
        )])
    }

    fn compile_index(&self, blueprint: &Blueprint, index: &IndexCommand) -> Result<Vec<String>> {
        let table = self.wrap_table(&Ident::plain(blueprint.qualified_table()));
        let columns = index.columns.iter().map(|c| self.wrap_segment(c)).collect::<Vec<_>>().join(", ");
        let name = self.wrap_segment(&index.name);
        match index.kind {
            IndexKind::Primary => Ok(vec![format!("alter table {table} add primary key ({columns})")]),
            IndexKind::Unique => Ok(vec![format!("alter table {table} add constraint {name} unique ({columns})")]),
            IndexKind::Index => Ok(vec![format!("create index {name} on {table} ({columns})")]),
            IndexKind::Fulltext => Err(Error::logic("fulltext indexes are not supported by this dialect")),
            IndexKind::Spatial => Err(Error::logic("spatial indexes are not supported by this dialect")),
        }
    }

    fn compile_drop_index(&self, blueprint: &Blueprint, kind: IndexKind, name: &str) -> Result<Vec<String>> {
        let table = self.wrap_table(&Ident::plain(blueprint.qualified_table()));
        let name = self.wrap_segment(name);
        match kind {
            IndexKind::Primary => Ok(vec![format!("alter table {table} drop constraint {name}")]),
            IndexKind::Unique => Ok(vec![format!("alter table {table} drop constraint {name}")]),
            _ => Ok(vec![format!("drop index {name}")]),
        }
    }

    fn compile_foreign(&self, blueprint: &Blueprint, fk: &ForeignKeyCommand) -> Result<Vec<String>> {
        let table = self.wrap_table(&Ident::plain(blueprint.qualified_table()));
        let columns = fk.columns.iter().map(|c| self.wrap_segment(c)).collect::<Vec<_>>().join(", ");
        let ref_table = self.wrap_table(&Ident::plain(fk.references_table.clone()));
        let ref_columns = fk.references_columns.iter().map(|c| self.wrap_segment(c)).collect::<Vec<_>>().join(", ");
        let mut sql = format!(
            "alter table {table} add constraint {} foreign key ({columns}) references {ref_table} ({ref_columns})",
            self.wrap_segment(&fk.name)
        );
        if let Some(on_delete) = &fk.on_delete {
            sql.push_str(&format!(" on delete {on_delete}"));
        }
        if let Some(on_update) = &fk.on_update {
            sql.push_str(&format!(" on update {on_update}"));
        }
        Ok(vec![sql])
    }

    fn compile_drop_foreign(&self, blueprint: &Blueprint, name: &str) -> Result<Vec<String>> {
        Ok(vec![format!(
            "alter table {} drop constraint {}",
            self.wrap_table(&Ident::plain(blueprint.qualified_table())),
            self.wrap_segment(name)
        )])
    }

    fn compile_auto_increment_starting_value(
        &self,
        blueprint: &Blueprint,
        column: &str,
        value: i64,
    ) -> Result<Vec<String>> {
        let _ = (blueprint, column);
        let _ = value;
        Ok(Vec::new())
    }

    fn compile_table_comment(&self, blueprint: &Blueprint, comment: &str) -> Result<Vec<String>> {
        let _ = (blueprint, comment);
        Ok(Vec::new())
    }

    fn compile_column_comment(&self, blueprint: &Blueprint, column: &str, comment: &str) -> Result<Vec<String>> {
        Ok(vec![format!(
            "comment on column {}.{} is {}",
            self.wrap_table(&Ident::plain(blueprint.qualified_table())),
            self.wrap_segment(column),
            self.quote_string(comment)
        )])
    }

    fn compile_rename(&self, blueprint: &Blueprint, to: &str) -> Result<Vec<String>> {
        Ok(vec![format!(
            "alter table {} rename to {}",
            self.wrap_table(&Ident::plain(blueprint.qualified_table())),
            self.wrap_segment(to)
        )])
    }

    fn compile_drop(&self, blueprint: &Blueprint) -> Result<Vec<String>> {
        Ok(vec![format!("drop table {}", self.wrap_table(&Ident::plain(blueprint.qualified_table())))])
    }

    fn compile_drop_if_exists(&self, blueprint: &Blueprint) -> Result<Vec<String>> {
        Ok(vec![format!("drop table if exists {}", self.wrap_table(&Ident::plain(blueprint.qualified_table())))])
    }

    fn compile_rebuild(
        &self,
        blueprint: &Blueprint,
        pre_image: &BlueprintState,
        batched: &[Command],
    ) -> Result<Vec<String>> {
        let _ = (blueprint, pre_image, batched);
        Err(Error::logic("this dialect has no rebuild-alter strategy"))
    }
}
