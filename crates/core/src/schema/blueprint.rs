use crate::{
    Result,
    schema::{
        BlueprintState, Command, CommandEntry, ColumnDefinition, ColumnType, ForeignKeyCommand,
        IndexCommand, IndexKind, IndexRequest, SchemaGrammar,
    },
};

/// The deferred table-mutation AST for a single table. Constructed fresh
/// per migration operation, compiled to an ordered DDL statement list by
/// [`Blueprint::to_sql`].
#[derive(Debug, Clone, Default)]
pub struct Blueprint {
    pub table: String,
    pub prefix: String,
    pub columns: Vec<ColumnDefinition>,
    pub commands: Vec<CommandEntry>,
    pub engine: Option<String>,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub temporary: bool,
}

impl Blueprint {
    pub fn new(table: impl Into<String>) -> Self {
        Self { table: table.into(), ..Default::default() }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// The fully-qualified table name (`{prefix}{table}`) used when
    /// deriving default index/foreign-key names.
    pub fn qualified_table(&self) -> String {
        format!("{}{}", self.prefix, self.table)
    }

    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    pub fn collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }

    pub fn temporary(mut self) -> Self {
        self.temporary = true;
        self
    }

    fn push(mut self, command: Command) -> Self {
        self.commands.push(CommandEntry::new(command));
        self
    }

    pub fn create(self) -> Self {
        self.push(Command::Create)
    }

    pub fn drop(self) -> Self {
        self.push(Command::Drop)
    }

    pub fn drop_if_exists(self) -> Self {
        self.push(Command::DropIfExists)
    }

    pub fn rename(self, to: impl Into<String>) -> Self {
        self.push(Command::Rename { to: to.into() })
    }

    pub fn comment(self, comment: impl Into<String>) -> Self {
        self.push(Command::Comment(comment.into()))
    }

    pub fn has_create_command(&self) -> bool {
        self.commands.iter().any(|entry| matches!(entry.command, Command::Create))
    }

    fn add_column(mut self, column: ColumnDefinition) -> Self {
        self.columns.push(column);
        self
    }

    pub fn column(self, column: ColumnDefinition) -> Self {
        self.add_column(column)
    }

    pub fn id(self, name: &str) -> Self {
        self.add_column(ColumnDefinition::new(name, ColumnType::Id).auto_increment(true).unsigned(true))
    }

    pub fn increments(self, name: &str) -> Self {
        self.add_column(
            ColumnDefinition::new(name, ColumnType::Integer).auto_increment(true).unsigned(true),
        )
    }

    pub fn big_increments(self, name: &str) -> Self {
        self.add_column(
            ColumnDefinition::new(name, ColumnType::BigInteger).auto_increment(true).unsigned(true),
        )
    }

    pub fn integer(self, name: &str) -> Self {
        self.add_column(ColumnDefinition::new(name, ColumnType::Integer))
    }

    pub fn big_integer(self, name: &str) -> Self {
        self.add_column(ColumnDefinition::new(name, ColumnType::BigInteger))
    }

    pub fn small_integer(self, name: &str) -> Self {
        self.add_column(ColumnDefinition::new(name, ColumnType::SmallInteger))
    }

    pub fn string(self, name: &str) -> Self {
        self.add_column(ColumnDefinition::new(name, ColumnType::String { length: 255 }))
    }

    pub fn string_with_length(self, name: &str, length: u16) -> Self {
        self.add_column(ColumnDefinition::new(name, ColumnType::String { length }))
    }

    pub fn text(self, name: &str) -> Self {
        self.add_column(ColumnDefinition::new(name, ColumnType::Text))
    }

    pub fn boolean(self, name: &str) -> Self {
        self.add_column(ColumnDefinition::new(name, ColumnType::Boolean))
    }

    pub fn date(self, name: &str) -> Self {
        self.add_column(ColumnDefinition::new(name, ColumnType::Date))
    }

    pub fn date_time(self, name: &str) -> Self {
        self.add_column(ColumnDefinition::new(name, ColumnType::DateTime))
    }

    pub fn timestamp(self, name: &str) -> Self {
        self.add_column(ColumnDefinition::new(name, ColumnType::Timestamp))
    }

    pub fn timestamps(self) -> Self {
        self.column(ColumnDefinition::new("created_at", ColumnType::Timestamp).nullable(true))
            .column(ColumnDefinition::new("updated_at", ColumnType::Timestamp).nullable(true))
    }

    pub fn decimal(self, name: &str, total: u16, places: u16) -> Self {
        self.add_column(ColumnDefinition::new(name, ColumnType::Decimal { total, places }))
    }

    pub fn json(self, name: &str) -> Self {
        self.add_column(ColumnDefinition::new(name, ColumnType::Json))
    }

    pub fn uuid(self, name: &str) -> Self {
        self.add_column(ColumnDefinition::new(name, ColumnType::Uuid))
    }

    pub fn r#enum(self, name: &str, allowed: Vec<String>) -> Self {
        self.add_column(ColumnDefinition::new(name, ColumnType::Enum { allowed }))
    }

    pub fn foreign_id(self, name: &str, references: impl Into<String>) -> Self {
        self.add_column(
            ColumnDefinition::new(name, ColumnType::ForeignId { references: references.into() })
                .unsigned(true),
        )
    }

    pub fn soft_deletes(self) -> Self {
        self.column(ColumnDefinition::new("deleted_at", ColumnType::Timestamp).nullable(true))
    }

    fn index_command(self, kind: IndexKind, columns: &[&str], name: Option<&str>) -> Self {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let name = name.map(str::to_string).unwrap_or_else(|| default_index_name(&self.qualified_table(), &columns, kind));
        self.push(Command::Index(IndexCommand { kind, columns, name, algorithm: None }))
    }

    pub fn primary(self, columns: &[&str]) -> Self {
        self.index_command(IndexKind::Primary, columns, None)
    }

    pub fn unique(self, columns: &[&str]) -> Self {
        self.index_command(IndexKind::Unique, columns, None)
    }

    pub fn index(self, columns: &[&str]) -> Self {
        self.index_command(IndexKind::Index, columns, None)
    }

    pub fn fulltext(self, columns: &[&str]) -> Self {
        self.index_command(IndexKind::Fulltext, columns, None)
    }

    pub fn spatial_index(self, columns: &[&str]) -> Self {
        self.index_command(IndexKind::Spatial, columns, None)
    }

    pub fn drop_primary(self, name: impl Into<String>) -> Self {
        self.push(Command::DropIndex { kind: IndexKind::Primary, name: name.into() })
    }

    pub fn drop_unique(self, name: impl Into<String>) -> Self {
        self.push(Command::DropIndex { kind: IndexKind::Unique, name: name.into() })
    }

    pub fn drop_index(self, name: impl Into<String>) -> Self {
        self.push(Command::DropIndex { kind: IndexKind::Index, name: name.into() })
    }

    pub fn foreign(
        self,
        columns: &[&str],
        references_table: impl Into<String>,
        references_columns: &[&str],
    ) -> Self {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let name = format!("{}_{}_foreign", self.qualified_table(), columns.join("_"));
        self.push(Command::Foreign(ForeignKeyCommand {
            columns,
            name,
            references_table: references_table.into(),
            references_columns: references_columns.iter().map(|c| c.to_string()).collect(),
            on_delete: None,
            on_update: None,
        }))
    }

    pub fn drop_foreign(self, name: impl Into<String>) -> Self {
        self.push(Command::DropForeign { name: name.into() })
    }

    pub fn drop_column(self, columns: &[&str]) -> Self {
        self.push(Command::DropColumn { columns: columns.iter().map(|c| c.to_string()).collect() })
    }

    pub fn rename_column(self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.push(Command::RenameColumn { from: from.into(), to: to.into() })
    }

    /// Runs `addImpliedCommands` then dispatches every
    /// non-skipped command to `grammar`, collecting the ordered DDL
    /// statement list. `pre_image`, when `Some`, is the live-schema
    /// snapshot a SQLite-style rebuild alter needs; dialects that never
    /// synthesize a `Command::Rebuild` ignore it.
    pub fn to_sql<G: SchemaGrammar + ?Sized>(
        &mut self,
        grammar: &G,
        pre_image: Option<BlueprintState>,
    ) -> Result<Vec<String>> {
        self.add_implied_commands(grammar, pre_image)?;

        let mut statements = Vec::new();
        for entry in &self.commands {
            if entry.should_be_skipped {
                continue;
            }
            statements.extend(grammar.compile_command(self, &entry.command)?);
        }
        Ok(statements)
    }

    fn add_implied_commands<G: SchemaGrammar + ?Sized>(
        &mut self,
        grammar: &G,
        pre_image: Option<BlueprintState>,
    ) -> Result<()> {
        self.add_fluent_indexes(grammar);
        grammar.add_fluent_commands(self);

        if !self.has_create_command() {
            let mut derived = Vec::with_capacity(self.columns.len());
            for column in &self.columns {
                let command = if column.change {
                    Command::Change(column.clone())
                } else {
                    Command::Add(column.clone())
                };
                derived.push(CommandEntry::new(command));
            }
            self.commands.splice(0..0, derived);
        }

        grammar.batch_alter_commands(self, pre_image)?;
        Ok(())
    }

    /// `addFluentIndexes`: for every column, for each of
    /// `{primary, unique, index, fulltext, spatial_index}`, turns a set
    /// flag into the matching index/drop command and clears the flag.
    fn add_fluent_indexes<G: SchemaGrammar + ?Sized>(&mut self, grammar: &G) {
        let qualified_table = self.qualified_table();
        let mut derived = Vec::new();
        for column in &mut self.columns {
            if grammar.skip_inline_primary_for_autoincrement_change(column) {
                column.primary = None;
            }
            for (kind, request) in [
                (IndexKind::Primary, column.primary.take()),
                (IndexKind::Unique, column.unique.take()),
                (IndexKind::Index, column.index.take()),
                (IndexKind::Fulltext, column.fulltext.take()),
                (IndexKind::Spatial, column.spatial_index.take()),
            ] {
                let Some(request) = request else { continue };
                let columns = vec![column.name.clone()];
                match request {
                    IndexRequest::Drop => {
                        let name = default_index_name(&qualified_table, &columns, kind);
                        derived.push(CommandEntry::new(Command::DropIndex { kind, name }));
                    }
                    IndexRequest::Auto | IndexRequest::Named(_) => {
                        let name = match request {
                            IndexRequest::Named(name) => name,
                            _ => default_index_name(&qualified_table, &columns, kind),
                        };
                        derived.push(CommandEntry::new(Command::Index(IndexCommand {
                            kind,
                            columns,
                            name,
                            algorithm: None,
                        })));
                    }
                }
            }
        }
        self.commands.extend(derived);
    }
}

/// `lower(prefix+table + "_" + cols.join("_") + "_" + type)` with any `.`
/// or `-` normalized to `_` — the default index naming convention.
pub fn default_index_name(qualified_table: &str, columns: &[String], kind: IndexKind) -> String {
    let joined = format!("{qualified_table}_{}_{}", columns.join("_"), kind.name_suffix());
    joined.to_lowercase().replace(['.', '-'], "_")
}
