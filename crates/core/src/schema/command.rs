use crate::schema::ColumnDefinition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Primary,
    Unique,
    Index,
    Fulltext,
    Spatial,
}

impl IndexKind {
    /// The suffix used when deriving a default index name:
    /// `{prefix+table}_{columns…}_{suffix}`.
    pub fn name_suffix(self) -> &'static str {
        match self {
            IndexKind::Primary => "primary",
            IndexKind::Unique => "unique",
            IndexKind::Index => "index",
            IndexKind::Fulltext => "fulltext",
            IndexKind::Spatial => "spatialindex",
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndexCommand {
    pub kind: IndexKind,
    pub columns: Vec<String>,
    pub name: String,
    pub algorithm: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ForeignKeyCommand {
    pub columns: Vec<String>,
    pub name: String,
    pub references_table: String,
    pub references_columns: Vec<String>,
    pub on_delete: Option<String>,
    pub on_update: Option<String>,
}

/// A snapshot of a live table's columns/indexes/foreign keys, captured via
/// schema introspection before a SQLite rebuild-style alter
/// (`addAlterCommands`). Enough to regenerate a `CREATE TABLE` for
/// the temporary replacement and a `INSERT INTO ... SELECT` copy.
#[derive(Debug, Clone, Default)]
pub struct BlueprintState {
    pub columns: Vec<ColumnDefinition>,
    pub indexes: Vec<IndexCommand>,
    pub foreign_keys: Vec<ForeignKeyCommand>,
}

/// One deferred schema-mutation command. A closed sum type rather than a
/// string-keyed attribute bag: unknown command kinds are a compile
/// error, not silently-ignored keys.
#[derive(Debug, Clone)]
pub enum Command {
    Create,
    Add(ColumnDefinition),
    Change(ColumnDefinition),
    RenameColumn { from: String, to: String },
    DropColumn { columns: Vec<String> },
    Index(IndexCommand),
    DropIndex { kind: IndexKind, name: String },
    Foreign(ForeignKeyCommand),
    DropForeign { name: String },
    AutoIncrementStartingValue { column: String, value: i64 },
    Comment(String),
    ColumnComment { column: String, comment: String },
    Rename { to: String },
    Drop,
    DropIfExists,
    /// A virtual command synthesized by `addAlterCommands` on SQLite:
    /// batches consecutive alter-class commands (`change`, `primary`,
    /// `dropPrimary`, `foreign`, `dropForeign`) into a rebuild plan against
    /// `pre_image`.
    Rebuild { pre_image: BlueprintState, batched: Vec<Command> },
}

/// One entry in `Blueprint::commands`: the command plus the
/// `shouldBeSkipped` flag set during compilation when a later command (or
/// `addImpliedCommands` itself) subsumes it — e.g. a primary key inlined
/// into `CREATE TABLE` skips the standalone `primary` command.
#[derive(Debug, Clone)]
pub struct CommandEntry {
    pub command: Command,
    pub should_be_skipped: bool,
}

impl CommandEntry {
    pub fn new(command: Command) -> Self {
        Self { command, should_be_skipped: false }
    }

    pub fn skip(mut self) -> Self {
        self.should_be_skipped = true;
        self
    }
}

impl Command {
    /// Is this one of the commands the SQLite rebuild-batching pass
    /// (`addAlterCommands`) groups together because no native `ALTER`
    /// exists for it?
    pub fn is_alter_class(&self) -> bool {
        matches!(
            self,
            Command::Change(_)
                | Command::Index(IndexCommand { kind: IndexKind::Primary, .. })
                | Command::DropIndex { kind: IndexKind::Primary, .. }
                | Command::Foreign(_)
                | Command::DropForeign { .. }
        )
    }
}
