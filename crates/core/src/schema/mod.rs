mod blueprint;
mod column;
mod command;
mod grammar;

pub use blueprint::{Blueprint, default_index_name};
pub use column::{ColumnDefinition, ColumnType, GeneratedExpression, IndexRequest};
pub use command::{BlueprintState, Command, CommandEntry, ForeignKeyCommand, IndexCommand, IndexKind};
pub use grammar::SchemaGrammar;
