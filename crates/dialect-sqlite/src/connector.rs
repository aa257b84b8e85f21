use sqlforge_core::{ConnectionConfig, ConnectorHandles, Result};

use crate::{adapter, grammar::SqliteGrammar, predicates, processor::SqliteProcessor};

/// The `Connector` registered under the `"sqlite"` driver name.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteConnector;

impl sqlforge_core::Connector for SqliteConnector {
    fn dialect_name(&self) -> &'static str {
        "sqlite"
    }

    fn connect(&self, config: &ConnectionConfig) -> Result<ConnectorHandles> {
        let conn = adapter::connect(config)?;
        let grammar = SqliteGrammar::new(config.prefix.clone());

        Ok(ConnectorHandles {
            driver: Box::new(adapter::SqliteDriver::new(conn)),
            query_grammar: Box::new(grammar.clone()),
            schema_grammar: Box::new(grammar),
            processor: Box::new(SqliteProcessor),
            lost_connection: predicates::lost_connection(),
            unique_constraint: predicates::unique_constraint(),
            deadlock: predicates::deadlock(),
        })
    }
}
