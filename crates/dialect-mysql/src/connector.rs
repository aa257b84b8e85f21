use sqlforge_core::{ConnectionConfig, ConnectorHandles, Result};

use crate::{adapter, grammar::MysqlGrammar, predicates, processor::MysqlProcessor};

/// The `Connector` registered under the `"mysql"` driver name.
#[derive(Debug, Default, Clone, Copy)]
pub struct MysqlConnector;

impl sqlforge_core::Connector for MysqlConnector {
    fn dialect_name(&self) -> &'static str {
        "mysql"
    }

    fn connect(&self, config: &ConnectionConfig) -> Result<ConnectorHandles> {
        let conn = adapter::connect(config)?;
        let grammar = MysqlGrammar::new(config.prefix.clone());

        Ok(ConnectorHandles {
            driver: Box::new(adapter::MysqlDriver::new(conn)),
            query_grammar: Box::new(grammar.clone()),
            schema_grammar: Box::new(grammar),
            processor: Box::new(MysqlProcessor),
            lost_connection: predicates::lost_connection(),
            unique_constraint: predicates::unique_constraint(),
            deadlock: predicates::deadlock(),
        })
    }
}
