use sqlforge_core::{ConnectionConfig, ConnectorHandles, Result};

use crate::{adapter, grammar::MssqlGrammar, predicates, processor::MssqlProcessor};

/// The `Connector` registered under the `"sqlsrv"` driver name.
#[derive(Debug, Default, Clone, Copy)]
pub struct MssqlConnector;

impl sqlforge_core::Connector for MssqlConnector {
    fn dialect_name(&self) -> &'static str {
        "sqlsrv"
    }

    fn connect(&self, config: &ConnectionConfig) -> Result<ConnectorHandles> {
        let (runtime, client) = adapter::connect(config)?;
        let grammar = MssqlGrammar::new(config.prefix.clone());

        Ok(ConnectorHandles {
            driver: Box::new(adapter::MssqlDriver::new(runtime, client)),
            query_grammar: Box::new(grammar.clone()),
            schema_grammar: Box::new(grammar),
            processor: Box::new(MssqlProcessor),
            lost_connection: predicates::lost_connection(),
            unique_constraint: predicates::unique_constraint(),
            deadlock: predicates::deadlock(),
        })
    }
}
