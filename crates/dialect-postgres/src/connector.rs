use sqlforge_core::{ConnectionConfig, ConnectorHandles, Result};

use crate::{adapter, grammar::PostgresGrammar, predicates, processor::PostgresProcessor};

/// The `Connector` registered under the `"pgsql"` driver name — connects a
/// plain [`postgres::Client`] and pairs it with [`PostgresGrammar`] and
/// [`PostgresProcessor`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresConnector;

impl sqlforge_core::Connector for PostgresConnector {
    fn dialect_name(&self) -> &'static str {
        "pgsql"
    }

    fn connect(&self, config: &ConnectionConfig) -> Result<ConnectorHandles> {
        let client = adapter::connect(config)?;
        let grammar = PostgresGrammar::new(config.prefix.clone());

        Ok(ConnectorHandles {
            driver: Box::new(adapter::PostgresDriver::new(client)),
            query_grammar: Box::new(grammar.clone()),
            schema_grammar: Box::new(grammar),
            processor: Box::new(PostgresProcessor),
            lost_connection: predicates::lost_connection(),
            unique_constraint: predicates::unique_constraint(),
            deadlock: predicates::deadlock(),
        })
    }
}
