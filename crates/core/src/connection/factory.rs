use std::{collections::BTreeMap, sync::Arc};

use rand::seq::SliceRandom;

use crate::{
    Connection, ConnectionConfig, DeadlockPredicate, Driver, Error, LostConnectionPredicate,
    Processor, QueryGrammar, Result, SchemaGrammar, UniqueConstraintPredicate,
};

/// Everything a [`Connector`] hands back after a successful connect: the
/// driver handle plus the dialect's grammar/processor/predicate set.
pub struct ConnectorHandles {
    pub driver: Box<dyn Driver>,
    pub query_grammar: Box<dyn QueryGrammar>,
    pub schema_grammar: Box<dyn SchemaGrammar>,
    pub processor: Box<dyn Processor>,
    pub lost_connection: LostConnectionPredicate,
    pub unique_constraint: UniqueConstraintPredicate,
    pub deadlock: DeadlockPredicate,
}

/// One dialect's bridge from a [`ConnectionConfig`] to a live [`Driver`]
/// plus its grammar/processor set. Each dialect crate supplies exactly
/// one implementation wrapping a real driver crate (`postgres`, `mysql`,
/// `rusqlite`, `tiberius`).
pub trait Connector: Send + Sync {
    fn dialect_name(&self) -> &'static str;
    fn connect(&self, config: &ConnectionConfig) -> Result<ConnectorHandles>;
}

/// An explicit registry keyed by dialect name, in place of a global
/// mutable resolver map. A process-wide instance may exist for
/// convenience, but nothing requires one — tests build their own with
/// only the connectors they need.
#[derive(Default, Clone)]
pub struct DriverRegistry {
    connectors: BTreeMap<String, Arc<dyn Connector>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `resolverFor(name, factory)`: registers (or overrides) the
    /// connector used for `name`.
    pub fn register(&mut self, connector: impl Connector + 'static) -> &mut Self {
        self.connectors.insert(connector.dialect_name().to_string(), Arc::new(connector));
        self
    }

    pub fn resolve(&self, driver: &str) -> Result<Arc<dyn Connector>> {
        self.connectors
            .get(driver)
            .cloned()
            .ok_or_else(|| Error::invalid_argument(format!("unsupported driver: {driver}")))
    }
}

/// Produces a [`Connection`] from a [`ConnectionConfig`]:
/// resolves `url`, splits `read`/`write` sub-configs, and fails over across
/// a shuffled host list.
pub struct ConnectionFactory {
    registry: DriverRegistry,
}

impl ConnectionFactory {
    pub fn new(registry: DriverRegistry) -> Self {
        Self { registry }
    }

    pub fn make(&self, config: ConnectionConfig, name: impl Into<String>) -> Result<Connection> {
        let name = name.into();
        let config = config.resolve_url()?;

        if config.read.is_some() || config.write.is_some() {
            let write_config = config.write.clone().unwrap_or_else(|| Box::new(config.clone()));
            let read_config = config.read.clone().unwrap_or_else(|| Box::new(config.clone()));
            let write_connector = self.registry.resolve(&write_config.driver)?;
            let write_handles = self.connect_with_failover(write_connector.as_ref(), &write_config)?;
            let read_connector = self.registry.resolve(&read_config.driver)?;
            let reconnector_config = *read_config.clone();
            let read_connector_for_reconnect = read_connector.clone();
            let read_handles = self.connect_with_failover(read_connector.as_ref(), &read_config)?;
            Ok(Connection::new_read_write(
                name,
                *write_config,
                write_handles,
                read_handles,
                Box::new(move || {
                    read_connector_for_reconnect
                        .connect(&reconnector_config)
                        .map(|handles| handles.driver)
                }),
            ))
        } else {
            let connector = self.registry.resolve(&config.driver)?;
            let handles = self.connect_with_failover(connector.as_ref(), &config)?;
            let reconnect_config = config.clone();
            let reconnect_connector = connector.clone();
            Ok(Connection::new(
                name,
                config,
                handles,
                Box::new(move || {
                    reconnect_connector.connect(&reconnect_config).map(|handles| handles.driver)
                }),
            ))
        }
    }

    fn connect_with_failover(&self, connector: &dyn Connector, config: &ConnectionConfig) -> Result<ConnectorHandles> {
        let Some(hosts) = &config.host else {
            return connector.connect(config);
        };
        let mut hosts = hosts.as_slice();
        if hosts.is_empty() {
            return Err(Error::invalid_argument("host list is empty"));
        }
        if hosts.len() == 1 {
            return connector.connect(config);
        }

        hosts.shuffle(&mut rand::rng());
        let attempts = hosts.len();
        for host in hosts {
            let mut attempt = config.clone();
            attempt.host = Some(crate::connection::HostList::Single(host.to_string()));
            if let Ok(handles) = connector.connect(&attempt) {
                return Ok(handles);
            }
        }
        Err(Error::DsnExhausted { attempts })
    }
}
