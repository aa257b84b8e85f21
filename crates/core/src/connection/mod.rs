mod config;
mod factory;

use std::time::{Duration, Instant};

pub use config::{ConnectionConfig, HostList};
pub use factory::{ConnectionFactory, Connector, ConnectorHandles, DriverRegistry};

use crate::{
    BindKey, Blueprint, DeadlockPredicate, Driver, Error, FetchMode, LostConnectionPredicate,
    Processor, QueryBuilder, QueryGrammar, Result, Row, SchemaGrammar, UniqueConstraintPredicate,
    Value,
};

/// One executed-statement record, appended to [`Connection::query_log`]
/// when query logging is enabled.
#[derive(Debug, Clone)]
pub struct QueryLogEntry {
    pub sql: String,
    pub bindings: Vec<Value>,
    pub time_ms: f64,
}

struct DurationHandler {
    threshold: Duration,
    handler: Box<dyn FnMut() + Send>,
    has_run: bool,
}

/// Orchestrates compilation, driver execution, prepared-statement binding,
/// transactional state, query logging/events, and lost-connection
/// recovery. Long-lived, process-wide per logical database
/// name, owned by whatever constructs it via [`ConnectionFactory`]; not
/// safe for concurrent mutation from multiple threads.
pub struct Connection {
    name: String,
    config: ConnectionConfig,
    driver: Option<Box<dyn Driver>>,
    read_driver: Option<Box<dyn Driver>>,
    query_grammar: Box<dyn QueryGrammar>,
    schema_grammar: Box<dyn SchemaGrammar>,
    processor: Box<dyn Processor>,
    lost_connection: LostConnectionPredicate,
    unique_constraint: UniqueConstraintPredicate,
    deadlock: DeadlockPredicate,
    reconnector: Box<dyn FnMut() -> Result<Box<dyn Driver>> + Send>,
    read_reconnector: Option<Box<dyn FnMut() -> Result<Box<dyn Driver>> + Send>>,
    transactions: u32,
    records_modified: bool,
    fetch_mode: FetchMode,
    pretending: bool,
    pretend_log: Vec<QueryLogEntry>,
    logging_queries: bool,
    query_log: Vec<QueryLogEntry>,
    query_log_max: Option<usize>,
    total_query_duration: Duration,
    before_executing_callbacks: Vec<Box<dyn Fn(&str, &[Value]) + Send>>,
    duration_handlers: Vec<DurationHandler>,
    listeners: Vec<Box<dyn Fn(&str, &str, &[Value], Duration) + Send>>,
}

impl Connection {
    pub(crate) fn new(
        name: String,
        config: ConnectionConfig,
        handles: ConnectorHandles,
        reconnector: Box<dyn FnMut() -> Result<Box<dyn Driver>> + Send>,
    ) -> Self {
        Self {
            name,
            config,
            driver: Some(handles.driver),
            read_driver: None,
            query_grammar: handles.query_grammar,
            schema_grammar: handles.schema_grammar,
            processor: handles.processor,
            lost_connection: handles.lost_connection,
            unique_constraint: handles.unique_constraint,
            deadlock: handles.deadlock,
            reconnector,
            read_reconnector: None,
            transactions: 0,
            records_modified: false,
            fetch_mode: FetchMode::default(),
            pretending: false,
            pretend_log: Vec::new(),
            logging_queries: false,
            query_log: Vec::new(),
            query_log_max: None,
            total_query_duration: Duration::ZERO,
            before_executing_callbacks: Vec::new(),
            duration_handlers: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub(crate) fn new_read_write(
        name: String,
        write_config: ConnectionConfig,
        write_handles: ConnectorHandles,
        read_handles: ConnectorHandles,
        read_reconnector: Box<dyn FnMut() -> Result<Box<dyn Driver>> + Send>,
    ) -> Self {
        let mut connection = Self::new(
            name,
            write_config,
            write_handles,
            Box::new(|| Err(Error::logic("write connection reconnector not configured"))),
        );
        connection.read_driver = Some(read_handles.driver);
        connection.read_reconnector = Some(read_reconnector);
        connection
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table_prefix(&self) -> &str {
        &self.config.prefix
    }

    pub fn is_pretending(&self) -> bool {
        self.pretending
    }

    pub fn transaction_level(&self) -> u32 {
        self.transactions
    }

    pub fn records_have_been_modified(&self) -> bool {
        self.records_modified
    }

    pub fn enable_query_log(&mut self) {
        self.logging_queries = true;
    }

    pub fn disable_query_log(&mut self) {
        self.logging_queries = false;
    }

    pub fn query_log(&self) -> &[QueryLogEntry] {
        &self.query_log
    }

    pub fn flush_query_log(&mut self) {
        self.query_log.clear();
    }

    pub fn set_query_log_max(&mut self, max: usize) {
        self.query_log_max = Some(max);
    }

    pub fn total_query_duration(&self) -> Duration {
        self.total_query_duration
    }

    pub fn listen(&mut self, callback: impl Fn(&str, &str, &[Value], Duration) + Send + 'static) {
        self.listeners.push(Box::new(callback));
    }

    pub fn before_executing(&mut self, callback: impl Fn(&str, &[Value]) + Send + 'static) {
        self.before_executing_callbacks.push(Box::new(callback));
    }

    pub fn when_querying_for_longer_than(&mut self, threshold: Duration, handler: impl FnMut() + Send + 'static) {
        self.duration_handlers.push(DurationHandler { threshold, handler: Box::new(handler), has_run: false });
    }

    /// Resets every registered duration handler's `has_run` flag so it can
    /// fire again.
    pub fn allow_query_duration_handlers_to_run_again(&mut self) {
        for handler in &mut self.duration_handlers {
            handler.has_run = false;
        }
    }

    pub fn disconnect(&mut self) {
        self.driver = None;
        self.read_driver = None;
    }

    fn ensure_write_connected(&mut self) -> Result<()> {
        if self.driver.is_none() {
            let driver = (self.reconnector)()?;
            self.driver = Some(driver);
        }
        Ok(())
    }

    fn ensure_read_connected(&mut self) -> Result<()> {
        if self.read_driver.is_some() {
            return Ok(());
        }
        self.ensure_write_connected()
    }

    // ---- Query builder entry points -------------------------------------

    pub fn select(&mut self, query: &QueryBuilder) -> Result<Vec<Row>> {
        let (sql, bindings) = self.query_grammar.compile_select(query)?;
        self.run_read(&sql, &bindings)
    }

    pub fn select_one(&mut self, query: &QueryBuilder) -> Result<Option<Row>> {
        Ok(self.select(query)?.into_iter().next())
    }

    /// `scalar()`: fails with `multiple-columns-selected` if the first row
    /// has more than one column.
    pub fn scalar(&mut self, query: &QueryBuilder) -> Result<Option<Value>> {
        let Some(row) = self.select_one(query)? else { return Ok(None) };
        if row.columns().len() > 1 {
            return Err(Error::MultipleColumnsSelected { columns: row.columns().len() });
        }
        Ok(row.get_index(0).cloned())
    }

    pub fn exists(&mut self, query: &QueryBuilder) -> Result<bool> {
        Ok(self.select_one(query)?.is_some())
    }

    /// A lazy row sequence: rows are fetched from the driver one at a time
    /// as the iterator is advanced, so an abandoned cursor simply stops
    /// pulling further rows.
    pub fn cursor(&mut self, query: &QueryBuilder) -> Result<Cursor<'_>> {
        let (sql, bindings) = self.query_grammar.compile_select(query)?;
        self.cursor_raw(&sql, &bindings)
    }

    pub fn cursor_raw<'c>(&'c mut self, sql: &str, bindings: &[Value]) -> Result<Cursor<'c>> {
        self.ensure_read_connected()?;
        let driver = self.read_driver.as_mut().unwrap_or_else(|| self.driver.as_mut().expect("connected"));
        let mut statement = driver.prepare(sql)?;
        bind_positional(statement.as_mut(), bindings)?;
        statement.execute()?;
        Ok(Cursor { statement })
    }

    pub fn insert(&mut self, query: &QueryBuilder) -> Result<u64> {
        let (sql, bindings) = self.query_grammar.compile_write(query)?;
        self.affecting_statement(&sql, &bindings)
    }

    pub fn insert_get_id(&mut self, query: &QueryBuilder) -> Result<i64> {
        let (sql, bindings) = self.query_grammar.compile_write(query)?;
        if self.pretending {
            self.record_pretend(&sql, &bindings);
            return Ok(0);
        }
        let (rows, _) = self.execute_write(&sql, &bindings)?;
        self.processor.process_insert_get_id(&rows, None)
    }

    pub fn update(&mut self, query: &QueryBuilder) -> Result<u64> {
        let (sql, bindings) = self.query_grammar.compile_write(query)?;
        self.affecting_statement(&sql, &bindings)
    }

    pub fn delete(&mut self, query: &QueryBuilder) -> Result<u64> {
        let (sql, bindings) = self.query_grammar.compile_write(query)?;
        self.affecting_statement(&sql, &bindings)
    }

    pub fn truncate(&mut self, query: &QueryBuilder) -> Result<()> {
        for statement in self.query_grammar.compile_truncate(query)? {
            self.statement(&statement, &[])?;
        }
        Ok(())
    }

    /// Compiles and runs every DDL statement a [`Blueprint`] produces, in
    /// order.
    pub fn run_schema(&mut self, blueprint: &mut Blueprint, pre_image: Option<crate::schema::BlueprintState>) -> Result<()> {
        let statements = blueprint.to_sql(self.schema_grammar.as_ref(), pre_image)?;
        for statement in statements {
            self.statement(&statement, &[])?;
        }
        Ok(())
    }

    pub fn explain(&mut self, query: &QueryBuilder) -> Result<Vec<String>> {
        let (sql, bindings) = self.query_grammar.compile_select(query)?;
        let rows = self.run_read(&format!("explain {sql}"), &bindings)?;
        Ok(rows.iter().filter_map(|row| row.get_index(0)).map(value_to_plan_line).collect())
    }

    // ---- Raw SQL entry points --------------------------------------------

    pub fn select_raw(&mut self, sql: &str, bindings: &[Value]) -> Result<Vec<Row>> {
        self.run_read(sql, bindings)
    }

    pub fn statement(&mut self, sql: &str, bindings: &[Value]) -> Result<bool> {
        if self.pretending {
            self.record_pretend(sql, bindings);
            return Ok(true);
        }
        self.execute_write(sql, bindings)?;
        self.records_modified = true;
        Ok(true)
    }

    pub fn affecting_statement(&mut self, sql: &str, bindings: &[Value]) -> Result<u64> {
        if self.pretending {
            self.record_pretend(sql, bindings);
            return Ok(0);
        }
        let (_, affected) = self.execute_write(sql, bindings)?;
        if affected > 0 {
            self.records_modified = true;
        }
        Ok(affected)
    }

    /// Runs `sql` as a raw driver statement, bypassing binding
    /// preparation entirely — for DDL or vendor extensions the query
    /// grammar cannot express.
    pub fn unprepared(&mut self, sql: &str) -> Result<bool> {
        if self.pretending {
            self.record_pretend(sql, &[]);
            return Ok(true);
        }
        self.ensure_write_connected()?;
        let start = Instant::now();
        let result = self.driver.as_mut().expect("connected").exec(sql);
        match result {
            Ok(_) => {
                self.records_modified = true;
                self.finish(sql, &[], start.elapsed());
                Ok(true)
            }
            Err(err) => Err(self.wrap_error(sql, &[], err)),
        }
    }

    fn run_read(&mut self, sql: &str, bindings: &[Value]) -> Result<Vec<Row>> {
        if self.pretending {
            self.record_pretend(sql, bindings);
            return Ok(Vec::new());
        }
        let prepared = self.prepare_bindings(bindings);
        self.run_with_retry(sql, &prepared, true).map(|(rows, _)| rows)
    }

    fn execute_write(&mut self, sql: &str, bindings: &[Value]) -> Result<(Vec<Row>, u64)> {
        let prepared = self.prepare_bindings(bindings);
        self.run_with_retry(sql, &prepared, false)
    }

    /// `run()`: before-executing callbacks, connect if
    /// needed, execute with one lost-connection retry outside a
    /// transaction, then log/dispatch/duration-track.
    fn run_with_retry(&mut self, sql: &str, bindings: &[Value], read: bool) -> Result<(Vec<Row>, u64)> {
        for callback in &self.before_executing_callbacks {
            callback(sql, bindings);
        }
        if read {
            self.ensure_read_connected()?;
        } else {
            self.ensure_write_connected()?;
        }

        let start = Instant::now();
        let first_attempt = self.execute_prepared(sql, bindings, read);
        let outcome = match first_attempt {
            Ok(result) => Ok(result),
            Err(err) if self.transactions == 0 && err.is_lost_connection(&self.lost_connection) => {
                log::warn!(target: "sqlforge::connection", "lost connection, retrying");
                self.reconnect(read)?;
                self.execute_prepared(sql, bindings, read).map_err(|err| self.wrap_error(sql, bindings, err))
            }
            Err(err) => Err(self.wrap_error(sql, bindings, err)),
        };

        self.finish(sql, bindings, start.elapsed());
        outcome
    }

    fn execute_prepared(&mut self, sql: &str, bindings: &[Value], read: bool) -> Result<(Vec<Row>, u64)> {
        let fetch_mode = self.fetch_mode;
        let driver: &mut Box<dyn Driver> = if read {
            self.read_driver.as_mut().unwrap_or_else(|| self.driver.as_mut().expect("connected"))
        } else {
            self.driver.as_mut().expect("connected")
        };
        let mut statement = driver.prepare(sql)?;
        statement.set_fetch_mode(fetch_mode);
        bind_positional(statement.as_mut(), bindings)?;
        statement.execute()?;
        let rows = statement.fetch_all()?;
        let affected = statement.row_count();
        Ok((rows, affected))
    }

    fn reconnect(&mut self, read: bool) -> Result<()> {
        if read && self.read_reconnector.is_some() {
            let driver = (self.read_reconnector.as_mut().unwrap())()?;
            self.read_driver = Some(driver);
        } else {
            let driver = (self.reconnector)()?;
            self.driver = Some(driver);
        }
        Ok(())
    }

    /// Normalizes any error a driver call raised into an `Error::Query`
    /// carrying the *real* connection name and the top-level statement with
    /// bindings substituted in — adapters don't know the connection's name
    /// or see substituted SQL, so a driver-level `Error::Query` (always
    /// built with a placeholder connection label) is unwrapped to its
    /// source and rebuilt here rather than passed through.
    fn wrap_error(&self, sql: &str, bindings: &[Value], err: Error) -> Error {
        let substituted = self.query_grammar.substitute_bindings_into_raw_sql(sql, bindings);
        let source: Box<dyn std::error::Error + Send + Sync> = match err {
            Error::Query { source, .. } => source,
            other => Box::new(other),
        };
        Error::query(self.name.clone(), substituted, source)
    }

    fn finish(&mut self, sql: &str, bindings: &[Value], elapsed: Duration) {
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        log::debug!(target: "sqlforge::query", "{sql}");
        for listener in &self.listeners {
            listener(&self.name, sql, bindings, elapsed);
        }
        if self.logging_queries {
            self.query_log.push(QueryLogEntry { sql: sql.to_string(), bindings: bindings.to_vec(), time_ms: elapsed_ms });
            if let Some(max) = self.query_log_max {
                while self.query_log.len() > max {
                    self.query_log.remove(0);
                }
            }
        }
        self.total_query_duration += elapsed;
        for handler in &mut self.duration_handlers {
            if !handler.has_run && self.total_query_duration > handler.threshold {
                log::warn!(target: "sqlforge::connection", "query duration threshold exceeded");
                (handler.handler)();
                handler.has_run = true;
            }
        }
    }

    fn prepare_bindings(&self, bindings: &[Value]) -> Vec<Value> {
        bindings
            .iter()
            .map(|value| match value {
                Value::Date(date) => Value::Text(date.format(self.query_grammar.date_format()).to_string()),
                Value::DateTime(datetime) => Value::Text(datetime.format(self.query_grammar.date_format()).to_string()),
                other => other.clone(),
            })
            .collect()
    }

    fn record_pretend(&mut self, sql: &str, bindings: &[Value]) {
        let substituted = self.query_grammar.substitute_bindings_into_raw_sql(sql, bindings);
        self.pretend_log.push(QueryLogEntry { sql: substituted, bindings: Vec::new(), time_ms: 0.0 });
    }

    /// Dry-run mode: `cb` runs with every statement body
    /// short-circuited, and the captured, bindings-substituted statement
    /// list is returned with state restored.
    pub fn pretend(&mut self, cb: impl FnOnce(&mut Connection) -> Result<()>) -> Result<Vec<String>> {
        let was_pretending = self.pretending;
        self.pretending = true;
        self.pretend_log.clear();
        let result = cb(self);
        let log = std::mem::take(&mut self.pretend_log);
        self.pretending = was_pretending;
        result?;
        Ok(log.into_iter().map(|entry| entry.sql).collect())
    }

    /// Temporarily restores real execution inside a `pretend` block.
    pub fn without_pretending(&mut self, cb: impl FnOnce(&mut Connection) -> Result<()>) -> Result<()> {
        let was_pretending = self.pretending;
        self.pretending = false;
        let result = cb(self);
        self.pretending = was_pretending;
        result
    }

    // ---- Transactions -----------------------------------------------------

    pub fn begin_transaction(&mut self) -> Result<()> {
        if self.transactions == 0 {
            self.statement_unlogged("begin")?;
        } else {
            let savepoint = format!("trans{}", self.transactions + 1);
            self.statement_unlogged(&format!("savepoint {savepoint}"))?;
        }
        self.transactions += 1;
        Ok(())
    }

    pub fn commit(&mut self) -> Result<()> {
        if self.transactions == 1 {
            self.statement_unlogged("commit")?;
        } else if self.transactions > 1 {
            let savepoint = format!("trans{}", self.transactions);
            self.statement_unlogged(&format!("release savepoint {savepoint}"))?;
        }
        self.transactions = self.transactions.saturating_sub(1);
        Ok(())
    }

    pub fn roll_back(&mut self, to_level: Option<u32>) -> Result<()> {
        let target = to_level.unwrap_or_else(|| self.transactions.saturating_sub(1));
        if target >= self.transactions {
            return Ok(());
        }
        if target == 0 {
            self.statement_unlogged("rollback")?;
        } else {
            let savepoint = format!("trans{}", target + 1);
            self.statement_unlogged(&format!("rollback to savepoint {savepoint}"))?;
        }
        self.transactions = target;
        Ok(())
    }

    fn statement_unlogged(&mut self, sql: &str) -> Result<()> {
        if self.pretending {
            return Ok(());
        }
        self.ensure_write_connected()?;
        self.driver.as_mut().expect("connected").exec(sql).map_err(|err| self.wrap_error(sql, &[], err))?;
        Ok(())
    }

    /// Retries `cb` up to `attempts` times on deadlock-class errors, but
    /// only when invoked at transaction depth 0.
    pub fn transaction<T>(&mut self, attempts: u32, mut cb: impl FnMut(&mut Connection) -> Result<T>) -> Result<T> {
        let retryable = self.transactions == 0;
        let mut last_err = None;
        let max_attempts = attempts.max(1);
        for attempt in 0..max_attempts {
            self.begin_transaction()?;
            match cb(self) {
                Ok(value) => {
                    self.commit()?;
                    return Ok(value);
                }
                Err(err) => {
                    self.roll_back(None)?;
                    if retryable && attempt + 1 < max_attempts && err.is_deadlock(&self.deadlock) {
                        last_err = Some(err);
                        continue;
                    }
                    return Err(err);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| Error::logic("transaction retry loop exited without a result")))
    }
}

/// A lazily-pulled row sequence backed by a live prepared statement.
pub struct Cursor<'c> {
    statement: Box<dyn crate::Statement + 'c>,
}

impl Iterator for Cursor<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.statement.fetch() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

fn bind_positional(statement: &mut dyn crate::Statement, bindings: &[Value]) -> Result<()> {
    for (index, value) in bindings.iter().enumerate() {
        statement.bind_value(BindKey::Positional(index + 1), value)?;
    }
    Ok(())
}

fn value_to_plan_line(value: &Value) -> String {
    match value {
        Value::Text(text) => text.clone(),
        Value::Int(value) => value.to_string(),
        Value::Float(value) => value.to_string(),
        Value::Bool(value) => value.to_string(),
        Value::Null => "null".to_string(),
        Value::Bytes(bytes) => String::from_utf8_lossy(bytes).to_string(),
        Value::Date(date) => date.to_string(),
        Value::DateTime(value) => value.to_string(),
    }
}
