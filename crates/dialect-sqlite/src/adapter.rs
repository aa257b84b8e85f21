use rusqlite::{
    Connection as RusqliteConnection, types::ValueRef,
};
use sqlforge_core::{BindKey, Error, FetchMode, Result, Row, Statement, Value, Version};

pub(crate) struct SqliteDriver {
    conn: RusqliteConnection,
}

impl SqliteDriver {
    pub(crate) fn new(conn: RusqliteConnection) -> Self {
        Self { conn }
    }
}

impl sqlforge_core::Driver for SqliteDriver {
    fn prepare(&mut self, sql: &str) -> Result<Box<dyn Statement + '_>> {
        Ok(Box::new(SqliteStatement {
            conn: &self.conn,
            sql: sql.to_string(),
            params: Vec::new(),
            fetch_mode: FetchMode::default(),
            rows: Vec::new().into_iter(),
            affected: 0,
        }))
    }

    fn exec(&mut self, sql: &str) -> Result<u64> {
        self.conn.execute_batch(sql).map_err(|err| sqlite_error(sql, err))?;
        Ok(self.conn.changes())
    }

    fn server_version(&mut self) -> Result<Version> {
        let raw: String = self
            .conn
            .query_row("select sqlite_version()", [], |row| row.get(0))
            .map_err(|err| sqlite_error("select sqlite_version()", err))?;
        parse_version(&raw)
    }
}

struct SqliteStatement<'c> {
    conn: &'c RusqliteConnection,
    sql: String,
    params: Vec<Value>,
    fetch_mode: FetchMode,
    rows: std::vec::IntoIter<Row>,
    affected: u64,
}

impl Statement for SqliteStatement<'_> {
    fn bind_value(&mut self, key: BindKey, value: &Value) -> Result<()> {
        let BindKey::Positional(index) = key else {
            return Err(Error::invalid_argument("SQLite driver binds positionally only"));
        };
        if self.params.len() < index {
            self.params.resize(index, Value::Null);
        }
        self.params[index - 1] = value.clone();
        Ok(())
    }

    fn execute(&mut self) -> Result<bool> {
        let mut stmt = self.conn.prepare(&self.sql).map_err(|err| sqlite_error(&self.sql, err))?;
        let wrapped: Vec<SqlValue<'_>> = self.params.iter().map(SqlValue).collect();
        let param_refs: Vec<&dyn rusqlite::ToSql> =
            wrapped.iter().map(|value| value as &dyn rusqlite::ToSql).collect();

        if stmt.column_count() == 0 {
            let affected =
                stmt.execute(param_refs.as_slice()).map_err(|err| sqlite_error(&self.sql, err))?;
            self.affected = affected as u64;
            self.rows = Vec::new().into_iter();
            return Ok(true);
        }

        let column_names: Vec<String> = stmt.column_names().iter().map(|name| name.to_string()).collect();
        let mut rows = Vec::new();
        let mut query_rows =
            stmt.query(param_refs.as_slice()).map_err(|err| sqlite_error(&self.sql, err))?;
        while let Some(row) = query_rows.next().map_err(|err| sqlite_error(&self.sql, err))? {
            let mut values = Vec::with_capacity(column_names.len());
            for index in 0..column_names.len() {
                values.push(convert_value(row.get_ref(index).map_err(|err| sqlite_error(&self.sql, err))?));
            }
            rows.push(Row::new(column_names.clone(), values));
        }
        self.affected = rows.len() as u64;
        self.rows = rows.into_iter();
        Ok(true)
    }

    fn fetch(&mut self) -> Result<Option<Row>> {
        Ok(self.rows.next())
    }

    fn fetch_all(&mut self) -> Result<Vec<Row>> {
        Ok(self.rows.by_ref().collect())
    }

    fn row_count(&self) -> u64 {
        self.affected
    }

    fn next_rowset(&mut self) -> Result<bool> {
        Ok(false)
    }

    fn set_fetch_mode(&mut self, mode: FetchMode) {
        self.fetch_mode = mode;
    }
}

/// Wraps a borrowed [`Value`] so it can implement the foreign `ToSql`
/// trait without an orphan-rule violation (mirrors the postgres
/// adapter's `SqlValue`).
struct SqlValue<'a>(&'a Value);

impl rusqlite::ToSql for SqlValue<'_> {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        use rusqlite::types::{ToSqlOutput, Value as RVal};
        Ok(match self.0 {
            Value::Null => ToSqlOutput::Owned(RVal::Null),
            Value::Bool(v) => ToSqlOutput::Owned(RVal::Integer(*v as i64)),
            Value::Int(v) => ToSqlOutput::Owned(RVal::Integer(*v)),
            Value::Float(v) => ToSqlOutput::Owned(RVal::Real(*v)),
            Value::Text(v) => ToSqlOutput::Owned(RVal::Text(v.clone())),
            Value::Bytes(v) => ToSqlOutput::Owned(RVal::Blob(v.clone())),
            Value::Date(v) => ToSqlOutput::Owned(RVal::Text(v.format("%Y-%m-%d").to_string())),
            Value::DateTime(v) => ToSqlOutput::Owned(RVal::Text(v.format("%Y-%m-%d %H:%M:%S").to_string())),
        })
    }
}

fn convert_value(value_ref: ValueRef<'_>) -> Value {
    match value_ref {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Int(v),
        ValueRef::Real(v) => Value::Float(v),
        ValueRef::Text(v) => Value::Text(String::from_utf8_lossy(v).into_owned()),
        ValueRef::Blob(v) => Value::Bytes(v.to_vec()),
    }
}

fn sqlite_error(sql: &str, err: rusqlite::Error) -> Error {
    Error::query("default", sql, err)
}

fn parse_version(raw: &str) -> Result<Version> {
    let mut parts = raw.trim().split('.');
    let major = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let minor = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let patch = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    Ok(Version { major, minor, patch })
}

/// Opens the file (or `:memory:`) named by `config.database`. SQLite has
/// no host/port/credentials; everything else in `ConnectionConfig` is
/// ignored here.
pub(crate) fn connect(config: &sqlforge_core::ConnectionConfig) -> Result<RusqliteConnection> {
    let conn = if config.database.is_empty() || config.database == ":memory:" {
        RusqliteConnection::open_in_memory()
    } else {
        RusqliteConnection::open(&config.database)
    }
    .map_err(|err| Error::query("default", "connect", err))?;

    if config.extra.get("foreign_key_constraints").map(String::as_str) != Some("false") {
        conn.execute_batch("pragma foreign_keys = on")
            .map_err(|err| Error::query("default", "pragma foreign_keys = on", err))?;
    }

    Ok(conn)
}
