use chrono::{Datelike, Timelike};
use mysql::{OptsBuilder, Params, Pool, PooledConn, Value as MyValue, prelude::Queryable};
use sqlforge_core::{BindKey, Error, FetchMode, Result, Row, Statement, Value, Version};

pub(crate) struct MysqlDriver {
    conn: PooledConn,
}

impl MysqlDriver {
    pub(crate) fn new(conn: PooledConn) -> Self {
        Self { conn }
    }
}

impl sqlforge_core::Driver for MysqlDriver {
    fn prepare(&mut self, sql: &str) -> Result<Box<dyn Statement + '_>> {
        Ok(Box::new(MysqlStatement {
            conn: &mut self.conn,
            sql: sql.to_string(),
            params: Vec::new(),
            fetch_mode: FetchMode::default(),
            rows: Vec::new().into_iter(),
            affected: 0,
        }))
    }

    fn exec(&mut self, sql: &str) -> Result<u64> {
        self.conn.query_drop(sql).map_err(|err| mysql_error(sql, err))?;
        Ok(self.conn.affected_rows())
    }

    fn server_version(&mut self) -> Result<Version> {
        let raw: String = self
            .conn
            .query_first("select version()")
            .map_err(|err| mysql_error("select version()", err))?
            .ok_or_else(|| Error::logic("select version() returned no rows"))?;
        parse_version(&raw)
    }
}

struct MysqlStatement<'c> {
    conn: &'c mut PooledConn,
    sql: String,
    params: Vec<Value>,
    fetch_mode: FetchMode,
    rows: std::vec::IntoIter<Row>,
    affected: u64,
}

impl Statement for MysqlStatement<'_> {
    fn bind_value(&mut self, key: BindKey, value: &Value) -> Result<()> {
        let BindKey::Positional(index) = key else {
            return Err(Error::invalid_argument("MySQL driver binds positionally only"));
        };
        if self.params.len() < index {
            self.params.resize(index, Value::Null);
        }
        self.params[index - 1] = value.clone();
        Ok(())
    }

    fn execute(&mut self) -> Result<bool> {
        let params: Vec<MyValue> = self.params.iter().map(to_mysql_value).collect();
        let params = if params.is_empty() { Params::Empty } else { Params::Positional(params) };

        let mut result = self.conn.exec_iter(self.sql.as_str(), params).map_err(|err| mysql_error(&self.sql, err))?;
        let names: Vec<String> =
            result.columns().map(|cols| cols.as_ref().iter().map(|c| c.name_str().to_string()).collect()).unwrap_or_default();

        let mut rows = Vec::new();
        for row in &mut result {
            let row = row.map_err(|err| mysql_error(&self.sql, err))?;
            let values = (0..names.len())
                .map(|index| row.as_ref(index).map(from_mysql_value).unwrap_or(Value::Null))
                .collect();
            rows.push(Row::new(names.clone(), values));
        }
        self.affected = result.affected_rows();

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

fn to_mysql_value(value: &Value) -> MyValue {
    match value {
        Value::Null => MyValue::NULL,
        Value::Bool(value) => MyValue::Int(*value as i64),
        Value::Int(value) => MyValue::Int(*value),
        Value::Float(value) => MyValue::Double(*value),
        Value::Text(value) => MyValue::Bytes(value.clone().into_bytes()),
        Value::Bytes(value) => MyValue::Bytes(value.clone()),
        Value::Date(date) => MyValue::Date(date.year() as u16, date.month() as u8, date.day() as u8, 0, 0, 0, 0),
        Value::DateTime(value) => MyValue::Date(
            value.year() as u16,
            value.month() as u8,
            value.day() as u8,
            value.hour() as u8,
            value.minute() as u8,
            value.second() as u8,
            0,
        ),
    }
}

fn from_mysql_value(value: &MyValue) -> Value {
    match value {
        MyValue::NULL => Value::Null,
        MyValue::Bytes(bytes) => {
            Value::Text(String::from_utf8_lossy(bytes).to_string())
        }
        MyValue::Int(value) => Value::Int(*value),
        MyValue::UInt(value) => Value::Int(*value as i64),
        MyValue::Float(value) => Value::Float(*value as f64),
        MyValue::Double(value) => Value::Float(*value),
        MyValue::Date(year, month, day, hour, minute, second, _micros) => {
            match chrono::NaiveDate::from_ymd_opt(*year as i32, *month as u32, *day as u32) {
                Some(date) => {
                    if *hour == 0 && *minute == 0 && *second == 0 {
                        Value::Date(date)
                    } else {
                        date.and_hms_opt(*hour as u32, *minute as u32, *second as u32)
                            .map(Value::DateTime)
                            .unwrap_or(Value::Null)
                    }
                }
                None => Value::Null,
            }
        }
        MyValue::Time(..) => Value::Null,
    }
}

fn mysql_error(sql: &str, err: mysql::Error) -> Error {
    Error::query("default", sql, err)
}

fn parse_version(raw: &str) -> Result<Version> {
    let mut parts = raw.split(|c: char| !c.is_ascii_digit()).filter(|part| !part.is_empty());
    let major = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let minor = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let patch = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    Ok(Version { major, minor, patch })
}

/// Builds a pooled connection from discrete connection fields. `mysql`
/// validates DSN syntax, not us — there is nothing here to fail fast on
/// beyond what `OptsBuilder` already rejects.
pub(crate) fn connect(config: &sqlforge_core::ConnectionConfig) -> Result<PooledConn> {
    let mut builder = OptsBuilder::new()
        .ip_or_hostname(config.host.as_ref().and_then(|h| h.as_slice().first().map(|h| h.to_string())))
        .tcp_port(config.port.unwrap_or(3306))
        .user(config.username.clone())
        .pass(config.password.clone())
        .db_name(Some(config.database.clone()));
    if let Some(charset) = &config.charset {
        builder = builder.charset_name(Some(charset.clone()));
    }

    let pool = Pool::new(builder).map_err(|err| Error::query("default", "connect", err))?;
    pool.get_conn().map_err(|err| Error::query("default", "connect", err))
}
