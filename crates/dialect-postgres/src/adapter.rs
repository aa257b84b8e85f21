use std::error::Error as StdError;

use postgres::{
    Client, NoTls,
    types::{IsNull, ToSql, Type, to_sql_checked},
};
use sqlforge_core::{BindKey, Error, FetchMode, Result, Row, Statement, Value, Version};

/// Wraps a borrowed [`Value`] so it can be handed to `postgres`'s
/// extended-query protocol as a single `&dyn ToSql`. Accepts any
/// postgres type — the server rejects genuine type mismatches, matching
/// how the driver layer is a thin pass-through rather than a validator.
struct SqlValue<'a>(&'a Value);

impl ToSql for SqlValue<'_> {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut bytes::BytesMut,
    ) -> std::result::Result<IsNull, Box<dyn StdError + Sync + Send>> {
        match self.0 {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(value) => value.to_sql(ty, out),
            Value::Int(value) => value.to_sql(ty, out),
            Value::Float(value) => value.to_sql(ty, out),
            Value::Text(value) => value.to_sql(ty, out),
            Value::Bytes(value) => value.to_sql(ty, out),
            Value::Date(value) => value.to_sql(ty, out),
            Value::DateTime(value) => value.to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

pub(crate) struct PostgresDriver {
    client: Client,
}

impl PostgresDriver {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }
}

impl sqlforge_core::Driver for PostgresDriver {
    fn prepare(&mut self, sql: &str) -> Result<Box<dyn Statement + '_>> {
        Ok(Box::new(PostgresStatement {
            client: &mut self.client,
            sql: sql.to_string(),
            params: Vec::new(),
            fetch_mode: FetchMode::default(),
            rows: Vec::new().into_iter(),
            affected: 0,
        }))
    }

    fn exec(&mut self, sql: &str) -> Result<u64> {
        self.client.batch_execute(sql).map_err(|err| pg_error(sql, err))?;
        Ok(0)
    }

    fn server_version(&mut self) -> Result<Version> {
        let row = self
            .client
            .query_one("show server_version_num", &[])
            .map_err(|err| pg_error("show server_version_num", err))?;
        let raw: String = row.get(0);
        parse_version_num(&raw)
    }
}

struct PostgresStatement<'c> {
    client: &'c mut Client,
    sql: String,
    params: Vec<Value>,
    fetch_mode: FetchMode,
    rows: std::vec::IntoIter<Row>,
    affected: u64,
}

impl Statement for PostgresStatement<'_> {
    fn bind_value(&mut self, key: BindKey, value: &Value) -> Result<()> {
        let BindKey::Positional(index) = key else {
            return Err(Error::invalid_argument("PostgreSQL driver binds positionally only"));
        };
        if self.params.len() < index {
            self.params.resize(index, Value::Null);
        }
        self.params[index - 1] = value.clone();
        Ok(())
    }

    fn execute(&mut self) -> Result<bool> {
        let sql = rewrite_placeholders(&self.sql);
        let wrapped: Vec<SqlValue<'_>> = self.params.iter().map(SqlValue).collect();
        let param_refs: Vec<&(dyn ToSql + Sync)> =
            wrapped.iter().map(|value| value as &(dyn ToSql + Sync)).collect();

        let mut iter = self
            .client
            .query_raw(sql.as_str(), param_refs)
            .map_err(|err| pg_error(&sql, err))?;

        let mut rows = Vec::new();
        while let Some(row) = iter.next().transpose().map_err(|err| pg_error(&sql, err))? {
            rows.push(convert_row(&row)?);
        }
        self.affected = iter.rows_affected().unwrap_or(rows.len() as u64);
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

fn convert_row(row: &postgres::Row) -> Result<Row> {
    let mut columns = Vec::with_capacity(row.len());
    let mut values = Vec::with_capacity(row.len());
    for (index, column) in row.columns().iter().enumerate() {
        columns.push(column.name().to_string());
        values.push(convert_column(row, index, column.type_())?);
    }
    Ok(Row::new(columns, values))
}

fn convert_column(row: &postgres::Row, index: usize, ty: &Type) -> Result<Value> {
    use postgres::types::Type as PgType;

    let value = match *ty {
        PgType::BOOL => row.try_get::<_, Option<bool>>(index).ok().flatten().map(Value::Bool),
        PgType::INT2 => row.try_get::<_, Option<i16>>(index).ok().flatten().map(|v| Value::Int(v as i64)),
        PgType::INT4 => row.try_get::<_, Option<i32>>(index).ok().flatten().map(|v| Value::Int(v as i64)),
        PgType::INT8 => row.try_get::<_, Option<i64>>(index).ok().flatten().map(Value::Int),
        PgType::FLOAT4 => row.try_get::<_, Option<f32>>(index).ok().flatten().map(|v| Value::Float(v as f64)),
        PgType::FLOAT8 => row.try_get::<_, Option<f64>>(index).ok().flatten().map(Value::Float),
        PgType::BYTEA => row.try_get::<_, Option<Vec<u8>>>(index).ok().flatten().map(Value::Bytes),
        PgType::DATE => row.try_get::<_, Option<chrono::NaiveDate>>(index).ok().flatten().map(Value::Date),
        PgType::TIMESTAMP | PgType::TIMESTAMPTZ => {
            row.try_get::<_, Option<chrono::NaiveDateTime>>(index).ok().flatten().map(Value::DateTime)
        }
        _ => row.try_get::<_, Option<String>>(index).ok().flatten().map(Value::Text),
    };
    Ok(value.unwrap_or(Value::Null))
}

/// `?` placeholders are the uniform binding marker across every dialect
/// grammar; rust-postgres instead expects positional `$1, $2, ...`
/// markers, so the statement rewrites the template once, at `execute()`
/// time, with the same quote-aware, `??`-escaping scan
/// `Grammar::substitute_bindings_into_raw_sql` uses.
fn rewrite_placeholders(sql: &str) -> String {
    let mut output = String::with_capacity(sql.len());
    let mut in_string = false;
    let mut next_param = 1usize;
    let mut chars = sql.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\'' => {
                in_string = !in_string;
                output.push(ch);
            }
            '?' if !in_string && chars.peek() == Some(&'?') => {
                chars.next();
                output.push('?');
            }
            '?' if !in_string => {
                output.push_str(&format!("${next_param}"));
                next_param += 1;
            }
            _ => output.push(ch),
        }
    }
    output
}

fn pg_error(sql: &str, err: postgres::Error) -> Error {
    Error::query("default", sql, err)
}

fn parse_version_num(raw: &str) -> Result<Version> {
    // `server_version_num` is e.g. "150004" => 15.00.04.
    let number: u32 = raw
        .parse()
        .map_err(|_| Error::invalid_argument(format!("unparseable postgres server_version_num: {raw}")))?;
    Ok(Version { major: number / 10000, minor: (number / 100) % 100, patch: number % 100 })
}

/// Connects a plaintext (no TLS) client from discrete connection fields.
/// Production deployments needing TLS should construct their own
/// `postgres::Config`/connector and wrap it the same way.
pub(crate) fn connect(config: &sqlforge_core::ConnectionConfig) -> Result<Client> {
    let mut pg_config = postgres::Config::new();
    if let Some(host) = &config.host {
        if let Some(host) = host.as_slice().first() {
            pg_config.host(host);
        }
    }
    if let Some(port) = config.port {
        pg_config.port(port);
    }
    pg_config.dbname(&config.database);
    if let Some(user) = &config.username {
        pg_config.user(user);
    }
    if let Some(password) = &config.password {
        pg_config.password(password);
    }

    pg_config.connect(NoTls).map_err(|err| Error::query("default", "connect", err))
}
