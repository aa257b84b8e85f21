use futures_util::TryStreamExt;
use sqlforge_core::{BindKey, Error, FetchMode, Result, Row, Statement, Value, Version};
use tiberius::{AuthMethod, Client, ColumnType, Config, QueryItem};
use tokio::{
    net::TcpStream,
    runtime::{Builder, Runtime},
};
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

type TdsClient = Client<Compat<TcpStream>>;

/// tiberius has no synchronous API; a single-threaded Tokio runtime is
/// parked inside the driver and every call blocks on it.
pub(crate) struct MssqlDriver {
    runtime: Runtime,
    client: TdsClient,
}

impl MssqlDriver {
    pub(crate) fn new(runtime: Runtime, client: TdsClient) -> Self {
        Self { runtime, client }
    }
}

impl sqlforge_core::Driver for MssqlDriver {
    fn prepare(&mut self, sql: &str) -> Result<Box<dyn Statement + '_>> {
        Ok(Box::new(MssqlStatement {
            runtime: &self.runtime,
            client: &mut self.client,
            sql: sql.to_string(),
            params: Vec::new(),
            fetch_mode: FetchMode::default(),
            rows: Vec::new().into_iter(),
            affected: 0,
        }))
    }

    fn exec(&mut self, sql: &str) -> Result<u64> {
        let MssqlDriver { runtime, client } = self;
        runtime.block_on(async {
            let result = client.execute(sql, &[]).await.map_err(|err| mssql_error(sql, err))?;
            Ok(result.total())
        })
    }

    fn server_version(&mut self) -> Result<Version> {
        let raw = self.query_scalar_string("select cast(serverproperty('ProductVersion') as nvarchar(128))")?;
        parse_version(&raw)
    }
}

impl MssqlDriver {
    fn query_scalar_string(&mut self, sql: &str) -> Result<String> {
        let MssqlDriver { runtime, client } = self;
        runtime.block_on(async {
            let mut stream = client.simple_query(sql).await.map_err(|err| mssql_error(sql, err))?;
            while let Some(item) = stream.try_next().await.map_err(|err| mssql_error(sql, err))? {
                if let QueryItem::Row(row) = item {
                    if let Some(value) = row.get::<&str, usize>(0) {
                        return Ok(value.to_string());
                    }
                }
            }
            Err(Error::query("default", sql, std::io::Error::other("query returned no rows")))
        })
    }
}

/// `?` placeholders are the uniform binding marker across every dialect
/// grammar; tiberius instead expects named `@P1, @P2, ...` markers, so
/// the statement rewrites the template once, at `execute()` time, in the
/// same left-to-right scan `substitute_bindings_into_raw_sql` uses for
/// quoted-string skipping.
struct MssqlStatement<'c> {
    runtime: &'c Runtime,
    client: &'c mut TdsClient,
    sql: String,
    params: Vec<Value>,
    fetch_mode: FetchMode,
    rows: std::vec::IntoIter<Row>,
    affected: u64,
}

impl Statement for MssqlStatement<'_> {
    fn bind_value(&mut self, key: BindKey, value: &Value) -> Result<()> {
        let BindKey::Positional(index) = key else {
            return Err(Error::invalid_argument("SQL Server driver binds positionally only"));
        };
        if self.params.len() < index {
            self.params.resize(index, Value::Null);
        }
        self.params[index - 1] = value.clone();
        Ok(())
    }

    fn execute(&mut self) -> Result<bool> {
        let sql = rewrite_placeholders(&self.sql);
        let wrapped: Vec<TiberiusValue<'_>> = self.params.iter().map(TiberiusValue).collect();
        let param_refs: Vec<&dyn tiberius::ToSql> =
            wrapped.iter().map(|value| value as &dyn tiberius::ToSql).collect();

        let MssqlStatement { runtime, client, .. } = self;
        let (rows, affected) = runtime.block_on(async {
            let mut stream = client.query(sql.as_str(), param_refs.as_slice()).await.map_err(|err| mssql_error(&sql, err))?;
            let mut rows = Vec::new();
            let mut affected = 0u64;
            while let Some(item) = stream.try_next().await.map_err(|err| mssql_error(&sql, err))? {
                match item {
                    QueryItem::Row(row) => rows.push(convert_row(&row)?),
                    QueryItem::Metadata(_) => {}
                }
            }
            if let Some(rows_affected) = stream.into_results().await.ok().and_then(|sets| sets.first().map(Vec::len)) {
                affected = affected.max(rows_affected as u64);
            }
            Ok::<_, Error>((rows, affected.max(rows.len() as u64)))
        })?;

        self.affected = affected;
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

/// Wraps a borrowed [`Value`] so it can implement tiberius's foreign
/// `ToSql` trait without an orphan-rule violation (mirrors the postgres
/// and sqlite adapters' own `SqlValue`).
struct TiberiusValue<'a>(&'a Value);

impl tiberius::ToSql for TiberiusValue<'_> {
    fn to_sql(&self) -> tiberius::ColumnData<'static> {
        match self.0 {
            Value::Null => tiberius::ColumnData::Bit(None),
            Value::Bool(value) => tiberius::ColumnData::Bit(Some(*value)),
            Value::Int(value) => tiberius::ColumnData::I64(Some(*value)),
            Value::Float(value) => tiberius::ColumnData::F64(Some(*value)),
            Value::Text(value) => tiberius::ColumnData::String(Some(value.clone().into())),
            Value::Bytes(value) => tiberius::ColumnData::Binary(Some(value.clone().into())),
            Value::Date(value) => tiberius::ColumnData::String(Some(value.format("%Y-%m-%d").to_string().into())),
            Value::DateTime(value) => {
                tiberius::ColumnData::String(Some(value.format("%Y-%m-%d %H:%M:%S").to_string().into()))
            }
        }
    }
}

fn convert_row(row: &tiberius::Row) -> Result<Row> {
    let mut columns = Vec::with_capacity(row.columns().len());
    let mut values = Vec::with_capacity(row.columns().len());
    for (index, column) in row.columns().iter().enumerate() {
        columns.push(column.name().to_string());
        values.push(convert_column(row, index, column.column_type()));
    }
    Ok(Row::new(columns, values))
}

fn convert_column(row: &tiberius::Row, index: usize, column_type: ColumnType) -> Value {
    match column_type {
        ColumnType::Bit | ColumnType::Bitn => row.get::<bool, _>(index).map(Value::Bool),
        ColumnType::Int1 => row.get::<u8, _>(index).map(|v| Value::Int(v as i64)),
        ColumnType::Int2 => row.get::<i16, _>(index).map(|v| Value::Int(v as i64)),
        ColumnType::Int4 | ColumnType::Intn => row.get::<i32, _>(index).map(|v| Value::Int(v as i64)),
        ColumnType::Int8 => row.get::<i64, _>(index).map(Value::Int),
        ColumnType::Float4 => row.get::<f32, _>(index).map(|v| Value::Float(v as f64)),
        ColumnType::Float8 | ColumnType::Floatn => row.get::<f64, _>(index).map(Value::Float),
        ColumnType::BigBinary | ColumnType::BigVarBinary | ColumnType::Image => {
            row.get::<&[u8], _>(index).map(|v| Value::Bytes(v.to_vec()))
        }
        ColumnType::Daten => row.get::<chrono::NaiveDate, _>(index).map(Value::Date),
        ColumnType::Datetime2 | ColumnType::Datetime | ColumnType::Datetime4 | ColumnType::Datetimen => {
            row.get::<chrono::NaiveDateTime, _>(index).map(Value::DateTime)
        }
        _ => row.get::<&str, _>(index).map(|v| Value::Text(v.to_string())),
    }
    .unwrap_or(Value::Null)
}

/// Rewrites `?` into `@P1, @P2, ...` outside of single-quoted string
/// literals (`''` doubling recognized), mirroring the quote-aware scan
/// `Grammar::substitute_bindings_into_raw_sql` performs.
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
            '?' if !in_string => {
                output.push_str(&format!("@P{next_param}"));
                next_param += 1;
            }
            _ => output.push(ch),
        }
    }
    output
}

fn mssql_error(sql: &str, err: tiberius::error::Error) -> Error {
    Error::query("default", sql, err)
}

fn parse_version(raw: &str) -> Result<Version> {
    let mut parts = raw.trim().split('.');
    let major = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let minor = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let patch = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    Ok(Version { major, minor, patch })
}

/// Connects a plaintext TDS session (`trust_cert`, no TLS validation) from
/// discrete connection fields, then parks it behind a current-thread
/// runtime so the rest of the driver can call it synchronously.
pub(crate) fn connect(config: &sqlforge_core::ConnectionConfig) -> Result<(Runtime, TdsClient)> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| Error::query("default", "connect", err))?;

    let host = config.host.as_ref().and_then(|h| h.as_slice().first().map(|s| s.to_string())).unwrap_or_else(|| "127.0.0.1".to_string());
    let port = config.port.unwrap_or(1433);
    let username = config
        .username
        .clone()
        .ok_or_else(|| Error::invalid_argument("mssql connections require a username"))?;
    let password = config.password.clone().unwrap_or_default();

    let mut tds_config = Config::new();
    tds_config.host(&host);
    tds_config.port(port);
    tds_config.database(&config.database);
    tds_config.authentication(AuthMethod::sql_server(username, password));
    tds_config.trust_cert();

    let client = runtime.block_on(async {
        let tcp = TcpStream::connect(tds_config.get_addr()).await.map_err(|err| Error::query("default", "connect", err))?;
        tcp.set_nodelay(true).map_err(|err| Error::query("default", "connect", err))?;
        Client::connect(tds_config, tcp.compat_write()).await.map_err(|err| Error::query("default", "connect", err))
    })?;

    Ok((runtime, client))
}
