use async_trait::async_trait;
use bigdecimal::{BigDecimal, ToPrimitive};
use ipnetwork::IpNetwork;
use serde_json::Value;
use sqlx::postgres::types::{Oid, PgInterval, PgMoney, PgTimeTz};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgRow, PgSslMode};
use sqlx::{Column, Executor, PgPool, Row, Statement, TypeInfo, ValueRef};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::{Duration, Instant};

use super::{truncate_for_log, QueryExecutor};
use crate::config::{DatabaseConfig, PoolConfig};
use crate::error::GatewayError;
use crate::schema::{ColumnInfo, SchemaSnapshot};
use crate::table::Table;

const INTROSPECTION_QUERY: &str = r#"
SELECT c.table_name::text,
       c.column_name::text,
       c.data_type::text,
       c.is_nullable::text,
       c.column_default::text
FROM information_schema.columns c
JOIN information_schema.tables t
  ON t.table_schema = c.table_schema AND t.table_name = c.table_name
WHERE c.table_schema = $1 AND t.table_type = 'BASE TABLE'
ORDER BY c.table_name, c.ordinal_position
"#;

/// Pooled PostgreSQL access.
///
/// Statements run inside a read-only transaction that is always rolled back. The pool is
/// created lazily, so constructing a manager never touches the network. An unconfigured
/// manager holds no pool and refuses every call.
pub struct ConnectionManager {
    pool: Option<PgPool>,
    missing: Vec<String>,
    schema: String,
    statement_timeout_secs: Option<u64>,
}

impl ConnectionManager {
    pub fn new(database: &DatabaseConfig, pool: &PoolConfig) -> Result<Self, GatewayError> {
        let missing = database.missing_fields();
        if !missing.is_empty() {
            tracing::warn!(missing = ?missing, "Database is not configured; queries will be refused");
            return Ok(Self {
                pool: None,
                missing,
                schema: database.schema.clone(),
                statement_timeout_secs: pool.statement_timeout_secs,
            });
        }

        let ssl_mode = parse_ssl_mode(&database.ssl_mode).ok_or_else(|| GatewayError::Configuration {
            message: format!("unsupported ssl_mode '{}'", database.ssl_mode),
            fields: vec!["ssl_mode".to_string()],
        })?;

        let options = PgConnectOptions::new()
            .host(&database.host)
            .port(database.port)
            .database(database.name.as_deref().unwrap_or_default())
            .username(database.user.as_deref().unwrap_or_default())
            .password(database.password.as_deref().unwrap_or_default())
            .ssl_mode(ssl_mode);

        tracing::info!(
            host = %database.host,
            port = database.port,
            database = database.name.as_deref().unwrap_or_default(),
            max_connections = pool.max_connections(),
            "Configured PostgreSQL connection pool"
        );

        Ok(Self::with_options(options, pool, &database.schema))
    }

    /// Builds a manager from a `postgres://` URL. Used by tooling and live tests.
    pub fn from_url(url: &str, pool: &PoolConfig, schema: &str) -> Result<Self, GatewayError> {
        let options = PgConnectOptions::from_str(url).map_err(|e| GatewayError::Configuration {
            message: format!("invalid connection URL: {}", e),
            fields: vec!["url".to_string()],
        })?;
        Ok(Self::with_options(options, pool, schema))
    }

    fn with_options(options: PgConnectOptions, pool: &PoolConfig, schema: &str) -> Self {
        let pg_pool = PgPoolOptions::new()
            .max_connections(pool.max_connections())
            .min_connections(0)
            .acquire_timeout(Duration::from_secs(pool.acquire_timeout_secs))
            .idle_timeout(Some(Duration::from_secs(pool.idle_timeout_secs)))
            .test_before_acquire(true)
            .connect_lazy_with(options);

        Self {
            pool: Some(pg_pool),
            missing: Vec::new(),
            schema: schema.to_string(),
            statement_timeout_secs: pool.statement_timeout_secs,
        }
    }

    fn pool(&self) -> Result<&PgPool, GatewayError> {
        self.pool
            .as_ref()
            .ok_or_else(|| GatewayError::configuration(self.missing.clone()))
    }

    /// Connections currently open (idle or in use)
    pub fn open_connections(&self) -> u32 {
        self.pool.as_ref().map(|p| p.size()).unwrap_or(0)
    }

    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

#[async_trait]
impl QueryExecutor for ConnectionManager {
    async fn execute(&self, statement: &str) -> Result<Table, GatewayError> {
        let pool = self.pool()?;
        let started = Instant::now();

        let mut tx = pool.begin().await.map_err(map_sqlx_error)?;

        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        if let Some(secs) = self.statement_timeout_secs {
            sqlx::query(&format!("SET LOCAL statement_timeout = '{}s'", secs))
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }

        let result: Result<Vec<PgRow>, sqlx::Error> = sqlx::query(statement).fetch_all(&mut *tx).await;
        let rows = match result {
            Ok(rows) => rows,
            Err(e) => {
                let err = map_sqlx_error(e);
                tracing::warn!(
                    statement = %truncate_for_log(statement, 100),
                    error = %err,
                    "Query failed"
                );
                return Err(err);
            }
        };

        let columns: Vec<String> = match rows.first() {
            Some(first) => first.columns().iter().map(|c| c.name().to_string()).collect(),
            // No rows to read names from; ask the server for the projection instead
            None => (&mut *tx)
                .prepare(statement)
                .await
                .map(|prepared| {
                    prepared
                        .columns()
                        .iter()
                        .map(|c| c.name().to_string())
                        .collect()
                })
                .unwrap_or_default(),
        };

        tx.rollback().await.map_err(map_sqlx_error)?;

        let rows: Vec<Vec<Value>> = rows
            .iter()
            .map(|row| {
                row.columns()
                    .iter()
                    .enumerate()
                    .map(|(i, col)| decode_value(row, i, col.type_info().name()))
                    .collect()
            })
            .collect();

        tracing::info!(
            statement = %truncate_for_log(statement, 100),
            rows = rows.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Query executed"
        );

        Ok(Table::new(columns, rows))
    }

    async fn introspect(&self) -> SchemaSnapshot {
        let Ok(pool) = self.pool() else {
            return SchemaSnapshot::default();
        };

        let rows = sqlx::query_as::<_, (String, String, String, String, Option<String>)>(
            INTROSPECTION_QUERY,
        )
        .bind(&self.schema)
        .fetch_all(pool)
        .await;

        let rows = match rows {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(schema = %self.schema, error = %e, "Schema introspection failed");
                return SchemaSnapshot::default();
            }
        };

        let mut tables: BTreeMap<String, Vec<ColumnInfo>> = BTreeMap::new();
        for (table, name, data_type, is_nullable, default) in rows {
            tables.entry(table).or_default().push(ColumnInfo {
                name,
                data_type,
                nullable: is_nullable.eq_ignore_ascii_case("YES"),
                default,
            });
        }

        tracing::info!(schema = %self.schema, tables = tables.len(), "Schema introspected");
        SchemaSnapshot { tables }
    }

    async fn ping(&self) -> Result<Duration, GatewayError> {
        let pool = self.pool()?;
        let started = Instant::now();
        let mut conn = pool.acquire().await.map_err(map_sqlx_error)?;
        sqlx::query("SELECT 1")
            .execute(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;
        Ok(started.elapsed())
    }

    fn missing_configuration(&self) -> Vec<String> {
        self.missing.clone()
    }
}

/// Maps sqlx failures onto the gateway taxonomy. Pool exhaustion stays distinct from
/// statement errors; database errors keep the server's message verbatim.
pub fn map_sqlx_error(err: sqlx::Error) -> GatewayError {
    match err {
        sqlx::Error::PoolTimedOut => {
            GatewayError::resource_exhaustion("timed out waiting for a pooled connection")
        }
        sqlx::Error::PoolClosed => GatewayError::resource_exhaustion("connection pool is closed"),
        sqlx::Error::Database(db_err) => GatewayError::execution(db_err.message()),
        other => GatewayError::execution(other.to_string()),
    }
}

pub fn parse_ssl_mode(mode: &str) -> Option<PgSslMode> {
    match mode.trim().to_ascii_lowercase().as_str() {
        "disable" => Some(PgSslMode::Disable),
        "allow" => Some(PgSslMode::Allow),
        "prefer" => Some(PgSslMode::Prefer),
        "require" => Some(PgSslMode::Require),
        "verify-ca" => Some(PgSslMode::VerifyCa),
        "verify-full" => Some(PgSslMode::VerifyFull),
        _ => None,
    }
}

/// Decodes one cell into JSON by PostgreSQL type name. A non-null value no typed arm can
/// read comes back as its raw text, or as `\x` hex when the bytes are not printable.
fn decode_value(row: &PgRow, index: usize, type_name: &str) -> Value {
    let raw = match row.try_get_raw(index) {
        Ok(raw) => raw,
        Err(_) => return Value::Null,
    };
    if raw.is_null() {
        return Value::Null;
    }

    let typed = match array_element_type(type_name) {
        Some(element) => decode_array(row, index, element),
        None => decode_scalar(row, index, type_name),
    };

    typed.unwrap_or_else(|| raw.as_bytes().map(raw_to_json).unwrap_or(Value::Null))
}

fn get<'r, T>(row: &'r PgRow, index: usize) -> Option<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get::<T, _>(index).ok()
}

fn decode_scalar(row: &PgRow, index: usize, type_name: &str) -> Option<Value> {
    match type_name {
        "BOOL" => get::<bool>(row, index).map(Value::Bool),
        "INT2" => get::<i16>(row, index).map(|v| Value::Number(v.into())),
        "INT4" => get::<i32>(row, index).map(|v| Value::Number(v.into())),
        "INT8" => get::<i64>(row, index).map(|v| Value::Number(v.into())),
        "FLOAT4" => get::<f32>(row, index).map(|v| float_to_json(v.into())),
        "FLOAT8" => get::<f64>(row, index).map(float_to_json),
        "NUMERIC" => get::<BigDecimal>(row, index).map(numeric_to_json),
        "MONEY" => get::<PgMoney>(row, index).map(|m| numeric_to_json(m.to_bigdecimal(2))),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => get::<String>(row, index).map(Value::String),
        "JSON" | "JSONB" => get::<Value>(row, index),
        "UUID" => get::<uuid::Uuid>(row, index).map(|u| Value::String(u.to_string())),
        "TIMESTAMPTZ" => get::<chrono::DateTime<chrono::Utc>>(row, index)
            .map(|dt| Value::String(dt.to_rfc3339())),
        "TIMESTAMP" => get::<chrono::NaiveDateTime>(row, index).map(|dt| Value::String(dt.to_string())),
        "DATE" => get::<chrono::NaiveDate>(row, index).map(|d| Value::String(d.to_string())),
        "TIME" => get::<chrono::NaiveTime>(row, index).map(|t| Value::String(t.to_string())),
        "TIMETZ" => get::<PgTimeTz<chrono::NaiveTime, chrono::FixedOffset>>(row, index)
            .map(|t| Value::String(format!("{}{}", t.time, t.offset))),
        "INTERVAL" => get::<PgInterval>(row, index).map(|iv| Value::String(format_interval(&iv))),
        "BYTEA" => get::<Vec<u8>>(row, index).map(|bytes| Value::String(format!("\\x{}", hex::encode(bytes)))),
        "INET" => get::<IpNetwork>(row, index).map(|net| Value::String(format_inet(net))),
        "CIDR" => get::<IpNetwork>(row, index).map(|net| Value::String(net.to_string())),
        "OID" => get::<Oid>(row, index).map(|oid| Value::Number(oid.0.into())),
        // reg* aliases share the OID wire format
        "REGCLASS" | "REGPROC" | "REGTYPE" | "REGNAMESPACE" | "REGROLE" => row
            .try_get_unchecked::<Oid, _>(index)
            .ok()
            .map(|oid| Value::Number(oid.0.into())),
        _ => None,
    }
}

/// `INT4[]` and `_int4` both name an array of `INT4`.
fn array_element_type(type_name: &str) -> Option<&str> {
    type_name
        .strip_suffix("[]")
        .or_else(|| type_name.strip_prefix('_'))
}

fn decode_array(row: &PgRow, index: usize, element: &str) -> Option<Value> {
    fn list<T>(row: &PgRow, index: usize, to_json: fn(T) -> Value) -> Option<Value>
    where
        Vec<Option<T>>: for<'r> sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
    {
        let items = row.try_get::<Vec<Option<T>>, _>(index).ok()?;
        Some(Value::Array(
            items
                .into_iter()
                .map(|item| item.map_or(Value::Null, to_json))
                .collect(),
        ))
    }

    match element.to_ascii_uppercase().as_str() {
        "BOOL" => list::<bool>(row, index, Value::Bool),
        "INT2" => list::<i16>(row, index, |v| Value::Number(v.into())),
        "INT4" => list::<i32>(row, index, |v| Value::Number(v.into())),
        "INT8" => list::<i64>(row, index, |v| Value::Number(v.into())),
        "FLOAT4" => list::<f32>(row, index, |v| float_to_json(v.into())),
        "FLOAT8" => list::<f64>(row, index, float_to_json),
        "NUMERIC" => list::<BigDecimal>(row, index, numeric_to_json),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => list::<String>(row, index, Value::String),
        "UUID" => list::<uuid::Uuid>(row, index, |u| Value::String(u.to_string())),
        "JSON" | "JSONB" => list::<Value>(row, index, |v| v),
        "DATE" => list::<chrono::NaiveDate>(row, index, |d| Value::String(d.to_string())),
        "TIMESTAMP" => list::<chrono::NaiveDateTime>(row, index, |dt| Value::String(dt.to_string())),
        "TIMESTAMPTZ" => {
            list::<chrono::DateTime<chrono::Utc>>(row, index, |dt| Value::String(dt.to_rfc3339()))
        }
        "INET" => list::<IpNetwork>(row, index, |net| Value::String(format_inet(net))),
        _ => None,
    }
}

fn float_to_json(v: f64) -> Value {
    serde_json::Number::from_f64(v)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(v.to_string()))
}

/// NUMERIC has no range limit. Values an f64 holds exactly become JSON numbers,
/// everything else keeps its full decimal text.
fn numeric_to_json(value: BigDecimal) -> Value {
    if value.digits() <= 15 {
        if let Some(n) = value.to_f64().and_then(serde_json::Number::from_f64) {
            return Value::Number(n);
        }
    }
    Value::String(value.normalized().to_plain_string())
}

/// Renders an interval the way psql does: `1 year 2 mons 3 days 04:05:06`.
fn format_interval(interval: &PgInterval) -> String {
    fn unit(n: i32, singular: &str, plural: &str) -> String {
        format!("{} {}", n, if n.abs() == 1 { singular } else { plural })
    }

    let mut parts = Vec::new();
    let (years, months) = (interval.months / 12, interval.months % 12);
    if years != 0 {
        parts.push(unit(years, "year", "years"));
    }
    if months != 0 {
        parts.push(unit(months, "mon", "mons"));
    }
    if interval.days != 0 {
        parts.push(unit(interval.days, "day", "days"));
    }

    if interval.microseconds != 0 || parts.is_empty() {
        let sign = if interval.microseconds < 0 { "-" } else { "" };
        let micros = interval.microseconds.unsigned_abs();
        let secs = micros / 1_000_000;
        let mut clock = format!("{}{:02}:{:02}:{:02}", sign, secs / 3600, (secs % 3600) / 60, secs % 60);
        if micros % 1_000_000 != 0 {
            clock.push_str(&format!(".{:06}", micros % 1_000_000));
        }
        parts.push(clock);
    }

    parts.join(" ")
}

/// Single-host INET values print without their prefix length.
fn format_inet(net: IpNetwork) -> String {
    let host_prefix = match net {
        IpNetwork::V4(_) => 32,
        IpNetwork::V6(_) => 128,
    };
    if net.prefix() == host_prefix {
        net.ip().to_string()
    } else {
        net.to_string()
    }
}

fn raw_to_json(bytes: &[u8]) -> Value {
    match std::str::from_utf8(bytes) {
        Ok(text) if !text.chars().any(|c| c.is_control() && !c.is_whitespace()) => {
            Value::String(text.to_string())
        }
        _ => Value::String(format!("\\x{}", hex::encode(bytes))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn configured() -> DatabaseConfig {
        DatabaseConfig {
            name: Some("analytics".into()),
            user: Some("reader".into()),
            password: Some("secret".into()),
            ..DatabaseConfig::default()
        }
    }

    #[test]
    fn test_parse_ssl_mode() {
        assert!(matches!(parse_ssl_mode("prefer"), Some(PgSslMode::Prefer)));
        assert!(matches!(parse_ssl_mode(" Require "), Some(PgSslMode::Require)));
        assert!(matches!(parse_ssl_mode("verify-full"), Some(PgSslMode::VerifyFull)));
        assert!(parse_ssl_mode("sometimes").is_none());
    }

    #[test]
    fn test_pool_errors_are_resource_exhaustion() {
        assert_eq!(
            map_sqlx_error(sqlx::Error::PoolTimedOut).kind(),
            ErrorKind::ResourceExhaustion
        );
        assert_eq!(
            map_sqlx_error(sqlx::Error::PoolClosed).kind(),
            ErrorKind::ResourceExhaustion
        );
        assert_eq!(
            map_sqlx_error(sqlx::Error::RowNotFound).kind(),
            ErrorKind::Execution
        );
    }

    #[tokio::test]
    async fn test_unconfigured_manager_refuses_without_connecting() {
        let manager = ConnectionManager::new(&DatabaseConfig::default(), &PoolConfig::default()).unwrap();
        assert_eq!(manager.missing_configuration(), vec!["name", "user", "password"]);

        let err = manager.execute("SELECT 1").await.unwrap_err();
        assert!(matches!(err, GatewayError::Configuration { ref fields, .. } if fields.len() == 3));
        assert!(manager.ping().await.is_err());
        assert!(manager.introspect().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_ssl_mode_is_configuration_error() {
        let mut database = configured();
        database.ssl_mode = "sometimes".into();
        let err = ConnectionManager::new(&database, &PoolConfig::default())
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_configured_manager_is_lazy() {
        let manager = ConnectionManager::new(&configured(), &PoolConfig::default()).unwrap();
        assert!(manager.missing_configuration().is_empty());
        assert_eq!(manager.open_connections(), 0);
    }

    #[test]
    fn test_numeric_beyond_f64_keeps_full_text() {
        let big = BigDecimal::from_str("123456789012345678901234567890.5").unwrap();
        assert_eq!(numeric_to_json(big), Value::from("123456789012345678901234567890.5"));

        let factorial = BigDecimal::from_str("265252859812191058636308480000000").unwrap();
        assert_eq!(numeric_to_json(factorial), Value::from("265252859812191058636308480000000"));
    }

    #[test]
    fn test_small_numeric_is_a_number() {
        assert_eq!(numeric_to_json(BigDecimal::from_str("12.50").unwrap()), Value::from(12.5));
        assert_eq!(numeric_to_json(BigDecimal::from_str("-3").unwrap()), Value::from(-3.0));
    }

    #[test]
    fn test_format_interval() {
        let interval = |months, days, microseconds| PgInterval { months, days, microseconds };
        assert_eq!(format_interval(&interval(0, 3, 0)), "3 days");
        assert_eq!(format_interval(&interval(14, 1, 0)), "1 year 2 mons 1 day");
        assert_eq!(format_interval(&interval(0, 0, 3_723_000_000)), "01:02:03");
        assert_eq!(format_interval(&interval(0, 0, 1_500_000)), "00:00:01.500000");
        assert_eq!(format_interval(&interval(0, 0, -90_000_000)), "-00:01:30");
        assert_eq!(format_interval(&interval(0, 0, 0)), "00:00:00");
    }

    #[test]
    fn test_format_inet() {
        assert_eq!(format_inet("10.0.0.1/32".parse().unwrap()), "10.0.0.1");
        assert_eq!(format_inet("10.0.0.0/8".parse().unwrap()), "10.0.0.0/8");
        assert_eq!(format_inet("::1/128".parse().unwrap()), "::1");
    }

    #[test]
    fn test_raw_fallback_is_text_or_hex() {
        assert_eq!(raw_to_json(b"happy"), Value::from("happy"));
        assert_eq!(raw_to_json(&[0x00, 0x01, 0xff]), Value::from("\\x0001ff"));
    }

    #[test]
    fn test_array_element_type() {
        assert_eq!(array_element_type("INT4[]"), Some("INT4"));
        assert_eq!(array_element_type("_text"), Some("text"));
        assert_eq!(array_element_type("INT4"), None);
    }

    fn live_manager() -> Option<ConnectionManager> {
        let url = std::env::var("QUERYGATE_TEST_DATABASE_URL").ok()?;
        ConnectionManager::from_url(&url, &PoolConfig::default(), "public").ok()
    }

    #[tokio::test]
    #[ignore = "requires QUERYGATE_TEST_DATABASE_URL"]
    async fn test_live_select_one() {
        let manager = live_manager().expect("QUERYGATE_TEST_DATABASE_URL not set");
        let table = manager.execute("SELECT 1 AS one").await.unwrap();
        assert_eq!(table.columns, vec!["one"]);
        assert_eq!(table.rows, vec![vec![Value::from(1)]]);
        assert!(manager.ping().await.is_ok());
    }

    #[tokio::test]
    #[ignore = "requires QUERYGATE_TEST_DATABASE_URL"]
    async fn test_live_wide_numeric_does_not_fault() {
        let manager = live_manager().expect("QUERYGATE_TEST_DATABASE_URL not set");
        let table = manager
            .execute("SELECT 123456789012345678901234567890.5 AS f, factorial(30) AS g, 12.50::numeric AS h")
            .await
            .unwrap();
        assert_eq!(
            table.rows,
            vec![vec![
                Value::from("123456789012345678901234567890.5"),
                Value::from("265252859812191058636308480000000"),
                Value::from(12.5),
            ]]
        );
    }

    #[tokio::test]
    #[ignore = "requires QUERYGATE_TEST_DATABASE_URL"]
    async fn test_live_non_scalar_types_are_not_null() {
        let manager = live_manager().expect("QUERYGATE_TEST_DATABASE_URL not set");
        let table = manager
            .execute(
                "SELECT ARRAY[1,2] AS arr, interval '3 days' AS iv, 'abc'::bytea AS by, \
                 '10.0.0.1'::inet AS ip, 7::oid AS o, 'red'::text AS t, NULL::int AS n",
            )
            .await
            .unwrap();
        assert_eq!(
            table.rows,
            vec![vec![
                serde_json::json!([1, 2]),
                Value::from("3 days"),
                Value::from("\\x616263"),
                Value::from("10.0.0.1"),
                Value::from(7),
                Value::from("red"),
                Value::Null,
            ]]
        );
    }

    #[tokio::test]
    #[ignore = "requires QUERYGATE_TEST_DATABASE_URL"]
    async fn test_live_unknown_type_falls_back_to_text() {
        let manager = live_manager().expect("QUERYGATE_TEST_DATABASE_URL not set");
        let table = manager.execute("SELECT '<a/>'::xml AS doc").await.unwrap();
        assert_eq!(table.rows, vec![vec![Value::from("<a/>")]]);
    }

    #[tokio::test]
    #[ignore = "requires QUERYGATE_TEST_DATABASE_URL"]
    async fn test_live_empty_result_keeps_columns() {
        let manager = live_manager().expect("QUERYGATE_TEST_DATABASE_URL not set");
        let table = manager
            .execute("SELECT 1 AS a, 'x'::text AS b WHERE false")
            .await
            .unwrap();
        assert_eq!(table.columns, vec!["a", "b"]);
        assert!(table.is_empty());
    }

    #[tokio::test]
    #[ignore = "requires QUERYGATE_TEST_DATABASE_URL"]
    async fn test_live_read_only_transaction_blocks_writes() {
        let manager = live_manager().expect("QUERYGATE_TEST_DATABASE_URL not set");
        // No classification happens here; the read-only transaction alone refuses this
        let err = manager
            .execute("CREATE TEMP TABLE should_not_exist (id int)")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Execution);
    }

    #[tokio::test]
    #[ignore = "requires QUERYGATE_TEST_DATABASE_URL"]
    async fn test_live_backend_error_is_verbatim() {
        let manager = live_manager().expect("QUERYGATE_TEST_DATABASE_URL not set");
        let err = manager
            .execute("SELECT * FROM table_that_does_not_exist")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("table_that_does_not_exist"));
    }
}
