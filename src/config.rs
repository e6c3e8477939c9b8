//! Startup configuration.
//!
//! Every option is read from the environment (after an optional `.env`
//! file) through a lookup closure, so tests can pass a plain map. Each job
//! validates only the settings it needs: the collector never asks for
//! database settings, the loader never asks for an API key.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use sqlx::postgres::PgConnectOptions;
use tokio_cron_scheduler::Job;

use crate::db::intraday_queries::ConflictKey;
use crate::errors::AppError;
use crate::external::alphavantage::DEFAULT_BASE_URL;

const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_SERVER_PORT: u16 = 3000;
const DEFAULT_COLLECT_SCHEDULE: &str = "0 */5 * * * *";
const DEFAULT_LOAD_SCHEDULE: &str = "0 2-59/5 * * * *";

/// Bar interval requested from the market-data API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interval {
    OneMinute,
    #[default]
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    SixtyMinutes,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1min",
            Interval::FiveMinutes => "5min",
            Interval::FifteenMinutes => "15min",
            Interval::ThirtyMinutes => "30min",
            Interval::SixtyMinutes => "60min",
        }
    }

    /// Top-level key holding the bars in an archived snapshot.
    pub fn series_key(&self) -> String {
        format!("Time Series ({})", self.as_str())
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1min" => Ok(Interval::OneMinute),
            "5min" => Ok(Interval::FiveMinutes),
            "15min" => Ok(Interval::FifteenMinutes),
            "30min" => Ok(Interval::ThirtyMinutes),
            "60min" => Ok(Interval::SixtyMinutes),
            other => Err(format!(
                "unknown interval '{}', expected one of 1min, 5min, 15min, 30min, 60min",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    S3 { bucket: String },
    Local { root: PathBuf },
    Memory,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

impl StorageConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match optional(&lookup, "STORAGE_BACKEND").as_deref() {
            None | Some("s3") => StorageBackend::S3 {
                bucket: required(&lookup, "STORAGE_BUCKET")?,
            },
            Some("local") => StorageBackend::Local {
                root: PathBuf::from(required(&lookup, "STORAGE_ROOT")?),
            },
            Some("memory") => StorageBackend::Memory,
            Some(other) => {
                return Err(AppError::Config(format!(
                    "STORAGE_BACKEND must be 's3', 'local' or 'memory', got '{}'",
                    other
                )))
            }
        };

        Ok(Self { backend })
    }
}

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub symbols: Vec<String>,
    pub interval: Interval,
    pub api_key: String,
    pub base_url: String,
}

impl CollectorConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let symbols = parse_symbols(&required(&lookup, "QUOTE_SYMBOLS")?)?;
        let interval = parse_or(&lookup, "QUOTE_INTERVAL", Interval::default())?;
        let api_key = required(&lookup, "ALPHAVANTAGE_API_KEY")?;
        let base_url = optional(&lookup, "ALPHAVANTAGE_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        url::Url::parse(&base_url).map_err(|e| {
            AppError::Config(format!("ALPHAVANTAGE_BASE_URL is not a valid URL: {}", e))
        })?;

        Ok(Self {
            symbols,
            interval,
            api_key,
            base_url,
        })
    }
}

#[derive(Clone)]
pub enum DatabaseConfig {
    Url(String),
    Parts {
        host: String,
        name: String,
        user: String,
        password: String,
        port: u16,
    },
}

const REDACTED: &str = "***";

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseConfig::Url(url) => f.debug_tuple("Url").field(&redact_url(url)).finish(),
            DatabaseConfig::Parts {
                host,
                name,
                user,
                port,
                ..
            } => f
                .debug_struct("Parts")
                .field("host", host)
                .field("name", name)
                .field("user", user)
                .field("password", &REDACTED)
                .field("port", port)
                .finish(),
        }
    }
}

/// Masks the password of a connection URL; an unparseable URL is hidden whole.
fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some(REDACTED));
            }
            url.to_string()
        }
        Err(_) => REDACTED.to_string(),
    }
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> Result<PgConnectOptions, AppError> {
        match self {
            DatabaseConfig::Url(url) => url
                .parse::<PgConnectOptions>()
                .map_err(|e| AppError::Config(format!("DATABASE_URL is invalid: {}", e))),
            DatabaseConfig::Parts {
                host,
                name,
                user,
                password,
                port,
            } => Ok(PgConnectOptions::new()
                .host(host)
                .port(*port)
                .username(user)
                .password(password)
                .database(name)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub interval: Interval,
    pub prefix: Option<String>,
    pub table_key: ConflictKey,
    pub database: DatabaseConfig,
    pub max_connections: u32,
}

impl LoaderConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database = match optional(&lookup, "DATABASE_URL") {
            Some(url) => DatabaseConfig::Url(url),
            None => DatabaseConfig::Parts {
                host: required(&lookup, "DB_HOST")?,
                name: required(&lookup, "DB_NAME")?,
                user: required(&lookup, "DB_USER")?,
                password: required(&lookup, "DB_PASS")?,
                port: parse_required(&lookup, "DB_PORT")?,
            },
        };

        let max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?;
        if max_connections == 0 {
            return Err(AppError::Config(
                "DB_MAX_CONNECTIONS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            interval: parse_or(&lookup, "QUOTE_INTERVAL", Interval::default())?,
            prefix: optional(&lookup, "LOADER_PREFIX"),
            table_key: parse_or(&lookup, "INTRADAY_TABLE_KEY", ConflictKey::default())?,
            database,
            max_connections,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub collect_schedule: String,
    pub load_schedule: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let collect_schedule = optional(&lookup, "COLLECT_SCHEDULE")
            .unwrap_or_else(|| DEFAULT_COLLECT_SCHEDULE.to_string());
        let load_schedule = optional(&lookup, "LOAD_SCHEDULE")
            .unwrap_or_else(|| DEFAULT_LOAD_SCHEDULE.to_string());

        check_schedule("COLLECT_SCHEDULE", &collect_schedule)?;
        check_schedule("LOAD_SCHEDULE", &load_schedule)?;

        Ok(Self {
            port: parse_or(&lookup, "SERVER_PORT", DEFAULT_SERVER_PORT)?,
            collect_schedule,
            load_schedule,
        })
    }
}

pub(crate) fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Blank values count as unset.
pub(crate) fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required<F>(lookup: &F, key: &str) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, key).ok_or_else(|| AppError::Config(format!("{} is not set", key)))
}

fn parse_required<F, T>(lookup: &F, key: &str) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = required(lookup, key)?;
    raw.parse()
        .map_err(|e| AppError::Config(format!("{} has invalid value '{}': {}", key, raw, e)))
}

pub(crate) fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match optional(lookup, key) {
        Some(_) => parse_required(lookup, key),
        None => Ok(default),
    }
}

fn parse_symbols(raw: &str) -> Result<Vec<String>, AppError> {
    let mut symbols = Vec::new();

    for part in raw.split(',') {
        let symbol = part.trim();
        if symbol.is_empty() {
            return Err(AppError::Config(format!(
                "QUOTE_SYMBOLS contains an empty entry: '{}'",
                raw
            )));
        }
        // Symbols become the first segment of the storage key.
        if symbol.contains('/') {
            return Err(AppError::Config(format!(
                "QUOTE_SYMBOLS entry '{}' must not contain '/'",
                symbol
            )));
        }
        symbols.push(symbol.to_string());
    }

    Ok(symbols)
}

/// Parses `expr` the same way the scheduler will when the job is registered.
fn check_schedule(key: &str, expr: &str) -> Result<(), AppError> {
    Job::new(expr, |_uuid, _scheduler| {}).map(|_| ()).map_err(|e| {
        AppError::Config(format!(
            "{} is not a valid cron expression (sec min hour day month weekday [year]), got '{}': {}",
            key, expr, e
        ))
    })
}
