//! Job configuration loaded from environment variables.
//!
//! `.env` files are honoured (loaded by the binary with `dotenvy`) and every value can be
//! overridden from the process environment. Credentials are never compiled in.
//!
//! # Environment Variables
//!
//! ## Profile selection
//! - `APP_ENV`: `prod` / `production` selects the production profile. Anything else,
//!   including unset, selects development.
//! - `ENV`: consulted only when `APP_ENV` is unset.
//!
//! ## Database endpoint (`PREFIX` is `PROD` or `DEV` depending on the profile)
//! - `{PREFIX}_DB_HOST`: required in production (development default: "127.0.0.1")
//! - `{PREFIX}_DB_PORT`: default 3306
//! - `{PREFIX}_DB_USER`: required in production (development default: "root")
//! - `{PREFIX}_DB_PASSWORD`: required in production (development default: empty)
//! - `{PREFIX}_DB_NAME`: required in production (development default: "task_manage")
//! - `DB_DRIVER`: `mysql` (default), `postgres` or `sqlite`
//! - `DATABASE_URL`: full connection URL, overrides everything above
//!
//! ## Job behaviour
//! - `TASK_COUNT_GROUPING`: `system_employee` (default) or `global`
//! - `RUST_LOG`: logging filter (default: "info,task_state_snapshot=debug")

use crate::domain::task_state::{errors::TaskStateError, grouping::GroupingStrategy};
use std::fmt;
use url::Url;

/// Variables consulted for the profile indicator, in priority order.
pub const PROFILE_VARS: [&str; 2] = ["APP_ENV", "ENV"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Production,
    Development,
}

impl Profile {
    fn env_prefix(self) -> &'static str {
        match self {
            Profile::Production => "PROD",
            Profile::Development => "DEV",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Production => f.write_str("production"),
            Profile::Development => f.write_str("development"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultReason {
    Unset,
    Unrecognized { var: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileSource {
    Recognized { var: String, value: String },
    Defaulted(DefaultReason),
}

/// Outcome of profile resolution. Keeps track of whether the profile was asked for or
/// fell back to development, so the caller can surface misconfiguration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSelection {
    pub profile: Profile,
    pub source: ProfileSource,
}

impl ProfileSelection {
    pub fn is_defaulted(&self) -> bool {
        matches!(self.source, ProfileSource::Defaulted(_))
    }
}

/// Resolve the deployment profile using `lookup` to read variables.
pub fn resolve_profile<F>(lookup: F) -> ProfileSelection
where
    F: Fn(&str) -> Option<String>,
{
    let Some((var, value)) = PROFILE_VARS
        .iter()
        .find_map(|var| lookup(*var).map(|value| (var.to_string(), value)))
    else {
        return ProfileSelection {
            profile: Profile::Development,
            source: ProfileSource::Defaulted(DefaultReason::Unset),
        };
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "prod" | "production" => ProfileSelection {
            profile: Profile::Production,
            source: ProfileSource::Recognized { var, value },
        },
        "dev" | "development" => ProfileSelection {
            profile: Profile::Development,
            source: ProfileSource::Recognized { var, value },
        },
        _ => ProfileSelection {
            profile: Profile::Development,
            source: ProfileSource::Defaulted(DefaultReason::Unrecognized { var, value }),
        },
    }
}

/// Database flavour, detected from a URL scheme or chosen with `DB_DRIVER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbDriver {
    MySql,
    Postgres,
    Sqlite,
}

impl DbDriver {
    pub fn from_url(url: &str) -> Result<Self, TaskStateError> {
        if url.starts_with("mysql://") || url.starts_with("mariadb://") {
            Ok(DbDriver::MySql)
        } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(DbDriver::Postgres)
        } else if url.starts_with("sqlite:") {
            Ok(DbDriver::Sqlite)
        } else {
            Err(TaskStateError::Configuration(format!(
                "unable to detect database driver from URL scheme of '{}'",
                redact_url(url)
            )))
        }
    }

    fn scheme(self) -> &'static str {
        match self {
            DbDriver::MySql => "mysql",
            DbDriver::Postgres => "postgres",
            DbDriver::Sqlite => "sqlite",
        }
    }
}

impl std::str::FromStr for DbDriver {
    type Err = TaskStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(DbDriver::MySql),
            "postgres" | "postgresql" => Ok(DbDriver::Postgres),
            "sqlite" => Ok(DbDriver::Sqlite),
            other => Err(TaskStateError::Configuration(format!(
                "unknown database driver '{other}'"
            ))),
        }
    }
}

/// Where the snapshot job connects to.
#[derive(Clone, PartialEq, Eq)]
pub enum DatabaseConfig {
    Endpoint {
        driver: DbDriver,
        host: String,
        port: u16,
        user: String,
        password: String,
        database: String,
    },
    Url(String),
}

impl DatabaseConfig {
    pub fn driver(&self) -> Result<DbDriver, TaskStateError> {
        match self {
            DatabaseConfig::Endpoint { driver, .. } => Ok(*driver),
            DatabaseConfig::Url(url) => DbDriver::from_url(url),
        }
    }

    /// Connection URL for sqlx. Endpoint credentials and the database name are
    /// percent-encoded, so reserved characters in a password never change the endpoint.
    pub fn url(&self) -> Result<String, TaskStateError> {
        match self {
            DatabaseConfig::Url(url) => Ok(url.clone()),
            DatabaseConfig::Endpoint {
                driver: DbDriver::Sqlite,
                database,
                ..
            } => Ok(format!("sqlite:{database}")),
            DatabaseConfig::Endpoint {
                driver,
                host,
                port,
                user,
                password,
                database,
            } => endpoint_url(*driver, host, *port, user, password, database),
        }
    }

    /// The connection URL with any password masked, for logs.
    pub fn redacted_url(&self) -> String {
        match self.url() {
            Ok(url) => redact_url(&url),
            Err(e) => format!("<{e}>"),
        }
    }
}

fn endpoint_url(
    driver: DbDriver,
    host: &str,
    port: u16,
    user: &str,
    password: &str,
    database: &str,
) -> Result<String, TaskStateError> {
    let invalid = |part: &str| {
        TaskStateError::Configuration(format!("database {part} cannot be used in a URL"))
    };

    let mut url = Url::parse(&format!("{}://localhost", driver.scheme()))
        .map_err(|e| TaskStateError::Configuration(e.to_string()))?;
    url.set_host(Some(host)).map_err(|e| {
        TaskStateError::Configuration(format!("invalid database host '{host}': {e}"))
    })?;
    url.set_port(Some(port)).map_err(|_| invalid("port"))?;
    url.set_username(user).map_err(|_| invalid("user"))?;
    if !password.is_empty() {
        url.set_password(Some(password)).map_err(|_| invalid("password"))?;
    }
    url.path_segments_mut()
        .map_err(|_| invalid("name"))?
        .clear()
        .push(database);
    Ok(url.to_string())
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DatabaseConfig")
            .field(&self.redacted_url())
            .finish()
    }
}

fn redact_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) if parsed.password().is_some() => match parsed.set_password(Some("***")) {
            Ok(()) => parsed.to_string(),
            Err(()) => format!("{}://***", parsed.scheme()),
        },
        Ok(_) => url.to_string(),
        Err(_) => match url.split_once("://") {
            Some((scheme, _)) => format!("{scheme}://***"),
            None => url.to_string(),
        },
    }
}

/// Complete job configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub profile: ProfileSelection,
    pub database: DatabaseConfig,
    pub grouping: GroupingStrategy,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the production profile is selected and a required credential is
    /// missing, or if a set variable cannot be parsed.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let profile = resolve_profile(&lookup);
        let database = match lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()) {
            Some(url) => DatabaseConfig::Url(url),
            None => endpoint_for(profile.profile, &lookup)?,
        };
        Ok(Self {
            profile,
            database,
            grouping: env_or(&lookup, "TASK_COUNT_GROUPING", GroupingStrategy::default())?,
        })
    }
}

fn endpoint_for<F>(profile: Profile, lookup: &F) -> anyhow::Result<DatabaseConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let prefix = profile.env_prefix();
    let key = |name: &str| format!("{prefix}_DB_{name}");
    let driver = env_or(lookup, "DB_DRIVER", DbDriver::MySql)?;
    let port = env_or(lookup, &key("PORT"), 3306u16)?;

    let endpoint = match profile {
        Profile::Production => DatabaseConfig::Endpoint {
            driver,
            host: env_required(lookup, &key("HOST"))?,
            port,
            user: env_required(lookup, &key("USER"))?,
            password: env_required(lookup, &key("PASSWORD"))?,
            database: env_required(lookup, &key("NAME"))?,
        },
        Profile::Development => DatabaseConfig::Endpoint {
            driver,
            host: env_or(lookup, &key("HOST"), "127.0.0.1".to_string())?,
            port,
            user: env_or(lookup, &key("USER"), "root".to_string())?,
            password: lookup(&key("PASSWORD")).unwrap_or_default(),
            database: env_or(lookup, &key("NAME"), "task_manage".to_string())?,
        },
    };
    Ok(endpoint)
}

/// Load a required variable.
///
/// # Errors
///
/// Returns a configuration error if the variable is not set.
fn env_required<F>(lookup: &F, key: &str) -> anyhow::Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).ok_or_else(|| {
        TaskStateError::Configuration(format!("missing required environment variable: {key}"))
            .into()
    })
}

/// Load a variable with a default value.
///
/// # Errors
///
/// Returns an error if the variable is set but cannot be parsed.
fn env_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(val) => val.parse::<T>().map_err(|e| {
            TaskStateError::Configuration(format!("failed to parse {key}: {e}")).into()
        }),
        None => Ok(default),
    }
}
