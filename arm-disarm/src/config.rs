use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub const DB_PORT: u16 = 3306;

const DB_HOST: &str = "DB_HOST";
const DB_USER: &str = "DB_USER";
const DB_PASSWORD: &str = "DB_PASSWORD";
const DB_NAME: &str = "DB_NAME";
const UPSERT_MODE: &str = "UPSERT_MODE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("unknown upsert mode `{0}` (expected `check-then-write` or `atomic`)")]
    InvalidUpsertMode(String),
}

/// How a report is written once the connection is up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpsertMode {
    /// Count the rows for the device, then UPDATE or INSERT. Two concurrent
    /// first reports for the same device can both take the insert branch.
    #[default]
    CheckThenWrite,
    /// Lock the key with `SELECT ... FOR UPDATE`, then
    /// `INSERT ... ON DUPLICATE KEY UPDATE`, in one transaction.
    Atomic,
}

impl FromStr for UpsertMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "check-then-write" | "check_then_write" => Ok(UpsertMode::CheckThenWrite),
            "atomic" => Ok(UpsertMode::Atomic),
            other => Err(ConfigError::InvalidUpsertMode(other.to_string())),
        }
    }
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub port: u16,
    pub upsert_mode: UpsertMode,
}

impl DatabaseConfig {
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            password: password.into(),
            database: database.into(),
            port: DB_PORT,
            upsert_mode: UpsertMode::default(),
        }
    }

    pub fn with_upsert_mode(mut self, upsert_mode: UpsertMode) -> Self {
        self.upsert_mode = upsert_mode;
        self
    }

    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves every variable through `lookup`. Empty values count as unset,
    /// and all missing names are reported together.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let host = get(DB_HOST);
        let user = get(DB_USER);
        let password = get(DB_PASSWORD);
        let database = get(DB_NAME);

        let missing: Vec<&'static str> = [
            (DB_HOST, host.is_none()),
            (DB_USER, user.is_none()),
            (DB_PASSWORD, password.is_none()),
            (DB_NAME, database.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        match (host, user, password, database) {
            (Some(host), Some(user), Some(password), Some(database)) => {
                let upsert_mode = match get(UPSERT_MODE) {
                    Some(mode) => mode.parse()?,
                    None => UpsertMode::default(),
                };
                Ok(Self::new(host, user, password, database).with_upsert_mode(upsert_mode))
            }
            _ => Err(ConfigError::Missing(missing)),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("port", &self.port)
            .field("upsert_mode", &self.upsert_mode)
            .finish()
    }
}
