use std::path::PathBuf;
use std::time::Duration;

/// Settings for the whole service, resolved once at startup
#[derive(Clone, Debug)]
pub struct Config {
    pub database: DatabaseConfig,
    pub http: HttpConfig,
    pub provider: ProviderMode,
    pub seed: bool,
    /// Data boxes whose new messages are ingested at startup
    pub sync_mailboxes: Vec<String>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DatabaseBackend {
    Postgres {
        name: String,
        user: String,
        password: String,
        host: String,
        port: u16,
    },
    Sqlite {
        path: PathBuf,
    },
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    /// Maximum number of open connections
    pub pool_size: u32,
    /// Upper bound for connecting, checking out a connection and running a statement
    pub timeout: Duration,
}

impl DatabaseConfig {
    /// Construct the configuration of a private in-memory SQLite database for tests
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self {
            backend: DatabaseBackend::Sqlite {
                path: PathBuf::from(":memory:"),
            },
            // Every connection to :memory: opens a separate database
            pool_size: 1,
            timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

/// How messages are obtained from the data box provider
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProviderMode {
    /// No client certificate is available, so provider responses are simulated
    Simulated,
}
