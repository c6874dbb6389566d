use crate::config::{Config, DatabaseBackend, DatabaseConfig, HttpConfig, ProviderMode};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[clap(about, version, author)]
pub struct Cli {
    /// PostgreSQL database name
    #[clap(long, env = "DB_NAME", default_value = "isds_db")]
    pub db_name: String,

    /// PostgreSQL user
    #[clap(long, env = "DB_USER", default_value = "postgres")]
    pub db_user: String,

    /// PostgreSQL password
    #[clap(long, env = "DB_PASSWORD", default_value = "", hide_env_values = true)]
    pub db_password: String,

    /// PostgreSQL host
    #[clap(long, env = "DB_HOST", default_value = "localhost")]
    pub db_host: String,

    /// PostgreSQL port
    #[clap(long, env = "DB_PORT", default_value_t = 5432)]
    pub db_port: u16,

    /// Store messages in a SQLite database at this path instead of PostgreSQL
    #[clap(long, env = "DB_SQLITE_PATH")]
    pub sqlite: Option<PathBuf>,

    /// Maximum number of database connections
    #[clap(long, env = "DB_POOL_SIZE", default_value_t = 4)]
    pub db_pool_size: u32,

    /// Database timeout in seconds
    #[clap(long, env = "DB_TIMEOUT", default_value_t = 5)]
    pub db_timeout: u64,

    /// HTTP server address
    #[clap(long, env = "HTTP_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// HTTP server port
    #[clap(short = 'p', long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Data boxes to fetch new messages for at startup
    #[clap(long = "sync", env = "SYNC_MAILBOXES", value_delimiter = ',', value_name = "MAILBOX")]
    pub sync_mailboxes: Vec<String>,

    /// Don't insert the fixture messages at startup
    #[clap(long, env = "NO_SEED", value_parser = clap::builder::FalseyValueParser::new())]
    pub no_seed: bool,

    /// Log fewer messages
    #[clap(short = 'q', long)]
    pub quiet: bool,
}

impl Cli {
    /// Resolve the arguments into the service configuration
    pub fn config(&self) -> Config {
        let backend = match &self.sqlite {
            Some(path) => DatabaseBackend::Sqlite { path: path.clone() },
            None => DatabaseBackend::Postgres {
                name: self.db_name.clone(),
                user: self.db_user.clone(),
                password: self.db_password.clone(),
                host: self.db_host.clone(),
                port: self.db_port,
            },
        };

        Config {
            database: DatabaseConfig {
                backend,
                pool_size: self.db_pool_size.max(1),
                timeout: Duration::from_secs(self.db_timeout.max(1)),
            },
            http: HttpConfig {
                host: self.host.clone(),
                port: self.port,
            },
            provider: ProviderMode::Simulated,
            seed: !self.no_seed,
            sync_mailboxes: self.sync_mailboxes.clone(),
        }
    }
}
