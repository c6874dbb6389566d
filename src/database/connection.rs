use crate::config::{DatabaseBackend, DatabaseConfig};
use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Error, Pool};
use diesel::{PgConnection, SqliteConnection};
use std::time::Duration;

/// A connection pool for one of the supported database engines
#[derive(Clone, Debug)]
pub enum ConnectionPool {
    Postgres(Pool<ConnectionManager<PgConnection>>),
    Sqlite(Pool<ConnectionManager<SqliteConnection>>),
}

impl ConnectionPool {
    /// Create a pool for the configured database
    /// No connections are opened eagerly, so an unreachable database surfaces as errors when connections are
    /// checked out instead of preventing startup.
    pub fn new(config: &DatabaseConfig) -> Self {
        match &config.backend {
            DatabaseBackend::Postgres {
                name,
                user,
                password,
                host,
                port,
            } => {
                let conninfo = postgres_conninfo(name, user, password, host, *port, config.timeout);
                let pool = Pool::builder()
                    .max_size(config.pool_size)
                    .connection_timeout(config.timeout)
                    .connection_customizer(Box::new(PostgresCustomizer {
                        statement_timeout: config.timeout,
                    }))
                    .build_unchecked(ConnectionManager::new(conninfo));
                Self::Postgres(pool)
            }
            DatabaseBackend::Sqlite { path } => {
                let pool = Pool::builder()
                    .max_size(config.pool_size)
                    .connection_timeout(config.timeout)
                    .connection_customizer(Box::new(SqliteCustomizer {
                        busy_timeout: config.timeout,
                    }))
                    .build_unchecked(ConnectionManager::new(path.to_string_lossy()));
                Self::Sqlite(pool)
            }
        }
    }
}

/// Build a libpq keyword/value connection string
fn postgres_conninfo(
    name: &str,
    user: &str,
    password: &str,
    host: &str,
    port: u16,
    timeout: Duration,
) -> String {
    format!(
        "host={} port={port} user={} password={} dbname={} connect_timeout={}",
        quote_conninfo_value(host),
        quote_conninfo_value(user),
        quote_conninfo_value(password),
        quote_conninfo_value(name),
        timeout.as_secs().max(1),
    )
}

/// Quote a connection string value so that it may contain spaces, quotes, and backslashes
fn quote_conninfo_value(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

#[derive(Debug)]
struct PostgresCustomizer {
    statement_timeout: Duration,
}

impl CustomizeConnection<PgConnection, Error> for PostgresCustomizer {
    fn on_acquire(&self, conn: &mut PgConnection) -> Result<(), Error> {
        // Keep a stuck query from holding the connection forever
        conn.batch_execute(&format!(
            "SET statement_timeout = {}",
            self.statement_timeout.as_millis()
        ))
        .map_err(Error::QueryError)
    }
}

#[derive(Debug)]
struct SqliteCustomizer {
    busy_timeout: Duration,
}

impl CustomizeConnection<SqliteConnection, Error> for SqliteCustomizer {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), Error> {
        // Wait for concurrent writers to finish instead of failing immediately
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}",
            self.busy_timeout.as_millis()
        ))
        .map_err(Error::QueryError)
    }
}
