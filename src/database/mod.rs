mod connection;
mod models;

use self::connection::ConnectionPool;
pub use self::models::{InsertOutcome, Message, NewMessage};
use crate::config::DatabaseConfig;
use crate::schema::messages;
use anyhow::{anyhow, Context, Result};
use diesel::prelude::*;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::{debug, info};

const POSTGRES_MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/postgres");
const SQLITE_MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/sqlite");

/// Check out a connection from the pool and evaluate `$body` with it bound to `$conn`
/// The body is compiled once per database engine, so it must be valid for both.
macro_rules! with_connection {
    ($pool:expr, $conn:ident => $body:expr) => {
        match $pool {
            ConnectionPool::Postgres(pool) => {
                let mut pooled = pool
                    .get()
                    .context("Failed to check out a PostgreSQL connection")?;
                let $conn: &mut diesel::PgConnection = &mut pooled;
                $body
            }
            ConnectionPool::Sqlite(pool) => {
                let mut pooled = pool
                    .get()
                    .context("Failed to check out a SQLite connection")?;
                let $conn: &mut diesel::SqliteConnection = &mut pooled;
                $body
            }
        }
    };
}

#[derive(Clone)]
pub struct Database {
    pool: ConnectionPool,
}

impl Database {
    /// Create a new Database instance
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            pool: ConnectionPool::new(config),
        }
    }

    /// Open a connection to make sure that the database is reachable
    pub fn connect(&self) -> Result<()> {
        with_connection!(&self.pool, _conn => Ok(()))
    }

    /// Create the messages table if it doesn't exist yet
    /// Already-applied migrations are skipped, so calling this repeatedly is harmless.
    pub fn ensure_schema(&self) -> Result<()> {
        let applied = match &self.pool {
            ConnectionPool::Postgres(pool) => {
                let mut pooled = pool
                    .get()
                    .context("Failed to check out a PostgreSQL connection")?;
                let conn: &mut diesel::PgConnection = &mut pooled;
                conn.run_pending_migrations(POSTGRES_MIGRATIONS)
                    .map(|versions| versions.len())
            }
            ConnectionPool::Sqlite(pool) => {
                let mut pooled = pool
                    .get()
                    .context("Failed to check out a SQLite connection")?;
                let conn: &mut diesel::SqliteConnection = &mut pooled;
                conn.run_pending_migrations(SQLITE_MIGRATIONS)
                    .map(|versions| versions.len())
            }
        }
        .map_err(|err| anyhow!(err).context("Failed to create the database schema"))?;
        debug!("Applied {applied} database migrations");
        Ok(())
    }

    /// Store a message unless a message with the same message_id is already stored
    pub fn insert_message(&self, message: &NewMessage) -> Result<InsertOutcome> {
        let inserted = with_connection!(&self.pool, conn => {
            diesel::insert_into(messages::table)
                .values(message)
                .on_conflict(messages::message_id)
                .do_nothing()
                .execute(conn)
        })
        .with_context(|| {
            format!(
                "Failed to save message {} to the database",
                message.message_id
            )
        })?;

        if inserted == 0 {
            debug!("Message {} is already stored", message.message_id);
            Ok(InsertOutcome::AlreadyExists)
        } else {
            info!(
                "Stored message {} for data box {}",
                message.message_id, message.datova_schranka_id
            );
            Ok(InsertOutcome::Inserted)
        }
    }

    /// Read all messages, newest first
    /// Messages received at the same time are ordered by insertion, newest first.
    pub fn list_messages(&self) -> Result<Vec<Message>> {
        with_connection!(&self.pool, conn => {
            messages::table
                .order((messages::received_at.desc(), messages::id.desc()))
                .load::<Message>(conn)
        })
        .context("Failed to load messages from the database")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseBackend, DatabaseConfig};
    use assert_matches::assert_matches;
    use chrono::{Local, NaiveDate, NaiveDateTime};
    use std::path::PathBuf;
    use std::time::Duration;

    fn open_db() -> Database {
        let db = Database::new(&DatabaseConfig::in_memory());
        db.ensure_schema().unwrap();
        db
    }

    fn new_message<'a>(message_id: &'a str, mailbox: &'a str) -> NewMessage<'a> {
        NewMessage {
            message_id,
            datova_schranka_id: mailbox,
            sender: "Sender",
            subject: "Subject",
            content: "Content",
            attachments: None,
            received_at: None,
        }
    }

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_connect() {
        let db = Database::new(&DatabaseConfig::in_memory());
        db.connect().unwrap();
    }

    #[test]
    fn test_connect_unreachable() {
        let db = Database::new(&DatabaseConfig {
            backend: DatabaseBackend::Sqlite {
                path: PathBuf::from("/nonexistent/directory/inbox.db"),
            },
            pool_size: 1,
            timeout: Duration::from_millis(200),
        });
        assert!(db.connect().is_err());
        assert!(db.list_messages().is_err());
    }

    #[test]
    fn test_ensure_schema_twice() {
        let db = open_db();
        db.insert_message(&new_message("msg", "box")).unwrap();

        db.ensure_schema().unwrap();

        assert_eq!(db.list_messages().unwrap().len(), 1);
    }

    #[test]
    fn test_list_messages_empty() {
        let db = open_db();
        assert_eq!(db.list_messages().unwrap(), vec![]);
    }

    #[test]
    fn test_insert_message() {
        let db = open_db();
        let message = NewMessage {
            attachments: Some("[\"invoice.pdf\"]"),
            received_at: Some(at(8)),
            ..new_message("msg", "box")
        };

        assert_eq!(db.insert_message(&message).unwrap(), InsertOutcome::Inserted);

        assert_eq!(
            db.list_messages().unwrap(),
            vec![Message {
                id: 1,
                message_id: "msg".to_owned(),
                datova_schranka_id: "box".to_owned(),
                sender: "Sender".to_owned(),
                subject: "Subject".to_owned(),
                content: "Content".to_owned(),
                attachments: Some("[\"invoice.pdf\"]".to_owned()),
                received_at: Some(at(8)),
            }]
        );
    }

    #[test]
    fn test_insert_message_defaults_received_at() {
        let db = open_db();
        db.insert_message(&new_message("msg", "box")).unwrap();

        let messages = db.list_messages().unwrap();
        assert_matches!(messages.as_slice(), [Message { attachments: None, received_at: Some(_), .. }]);
    }

    #[test]
    fn test_insert_message_received_at_is_local_time() {
        let db = open_db();
        let now = Local::now().naive_local();
        db.insert_message(&new_message("msg", "box")).unwrap();

        let received_at = db.list_messages().unwrap()[0].received_at.unwrap();
        assert!((received_at - now).num_seconds().abs() <= 60);
    }

    #[test]
    fn test_insert_duplicate_message() {
        let db = open_db();
        db.insert_message(&new_message("msg", "box")).unwrap();

        let duplicate = NewMessage {
            sender: "Another sender",
            ..new_message("msg", "other-box")
        };
        assert_eq!(
            db.insert_message(&duplicate).unwrap(),
            InsertOutcome::AlreadyExists
        );

        let messages = db.list_messages().unwrap();
        assert_eq!(messages.len(), 1);
        // The original message is untouched
        assert_eq!(messages[0].sender, "Sender");
        assert_eq!(messages[0].datova_schranka_id, "box");
    }

    #[test]
    fn test_ids_are_not_reused() {
        let db = open_db();
        db.insert_message(&new_message("msg1", "box")).unwrap();
        db.insert_message(&new_message("msg1", "box")).unwrap();
        db.insert_message(&new_message("msg2", "box")).unwrap();

        let mut ids = db
            .list_messages()
            .unwrap()
            .into_iter()
            .map(|message| message.id)
            .collect::<Vec<_>>();
        ids.sort_unstable();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_list_messages_newest_first() {
        let db = open_db();
        for (message_id, hour) in [("noon", 12), ("morning", 8), ("evening", 18)] {
            db.insert_message(&NewMessage {
                received_at: Some(at(hour)),
                ..new_message(message_id, "box")
            })
            .unwrap();
        }

        let messages = db.list_messages().unwrap();
        assert_eq!(
            messages
                .iter()
                .map(|message| message.message_id.as_str())
                .collect::<Vec<_>>(),
            vec!["evening", "noon", "morning"]
        );
        assert!(messages
            .windows(2)
            .all(|pair| pair[0].received_at > pair[1].received_at));
    }

    #[test]
    fn test_list_messages_ties_newest_insert_first() {
        let db = open_db();
        for message_id in ["first", "second", "third"] {
            db.insert_message(&NewMessage {
                received_at: Some(at(10)),
                ..new_message(message_id, "box")
            })
            .unwrap();
        }

        let list = || {
            db.list_messages()
                .unwrap()
                .into_iter()
                .map(|message| message.message_id)
                .collect::<Vec<_>>()
        };
        assert_eq!(list(), vec!["third", "second", "first"]);
        assert_eq!(list(), list());
    }

    // Needs a reachable PostgreSQL server configured through the DB_* environment variables
    #[test]
    #[ignore]
    fn test_postgres() {
        use crate::cli::Cli;
        use clap::Parser;

        let mut config = Cli::parse_from(["isds-inbox"]).config().database;
        config.timeout = Duration::from_secs(1);
        let db = Database::new(&config);
        db.connect().unwrap();
        db.ensure_schema().unwrap();
        db.ensure_schema().unwrap();

        let message_id = format!("test-{}", Local::now().timestamp_micros());
        let message = new_message(&message_id, "box");
        assert_eq!(db.insert_message(&message).unwrap(), InsertOutcome::Inserted);
        assert_eq!(
            db.insert_message(&message).unwrap(),
            InsertOutcome::AlreadyExists
        );
        let stored = db
            .list_messages()
            .unwrap()
            .into_iter()
            .filter(|message| message.message_id == message_id)
            .collect::<Vec<_>>();
        assert_matches!(stored.as_slice(), [Message { received_at: Some(_), .. }]);

        // Statements running longer than the timeout are cancelled
        assert_matches!(&db.pool, ConnectionPool::Postgres(_));
        let slow_query = || -> Result<usize> {
            Ok(with_connection!(&db.pool, conn => {
                diesel::sql_query("SELECT pg_sleep(2)").execute(conn)
            })?)
        };
        assert!(slow_query().is_err());
    }
}
