mod cli;
mod config;
mod database;
mod format;
mod http;
mod provider;
mod schema;
mod seed;

use crate::cli::Cli;
use crate::config::ProviderMode;
use crate::database::Database;
use anyhow::Result;
use clap::Parser;
use log::{error, info, warn, LevelFilter};

#[actix_web::main]
async fn main() -> Result<()> {
    // A missing .env file is fine, the environment and defaults still apply
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    simple_logger::SimpleLogger::new()
        .with_module_level("actix_server", LevelFilter::Off)
        .with_module_level("mio", LevelFilter::Off)
        .with_level(if cli.quiet {
            LevelFilter::Warn
        } else {
            LevelFilter::Debug
        })
        .init()?;

    let config = cli.config();
    match config.provider {
        ProviderMode::Simulated => {
            warn!("Simulating the ISDS API, a client certificate is not available yet");
        }
    }

    let db = Database::new(&config.database);
    match db.connect().and_then(|()| db.ensure_schema()) {
        Ok(()) => info!("Database schema is ready"),
        Err(err) => error!("Failed to prepare the database, continuing without it\n{err:?}"),
    }

    if config.seed {
        seed::seed_fixtures(&db);
    }

    let message_provider = provider::create(config.provider);
    for mailbox in &config.sync_mailboxes {
        match provider::ingest(message_provider.as_ref(), &db, mailbox, None) {
            Ok(report) => info!(
                "Synchronized data box {mailbox}: {} new, {} already stored",
                report.inserted, report.already_stored
            ),
            Err(err) => error!("Failed to synchronize data box {mailbox}\n{err:?}"),
        }
    }

    http::start_server(db, &config.http).await?;

    Ok(())
}
