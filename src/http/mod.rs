mod http_error;

use self::http_error::HttpError;
use crate::config::HttpConfig;
use crate::database::{Database, Message};
use actix_web::web::{self, Data, Json, Query, ServiceConfig};
use actix_web::{get, http::StatusCode, App, HttpServer, Responder, Result};
use log::{error, info};

const READY_MESSAGE: &str = "✅ API běží správně!";

/// Name of the query parameter that selects a data box
const MAILBOX_PARAM: &str = "datova_schranka_id";

#[get("/")]
async fn index() -> impl Responder {
    READY_MESSAGE
}

#[get("/messages")]
async fn list_messages(
    query: Query<Vec<(String, String)>>,
    db: Data<Database>,
) -> Result<impl Responder> {
    let messages = web::block(move || db.list_messages())
        .await?
        .map_err(|err| {
            error!("Failed to list messages\n{err:?}");
            HttpError::new(StatusCode::SERVICE_UNAVAILABLE)
        })?;

    // A repeated parameter uses its first value
    let mailbox = query
        .into_inner()
        .into_iter()
        .find_map(|(key, value)| (key == MAILBOX_PARAM).then_some(value));
    Ok(Json(filter_by_mailbox(messages, mailbox.as_deref())))
}

/// Keep only the messages delivered to a data box
/// An absent or empty data box id keeps every message.
fn filter_by_mailbox(messages: Vec<Message>, mailbox: Option<&str>) -> Vec<Message> {
    match mailbox.filter(|mailbox| !mailbox.is_empty()) {
        Some(mailbox) => messages
            .into_iter()
            .filter(|message| message.datova_schranka_id == mailbox)
            .collect(),
        None => messages,
    }
}

/// Register the API routes
pub fn configure(config: &mut ServiceConfig) {
    config.service(index).service(list_messages);
}

pub async fn start_server(db: Database, config: &HttpConfig) -> Result<(), std::io::Error> {
    info!("Starting HTTP server on {}:{}", config.host, config.port);
    let data = Data::new(db);
    HttpServer::new(move || App::new().app_data(Data::clone(&data)).configure(configure))
        .bind((config.host.as_str(), config.port))?
        .run()
        .await
}
