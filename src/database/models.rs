use crate::format::serialize_timestamp;
use crate::schema::messages;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

/*
 * A message delivered to a data box. Rows are append-only: the service never
 * updates or deletes them. message_id is the provider's identifier and is
 * unique across all data boxes, while id is the local surrogate key.
 */
#[derive(Clone, Debug, Eq, PartialEq, Queryable, Serialize)]
#[diesel(table_name = messages)]
pub struct Message {
    pub id: i32,
    pub message_id: String,
    pub datova_schranka_id: String,
    pub sender: String,
    pub subject: String,
    pub content: String,
    pub attachments: Option<String>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub received_at: Option<NaiveDateTime>,
}

/// A message to be stored
/// A `received_at` of `None` lets the database stamp the row with the insertion time.
#[derive(Clone, Copy, Debug, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessage<'a> {
    pub message_id: &'a str,
    pub datova_schranka_id: &'a str,
    pub sender: &'a str,
    pub subject: &'a str,
    pub content: &'a str,
    pub attachments: Option<&'a str>,
    pub received_at: Option<NaiveDateTime>,
}

/// The result of storing a message
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InsertOutcome {
    Inserted,
    // A message with the same message_id was already stored and the new one was discarded
    AlreadyExists,
}
