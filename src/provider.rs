use crate::config::ProviderMode;
use crate::database::{Database, InsertOutcome, NewMessage};
use crate::seed::FIXTURES;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use log::debug;

/// A message as delivered by the data box provider
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IncomingMessage {
    pub message_id: String,
    pub datova_schranka_id: String,
    pub sender: String,
    pub subject: String,
    pub content: String,
    pub attachments: Option<String>,
    pub received_at: Option<NaiveDateTime>,
}

impl IncomingMessage {
    pub fn as_new_message(&self) -> NewMessage<'_> {
        NewMessage {
            message_id: &self.message_id,
            datova_schranka_id: &self.datova_schranka_id,
            sender: &self.sender,
            subject: &self.subject,
            content: &self.content,
            attachments: self.attachments.as_deref(),
            received_at: self.received_at,
        }
    }
}

impl From<&NewMessage<'_>> for IncomingMessage {
    fn from(message: &NewMessage) -> Self {
        Self {
            message_id: message.message_id.to_owned(),
            datova_schranka_id: message.datova_schranka_id.to_owned(),
            sender: message.sender.to_owned(),
            subject: message.subject.to_owned(),
            content: message.content.to_owned(),
            attachments: message.attachments.map(ToOwned::to_owned),
            received_at: message.received_at,
        }
    }
}

/// A source of data box messages
pub trait MessageProvider: Send + Sync {
    /// Fetch the messages delivered to a data box after `since`, or all of its messages if `since` is `None`
    fn fetch_messages(
        &self,
        mailbox_id: &str,
        since: Option<NaiveDateTime>,
    ) -> Result<Vec<IncomingMessage>>;
}

/// A provider that serves a fixed set of messages instead of calling the ISDS web services
pub struct SimulatedProvider {
    messages: Vec<IncomingMessage>,
}

impl SimulatedProvider {
    pub fn new(messages: Vec<IncomingMessage>) -> Self {
        Self { messages }
    }

    /// Create a provider that serves the fixture messages
    pub fn with_fixtures() -> Self {
        Self::new(FIXTURES.iter().map(IncomingMessage::from).collect())
    }
}

impl MessageProvider for SimulatedProvider {
    fn fetch_messages(
        &self,
        mailbox_id: &str,
        since: Option<NaiveDateTime>,
    ) -> Result<Vec<IncomingMessage>> {
        Ok(self
            .messages
            .iter()
            .filter(|message| message.datova_schranka_id == mailbox_id)
            // Messages without a delivery time can't be compared to the checkpoint
            .filter(|message| match (since, message.received_at) {
                (Some(since), Some(received_at)) => received_at > since,
                _ => true,
            })
            .cloned()
            .collect())
    }
}

/// Create the provider for the configured mode
pub fn create(mode: ProviderMode) -> Box<dyn MessageProvider> {
    match mode {
        ProviderMode::Simulated => Box::new(SimulatedProvider::with_fixtures()),
    }
}

/// Counts of the messages processed by `ingest`
#[derive(Debug, Default, Eq, PartialEq)]
pub struct IngestReport {
    pub inserted: usize,
    pub already_stored: usize,
}

/// Fetch a data box's new messages from the provider and store them
/// Messages that are already stored are skipped, so ingesting overlapping batches is safe.
pub fn ingest(
    provider: &dyn MessageProvider,
    db: &Database,
    mailbox_id: &str,
    since: Option<NaiveDateTime>,
) -> Result<IngestReport> {
    let messages = provider
        .fetch_messages(mailbox_id, since)
        .with_context(|| format!("Failed to fetch messages for data box {mailbox_id}"))?;
    debug!(
        "Fetched {} messages for data box {mailbox_id}",
        messages.len()
    );

    let mut report = IngestReport::default();
    for message in &messages {
        match db.insert_message(&message.as_new_message())? {
            InsertOutcome::Inserted => report.inserted += 1,
            InsertOutcome::AlreadyExists => report.already_stored += 1,
        }
    }
    Ok(report)
}
