use crate::database::{Database, InsertOutcome, NewMessage};
use log::{error, info};

/// Sample messages for trying out the API by hand
pub const FIXTURES: [NewMessage<'static>; 3] = [
    NewMessage {
        message_id: "msg001",
        datova_schranka_id: "d75dvaq",
        sender: "Ministerstvo vnitra",
        subject: "Potvrzení o přijetí",
        content: "Vaše zpráva byla přijata.",
        attachments: None,
        received_at: None,
    },
    NewMessage {
        message_id: "msg002",
        datova_schranka_id: "vqqv5qf",
        sender: "Finanční úřad",
        subject: "Výzva k podání",
        content: "Nezapomeňte podat daňové přiznání.",
        attachments: None,
        received_at: None,
    },
    NewMessage {
        message_id: "msg003",
        datova_schranka_id: "jqwcu54",
        sender: "Česká pošta",
        subject: "Oznámení o zásilce",
        content: "Vaše zásilka je připravena k vyzvednutí.",
        attachments: None,
        received_at: None,
    },
];

/// Insert the fixture messages, skipping the ones that are already stored
/// Failures are logged and don't stop the remaining fixtures from being inserted. Returns the number of newly-inserted
/// fixtures.
pub fn seed_fixtures(db: &Database) -> usize {
    let inserted = FIXTURES
        .iter()
        .filter(|fixture| match db.insert_message(fixture) {
            Ok(outcome) => outcome == InsertOutcome::Inserted,
            Err(err) => {
                error!("Failed to insert fixture {}\n{err:?}", fixture.message_id);
                false
            }
        })
        .count();
    info!("Inserted {inserted} of {} fixture messages", FIXTURES.len());
    inserted
}
