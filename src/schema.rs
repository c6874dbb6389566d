diesel::table! {
    messages (id) {
        id -> Integer,
        message_id -> Varchar,
        datova_schranka_id -> Varchar,
        sender -> Varchar,
        subject -> Text,
        content -> Text,
        attachments -> Nullable<Text>,
        received_at -> Nullable<Timestamp>,
    }
}
