use serde::{Deserialize, Serialize};

/// Envelope decoded first from every queued message to pick its handler.
/// Every other field is left for the handler to decode.
#[derive(Debug, Default, Deserialize)]
pub struct MessageType {
    #[serde(rename = "type", default)]
    pub message_type: String,
}

/// A contract found for a given user, pushed so the user can start tracking the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoundContract {
    #[serde(rename = "userid")]
    pub user_id: String,
    pub filename: String,
    pub filepath: String,
    #[serde(rename = "finished")]
    pub search_finished: bool,
}

impl FoundContract {
    pub const MESSAGE_TYPE: &'static str = "foundcontract";
}
