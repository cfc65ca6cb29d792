use serde::{ Serialize, Deserialize };

pub const COUNSELLOR_ID: &str = "counsellor";
pub const COUNSELLOR_NAME: &str = "Counsellor";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub author_id: String,
    pub author_name: String,
    pub content: String,
}

impl Message {
    pub fn counsellor(content: impl Into<String>) -> Self {
        Self {
            author_id: COUNSELLOR_ID.to_string(),
            author_name: COUNSELLOR_NAME.to_string(),
            content: content.into(),
        }
    }

    pub fn is_counsellor(&self) -> bool {
        self.author_id == COUNSELLOR_ID
    }
}

/// Body of `create_conversation`, and its success shape.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewConversation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRef {
    pub conversation_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub author_name: String,
    pub content: String,
    pub author_id: String,
    pub conversation_id: String,
}

/// Success shape of `generate_message` and `generate_report`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedText {
    pub response: String,
}
