use crate::client::api::{ ClientError, GatewayApi };
use crate::client::view::ChatView;
use crate::models::chat::{ Message, OutgoingMessage };
use log::{ info, warn };
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// How long an error banner stays on screen.
pub const BANNER_TTL: Duration = Duration::from_secs(5);

pub const GREETING: &str = "Hello! I'm here to listen and help. What brings you here today?";

const DEFAULT_USER_NAME: &str = "User";

const CREATE_FAILED: &str = "Failed to create new session";
const SEND_FAILED: &str = "Failed to send message";
const RESPONSE_FAILED: &str = "Failed to generate counsellor response";
const REPORT_FAILED: &str = "Failed to generate report";
const HISTORY_FAILED: &str = "Failed to load messages";
const END_FAILED: &str = "Failed to end session";

/// One user's conversation with the counsellor, driven through a [`GatewayApi`]
/// and rendered on a [`ChatView`]. The only state kept is the conversation id;
/// the transcript itself lives upstream.
pub struct ChatSession<A, V> {
    api: A,
    view: Arc<V>,
    conversation_id: Option<String>,
    user_id: String,
    user_name: String,
}

impl<A: GatewayApi, V: ChatView> ChatSession<A, V> {
    pub fn new(api: A, view: Arc<V>) -> Self {
        Self::with_name(api, view, DEFAULT_USER_NAME)
    }

    pub fn with_name(api: A, view: Arc<V>, user_name: &str) -> Self {
        Self {
            api,
            view,
            conversation_id: None,
            user_id: random_user_id(),
            user_name: user_name.to_string(),
        }
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Starts a fresh conversation, wiping both panes and greeting the user.
    pub async fn start_session(&mut self) -> Result<(), ClientError> {
        let id = self.api
            .create_conversation().await
            .map_err(|e| self.report_error(CREATE_FAILED, e))?;
        info!("Created new conversation: {}", id);

        self.conversation_id = Some(id);
        self.view.clear_transcript();
        self.view.clear_report();
        self.view.append_message(&Message::counsellor(GREETING));
        Ok(())
    }

    /// Returns `Ok(false)` when `input` is blank; nothing is sent or rendered then.
    ///
    /// The user's message is rendered before the gateway confirms it and stays
    /// on screen if sending fails.
    pub async fn send_message(&mut self, input: &str) -> Result<bool, ClientError> {
        let content = input.trim();
        if content.is_empty() {
            return Ok(false);
        }
        let conversation_id = self.require_conversation(SEND_FAILED)?;

        let message = Message {
            author_id: self.user_id.clone(),
            author_name: self.user_name.clone(),
            content: content.to_string(),
        };
        self.view.append_message(&message);
        self.view.clear_input();

        let outgoing = OutgoingMessage {
            author_name: message.author_name,
            content: message.content,
            author_id: message.author_id,
            conversation_id: conversation_id.clone(),
        };
        self.api
            .send_message(&outgoing).await
            .map_err(|e| self.report_error(SEND_FAILED, e))?;

        let reply = self.api
            .generate_message(&conversation_id).await
            .map_err(|e| self.report_error(RESPONSE_FAILED, e))?;
        self.view.append_message(&Message::counsellor(reply));
        Ok(true)
    }

    pub async fn generate_report(&self) -> Result<(), ClientError> {
        let conversation_id = self.require_conversation(REPORT_FAILED)?;
        let report = self.api
            .generate_report(&conversation_id).await
            .map_err(|e| self.report_error(REPORT_FAILED, e))?;
        self.view.show_report(&report);
        Ok(())
    }

    /// Replaces the transcript with the messages upstream holds for this
    /// conversation. Entries that are not messages are skipped.
    pub async fn reload_transcript(&self) -> Result<usize, ClientError> {
        let conversation_id = self.require_conversation(HISTORY_FAILED)?;
        let listing = self.api
            .get_messages(&conversation_id).await
            .map_err(|e| self.report_error(HISTORY_FAILED, e))?;

        let messages = messages_from(listing);
        self.view.clear_transcript();
        for message in &messages {
            self.view.append_message(message);
        }
        Ok(messages.len())
    }

    /// Deletes the conversation upstream and forgets its id.
    pub async fn end_session(&mut self) -> Result<(), ClientError> {
        let conversation_id = self.require_conversation(END_FAILED)?;
        self.api
            .delete_conversation(&conversation_id).await
            .map_err(|e| self.report_error(END_FAILED, e))?;

        self.conversation_id = None;
        self.view.clear_transcript();
        self.view.clear_report();
        Ok(())
    }

    fn require_conversation(&self, action: &str) -> Result<String, ClientError> {
        match &self.conversation_id {
            Some(id) => Ok(id.clone()),
            None => Err(self.report_error(action, ClientError::NoConversation)),
        }
    }

    /// Shows a banner for `err` and schedules its removal after [`BANNER_TTL`].
    fn report_error(&self, action: &str, err: ClientError) -> ClientError {
        let text = format!("{}: {}", action, err);
        warn!("{}", text);

        let id = self.view.show_error(&text);
        let view = Arc::clone(&self.view);
        tokio::spawn(async move {
            tokio::time::sleep(BANNER_TTL).await;
            view.remove_banner(id);
        });
        err
    }
}

const USER_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// `user-` followed by 9 lowercase alphanumerics drawn from a v4 UUID's random bytes.
fn random_user_id() -> String {
    let token: String = Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(9)
        .map(|b| USER_ID_ALPHABET[(*b as usize) % USER_ID_ALPHABET.len()] as char)
        .collect();
    format!("user-{}", token)
}

fn messages_from(listing: Value) -> Vec<Message> {
    let items = match listing {
        Value::Array(items) => items,
        Value::Object(mut obj) =>
            match obj.remove("messages") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            }
        _ => Vec::new(),
    };
    items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect()
}
