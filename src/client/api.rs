use crate::models::chat::{ ConversationRef, GeneratedText, NewConversation, OutgoingMessage };
use crate::models::envelope::ErrorEnvelope;
use crate::models::route::Route;
use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The gateway answered with a non-2xx status.
    #[error("{message}")]
    Rejected {
        status: u16,
        message: String,
    },
    #[error("{0}")]
    Transport(String),
    #[error("Unexpected response: {0}")]
    Decode(String),
    #[error("No active conversation")]
    NoConversation,
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

/// The gateway's conversation routes as seen by a chat client.
#[async_trait]
pub trait GatewayApi: Send + Sync {
    /// Returns the id of the newly created conversation.
    async fn create_conversation(&self) -> Result<String, ClientError>;

    async fn send_message(&self, message: &OutgoingMessage) -> Result<(), ClientError>;

    /// Returns the counsellor's reply text.
    async fn generate_message(&self, conversation_id: &str) -> Result<String, ClientError>;

    async fn generate_report(&self, conversation_id: &str) -> Result<String, ClientError>;

    async fn get_messages(&self, conversation_id: &str) -> Result<Value, ClientError>;

    async fn delete_conversation(&self, conversation_id: &str) -> Result<(), ClientError>;
}

pub struct HttpGatewayApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpGatewayApi {
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: Url::parse(base_url)?,
        })
    }

    fn url(&self, route: Route) -> Result<Url, ClientError> {
        self.base_url.join(route.path()).map_err(|e| ClientError::Transport(e.to_string()))
    }

    async fn post<B, T>(&self, route: Route, body: &B) -> Result<T, ClientError>
        where B: Serialize + ?Sized + Sync, T: DeserializeOwned
    {
        let url = self.url(route)?;
        debug!("POST {}", url);
        let response = self.client.post(url).json(body).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let message = response
        .json::<ErrorEnvelope>().await
        .ok()
        .map(|env| env.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
    Err(ClientError::Rejected { status: status.as_u16(), message })
}

#[async_trait]
impl GatewayApi for HttpGatewayApi {
    async fn create_conversation(&self) -> Result<String, ClientError> {
        let created: NewConversation = self.post(
            Route::CreateConversation,
            &NewConversation::default()
        ).await?;
        created.conversation_id.ok_or_else(|| ClientError::Decode("missing conversation_id".into()))
    }

    async fn send_message(&self, message: &OutgoingMessage) -> Result<(), ClientError> {
        let _ack: Value = self.post(Route::SendMessage, message).await?;
        Ok(())
    }

    async fn generate_message(&self, conversation_id: &str) -> Result<String, ClientError> {
        let body = ConversationRef { conversation_id: conversation_id.to_string() };
        let generated: GeneratedText = self.post(Route::GenerateMessage, &body).await?;
        Ok(generated.response)
    }

    async fn generate_report(&self, conversation_id: &str) -> Result<String, ClientError> {
        let body = ConversationRef { conversation_id: conversation_id.to_string() };
        let generated: GeneratedText = self.post(Route::GenerateReport, &body).await?;
        Ok(generated.response)
    }

    async fn get_messages(&self, conversation_id: &str) -> Result<Value, ClientError> {
        let url = self.url(Route::GetMessages)?;
        debug!("GET {}", url);
        let response = self.client
            .get(url)
            .query(&[("conversation_id", conversation_id)])
            .send().await?;
        decode(response).await
    }

    async fn delete_conversation(&self, conversation_id: &str) -> Result<(), ClientError> {
        let body = ConversationRef { conversation_id: conversation_id.to_string() };
        let _ack: Value = self.post(Route::DeleteConversation, &body).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_join_onto_base_url() {
        let api = HttpGatewayApi::new("http://127.0.0.1:3000").unwrap();
        assert_eq!(
            api.url(Route::GenerateReport).unwrap().as_str(),
            "http://127.0.0.1:3000/generate_report"
        );
    }

    #[test]
    fn rejected_error_displays_gateway_message() {
        let err = ClientError::Rejected { status: 503, message: "Failed to reach API server".into() };
        assert_eq!(err.to_string(), "Failed to reach API server");
    }
}
