use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error("Messaging endpoint responded with {0}")]
    Status(StatusCode),
}

/// Delivers alert messages to an external messaging service
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}

/// Sends messages to a chat through the Telegram Bot API
pub struct TelegramNotifier {
    client: Client,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    const API_URL: &'static str = "https://api.telegram.org";

    /// Returns a notifier if both the bot token and the chat id are set and non-empty
    pub fn from_credentials(bot_token: Option<String>, chat_id: Option<String>) -> Option<Self> {
        let bot_token = bot_token.filter(|t| !t.is_empty())?;
        let chat_id = chat_id.filter(|c| !c.is_empty())?;

        Some(Self {
            client: Client::new(),
            bot_token,
            chat_id,
        })
    }

    fn url(&self) -> String {
        format!("{}/bot{}/sendMessage", Self::API_URL, self.bot_token)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let payload = json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });

        let response = self.client.post(self.url()).json(&payload).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(NotifyError::Status(status));
        }

        Ok(())
    }
}
