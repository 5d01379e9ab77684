use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Sends one message to one recipient.
#[async_trait]
pub trait Deliver: Send + Sync {
    async fn send(&self, recipient: i64, text: &str) -> Result<()>;
}

pub fn make_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(From::from)
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Debug, Deserialize)]
struct Reply {
    ok: bool,
    description: Option<String>,
}

#[derive(Clone)]
pub struct TelegramApi {
    client: Client,
    api_url: String,
    token: String,
}

impl TelegramApi {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Ok(Self::with_client(make_client()?, TELEGRAM_API_URL, token))
    }

    pub fn with_client(client: Client, api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            token: token.into(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_url.trim_end_matches('/'), self.token)
    }
}

#[async_trait]
impl Deliver for TelegramApi {
    async fn send(&self, recipient: i64, text: &str) -> Result<()> {
        let body = SendMessage {
            chat_id: recipient,
            text,
            parse_mode: "HTML",
        };
        // the url carries the bot token, keep it out of error messages
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::DeliveryFailed(e.without_url().to_string()))?;
        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| Error::DeliveryFailed(e.without_url().to_string()))?;

        match serde_json::from_str::<Reply>(&raw) {
            Ok(Reply { ok: true, .. }) if status.is_success() => Ok(()),
            Ok(reply) => Err(Error::DeliveryFailed(
                reply.description.unwrap_or_else(|| status.to_string()),
            )),
            Err(_) => Err(Error::DeliveryFailed(format!("{status}: {raw}"))),
        }
    }
}
