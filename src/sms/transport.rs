//! Ways of getting a text message out.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::SmsMessage;
use crate::bridge::BridgeConnection;
use crate::error::{DialerError, Result};

/// One way of delivering an [`SmsMessage`].
#[async_trait]
pub trait SmsTransport: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, message: &SmsMessage) -> Result<()>;
}

/// Hands the message to the host bridge.
pub struct BridgeSms {
    conn: Arc<BridgeConnection>,
}

impl BridgeSms {
    pub fn new(conn: Arc<BridgeConnection>) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl SmsTransport for BridgeSms {
    fn name(&self) -> &'static str {
        "bridge"
    }

    async fn send(&self, message: &SmsMessage) -> Result<()> {
        self.conn.send_sms(&message.number, &message.body).await
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SmsApiRequest<'a> {
    phone_number: &'a str,
    message: &'a str,
}

/// Posts `{phoneNumber, message}` to a remote SMS API.
pub struct RemoteApiSms {
    client: Client,
    url: String,
}

impl RemoteApiSms {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DialerError::Network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, url: url.into() })
    }
}

#[async_trait]
impl SmsTransport for RemoteApiSms {
    fn name(&self) -> &'static str {
        "remote-api"
    }

    async fn send(&self, message: &SmsMessage) -> Result<()> {
        let body = SmsApiRequest {
            phone_number: &message.number,
            message: &message.body,
        };
        let response = self.client.post(&self.url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DialerError::Network(format!("SMS API returned {}", status)));
        }
        Ok(())
    }
}
