//! Auto-SMS after completed calls.
//!
//! [`decide_auto_sms`] is the pure policy; [`SmsSender`] tries each
//! configured transport in order and never fails the caller.

mod transport;

pub use transport::{BridgeSms, RemoteApiSms, SmsTransport};

use crate::domain::{AgentSettings, CallStatus};

/// Text message addressed to one number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsMessage {
    pub number: String,
    pub body: String,
}

impl SmsMessage {
    pub fn new(number: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            body: body.into(),
        }
    }
}

/// Message to send after a call with `status`, if any.
///
/// ANSWERED texts only when answered auto-SMS is on, UNANSWERED only when
/// auto-SMS is on, BUSY never.
pub fn decide_auto_sms(number: &str, status: CallStatus, settings: &AgentSettings) -> Option<SmsMessage> {
    let body = match status {
        CallStatus::Answered if settings.auto_sms_answered_enabled => settings.answered_template(),
        CallStatus::Unanswered if settings.auto_sms_enabled => settings.unanswered_template(),
        _ => return None,
    };
    Some(SmsMessage::new(number, body))
}

/// Ordered chain of transports.
pub struct SmsSender {
    transports: Vec<Box<dyn SmsTransport>>,
}

impl SmsSender {
    pub fn new(transports: Vec<Box<dyn SmsTransport>>) -> Self {
        Self { transports }
    }

    /// Sender with no transports; messages are only logged.
    pub fn log_only() -> Self {
        Self::new(Vec::new())
    }

    /// Try each transport until one succeeds. Returns whether the message
    /// went out.
    pub async fn send(&self, message: &SmsMessage) -> bool {
        if message.number.is_empty() || message.body.is_empty() {
            return false;
        }

        for transport in &self.transports {
            match transport.send(message).await {
                Ok(()) => {
                    log::info!("SMS to {} sent via {}", message.number, transport.name());
                    return true;
                }
                Err(e) => log::warn!("SMS via {} failed: {}", transport.name(), e),
            }
        }

        log::info!("[SMS] To: {}, Message: {}", message.number, message.body);
        false
    }
}
