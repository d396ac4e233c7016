//! Outbound push delivery.
//!
//! The engine never looks inside a subscription: it is whatever the browser
//! handed to the client, stored verbatim and passed back to the gateway.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use common::PushMessage;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Serialized delivery endpoint of one device.
#[derive(Clone, PartialEq, Eq)]
pub struct Subscription(String);

impl Subscription {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Subscriptions carry endpoint secrets; keep them out of logs.
impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Subscription(<{} bytes>)", self.0.len())
    }
}

/// Failure to deliver to one recipient.
#[derive(Error, Debug)]
pub enum PushError {
    /// The endpoint no longer accepts messages for this subscription
    #[error("subscription expired or unknown to the push service")]
    Gone,

    /// The push service answered with an error status
    #[error("push service rejected the message: {0}")]
    Rejected(String),

    /// The push service could not be reached
    #[error("push transport error: {0}")]
    Transport(String),
}

/// Delivers a message to one subscription.
#[async_trait]
pub trait PushGateway: Send + Sync + fmt::Debug {
    async fn send(&self, subscription: &Subscription, message: &PushMessage) -> Result<(), PushError>;
}

/// Gateway used when no relay is configured: logs and reports success.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPushGateway;

#[async_trait]
impl PushGateway for LogPushGateway {
    async fn send(&self, subscription: &Subscription, message: &PushMessage) -> Result<(), PushError> {
        info!(
            ?subscription,
            title = %message.title,
            "Push relay not configured, message logged only"
        );
        Ok(())
    }
}

#[derive(Serialize)]
struct RelayRequest<'a> {
    subscription: &'a str,
    notification: &'a PushMessage,
}

/// Forwards messages to an HTTP push relay which owns the VAPID keys.
#[derive(Debug, Clone)]
pub struct RelayPushGateway {
    client: reqwest::Client,
    relay_url: String,
}

impl RelayPushGateway {
    pub fn new(relay_url: impl Into<String>, timeout: Duration) -> Result<Self, PushError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PushError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            relay_url: relay_url.into(),
        })
    }

    pub fn relay_url(&self) -> &str {
        &self.relay_url
    }
}

#[async_trait]
impl PushGateway for RelayPushGateway {
    #[instrument(skip(self, message), fields(relay = %self.relay_url))]
    async fn send(&self, subscription: &Subscription, message: &PushMessage) -> Result<(), PushError> {
        let request = RelayRequest {
            subscription: subscription.as_str(),
            notification: message,
        };

        let response = self
            .client
            .post(&self.relay_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| PushError::Transport(e.to_string()))?;

        let status = response.status();
        debug!("Push relay answered with status {}", status);
        match status {
            s if s.is_success() => Ok(()),
            reqwest::StatusCode::NOT_FOUND | reqwest::StatusCode::GONE => Err(PushError::Gone),
            s => Err(PushError::Rejected(s.to_string())),
        }
    }
}
