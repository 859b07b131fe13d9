//! PushPlus client
//!
//! One-to-one friend push: the sender token (real-name verified account)
//! calls the `send` API, and the `to` field selects the friend who receives
//! the message. Each role has its own friend token.

use crate::error::{PushError, PushResult};
use crate::template::render_card;
use serde::{Deserialize, Serialize};
use shared::models::Role;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Public PushPlus send endpoint
pub const PUSHPLUS_ENDPOINT: &str = "https://www.pushplus.plus/send";

/// Business code PushPlus returns on success
const SUCCESS_CODE: i64 = 200;

/// Adapter configuration
#[derive(Debug, Clone)]
pub struct PushPlusConfig {
    pub sender_token: Option<String>,
    pub kitchen_friend_token: Option<String>,
    pub customer_friend_token: Option<String>,
    pub endpoint: String,
    pub timeout: Duration,
    /// Footer line of the HTML card
    pub signature: String,
}

impl Default for PushPlusConfig {
    fn default() -> Self {
        Self {
            sender_token: None,
            kitchen_friend_token: None,
            customer_friend_token: None,
            endpoint: PUSHPLUS_ENDPOINT.to_string(),
            timeout: Duration::from_secs(5),
            signature: "From: Wok kitchen".to_string(),
        }
    }
}

impl PushPlusConfig {
    pub fn new(sender_token: impl Into<String>) -> Self {
        Self {
            sender_token: Some(sender_token.into()),
            ..Default::default()
        }
    }

    /// Set the friend token that receives pushes for `role`
    pub fn with_friend_token(mut self, role: Role, token: impl Into<String>) -> Self {
        let token = Some(token.into());
        match role {
            Role::Fulfiller => self.kitchen_friend_token = token,
            Role::Requester => self.customer_friend_token = token,
        }
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = signature.into();
        self
    }

    /// Friend token for a role; blank tokens count as unset
    pub fn friend_token(&self, role: Role) -> Option<&str> {
        let token = match role {
            Role::Fulfiller => self.kitchen_friend_token.as_deref(),
            Role::Requester => self.customer_friend_token.as_deref(),
        };
        token.filter(|t| !t.trim().is_empty())
    }

    fn sender(&self) -> Option<&str> {
        self.sender_token.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// Request body of the `send` API
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PushMessage {
    pub token: String,
    pub title: String,
    pub content: String,
    /// html, txt, json, markdown
    pub template: String,
    pub channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PushReply {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
}

/// PushPlus HTTP client
#[derive(Debug, Clone)]
pub struct PushPlusClient {
    http: reqwest::Client,
    config: PushPlusConfig,
}

impl PushPlusClient {
    pub fn new(config: PushPlusConfig) -> PushResult<Self> {
        if config.endpoint.trim().is_empty() {
            return Err(PushError::InvalidConfig("Empty endpoint".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PushError::InvalidConfig(format!("HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &PushPlusConfig {
        &self.config
    }

    /// Whether both the sender token and the role's friend token are set
    pub fn can_push_to(&self, role: Role) -> bool {
        self.config.sender().is_some() && self.config.friend_token(role).is_some()
    }

    /// Build the card message addressed to `role`'s friend token
    pub fn compose(&self, icon: &str, title: &str, body: &str, role: Role) -> PushResult<PushMessage> {
        let token = self
            .config
            .sender()
            .ok_or_else(|| PushError::MissingToken("sender".to_string()))?;
        let to = self
            .config
            .friend_token(role)
            .ok_or_else(|| PushError::MissingToken(format!("{} friend", role)))?;

        Ok(PushMessage {
            token: token.to_string(),
            title: format!("🍳 {}", title),
            content: render_card(icon, title, body, &self.config.signature),
            template: "html".to_string(),
            channel: "wechat".to_string(),
            to: Some(to.to_string()),
        })
    }

    /// Render and send a card to the friend registered for `role`
    pub async fn push_card(&self, icon: &str, title: &str, body: &str, role: Role) -> PushResult<()> {
        let message = self.compose(icon, title, body, role)?;
        self.send(&message).await
    }

    /// POST a message to the send API
    ///
    /// Succeeds only when the reply's business code is 200; the HTTP status
    /// alone is not trusted.
    #[instrument(skip(self, message), fields(title = %message.title))]
    pub async fn send(&self, message: &PushMessage) -> PushResult<()> {
        let response = self
            .http
            .post(&self.config.endpoint)
            .json(message)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PushError::Timeout(format!("{}: {}", self.config.endpoint, e))
                } else {
                    PushError::Http(e)
                }
            })?;

        let reply: PushReply = response.json().await?;
        if reply.code == SUCCESS_CODE {
            info!("Push delivered");
            Ok(())
        } else {
            let msg = reply.msg.unwrap_or_default();
            warn!(code = reply.code, msg = %msg, "Push rejected");
            Err(PushError::Rejected {
                code: reply.code,
                msg,
            })
        }
    }
}
