//! Client configuration

use crate::error::{ClientError, ClientResult};
use shared::BusinessZone;
use shared::models::Role;
use std::path::PathBuf;
use std::time::Duration;
use wok_push::PushPlusConfig;

/// Client configuration
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./wok-data | 工作目录 (identity file, logs) |
/// | CLIENT_ROLE | customer | `customer` or `kitchen` |
/// | BUSINESS_TZ | (local) | IANA zone for day keys and clock display |
/// | CUSTOMER_NAME | - | Display name attached to submitted orders |
/// | PUSHPLUS_SENDER_TOKEN | - | PushPlus sender token |
/// | PUSHPLUS_FRIEND_KITCHEN | - | Friend token receiving kitchen pushes |
/// | PUSHPLUS_FRIEND_CUSTOMER | - | Friend token receiving customer pushes |
/// | PUSH_TIMEOUT_SECS | 5 | Push request timeout |
/// | LOG_LEVEL | info | Log level |
/// | LOG_DIR | - | Daily-rolling log directory |
///
/// # 示例
///
/// ```ignore
/// CLIENT_ROLE=kitchen BUSINESS_TZ=Asia/Shanghai cargo run --bin wok-demo
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// 工作目录，存储身份文件、日志等
    pub work_dir: PathBuf,
    /// Role requested by configuration; `None` keeps the persisted one
    pub role: Option<Role>,
    pub zone: BusinessZone,
    pub customer_name: Option<String>,
    pub pushplus_sender_token: Option<String>,
    pub pushplus_friend_kitchen: Option<String>,
    pub pushplus_friend_customer: Option<String>,
    pub push_timeout: Duration,
    pub log_level: String,
    pub log_dir: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ClientConfig {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            role: None,
            zone: BusinessZone::Local,
            customer_name: None,
            pushplus_sender_token: None,
            pushplus_friend_kitchen: None,
            pushplus_friend_customer: None,
            push_timeout: Duration::from_secs(5),
            log_level: "info".to_string(),
            log_dir: None,
        }
    }

    /// 从环境变量加载配置
    ///
    /// Unset variables fall back to defaults; malformed role or zone values
    /// are errors.
    pub fn from_env() -> ClientResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (used by `from_env` and tests)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ClientResult<Self> {
        let mut config = Self::new(lookup("WORK_DIR").unwrap_or_else(|| "./wok-data".into()));

        config.role = non_empty(lookup("CLIENT_ROLE"))
            .map(|r| r.parse::<Role>())
            .transpose()
            .map_err(ClientError::Config)?;
        config.zone = lookup("BUSINESS_TZ")
            .map(|tz| tz.parse::<BusinessZone>())
            .transpose()
            .map_err(ClientError::Config)?
            .unwrap_or_default();
        config.customer_name = non_empty(lookup("CUSTOMER_NAME"));
        config.pushplus_sender_token = non_empty(lookup("PUSHPLUS_SENDER_TOKEN"));
        config.pushplus_friend_kitchen = non_empty(lookup("PUSHPLUS_FRIEND_KITCHEN"));
        config.pushplus_friend_customer = non_empty(lookup("PUSHPLUS_FRIEND_CUSTOMER"));
        config.push_timeout = lookup("PUSH_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(config.push_timeout);
        if let Some(level) = non_empty(lookup("LOG_LEVEL")) {
            config.log_level = level;
        }
        config.log_dir = non_empty(lookup("LOG_DIR"));
        Ok(config)
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_zone(mut self, zone: BusinessZone) -> Self {
        self.zone = zone;
        self
    }

    pub fn with_customer_name(mut self, name: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self
    }

    pub fn with_pushplus(
        mut self,
        sender_token: impl Into<String>,
        friend_kitchen: Option<String>,
        friend_customer: Option<String>,
    ) -> Self {
        self.pushplus_sender_token = Some(sender_token.into());
        self.pushplus_friend_kitchen = friend_kitchen;
        self.pushplus_friend_customer = friend_customer;
        self
    }

    pub fn with_push_timeout(mut self, timeout: Duration) -> Self {
        self.push_timeout = timeout;
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<String>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    /// Whether a PushPlus sender token is configured
    pub fn push_enabled(&self) -> bool {
        self.pushplus_sender_token.is_some()
    }

    /// PushPlus adapter settings
    pub fn pushplus(&self) -> PushPlusConfig {
        PushPlusConfig {
            sender_token: self.pushplus_sender_token.clone(),
            kitchen_friend_token: self.pushplus_friend_kitchen.clone(),
            customer_friend_token: self.pushplus_friend_customer.clone(),
            timeout: self.push_timeout,
            ..Default::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("./wok-data")
    }
}

/// Per-client context handed to every component
///
/// Created once at startup from the config plus the persisted identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientContext {
    pub client_id: String,
    pub role: Role,
    pub zone: BusinessZone,
    pub customer_name: Option<String>,
}

impl ClientContext {
    pub fn new(client_id: impl Into<String>, role: Role) -> Self {
        Self {
            client_id: client_id.into(),
            role,
            zone: BusinessZone::Local,
            customer_name: None,
        }
    }

    pub fn with_zone(mut self, zone: BusinessZone) -> Self {
        self.zone = zone;
        self
    }

    pub fn with_customer_name(mut self, name: Option<String>) -> Self {
        self.customer_name = name;
        self
    }

    pub fn notify_context(&self) -> crate::notifier::NotifyContext {
        crate::notifier::NotifyContext::new(self.client_id.clone(), self.role)
    }
}
