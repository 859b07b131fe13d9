//! Intent delivery
//!
//! Every intent is handed to the push adapter (best effort). A local alert is
//! shown only when this client's role matches the intent's target role.

use crate::notifier::DispatchIntent;
use async_trait::async_trait;
use shared::models::Role;
use std::sync::Arc;
use wok_push::PushPlusClient;

/// Remote push collaborator
#[async_trait]
pub trait PushDispatcher: Send + Sync {
    /// Returns whether the push was accepted; failures are never raised
    async fn dispatch(&self, title: &str, body: &str, role: Role) -> bool;
}

/// Local (on-device) alert collaborator
pub trait AlertPresenter: Send + Sync {
    fn present_alert(&self, title: &str, body: &str, icon: &str);
}

/// Push adapter that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPush;

#[async_trait]
impl PushDispatcher for NoPush {
    async fn dispatch(&self, _title: &str, _body: &str, _role: Role) -> bool {
        false
    }
}

/// PushPlus-backed push
#[async_trait]
impl PushDispatcher for PushPlusClient {
    async fn dispatch(&self, title: &str, body: &str, role: Role) -> bool {
        if !self.can_push_to(role) {
            tracing::debug!(role = %role, "PushPlus tokens not configured, skipping push");
            return false;
        }
        match self.push_card("🔔", title, body, role).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(role = %role, error = %e, "PushPlus push failed");
                false
            }
        }
    }
}

/// Alert presenter writing to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlerts;

impl AlertPresenter for LogAlerts {
    fn present_alert(&self, title: &str, body: &str, icon: &str) {
        tracing::info!(icon = %icon, "[ALERT] {} - {}", title, body);
    }
}

/// What happened to one intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchOutcome {
    pub pushed: bool,
    pub alerted: bool,
}

/// Delivers intents for one client
#[derive(Clone)]
pub struct Dispatcher {
    role: Role,
    push: Arc<dyn PushDispatcher>,
    alerts: Arc<dyn AlertPresenter>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("role", &self.role)
            .field("push", &"<PushDispatcher>")
            .field("alerts", &"<AlertPresenter>")
            .finish()
    }
}

impl Dispatcher {
    pub fn new(role: Role, push: Arc<dyn PushDispatcher>, alerts: Arc<dyn AlertPresenter>) -> Self {
        Self { role, push, alerts }
    }

    pub async fn dispatch(&self, intent: &DispatchIntent) -> DispatchOutcome {
        let target = intent.target.role();
        let pushed = self.push.dispatch(&intent.title, &intent.body, target).await;

        let alerted = target == self.role;
        if alerted {
            self.alerts.present_alert(&intent.title, &intent.body, &intent.icon);
        } else {
            tracing::debug!(target_role = %target, own_role = %self.role, order_id = %intent.order_id, "Local alert filtered by role");
        }
        DispatchOutcome { pushed, alerted }
    }

    pub async fn dispatch_all(&self, intents: &[DispatchIntent]) -> Vec<DispatchOutcome> {
        let mut outcomes = Vec::with_capacity(intents.len());
        for intent in intents {
            outcomes.push(self.dispatch(intent).await);
        }
        outcomes
    }
}
