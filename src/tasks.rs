//! Background tasks for API operations.
//!
//! Every API call a view makes runs on its own tokio task. The task reports
//! exactly one [`ApiMessage`] back to the event loop over an unbounded
//! channel; the [`App`](crate::app::App) owns the receiving end.
//!
//! Every message carries the [`ViewScope`] of the view that asked for it, so
//! results for a view that has since been closed can be dropped. Reads also
//! carry a [`LoadId`] so that only the latest read of a page is applied.
//!
//! # Adding New Task Types
//!
//! 1. Add a variant to `ApiMessage` for the result
//! 2. Add a spawn method to `TaskSpawner`
//! 3. Handle the message in `App::handle_message`

use serde_json::Value;
use tokio::sync::mpsc;

use crate::api::types::{Alert, AlertRule, Cow, FeedItem, FeedPurchase, TaskInstance};
use crate::api::{ApiError, FarmClient, Query, RecordId};
use crate::views::{
    FeedRecord, HealthData, HealthRecord, HealthView, LoadId, SalesData, SalesRecord, TaskAction,
    ViewScope,
};

type Result<T> = std::result::Result<T, ApiError>;

/// Messages sent from background tasks to the event loop.
#[derive(Debug)]
pub enum ApiMessage {
    AlertsLoaded {
        scope: ViewScope,
        load: LoadId,
        result: Result<(Vec<Alert>, Vec<AlertRule>)>,
    },
    AlertMarkedRead {
        scope: ViewScope,
        id: RecordId,
        result: Result<Value>,
    },
    AllAlertsMarkedRead {
        scope: ViewScope,
        result: Result<Value>,
    },
    AlertResolved {
        scope: ViewScope,
        result: Result<Value>,
    },
    AlertRuleToggled {
        scope: ViewScope,
        id: RecordId,
        is_active: bool,
        result: Result<AlertRule>,
    },

    CowsLoaded {
        scope: ViewScope,
        load: LoadId,
        result: Result<Vec<Cow>>,
    },
    CowCreated {
        scope: ViewScope,
        result: Result<Cow>,
    },

    SalesLoaded {
        scope: ViewScope,
        load: LoadId,
        result: Result<SalesData>,
    },
    SalesRecordCreated {
        scope: ViewScope,
        kind: SalesRecord,
        result: Result<()>,
    },

    TasksLoaded {
        scope: ViewScope,
        load: LoadId,
        result: Result<Vec<TaskInstance>>,
    },
    TaskUpdated {
        scope: ViewScope,
        action: TaskAction,
        result: Result<Value>,
    },

    FeedsLoaded {
        scope: ViewScope,
        load: LoadId,
        result: Result<(Vec<FeedItem>, Vec<FeedPurchase>)>,
    },
    FeedRecordCreated {
        scope: ViewScope,
        kind: FeedRecord,
        result: Result<()>,
    },

    HealthLoaded {
        scope: ViewScope,
        load: LoadId,
        result: Result<HealthData>,
    },
    HealthRecordCreated {
        scope: ViewScope,
        kind: HealthRecord,
        result: Result<()>,
    },
    HealthEventResolved {
        scope: ViewScope,
        result: Result<Value>,
    },
}

impl ApiMessage {
    /// The view this message belongs to.
    pub fn scope(&self) -> ViewScope {
        match self {
            ApiMessage::AlertsLoaded { scope, .. }
            | ApiMessage::AlertMarkedRead { scope, .. }
            | ApiMessage::AllAlertsMarkedRead { scope, .. }
            | ApiMessage::AlertResolved { scope, .. }
            | ApiMessage::AlertRuleToggled { scope, .. }
            | ApiMessage::CowsLoaded { scope, .. }
            | ApiMessage::CowCreated { scope, .. }
            | ApiMessage::SalesLoaded { scope, .. }
            | ApiMessage::SalesRecordCreated { scope, .. }
            | ApiMessage::TasksLoaded { scope, .. }
            | ApiMessage::TaskUpdated { scope, .. }
            | ApiMessage::FeedsLoaded { scope, .. }
            | ApiMessage::FeedRecordCreated { scope, .. }
            | ApiMessage::HealthLoaded { scope, .. }
            | ApiMessage::HealthRecordCreated { scope, .. }
            | ApiMessage::HealthEventResolved { scope, .. } => *scope,
        }
    }

    /// The failure this message reports, if any.
    pub fn into_error(self) -> Option<ApiError> {
        match self {
            ApiMessage::AlertsLoaded { result, .. } => result.err(),
            ApiMessage::AlertMarkedRead { result, .. }
            | ApiMessage::AllAlertsMarkedRead { result, .. }
            | ApiMessage::AlertResolved { result, .. }
            | ApiMessage::TaskUpdated { result, .. }
            | ApiMessage::HealthEventResolved { result, .. } => result.err(),
            ApiMessage::AlertRuleToggled { result, .. } => result.err(),
            ApiMessage::CowsLoaded { result, .. } => result.err(),
            ApiMessage::CowCreated { result, .. } => result.err(),
            ApiMessage::SalesLoaded { result, .. } => result.err(),
            ApiMessage::SalesRecordCreated { result, .. }
            | ApiMessage::FeedRecordCreated { result, .. }
            | ApiMessage::HealthRecordCreated { result, .. } => result.err(),
            ApiMessage::TasksLoaded { result, .. } => result.err(),
            ApiMessage::FeedsLoaded { result, .. } => result.err(),
            ApiMessage::HealthLoaded { result, .. } => result.err(),
        }
    }
}

/// Spawns background tasks for API operations.
///
/// Each method clones what it needs, spawns a tokio task, and sends the
/// result through the channel.
#[derive(Debug, Clone)]
pub struct TaskSpawner {
    tx: mpsc::UnboundedSender<ApiMessage>,
}

impl TaskSpawner {
    pub fn new(tx: mpsc::UnboundedSender<ApiMessage>) -> Self {
        Self { tx }
    }

    fn spawn<F>(&self, task: F)
    where
        F: std::future::Future<Output = ApiMessage> + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(task.await);
        });
    }

    // Alerts

    /// Fetch alerts and alert rules in parallel.
    pub fn spawn_load_alerts(
        &self,
        client: &FarmClient,
        scope: ViewScope,
        load: LoadId,
        query: Query,
    ) {
        let client = client.clone();
        self.spawn(async move {
            let result = tokio::try_join!(client.alerts(&query), client.alert_rules());
            ApiMessage::AlertsLoaded {
                scope,
                load,
                result,
            }
        });
    }

    pub fn spawn_mark_alert_read(&self, client: &FarmClient, scope: ViewScope, id: RecordId) {
        let client = client.clone();
        self.spawn(async move {
            let result = client.mark_alert_read(id).await;
            ApiMessage::AlertMarkedRead { scope, id, result }
        });
    }

    pub fn spawn_mark_all_alerts_read(&self, client: &FarmClient, scope: ViewScope) {
        let client = client.clone();
        self.spawn(async move {
            let result = client.mark_all_alerts_read().await;
            ApiMessage::AllAlertsMarkedRead { scope, result }
        });
    }

    pub fn spawn_resolve_alert(
        &self,
        client: &FarmClient,
        scope: ViewScope,
        id: RecordId,
        note: Option<String>,
    ) {
        let client = client.clone();
        self.spawn(async move {
            let result = client.resolve_alert(id, note.as_deref()).await;
            ApiMessage::AlertResolved { scope, result }
        });
    }

    /// Enable or disable an alert rule.
    pub fn spawn_toggle_alert_rule(
        &self,
        client: &FarmClient,
        scope: ViewScope,
        id: RecordId,
        is_active: bool,
    ) {
        let client = client.clone();
        self.spawn(async move {
            let body = serde_json::json!({ "is_active": is_active });
            let result = client.update_alert_rule(id, &body).await;
            ApiMessage::AlertRuleToggled {
                scope,
                id,
                is_active,
                result,
            }
        });
    }

    // Cows

    pub fn spawn_load_cows(
        &self,
        client: &FarmClient,
        scope: ViewScope,
        load: LoadId,
        query: Query,
    ) {
        let client = client.clone();
        self.spawn(async move {
            let result = client.cows(&query).await;
            ApiMessage::CowsLoaded {
                scope,
                load,
                result,
            }
        });
    }

    pub fn spawn_create_cow(&self, client: &FarmClient, scope: ViewScope, data: Value) {
        let client = client.clone();
        self.spawn(async move {
            let result = client.create_cow(&data).await;
            ApiMessage::CowCreated { scope, result }
        });
    }

    // Sales

    /// Fetch buyers, sales and payments in parallel.
    pub fn spawn_load_sales(
        &self,
        client: &FarmClient,
        scope: ViewScope,
        load: LoadId,
        query: Query,
    ) {
        let client = client.clone();
        self.spawn(async move {
            let result = tokio::try_join!(client.buyers(), client.sales(&query), client.payments())
                .map(|(buyers, sales, payments)| SalesData {
                    buyers,
                    sales,
                    payments,
                });
            ApiMessage::SalesLoaded {
                scope,
                load,
                result,
            }
        });
    }

    pub fn spawn_create_sales_record(
        &self,
        client: &FarmClient,
        scope: ViewScope,
        kind: SalesRecord,
        data: Value,
    ) {
        let client = client.clone();
        self.spawn(async move {
            let result = match kind {
                SalesRecord::Sale => client.create_sale(&data).await.map(drop),
                SalesRecord::Buyer => client.create_buyer(&data).await.map(drop),
                SalesRecord::Payment => client.create_payment(&data).await.map(drop),
            };
            ApiMessage::SalesRecordCreated {
                scope,
                kind,
                result,
            }
        });
    }

    // Tasks

    /// Fetch today's tasks.
    pub fn spawn_load_tasks(&self, client: &FarmClient, scope: ViewScope, load: LoadId) {
        let client = client.clone();
        self.spawn(async move {
            let result = client.today_tasks().await;
            ApiMessage::TasksLoaded {
                scope,
                load,
                result,
            }
        });
    }

    pub fn spawn_update_task(
        &self,
        client: &FarmClient,
        scope: ViewScope,
        id: RecordId,
        action: TaskAction,
    ) {
        let client = client.clone();
        self.spawn(async move {
            let result = match &action {
                TaskAction::Complete { comment } => {
                    client.complete_task(id, comment.as_deref()).await
                }
                TaskAction::Skip { reason } => client.skip_task(id, reason.as_deref()).await,
            };
            ApiMessage::TaskUpdated {
                scope,
                action,
                result,
            }
        });
    }

    // Feeds

    /// Fetch feed items and purchases in parallel.
    pub fn spawn_load_feeds(&self, client: &FarmClient, scope: ViewScope, load: LoadId) {
        let client = client.clone();
        self.spawn(async move {
            let result = tokio::try_join!(client.feed_items(), client.feed_purchases());
            ApiMessage::FeedsLoaded {
                scope,
                load,
                result,
            }
        });
    }

    pub fn spawn_create_feed_record(
        &self,
        client: &FarmClient,
        scope: ViewScope,
        kind: FeedRecord,
        data: Value,
    ) {
        let client = client.clone();
        self.spawn(async move {
            let result = match kind {
                FeedRecord::Item => client.create_feed_item(&data).await.map(drop),
                FeedRecord::Purchase => client.create_feed_purchase(&data).await.map(drop),
            };
            ApiMessage::FeedRecordCreated {
                scope,
                kind,
                result,
            }
        });
    }

    // Health

    /// Fetch all health events and the unresolved ones in parallel.
    pub fn spawn_load_health(&self, client: &FarmClient, scope: ViewScope, load: LoadId) {
        let client = client.clone();
        self.spawn(async move {
            let active = HealthView::active_query();
            let all = Query::new();
            let result = tokio::try_join!(
                client.health_events(&all),
                client.health_events(&active)
            )
            .map(|(events, active)| HealthData { events, active });
            ApiMessage::HealthLoaded {
                scope,
                load,
                result,
            }
        });
    }

    pub fn spawn_create_health_record(
        &self,
        client: &FarmClient,
        scope: ViewScope,
        kind: HealthRecord,
        data: Value,
    ) {
        let client = client.clone();
        self.spawn(async move {
            let result = match kind {
                HealthRecord::Event => client.create_health_event(&data).await.map(drop),
                HealthRecord::Treatment => client.create_treatment(&data).await.map(drop),
            };
            ApiMessage::HealthRecordCreated {
                scope,
                kind,
                result,
            }
        });
    }

    pub fn spawn_resolve_health_event(
        &self,
        client: &FarmClient,
        scope: ViewScope,
        id: RecordId,
        data: Value,
    ) {
        let client = client.clone();
        self.spawn(async move {
            let result = client.resolve_health_event(id, &data).await;
            ApiMessage::HealthEventResolved { scope, result }
        });
    }
}

/// Create a new task channel and spawner.
///
/// Returns a tuple of (receiver, spawner). The receiver is polled by the
/// event loop; the spawner is used to start tasks.
pub fn create_task_channel() -> (mpsc::UnboundedReceiver<ApiMessage>, TaskSpawner) {
    let (tx, rx) = mpsc::unbounded_channel();
    (rx, TaskSpawner::new(tx))
}
