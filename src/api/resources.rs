//! Per-resource wrappers around [`FarmClient::request`].
//!
//! Each method maps one backend resource-action pair to a fixed endpoint and
//! method. Bodies are forwarded untouched; collection reads go through
//! [`FarmClient::list`] so callers always get a plain `Vec`.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::instrument;

use super::client::FarmClient;
use super::error::Result;
use super::types::{
    Alert, AlertRule, Buyer, Cow, FeedItem, FeedPurchase, HealthEvent, MilkLog, Payment, Query,
    RecordId, RegisterRequest, Sale, TaskInstance, TaskTemplate, Worker,
};

impl FarmClient {
    // Auth

    /// Create an account and farm.
    pub async fn register(&self, request: &RegisterRequest) -> Result<Value> {
        self.post("/auth/register/", request).await
    }

    // Dashboards

    /// KPIs for the owner dashboard.
    pub async fn owner_dashboard(&self) -> Result<Value> {
        self.get("/dashboard/owner/").await
    }

    /// Today's summary for the worker dashboard.
    pub async fn worker_dashboard(&self) -> Result<Value> {
        self.get("/dashboard/worker/").await
    }

    // Cows

    #[instrument(skip(self))]
    pub async fn cows(&self, query: &Query) -> Result<Vec<Cow>> {
        self.list(&format!("/cows/{}", query.to_suffix())).await
    }

    pub async fn cow(&self, id: RecordId) -> Result<Cow> {
        self.get(&format!("/cows/{}/", id)).await
    }

    pub async fn create_cow<B: Serialize + ?Sized>(&self, data: &B) -> Result<Cow> {
        self.post("/cows/", data).await
    }

    pub async fn update_cow<B: Serialize + ?Sized>(&self, id: RecordId, data: &B) -> Result<Cow> {
        self.patch(&format!("/cows/{}/", id), data).await
    }

    /// Move a cow to a new status (milking, dry, sold, ...).
    pub async fn update_cow_status(
        &self,
        id: RecordId,
        to_status: &str,
        notes: Option<&str>,
    ) -> Result<Value> {
        self.post(
            &format!("/cows/{}/update_status/", id),
            &json!({ "to_status": to_status, "notes": notes }),
        )
        .await
    }

    pub async fn cow_stats(&self) -> Result<Value> {
        self.get("/cows/stats/").await
    }

    // Milk

    #[instrument(skip(self))]
    pub async fn milk_logs(&self, query: &Query) -> Result<Vec<MilkLog>> {
        self.list(&format!("/milk/logs/{}", query.to_suffix())).await
    }

    pub async fn create_milk_log<B: Serialize + ?Sized>(&self, data: &B) -> Result<MilkLog> {
        self.post("/milk/logs/", data).await
    }

    pub async fn today_milk_logs(&self) -> Result<Vec<MilkLog>> {
        self.list("/milk/logs/today/").await
    }

    /// Totals and per-day figures: `{date_range, totals, daily}`.
    pub async fn milk_summary(&self, query: &Query) -> Result<Value> {
        self.get(&format!("/milk/logs/summary/{}", query.to_suffix())).await
    }

    pub async fn top_producers(&self, query: &Query) -> Result<Value> {
        self.get(&format!("/milk/logs/top_producers/{}", query.to_suffix())).await
    }

    // Feeds

    pub async fn feed_items(&self) -> Result<Vec<FeedItem>> {
        self.list("/feeds/items/").await
    }

    pub async fn create_feed_item<B: Serialize + ?Sized>(&self, data: &B) -> Result<FeedItem> {
        self.post("/feeds/items/", data).await
    }

    pub async fn feed_purchases(&self) -> Result<Vec<FeedPurchase>> {
        self.list("/feeds/purchases/").await
    }

    pub async fn create_feed_purchase<B: Serialize + ?Sized>(
        &self,
        data: &B,
    ) -> Result<FeedPurchase> {
        self.post("/feeds/purchases/", data).await
    }

    pub async fn create_feed_usage<B: Serialize + ?Sized>(&self, data: &B) -> Result<Value> {
        self.post("/feeds/usage/", data).await
    }

    pub async fn inventory_balances(&self) -> Result<Vec<Value>> {
        self.list("/inventory/balances/").await
    }

    pub async fn low_stock_items(&self) -> Result<Vec<Value>> {
        self.list("/inventory/balances/low_stock/").await
    }

    // Health

    #[instrument(skip(self))]
    pub async fn health_events(&self, query: &Query) -> Result<Vec<HealthEvent>> {
        self.list(&format!("/health/events/{}", query.to_suffix())).await
    }

    pub async fn create_health_event<B: Serialize + ?Sized>(
        &self,
        data: &B,
    ) -> Result<HealthEvent> {
        self.post("/health/events/", data).await
    }

    pub async fn resolve_health_event<B: Serialize + ?Sized>(
        &self,
        id: RecordId,
        data: &B,
    ) -> Result<Value> {
        self.post(&format!("/health/events/{}/resolve/", id), data).await
    }

    pub async fn create_treatment<B: Serialize + ?Sized>(&self, data: &B) -> Result<Value> {
        self.post("/health/treatments/", data).await
    }

    pub async fn active_withdrawals(&self) -> Result<Vec<Value>> {
        self.list("/health/withdrawals/active/").await
    }

    /// Vaccinations due within `days` days.
    pub async fn vaccinations_due(&self, days: u32) -> Result<Vec<Value>> {
        let query = Query::new().param("days", days);
        self.list(&format!("/vaccinations/due/{}", query.to_suffix())).await
    }

    // Tasks

    pub async fn today_tasks(&self) -> Result<Vec<TaskInstance>> {
        self.list("/tasks/today/").await
    }

    pub async fn my_tasks(&self) -> Result<Vec<TaskInstance>> {
        self.list("/tasks/my_tasks/").await
    }

    pub async fn pending_tasks(&self) -> Result<Vec<TaskInstance>> {
        self.list("/tasks/pending/").await
    }

    pub async fn overdue_tasks(&self) -> Result<Vec<TaskInstance>> {
        self.list("/tasks/overdue/").await
    }

    pub async fn complete_task(&self, id: RecordId, comment: Option<&str>) -> Result<Value> {
        let body = match comment {
            Some(comment) => json!({ "comment": comment }),
            None => json!({}),
        };
        self.post(&format!("/tasks/{}/complete/", id), &body).await
    }

    pub async fn skip_task(&self, id: RecordId, reason: Option<&str>) -> Result<Value> {
        self.post(&format!("/tasks/{}/skip/", id), &json!({ "reason": reason })).await
    }

    /// Ask the server to create today's task instances from the templates.
    pub async fn generate_daily_tasks(&self) -> Result<Value> {
        self.post_empty("/tasks/generate_daily/").await
    }

    pub async fn task_templates(&self) -> Result<Vec<TaskTemplate>> {
        self.list("/tasks/templates/").await
    }

    pub async fn create_task_template<B: Serialize + ?Sized>(
        &self,
        data: &B,
    ) -> Result<TaskTemplate> {
        self.post("/tasks/templates/", data).await
    }

    pub async fn task_instances(&self, query: &Query) -> Result<Vec<TaskInstance>> {
        self.list(&format!("/tasks/instances/{}", query.to_suffix())).await
    }

    pub async fn create_task_instance<B: Serialize + ?Sized>(
        &self,
        data: &B,
    ) -> Result<TaskInstance> {
        self.post("/tasks/instances/", data).await
    }

    pub async fn workers(&self) -> Result<Vec<Worker>> {
        self.list("/farm/workers/").await
    }

    // Sales

    #[instrument(skip(self))]
    pub async fn sales(&self, query: &Query) -> Result<Vec<Sale>> {
        self.list(&format!("/sales/{}", query.to_suffix())).await
    }

    pub async fn create_sale<B: Serialize + ?Sized>(&self, data: &B) -> Result<Sale> {
        self.post("/sales/", data).await
    }

    pub async fn sales_summary(&self, query: &Query) -> Result<Value> {
        self.get(&format!("/sales/summary/{}", query.to_suffix())).await
    }

    pub async fn check_withdrawal(&self) -> Result<Value> {
        self.get("/sales/check_withdrawal/").await
    }

    pub async fn buyers(&self) -> Result<Vec<Buyer>> {
        self.list("/buyers/").await
    }

    pub async fn create_buyer<B: Serialize + ?Sized>(&self, data: &B) -> Result<Buyer> {
        self.post("/buyers/", data).await
    }

    pub async fn payments(&self) -> Result<Vec<Payment>> {
        self.list("/payments/").await
    }

    pub async fn create_payment<B: Serialize + ?Sized>(&self, data: &B) -> Result<Payment> {
        self.post("/payments/", data).await
    }

    // Alerts

    #[instrument(skip(self))]
    pub async fn alerts(&self, query: &Query) -> Result<Vec<Alert>> {
        self.list(&format!("/alerts/{}", query.to_suffix())).await
    }

    pub async fn open_alerts(&self) -> Result<Vec<Alert>> {
        self.list("/alerts/open/").await
    }

    pub async fn alerts_summary(&self) -> Result<Value> {
        self.get("/alerts/summary/").await
    }

    pub async fn mark_alert_read(&self, id: RecordId) -> Result<Value> {
        self.post_empty(&format!("/alerts/{}/mark_read/", id)).await
    }

    pub async fn mark_all_alerts_read(&self) -> Result<Value> {
        self.post_empty("/alerts/mark_all_read/").await
    }

    pub async fn resolve_alert(&self, id: RecordId, note: Option<&str>) -> Result<Value> {
        self.post(&format!("/alerts/{}/resolve/", id), &json!({ "note": note })).await
    }

    pub async fn acknowledge_alert(&self, id: RecordId) -> Result<Value> {
        self.post_empty(&format!("/alerts/{}/acknowledge/", id)).await
    }

    pub async fn mute_alert(&self, id: RecordId) -> Result<Value> {
        self.post_empty(&format!("/alerts/{}/mute/", id)).await
    }

    pub async fn alert_rules(&self) -> Result<Vec<AlertRule>> {
        self.list("/alerts/rules/").await
    }

    pub async fn update_alert_rule<B: Serialize + ?Sized>(
        &self,
        id: RecordId,
        data: &B,
    ) -> Result<AlertRule> {
        self.patch(&format!("/alerts/rules/{}/", id), data).await
    }

    // Notifications

    pub async fn unread_notifications(&self) -> Result<Vec<Value>> {
        self.list("/notifications/unread/").await
    }

    pub async fn mark_notification_read(&self, id: RecordId) -> Result<Value> {
        self.post_empty(&format!("/notifications/{}/mark_read/", id)).await
    }
}
