//! Main application state and event loop.
//!
//! [`App`] owns the open page views and the receiving end of the task
//! channel. Actions spawn background tasks; [`App::handle_message`] folds
//! their results back into the views, following the reconciliation rules in
//! [`crate::views`].

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::api::{ApiError, LogoutOutcome, RecordId, User};
use crate::context::AppContext;
use crate::error::AppError;
use crate::notification::{Notification, NotificationManager};
use crate::tasks::{create_task_channel, ApiMessage, TaskSpawner};
use crate::views::{
    AlertFilter, AlertsView, CowsView, FeedRecord, FeedsView, HealthRecord, HealthView, LoadId,
    Reconcile, SalesRecord, SalesView, TaskAction, TasksView, ViewScope,
};

/// A page that holds view state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Alerts,
    Cows,
    Sales,
    Tasks,
    Feeds,
    Health,
}

impl Page {
    pub const ALL: [Page; 6] = [
        Page::Alerts,
        Page::Cows,
        Page::Sales,
        Page::Tasks,
        Page::Feeds,
        Page::Health,
    ];
}

/// The main application struct that holds all state.
pub struct App {
    ctx: AppContext,
    spawner: TaskSpawner,
    rx: mpsc::UnboundedReceiver<ApiMessage>,
    /// Tasks spawned whose message has not been handled yet.
    in_flight: usize,
    /// The most recent read issued for each open page.
    latest_loads: HashMap<Page, LoadId>,
    notifications: NotificationManager,
    alerts: Option<AlertsView>,
    cows: Option<CowsView>,
    sales: Option<SalesView>,
    tasks: Option<TasksView>,
    feeds: Option<FeedsView>,
    health: Option<HealthView>,
}

impl App {
    /// Create a new application instance over a context.
    pub fn new(ctx: AppContext) -> Self {
        debug!("Creating new application instance");
        let (rx, spawner) = create_task_channel();
        Self {
            ctx,
            spawner,
            rx,
            in_flight: 0,
            latest_loads: HashMap::new(),
            notifications: NotificationManager::new(),
            alerts: None,
            cows: None,
            sales: None,
            tasks: None,
            feeds: None,
            health: None,
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub fn notifications(&self) -> &NotificationManager {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationManager {
        &mut self.notifications
    }

    /// Number of tasks whose results have not been handled.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Expire old notifications.
    pub fn tick(&mut self) {
        self.notifications.tick();
    }

    // ========================================================================
    // Session
    // ========================================================================

    /// Log in and navigate home. A failure is also shown as a notification.
    pub async fn login(&mut self, phone: &str, password: &str) -> Result<User, ApiError> {
        match self.ctx.login(phone, password).await {
            Ok(user) => {
                info!(user_id = user.id, "Logged in");
                Ok(user)
            }
            Err(e) => {
                self.notifications.error(e.to_string());
                Err(e)
            }
        }
    }

    /// Log out and close every page.
    pub async fn logout(&mut self) -> LogoutOutcome {
        let outcome = self.ctx.logout().await;
        self.close_all();
        outcome
    }

    // ========================================================================
    // Pages
    // ========================================================================

    /// Open a page with a fresh scope and start its initial load.
    ///
    /// Re-opening a page that is already open discards the old instance.
    pub fn open(&mut self, page: Page) -> ViewScope {
        let scope = ViewScope::next();
        debug!(?page, ?scope, "Opening page");
        match page {
            Page::Alerts => self.alerts = Some(AlertsView::new(scope)),
            Page::Cows => self.cows = Some(CowsView::new(scope)),
            Page::Sales => self.sales = Some(SalesView::new(scope)),
            Page::Tasks => self.tasks = Some(TasksView::new(scope)),
            Page::Feeds => self.feeds = Some(FeedsView::new(scope)),
            Page::Health => self.health = Some(HealthView::new(scope)),
        }
        self.reload(page);
        scope
    }

    /// Tear a page down. Results still in flight for it will be dropped.
    pub fn close(&mut self, page: Page) {
        debug!(?page, "Closing page");
        match page {
            Page::Alerts => self.alerts = None,
            Page::Cows => self.cows = None,
            Page::Sales => self.sales = None,
            Page::Tasks => self.tasks = None,
            Page::Feeds => self.feeds = None,
            Page::Health => self.health = None,
        }
        self.latest_loads.remove(&page);
    }

    fn close_all(&mut self) {
        for page in Page::ALL {
            self.close(page);
        }
    }

    pub fn alerts_view(&self) -> Option<&AlertsView> {
        self.alerts.as_ref()
    }

    pub fn cows_view(&self) -> Option<&CowsView> {
        self.cows.as_ref()
    }

    pub fn sales_view(&self) -> Option<&SalesView> {
        self.sales.as_ref()
    }

    pub fn tasks_view(&self) -> Option<&TasksView> {
        self.tasks.as_ref()
    }

    pub fn feeds_view(&self) -> Option<&FeedsView> {
        self.feeds.as_ref()
    }

    pub fn health_view(&self) -> Option<&HealthView> {
        self.health.as_ref()
    }

    /// Whether `scope` belongs to a page that is still open.
    pub fn is_active(&self, scope: ViewScope) -> bool {
        self.alerts.as_ref().map(AlertsView::scope) == Some(scope)
            || self.cows.as_ref().map(CowsView::scope) == Some(scope)
            || self.sales.as_ref().map(SalesView::scope) == Some(scope)
            || self.tasks.as_ref().map(TasksView::scope) == Some(scope)
            || self.feeds.as_ref().map(FeedsView::scope) == Some(scope)
            || self.health.as_ref().map(HealthView::scope) == Some(scope)
    }

    /// Whether `load` is the most recent read issued for `page`.
    fn is_latest_load(&self, page: Page, load: LoadId) -> bool {
        self.latest_loads.get(&page) == Some(&load)
    }

    /// Re-read an open page from the server. Does nothing if it is closed.
    ///
    /// The new read supersedes any read still in flight for the page.
    pub fn reload(&mut self, page: Page) {
        let client = self.ctx.client();
        let load = LoadId::next();
        let scope = match page {
            Page::Alerts => self.alerts.as_ref().map(|view| {
                let query = view.filter().to_query();
                self.spawner.spawn_load_alerts(client, view.scope(), load, query);
                view.scope()
            }),
            Page::Cows => self.cows.as_ref().map(|view| {
                self.spawner.spawn_load_cows(client, view.scope(), load, view.query());
                view.scope()
            }),
            Page::Sales => self.sales.as_ref().map(|view| {
                let query = view.sales_query();
                self.spawner.spawn_load_sales(client, view.scope(), load, query);
                view.scope()
            }),
            Page::Tasks => self.tasks.as_ref().map(|view| {
                self.spawner.spawn_load_tasks(client, view.scope(), load);
                view.scope()
            }),
            Page::Feeds => self.feeds.as_ref().map(|view| {
                self.spawner.spawn_load_feeds(client, view.scope(), load);
                view.scope()
            }),
            Page::Health => self.health.as_ref().map(|view| {
                self.spawner.spawn_load_health(client, view.scope(), load);
                view.scope()
            }),
        };
        if let Some(scope) = scope {
            debug!(?page, ?scope, ?load, "Loading page");
            self.latest_loads.insert(page, load);
            self.in_flight += 1;
        }
    }

    // ========================================================================
    // Actions
    //
    // Each returns whether a request was sent. Nothing is sent for a page
    // that is not open.
    // ========================================================================

    pub fn set_alert_filter(&mut self, filter: AlertFilter) -> bool {
        let changed = self
            .alerts
            .as_mut()
            .is_some_and(|view| view.set_filter(filter));
        if changed {
            self.reload(Page::Alerts);
        }
        changed
    }

    pub fn mark_alert_read(&mut self, id: RecordId) -> bool {
        let Some(scope) = self.alerts.as_ref().map(AlertsView::scope) else {
            return false;
        };
        self.spawner.spawn_mark_alert_read(self.ctx.client(), scope, id);
        self.in_flight += 1;
        true
    }

    pub fn mark_all_alerts_read(&mut self) -> bool {
        let Some(scope) = self.alerts.as_ref().map(AlertsView::scope) else {
            return false;
        };
        self.spawner.spawn_mark_all_alerts_read(self.ctx.client(), scope);
        self.in_flight += 1;
        true
    }

    pub fn resolve_alert(&mut self, id: RecordId, note: Option<String>) -> bool {
        let Some(scope) = self.alerts.as_ref().map(AlertsView::scope) else {
            return false;
        };
        self.spawner
            .spawn_resolve_alert(self.ctx.client(), scope, id, note);
        self.in_flight += 1;
        true
    }

    /// Flip an alert rule. Unknown rules are ignored.
    pub fn toggle_alert_rule(&mut self, id: RecordId) -> bool {
        let Some((scope, current)) = self
            .alerts
            .as_ref()
            .and_then(|view| view.rule_active(id).map(|active| (view.scope(), active)))
        else {
            return false;
        };
        self.spawner
            .spawn_toggle_alert_rule(self.ctx.client(), scope, id, !current);
        self.in_flight += 1;
        true
    }

    pub fn set_cow_status_filter(&mut self, status: Option<String>) -> bool {
        let changed = self
            .cows
            .as_mut()
            .is_some_and(|view| view.set_status_filter(status));
        if changed {
            self.reload(Page::Cows);
        }
        changed
    }

    pub fn create_cow(&mut self, data: Value) -> bool {
        let Some(scope) = self.cows.as_ref().map(CowsView::scope) else {
            return false;
        };
        self.spawner.spawn_create_cow(self.ctx.client(), scope, data);
        self.in_flight += 1;
        true
    }

    pub fn set_payment_status_filter(&mut self, status: Option<String>) -> bool {
        let changed = self
            .sales
            .as_mut()
            .is_some_and(|view| view.set_payment_status_filter(status));
        if changed {
            self.reload(Page::Sales);
        }
        changed
    }

    pub fn create_sales_record(&mut self, kind: SalesRecord, data: Value) -> bool {
        let Some(scope) = self.sales.as_ref().map(SalesView::scope) else {
            return false;
        };
        self.spawner
            .spawn_create_sales_record(self.ctx.client(), scope, kind, data);
        self.in_flight += 1;
        true
    }

    pub fn update_task(&mut self, id: RecordId, action: TaskAction) -> bool {
        let Some(scope) = self.tasks.as_ref().map(TasksView::scope) else {
            return false;
        };
        self.spawner
            .spawn_update_task(self.ctx.client(), scope, id, action);
        self.in_flight += 1;
        true
    }

    pub fn create_feed_record(&mut self, kind: FeedRecord, data: Value) -> bool {
        let Some(scope) = self.feeds.as_ref().map(FeedsView::scope) else {
            return false;
        };
        self.spawner
            .spawn_create_feed_record(self.ctx.client(), scope, kind, data);
        self.in_flight += 1;
        true
    }

    pub fn create_health_record(&mut self, kind: HealthRecord, data: Value) -> bool {
        let Some(scope) = self.health.as_ref().map(HealthView::scope) else {
            return false;
        };
        self.spawner
            .spawn_create_health_record(self.ctx.client(), scope, kind, data);
        self.in_flight += 1;
        true
    }

    pub fn resolve_health_event(&mut self, id: RecordId, data: Value) -> bool {
        let Some(scope) = self.health.as_ref().map(HealthView::scope) else {
            return false;
        };
        self.spawner
            .spawn_resolve_health_event(self.ctx.client(), scope, id, data);
        self.in_flight += 1;
        true
    }

    // ========================================================================
    // Event loop
    // ========================================================================

    /// Handle messages until no task is in flight.
    ///
    /// Messages may spawn follow-up reloads; those are waited for too.
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            match self.rx.recv().await {
                Some(message) => {
                    self.in_flight -= 1;
                    self.handle_message(message);
                }
                None => break,
            }
        }
    }

    /// Handle whatever messages are ready without waiting.
    ///
    /// Returns the number of messages handled.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            self.handle_message(message);
            handled += 1;
        }
        handled
    }

    /// Fold one task result into the views.
    ///
    /// Results for pages that have been closed, and reads superseded by a
    /// newer read of the same page, leave the views alone. An expired session
    /// is still reported through the error boundary.
    pub fn handle_message(&mut self, message: ApiMessage) {
        let scope = message.scope();
        if !self.is_active(scope) {
            match message.into_error() {
                Some(error) if error.is_unauthenticated() => self.handle_error(error),
                _ => debug!(?scope, "Dropping result for closed page"),
            }
            return;
        }

        match message {
            ApiMessage::AlertsLoaded { load, result, .. } => match result {
                Ok(_) if !self.is_latest_load(Page::Alerts, load) => {
                    debug!(?load, "Dropping superseded alerts read");
                }
                Ok((alerts, rules)) => {
                    if let Some(view) = self.alerts.as_mut() {
                        view.on_loaded(alerts, rules);
                    }
                }
                Err(e) => self.handle_error(e),
            },
            ApiMessage::AlertMarkedRead { id, result, .. } => match result {
                Ok(_) => self.reconcile(Page::Alerts, AlertsView::MARK_READ, |app| {
                    if let Some(view) = app.alerts.as_mut() {
                        view.mark_read(id);
                    }
                }),
                Err(e) => self.handle_error(e),
            },
            ApiMessage::AllAlertsMarkedRead { result, .. } => match result {
                Ok(_) => {
                    self.reconcile(Page::Alerts, AlertsView::MARK_READ, |app| {
                        if let Some(view) = app.alerts.as_mut() {
                            view.mark_all_read();
                        }
                    });
                    self.notifications.success("All alerts marked as read");
                }
                Err(e) => self.handle_error(e),
            },
            ApiMessage::AlertResolved { result, .. } => match result {
                Ok(_) => {
                    self.reconcile(Page::Alerts, AlertsView::RESOLVE, |_| {});
                    self.notifications.success("Alert resolved");
                }
                Err(e) => self.handle_error(e),
            },
            ApiMessage::AlertRuleToggled {
                id,
                is_active,
                result,
                ..
            } => match result {
                Ok(_) => self.reconcile(Page::Alerts, AlertsView::TOGGLE_RULE, |app| {
                    if let Some(view) = app.alerts.as_mut() {
                        view.set_rule_active(id, is_active);
                    }
                }),
                Err(e) => self.handle_error(e),
            },

            ApiMessage::CowsLoaded { load, result, .. } => match result {
                Ok(_) if !self.is_latest_load(Page::Cows, load) => {
                    debug!(?load, "Dropping superseded cows read");
                }
                Ok(cows) => {
                    if let Some(view) = self.cows.as_mut() {
                        view.on_loaded(cows);
                    }
                }
                Err(e) => self.handle_error(e),
            },
            ApiMessage::CowCreated { result, .. } => match result {
                Ok(cow) => {
                    self.reconcile(Page::Cows, CowsView::CREATE, |_| {});
                    self.notifications
                        .success(format!("Cow {} added", cow.tag_number));
                }
                Err(e) => self.handle_error(e),
            },

            ApiMessage::SalesLoaded { load, result, .. } => match result {
                Ok(_) if !self.is_latest_load(Page::Sales, load) => {
                    debug!(?load, "Dropping superseded sales read");
                }
                Ok(data) => {
                    if let Some(view) = self.sales.as_mut() {
                        view.on_loaded(data);
                    }
                }
                Err(e) => self.handle_error(e),
            },
            ApiMessage::SalesRecordCreated { kind, result, .. } => match result {
                Ok(()) => {
                    self.reconcile(Page::Sales, SalesView::CREATE, |_| {});
                    self.notifications.success(kind.success_message());
                }
                Err(e) => self.handle_error(e),
            },

            ApiMessage::TasksLoaded { load, result, .. } => match result {
                Ok(_) if !self.is_latest_load(Page::Tasks, load) => {
                    debug!(?load, "Dropping superseded tasks read");
                }
                Ok(tasks) => {
                    if let Some(view) = self.tasks.as_mut() {
                        view.on_loaded(tasks);
                    }
                }
                Err(e) => self.handle_error(e),
            },
            ApiMessage::TaskUpdated { action, result, .. } => match result {
                Ok(_) => {
                    self.reconcile(Page::Tasks, TasksView::UPDATE, |_| {});
                    self.notifications.success(action.success_message());
                }
                Err(e) => self.handle_error(e),
            },

            ApiMessage::FeedsLoaded { load, result, .. } => match result {
                Ok(_) if !self.is_latest_load(Page::Feeds, load) => {
                    debug!(?load, "Dropping superseded feeds read");
                }
                Ok((items, purchases)) => {
                    if let Some(view) = self.feeds.as_mut() {
                        view.on_loaded(items, purchases);
                    }
                }
                Err(e) => self.handle_error(e),
            },
            ApiMessage::FeedRecordCreated { kind, result, .. } => match result {
                Ok(()) => {
                    self.reconcile(Page::Feeds, FeedsView::CREATE, |_| {});
                    self.notifications.success(kind.success_message());
                }
                Err(e) => self.handle_error(e),
            },

            ApiMessage::HealthLoaded { load, result, .. } => match result {
                Ok(_) if !self.is_latest_load(Page::Health, load) => {
                    debug!(?load, "Dropping superseded health read");
                }
                Ok(data) => {
                    if let Some(view) = self.health.as_mut() {
                        view.on_loaded(data);
                    }
                }
                Err(e) => self.handle_error(e),
            },
            ApiMessage::HealthRecordCreated { kind, result, .. } => match result {
                Ok(()) => {
                    self.reconcile(Page::Health, kind.policy(), |_| {});
                    self.notifications.success(kind.success_message());
                }
                Err(e) => self.handle_error(e),
            },
            ApiMessage::HealthEventResolved { result, .. } => match result {
                Ok(_) => {
                    self.reconcile(Page::Health, HealthView::RESOLVE, |_| {});
                    self.notifications.success("Event resolved");
                }
                Err(e) => self.handle_error(e),
            },
        }
    }

    fn reconcile(&mut self, page: Page, policy: Reconcile, patch: impl FnOnce(&mut Self)) {
        match policy {
            Reconcile::Patch => patch(self),
            Reconcile::Reload => self.reload(page),
        }
    }

    /// Report a failed call.
    ///
    /// An expired session closes every page; the context has already
    /// redirected to login. Either way the error is shown as a notification
    /// and no view state changes.
    fn handle_error(&mut self, error: ApiError) {
        if self.ctx.handle_error(&error) {
            self.close_all();
        }
        let error = AppError::from(error);
        if error.is_critical() {
            warn!(error = %error, "Critical error occurred");
        } else {
            debug!(error = %error, "Recoverable error occurred");
        }
        self.notifications
            .push(Notification::error(error.user_message()));
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("ctx", &self.ctx)
            .field("in_flight", &self.in_flight)
            .field("alerts", &self.alerts.is_some())
            .field("cows", &self.cows.is_some())
            .field("sales", &self.sales.is_some())
            .field("tasks", &self.tasks.is_some())
            .field("feeds", &self.feeds.is_some())
            .field("health", &self.health.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reqwest::StatusCode;

    use super::*;
    use crate::api::types::{Alert, AlertRule, Cow};
    use crate::config::Settings;
    use crate::context::{RecordingNavigator, Route};
    use crate::session::MemoryStorage;

    fn create_test_app() -> (App, RecordingNavigator) {
        let navigator = RecordingNavigator::new();
        // Nothing listens on port 9.
        let settings = Settings {
            api_url: "http://127.0.0.1:9/api/v1".to_string(),
            ..Settings::default()
        };
        let ctx = AppContext::new(
            settings,
            Arc::new(MemoryStorage::new()),
            Arc::new(navigator.clone()),
        )
        .unwrap();
        (App::new(ctx), navigator)
    }

    fn alert(id: RecordId) -> Alert {
        Alert {
            id,
            ..Alert::default()
        }
    }

    fn loaded_alerts(app: &mut App, scope: ViewScope) {
        let load = app.latest_loads[&Page::Alerts];
        app.handle_message(ApiMessage::AlertsLoaded {
            scope,
            load,
            result: Ok((
                vec![alert(1), alert(2)],
                vec![AlertRule {
                    id: 7,
                    is_active: true,
                    ..AlertRule::default()
                }],
            )),
        });
    }

    #[tokio::test]
    async fn test_open_starts_load() {
        let (mut app, _) = create_test_app();
        app.open(Page::Cows);
        assert_eq!(app.in_flight(), 1);
        assert!(app.cows_view().is_some());
        assert!(!app.cows_view().unwrap().is_loaded());
    }

    #[tokio::test]
    async fn test_actions_on_closed_page_send_nothing() {
        let (mut app, _) = create_test_app();
        assert!(!app.mark_alert_read(1));
        assert!(!app.create_cow(serde_json::json!({})));
        assert!(!app.update_task(1, TaskAction::Skip { reason: None }));
        assert_eq!(app.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_stale_result_is_dropped() {
        let (mut app, _) = create_test_app();
        let old = app.open(Page::Cows);
        app.close(Page::Cows);
        let current = app.open(Page::Cows);
        assert_ne!(old, current);

        app.handle_message(ApiMessage::CowsLoaded {
            scope: old,
            load: LoadId::next(),
            result: Ok(vec![Cow {
                id: 1,
                ..Cow::default()
            }]),
        });

        assert!(!app.cows_view().unwrap().is_loaded());
        assert!(app.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_stale_failure_is_dropped() {
        let (mut app, navigator) = create_test_app();
        let scope = app.open(Page::Alerts);
        app.close(Page::Alerts);

        app.handle_message(ApiMessage::AlertsLoaded {
            scope,
            load: LoadId::next(),
            result: Err(ApiError::from_status(StatusCode::BAD_REQUEST, "Bad filter")),
        });

        assert!(app.notifications().is_empty());
        assert!(navigator.history().is_empty());
    }

    #[tokio::test]
    async fn test_expired_session_on_closed_page_still_redirects() {
        let (mut app, navigator) = create_test_app();
        app.open(Page::Tasks);
        let closed = app.open(Page::Cows);
        app.close(Page::Cows);

        app.handle_message(ApiMessage::CowsLoaded {
            scope: closed,
            load: LoadId::next(),
            result: Err(ApiError::Unauthenticated("Invalid token.".to_string())),
        });

        assert_eq!(navigator.history(), vec![Route::Login]);
        assert!(app.tasks_view().is_none());
        assert!(app.cows_view().is_none());
        assert_eq!(app.notifications().latest().unwrap().message, "Invalid token.");
    }

    #[tokio::test]
    async fn test_superseded_read_is_dropped() {
        let (mut app, _) = create_test_app();
        let scope = app.open(Page::Cows);
        let first = app.latest_loads[&Page::Cows];
        assert!(app.set_cow_status_filter(Some("milking".to_string())));
        let second = app.latest_loads[&Page::Cows];
        assert_ne!(first, second);

        app.handle_message(ApiMessage::CowsLoaded {
            scope,
            load: second,
            result: Ok(vec![Cow {
                id: 2,
                status: "milking".to_string(),
                ..Cow::default()
            }]),
        });
        app.handle_message(ApiMessage::CowsLoaded {
            scope,
            load: first,
            result: Ok(vec![
                Cow {
                    id: 1,
                    status: "dry".to_string(),
                    ..Cow::default()
                },
                Cow {
                    id: 2,
                    status: "milking".to_string(),
                    ..Cow::default()
                },
            ]),
        });

        let ids: Vec<_> = app.cows_view().unwrap().cows().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[tokio::test]
    async fn test_treatment_is_confirmed_without_reload() {
        let (mut app, _) = create_test_app();
        let scope = app.open(Page::Health);
        let before = app.in_flight();

        app.handle_message(ApiMessage::HealthRecordCreated {
            scope,
            kind: HealthRecord::Treatment,
            result: Ok(()),
        });

        assert_eq!(app.in_flight(), before);
        assert_eq!(app.notifications().latest().unwrap().message, "Treatment recorded");
    }

    #[tokio::test]
    async fn test_confirmed_mark_read_patches_in_place() {
        let (mut app, _) = create_test_app();
        let scope = app.open(Page::Alerts);
        loaded_alerts(&mut app, scope);
        let before = app.in_flight();

        app.handle_message(ApiMessage::AlertMarkedRead {
            scope,
            id: 2,
            result: Ok(serde_json::json!({})),
        });

        let view = app.alerts_view().unwrap();
        assert!(!view.alerts()[0].is_read);
        assert!(view.alerts()[1].is_read);
        assert_eq!(app.in_flight(), before);
    }

    #[tokio::test]
    async fn test_confirmed_rule_toggle_patches_in_place() {
        let (mut app, _) = create_test_app();
        let scope = app.open(Page::Alerts);
        loaded_alerts(&mut app, scope);

        app.handle_message(ApiMessage::AlertRuleToggled {
            scope,
            id: 7,
            is_active: false,
            result: Ok(AlertRule::default()),
        });

        assert_eq!(app.alerts_view().unwrap().rule_active(7), Some(false));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_view_unchanged() {
        let (mut app, navigator) = create_test_app();
        let scope = app.open(Page::Alerts);
        loaded_alerts(&mut app, scope);

        app.handle_message(ApiMessage::AlertMarkedRead {
            scope,
            id: 1,
            result: Err(ApiError::from_status(StatusCode::BAD_REQUEST, "Already read")),
        });

        assert_eq!(app.alerts_view().unwrap().unread_count(), 2);
        let latest = app.notifications().latest().unwrap();
        assert!(latest.is_error());
        assert_eq!(latest.message, "Already read");
        assert!(navigator.history().is_empty());
    }

    #[tokio::test]
    async fn test_unauthenticated_closes_pages_and_redirects() {
        let (mut app, navigator) = create_test_app();
        let scope = app.open(Page::Alerts);
        app.open(Page::Cows);
        let load = app.latest_loads[&Page::Alerts];

        app.handle_message(ApiMessage::AlertsLoaded {
            scope,
            load,
            result: Err(ApiError::Unauthenticated("Invalid token.".to_string())),
        });

        assert!(app.alerts_view().is_none());
        assert!(app.cows_view().is_none());
        assert_eq!(navigator.history(), vec![Route::Login]);
        assert_eq!(app.notifications().latest().unwrap().message, "Invalid token.");
    }

    #[tokio::test]
    async fn test_confirmed_create_triggers_reload() {
        let (mut app, _) = create_test_app();
        let scope = app.open(Page::Sales);
        let before = app.in_flight();

        app.handle_message(ApiMessage::SalesRecordCreated {
            scope,
            kind: SalesRecord::Buyer,
            result: Ok(()),
        });

        assert_eq!(app.in_flight(), before + 1);
        assert_eq!(app.notifications().latest().unwrap().message, "Buyer added");
    }

    #[tokio::test]
    async fn test_settle_drains_failed_loads() {
        let (mut app, _) = create_test_app();
        app.open(Page::Feeds);
        app.settle().await;

        assert_eq!(app.in_flight(), 0);
        assert!(!app.feeds_view().unwrap().is_loaded());
        assert_eq!(app.notifications().latest().unwrap().message, "Request failed");
    }
}
