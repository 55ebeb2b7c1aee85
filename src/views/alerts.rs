//! Alerts page state.

use crate::api::types::{Alert, AlertRule};
use crate::api::{Query, RecordId};

use super::{Collection, Reconcile, ViewScope};

/// Filters applied to the alert list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertFilter {
    /// e.g. `low_stock`, `health`; `None` for all types.
    pub alert_type: Option<String>,
    /// `info`, `warning` or `critical`; `None` for all severities.
    pub severity: Option<String>,
}

impl AlertFilter {
    /// The query string for this filter.
    pub fn to_query(&self) -> Query {
        Query::new()
            .param_opt("alert_type", self.alert_type.as_deref())
            .param_opt("severity", self.severity.as_deref())
    }
}

/// Alerts and alert rules.
///
/// Mark-read and rule toggles are patched in place; resolving reloads,
/// because the server sets the resolution fields.
#[derive(Debug)]
pub struct AlertsView {
    scope: ViewScope,
    filter: AlertFilter,
    alerts: Collection<Alert>,
    rules: Collection<AlertRule>,
}

impl AlertsView {
    pub const RESOLVE: Reconcile = Reconcile::Reload;
    pub const MARK_READ: Reconcile = Reconcile::Patch;
    pub const TOGGLE_RULE: Reconcile = Reconcile::Patch;

    pub fn new(scope: ViewScope) -> Self {
        Self {
            scope,
            filter: AlertFilter::default(),
            alerts: Collection::default(),
            rules: Collection::default(),
        }
    }

    pub fn scope(&self) -> ViewScope {
        self.scope
    }

    pub fn filter(&self) -> &AlertFilter {
        &self.filter
    }

    /// Change the filter. Returns whether it changed (and a reload is due).
    pub fn set_filter(&mut self, filter: AlertFilter) -> bool {
        if self.filter == filter {
            return false;
        }
        self.filter = filter;
        true
    }

    pub fn on_loaded(&mut self, alerts: Vec<Alert>, rules: Vec<AlertRule>) {
        self.alerts.replace(alerts);
        self.rules.replace(rules);
    }

    pub fn mark_read(&mut self, id: RecordId) {
        self.alerts.patch(id, |a| a.is_read = true);
    }

    pub fn mark_all_read(&mut self) {
        self.alerts.patch_all(|a| a.is_read = true);
    }

    pub fn set_rule_active(&mut self, id: RecordId, is_active: bool) {
        self.rules.patch(id, |r| r.is_active = is_active);
    }

    /// Current state of a rule, used to compute the toggle target.
    pub fn rule_active(&self, id: RecordId) -> Option<bool> {
        self.rules.get(id).map(|r| r.is_active)
    }

    pub fn alerts(&self) -> &[Alert] {
        self.alerts.items()
    }

    pub fn rules(&self) -> &[AlertRule] {
        self.rules.items()
    }

    pub fn unread_count(&self) -> usize {
        self.alerts.items().iter().filter(|a| !a.is_read).count()
    }

    pub fn is_loaded(&self) -> bool {
        self.alerts.is_loaded()
    }
}
