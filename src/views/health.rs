//! Herd health page state.

use crate::api::types::HealthEvent;
use crate::api::Query;

use super::{Collection, Reconcile, ViewScope};

/// Everything the health page reads on load.
#[derive(Debug, Clone, Default)]
pub struct HealthData {
    pub events: Vec<HealthEvent>,
    /// Events the server still reports as unresolved.
    pub active: Vec<HealthEvent>,
}

/// Which kind of record a health-page form created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthRecord {
    Event,
    Treatment,
}

impl HealthRecord {
    pub fn success_message(&self) -> &'static str {
        match self {
            HealthRecord::Event => "Health event recorded",
            HealthRecord::Treatment => "Treatment recorded",
        }
    }

    /// Treatments are not listed on the page, so there is nothing to re-read.
    pub fn policy(&self) -> Reconcile {
        match self {
            HealthRecord::Event => Reconcile::Reload,
            HealthRecord::Treatment => Reconcile::Patch,
        }
    }
}

/// Recorded health events and the ones still open.
#[derive(Debug)]
pub struct HealthView {
    scope: ViewScope,
    events: Collection<HealthEvent>,
    active: Collection<HealthEvent>,
}

impl HealthView {
    /// The server sets the resolution date and may close withdrawals.
    pub const RESOLVE: Reconcile = Reconcile::Reload;

    pub fn new(scope: ViewScope) -> Self {
        Self {
            scope,
            events: Collection::default(),
            active: Collection::default(),
        }
    }

    pub fn scope(&self) -> ViewScope {
        self.scope
    }

    /// Query for the unresolved events list.
    pub fn active_query() -> Query {
        Query::new().param("is_resolved", "false")
    }

    pub fn on_loaded(&mut self, data: HealthData) {
        self.events.replace(data.events);
        self.active.replace(data.active);
    }

    pub fn events(&self) -> &[HealthEvent] {
        self.events.items()
    }

    pub fn active(&self) -> &[HealthEvent] {
        self.active.items()
    }

    /// Open events of the given severity.
    pub fn active_with_severity<'a>(
        &'a self,
        severity: &'a str,
    ) -> impl Iterator<Item = &'a HealthEvent> + 'a {
        self.active.items().iter().filter(move |e| e.severity == severity)
    }

    pub fn resolved_count(&self) -> usize {
        self.events.items().iter().filter(|e| e.is_resolved).count()
    }

    pub fn is_loaded(&self) -> bool {
        self.events.is_loaded()
    }
}
