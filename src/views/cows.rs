//! Herd page state.

use crate::api::types::Cow;
use crate::api::Query;

use super::{Collection, Reconcile, ViewScope};

/// The cow list, optionally filtered by status.
#[derive(Debug)]
pub struct CowsView {
    scope: ViewScope,
    status: Option<String>,
    cows: Collection<Cow>,
}

impl CowsView {
    /// New cows get server-computed display fields.
    pub const CREATE: Reconcile = Reconcile::Reload;

    pub fn new(scope: ViewScope) -> Self {
        Self {
            scope,
            status: None,
            cows: Collection::default(),
        }
    }

    pub fn scope(&self) -> ViewScope {
        self.scope
    }

    /// Change the status filter. Returns whether a reload is due.
    pub fn set_status_filter(&mut self, status: Option<String>) -> bool {
        let status = status.filter(|s| !s.is_empty());
        if self.status == status {
            return false;
        }
        self.status = status;
        true
    }

    pub fn query(&self) -> Query {
        Query::new().param_opt("status", self.status.as_deref())
    }

    pub fn on_loaded(&mut self, cows: Vec<Cow>) {
        self.cows.replace(cows);
    }

    pub fn cows(&self) -> &[Cow] {
        self.cows.items()
    }

    pub fn is_loaded(&self) -> bool {
        self.cows.is_loaded()
    }
}
