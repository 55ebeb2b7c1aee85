//! Page-local view state.
//!
//! Every page that lists and mutates a farm collection follows the same
//! contract:
//!
//! - On open, and whenever a filter changes, the page issues its reads in
//!   parallel and replaces its local state with the results.
//! - A write is sent first. Nothing local changes until the server confirms
//!   it. After that the page either patches the affected records in place
//!   (toggles, where the full change is known to the client), or reloads
//!   (creates and state transitions, where the server computes fields the
//!   client cannot predict).
//! - On failure the local state is left exactly as it was.
//!
//! The views in this module only hold state and apply confirmed changes; the
//! [`App`](crate::app::App) decides when to call the API.

mod alerts;
mod cows;
mod feeds;
mod health;
mod sales;
mod tasks;

use std::sync::atomic::{AtomicU64, Ordering};

pub use alerts::{AlertFilter, AlertsView};
pub use cows::CowsView;
pub use feeds::{FeedRecord, FeedsView};
pub use health::{HealthData, HealthRecord, HealthView};
pub use sales::{SalesData, SalesRecord, SalesView};
pub use tasks::{TaskAction, TasksView};

use crate::api::{Record, RecordId};

/// Identity of one open view instance.
///
/// Every time a page is opened it gets a fresh scope. Results tagged with a
/// scope that is no longer open are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewScope(u64);

impl ViewScope {
    /// Allocate a new, never-before-used scope.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ViewScope(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Identity of one page read.
///
/// A page can have several reads in flight after a filter change. Only the
/// most recently issued one may replace the page's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadId(u64);

impl LoadId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        LoadId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// How a confirmed write is folded into local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconcile {
    /// The change is fully known client-side; patch the records in place.
    Patch,
    /// The server computes derived fields; reload from the server.
    Reload,
}

/// A locally held copy of a server collection.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    items: Vec<T>,
    loaded: bool,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loaded: false,
        }
    }
}

impl<T: Record> Collection<T> {
    /// Replace the contents with a fresh read.
    pub fn replace(&mut self, items: Vec<T>) {
        self.items = items;
        self.loaded = true;
    }

    /// Apply `f` to the record with `id`. Returns whether it was found.
    pub fn patch(&mut self, id: RecordId, f: impl FnOnce(&mut T)) -> bool {
        match self.items.iter_mut().find(|item| item.id() == id) {
            Some(item) => {
                f(item);
                true
            }
            None => false,
        }
    }

    /// Apply `f` to every record.
    pub fn patch_all(&mut self, f: impl FnMut(&mut T)) {
        self.items.iter_mut().for_each(f);
    }

    /// Look up a record by id.
    pub fn get(&self, id: RecordId) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether at least one read has completed.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}
