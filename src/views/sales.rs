//! Sales page state: buyers, sales and payments.

use crate::api::types::{Buyer, Payment, Sale};
use crate::api::Query;

use super::{Collection, Reconcile, ViewScope};

/// The three collections the sales page reads together.
#[derive(Debug, Clone, Default)]
pub struct SalesData {
    pub buyers: Vec<Buyer>,
    pub sales: Vec<Sale>,
    pub payments: Vec<Payment>,
}

/// Which kind of record a sales-page form created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalesRecord {
    Sale,
    Buyer,
    Payment,
}

impl SalesRecord {
    /// Toast shown after the server confirms the create.
    pub fn success_message(&self) -> &'static str {
        match self {
            SalesRecord::Sale => "Sale recorded",
            SalesRecord::Buyer => "Buyer added",
            SalesRecord::Payment => "Payment recorded",
        }
    }
}

/// Sales page state.
///
/// Every create reloads all three collections: totals, balances and payment
/// status are computed by the server.
#[derive(Debug)]
pub struct SalesView {
    scope: ViewScope,
    payment_status: Option<String>,
    buyers: Collection<Buyer>,
    sales: Collection<Sale>,
    payments: Collection<Payment>,
}

impl SalesView {
    pub const CREATE: Reconcile = Reconcile::Reload;

    pub fn new(scope: ViewScope) -> Self {
        Self {
            scope,
            payment_status: None,
            buyers: Collection::default(),
            sales: Collection::default(),
            payments: Collection::default(),
        }
    }

    pub fn scope(&self) -> ViewScope {
        self.scope
    }

    /// Filter sales by `unpaid`, `partial` or `paid`. Returns whether a
    /// reload is due.
    pub fn set_payment_status_filter(&mut self, status: Option<String>) -> bool {
        let status = status.filter(|s| !s.is_empty());
        if self.payment_status == status {
            return false;
        }
        self.payment_status = status;
        true
    }

    pub fn sales_query(&self) -> Query {
        Query::new().param_opt("payment_status", self.payment_status.as_deref())
    }

    pub fn on_loaded(&mut self, data: SalesData) {
        self.buyers.replace(data.buyers);
        self.sales.replace(data.sales);
        self.payments.replace(data.payments);
    }

    pub fn buyers(&self) -> &[Buyer] {
        self.buyers.items()
    }

    pub fn sales(&self) -> &[Sale] {
        self.sales.items()
    }

    pub fn payments(&self) -> &[Payment] {
        self.payments.items()
    }

    /// Revenue across the loaded sales, as computed by the server per sale.
    pub fn total_revenue(&self) -> f64 {
        self.sales.items().iter().map(|s| s.total_amount).sum()
    }

    /// Outstanding balance across the loaded buyers.
    pub fn total_outstanding(&self) -> f64 {
        self.buyers.items().iter().map(|b| b.current_balance).sum()
    }

    pub fn is_loaded(&self) -> bool {
        self.sales.is_loaded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_use_server_values() {
        let mut view = SalesView::new(ViewScope::next());
        view.on_loaded(SalesData {
            buyers: vec![Buyer {
                id: 1,
                current_balance: 1200.0,
                ..Buyer::default()
            }],
            sales: vec![
                Sale {
                    id: 1,
                    total_amount: 550.0,
                    ..Sale::default()
                },
                Sale {
                    id: 2,
                    total_amount: 450.0,
                    ..Sale::default()
                },
            ],
            payments: vec![],
        });

        assert_eq!(view.total_revenue(), 1000.0);
        assert_eq!(view.total_outstanding(), 1200.0);
        assert!(view.is_loaded());
    }

    #[test]
    fn test_payment_status_filter() {
        let mut view = SalesView::new(ViewScope::next());
        assert!(view.set_payment_status_filter(Some("unpaid".to_string())));
        assert_eq!(view.sales_query().to_suffix(), "?payment_status=unpaid");
        assert!(!view.set_payment_status_filter(Some("unpaid".to_string())));
    }

    #[test]
    fn test_success_messages() {
        assert_eq!(SalesRecord::Buyer.success_message(), "Buyer added");
    }
}
