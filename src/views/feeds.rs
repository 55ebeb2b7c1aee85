//! Feed inventory page state.

use crate::api::types::{FeedItem, FeedPurchase};

use super::{Collection, Reconcile, ViewScope};

/// Which kind of record a feeds-page form created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedRecord {
    Item,
    Purchase,
}

impl FeedRecord {
    pub fn success_message(&self) -> &'static str {
        match self {
            FeedRecord::Item => "Feed item added",
            FeedRecord::Purchase => "Purchase recorded",
        }
    }
}

/// Feed items with their stock levels, and recent purchases.
///
/// Creates reload: stock levels and costs are derived on the server.
#[derive(Debug)]
pub struct FeedsView {
    scope: ViewScope,
    items: Collection<FeedItem>,
    purchases: Collection<FeedPurchase>,
}

impl FeedsView {
    pub const CREATE: Reconcile = Reconcile::Reload;

    pub fn new(scope: ViewScope) -> Self {
        Self {
            scope,
            items: Collection::default(),
            purchases: Collection::default(),
        }
    }

    pub fn scope(&self) -> ViewScope {
        self.scope
    }

    pub fn on_loaded(&mut self, items: Vec<FeedItem>, purchases: Vec<FeedPurchase>) {
        self.items.replace(items);
        self.purchases.replace(purchases);
    }

    pub fn items(&self) -> &[FeedItem] {
        self.items.items()
    }

    pub fn purchases(&self) -> &[FeedPurchase] {
        self.purchases.items()
    }

    /// Items the server flagged as below minimum stock.
    pub fn low_stock(&self) -> impl Iterator<Item = &FeedItem> {
        self.items.items().iter().filter(|i| i.is_low())
    }

    pub fn is_loaded(&self) -> bool {
        self.items.is_loaded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::StockLevel;

    #[test]
    fn test_low_stock_uses_server_flag() {
        let mut view = FeedsView::new(ViewScope::next());
        view.on_loaded(
            vec![
                FeedItem {
                    id: 1,
                    name: "Dairy meal".to_string(),
                    current_stock: Some(StockLevel {
                        quantity: 2.0,
                        is_low: true,
                        ..StockLevel::default()
                    }),
                    ..FeedItem::default()
                },
                FeedItem {
                    id: 2,
                    name: "Hay".to_string(),
                    current_stock: None,
                    ..FeedItem::default()
                },
            ],
            vec![],
        );

        let low: Vec<_> = view.low_stock().map(|i| i.name.as_str()).collect();
        assert_eq!(low, vec!["Dairy meal"]);
    }
}
