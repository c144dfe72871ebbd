//! Catalog summary statistics.

use serde::{Deserialize, Serialize};

use crate::types::Product;

/// Summary of the catalog's stock position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryStats {
    pub total_products: usize,
    /// Products with `0 < quantity <= threshold`.
    pub low_stock_count: usize,
    pub out_of_stock_count: usize,
    /// Highest positive quantity, lowest id on ties. `None` when nothing
    /// is in stock.
    pub most_stocked: Option<Product>,
}

impl InventoryStats {
    /// Computes statistics over a catalog snapshot.
    pub fn compute(products: &[Product], threshold: i64) -> Self {
        let low_stock_count = products
            .iter()
            .filter(|p| p.quantity > 0 && p.is_low_stock(threshold))
            .count();
        let out_of_stock_count = products.iter().filter(|p| p.is_out_of_stock()).count();

        let most_stocked = products
            .iter()
            .filter(|p| p.quantity > 0)
            .min_by(|a, b| b.quantity.cmp(&a.quantity).then(a.id.cmp(&b.id)))
            .cloned();

        InventoryStats {
            total_products: products.len(),
            low_stock_count,
            out_of_stock_count,
            most_stocked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    fn product(id: i64, quantity: i64) -> Product {
        Product::new(id, format!("P{}", id), quantity, Money::from_cents(100), "")
    }

    #[test]
    fn test_compute_counts() {
        let products = vec![
            product(1, 0),
            product(2, 3),
            product(3, 5),
            product(4, 6),
            product(5, 40),
        ];
        let stats = InventoryStats::compute(&products, 5);

        assert_eq!(stats.total_products, 5);
        assert_eq!(stats.low_stock_count, 2);
        assert_eq!(stats.out_of_stock_count, 1);
        assert_eq!(stats.most_stocked.map(|p| p.id), Some(5));
    }

    #[test]
    fn test_most_stocked_tie_breaks_on_lowest_id() {
        let products = vec![product(9, 20), product(4, 20), product(7, 1)];
        let stats = InventoryStats::compute(&products, 5);
        assert_eq!(stats.most_stocked.map(|p| p.id), Some(4));
    }

    #[test]
    fn test_empty_or_sold_out_catalog() {
        assert_eq!(InventoryStats::compute(&[], 5).most_stocked, None);

        let stats = InventoryStats::compute(&[product(1, 0)], 5);
        assert_eq!(stats.out_of_stock_count, 1);
        assert_eq!(stats.low_stock_count, 0);
        assert_eq!(stats.most_stocked, None);
    }
}
