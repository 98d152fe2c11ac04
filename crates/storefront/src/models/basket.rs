//! Basket lines and the per-user summary.

use rust_decimal::Decimal;
use serde::Serialize;

use geekshop_core::{BasketLineId, Price, ProductId};

/// One (user, product, quantity) record joined with product data.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BasketLine {
    pub id: BasketLineId,
    pub product_id: ProductId,
    pub product_name: String,
    pub category_name: String,
    pub price: Price,
    pub quantity: i32,
}

impl BasketLine {
    /// Price times quantity.
    #[must_use]
    pub fn cost(&self) -> Decimal {
        self.price.times(self.quantity)
    }

    /// Line cost formatted with two decimals.
    #[must_use]
    pub fn cost_display(&self) -> String {
        format!("{:.2}", self.cost())
    }
}

/// Totals shown in the page header and under the basket table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BasketSummary {
    pub total_quantity: i64,
    pub total_cost: Decimal,
}

impl BasketSummary {
    /// Sum quantity and cost over `lines`.
    #[must_use]
    pub fn from_lines(lines: &[BasketLine]) -> Self {
        lines.iter().fold(Self::default(), |acc, line| Self {
            total_quantity: acc.total_quantity + i64::from(line.quantity),
            total_cost: acc.total_cost + line.cost(),
        })
    }

    /// Whether the basket holds nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total_quantity == 0
    }

    /// Total cost formatted with two decimals.
    #[must_use]
    pub fn total_cost_display(&self) -> String {
        format!("{:.2}", self.total_cost)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(id: i32, price: &str, quantity: i32) -> BasketLine {
        BasketLine {
            id: BasketLineId::new(id),
            product_id: ProductId::new(id),
            product_name: format!("product {id}"),
            category_name: "games".to_string(),
            price: price.parse().unwrap(),
            quantity,
        }
    }

    #[test]
    fn test_empty_summary() {
        let summary = BasketSummary::from_lines(&[]);
        assert!(summary.is_empty());
        assert_eq!(summary.total_cost_display(), "0.00");
    }

    #[test]
    fn test_summary_totals_quantity_times_price() {
        let lines = [line(1, "10.50", 2), line(2, "3.25", 4)];
        let summary = BasketSummary::from_lines(&lines);

        assert_eq!(summary.total_quantity, 6);
        assert_eq!(summary.total_cost, Decimal::new(3400, 2));
        assert_eq!(summary.total_cost_display(), "34.00");
    }

    #[test]
    fn test_line_cost() {
        let l = line(1, "0.99", 3);
        assert_eq!(l.cost_display(), "2.97");
    }
}
