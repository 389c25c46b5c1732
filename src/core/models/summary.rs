use itertools::Itertools;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinanceSummary {
    pub total_amount: Decimal,
    pub record_count: i64,
    pub by_category: Vec<CategoryTotal>,
}

impl FinanceSummary {
    /// Largest categories first, ties by name.
    pub fn from_totals(totals: Vec<CategoryTotal>) -> Self {
        let total_amount = totals.iter().map(|t| t.total).sum();
        let record_count = totals.iter().map(|t| t.count).sum();
        let by_category = totals.into_iter().sorted_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category))).collect();
        Self {
            total_amount,
            record_count,
            by_category,
        }
    }
}
