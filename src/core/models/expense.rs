use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::common::{ListParams, Order};
use super::filter::{FinanceColumns, FinanceFilter};

pub const COLUMNS: FinanceColumns = FinanceColumns {
    date: "e.date",
    amount: "e.amount",
    category: Some("e.category"),
    payment_method: Some("e.payment_method"),
    member: None,
    group: None,
    tag_item: None,
    occasion: None,
    session: None,
    branch: "e.branch_id",
    is_deleted: "e.is_deleted",
    created_at: "e.created_at",
    search: &["e.description", "e.vendor", "e.category", "e.receipt_number"],
};

pub fn default_order() -> Vec<Order> {
    vec![Order::desc(COLUMNS.date), Order::desc(COLUMNS.created_at)]
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Expense {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub branch_name: Option<String>,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category: String,
    pub payment_method: Option<String>,
    pub description: Option<String>,
    pub vendor: Option<String>,
    pub receipt_number: Option<String>,
    #[serde(skip)]
    pub is_deleted: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseSortField {
    Date,
    Amount,
    Category,
    PaymentMethod,
    Vendor,
    CreatedAt,
}

impl ExpenseSortField {
    pub fn column(&self) -> &'static str {
        match self {
            ExpenseSortField::Date => COLUMNS.date,
            ExpenseSortField::Amount => COLUMNS.amount,
            ExpenseSortField::Category => "e.category",
            ExpenseSortField::PaymentMethod => "e.payment_method",
            ExpenseSortField::Vendor => "e.vendor",
            ExpenseSortField::CreatedAt => COLUMNS.created_at,
        }
    }
}

pub type ExpenseListParams = ListParams<FinanceFilter, ExpenseSortField>;

#[derive(Debug, Clone, Deserialize)]
pub struct ExpenseCreate {
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category: String,
    pub payment_method: Option<String>,
    pub description: Option<String>,
    pub vendor: Option<String>,
    pub receipt_number: Option<String>,
    pub branch_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub organization_id: Uuid,
    pub created_by: Uuid,
    pub data: ExpenseCreate,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExpenseUpdate {
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub category: Option<String>,
    pub payment_method: Option<String>,
    pub description: Option<String>,
    pub vendor: Option<String>,
    pub receipt_number: Option<String>,
    pub branch_id: Option<Uuid>,
}

impl ExpenseUpdate {
    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.date.is_none()
            && self.category.is_none()
            && self.payment_method.is_none()
            && self.description.is_none()
            && self.vendor.is_none()
            && self.receipt_number.is_none()
            && self.branch_id.is_none()
    }
}
