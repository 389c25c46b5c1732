use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::common::{ListParams, Order};
use super::contributor::{ContributorRow, SourceType};
use super::filter::{FinanceColumns, FinanceFilter};
use crate::core::reshape::resolve_contributor;

pub const COLUMNS: FinanceColumns = FinanceColumns {
    date: "i.date",
    amount: "i.amount",
    category: Some("i.category"),
    payment_method: Some("i.payment_method"),
    member: Some("i.member_id"),
    group: Some("i.group_id"),
    tag_item: Some("i.tag_item_id"),
    occasion: Some("i.occasion_id"),
    session: Some("i.session_id"),
    branch: "i.branch_id",
    is_deleted: "i.is_deleted",
    created_at: "i.created_at",
    search: &["i.description", "i.source", "i.receipt_number", "i.category", "m.first_name", "m.last_name", "g.name", "t.name"],
};

pub fn default_order() -> Vec<Order> {
    vec![Order::desc(COLUMNS.date), Order::desc(COLUMNS.created_at)]
}

#[derive(Debug, Clone, FromRow)]
pub struct IncomeRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub branch_name: Option<String>,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category: String,
    pub payment_method: Option<String>,
    pub description: Option<String>,
    pub receipt_number: Option<String>,
    pub member_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub tag_item_id: Option<Uuid>,
    pub occasion_id: Option<Uuid>,
    pub session_id: Option<Uuid>,
    pub is_deleted: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub contributor: ContributorRow,
}

#[derive(Debug, Clone, Serialize)]
pub struct Income {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub branch_name: Option<String>,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category: String,
    pub payment_method: Option<String>,
    pub description: Option<String>,
    pub receipt_number: Option<String>,
    pub source_type: SourceType,
    pub source: Option<String>,
    pub member_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub tag_item_id: Option<Uuid>,
    pub occasion_id: Option<Uuid>,
    pub session_id: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub contributor_name: String,
    pub contributor_avatar: Option<String>,
    pub contributor_tag_color: Option<String>,
}

impl From<IncomeRow> for Income {
    fn from(row: IncomeRow) -> Self {
        let contributor = resolve_contributor(&row.contributor);
        Self {
            id: row.id,
            organization_id: row.organization_id,
            branch_id: row.branch_id,
            branch_name: row.branch_name,
            amount: row.amount,
            date: row.date,
            category: row.category,
            payment_method: row.payment_method,
            description: row.description,
            receipt_number: row.receipt_number,
            source_type: SourceType::parse(row.contributor.source_type.as_deref()),
            source: row.contributor.source,
            member_id: row.member_id,
            group_id: row.group_id,
            tag_item_id: row.tag_item_id,
            occasion_id: row.occasion_id,
            session_id: row.session_id,
            created_by: row.created_by,
            created_at: row.created_at,
            contributor_name: contributor.name,
            contributor_avatar: contributor.avatar,
            contributor_tag_color: contributor.tag_color,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeSortField {
    Date,
    Amount,
    Category,
    PaymentMethod,
    CreatedAt,
    ContributorName,
}

impl IncomeSortField {
    pub fn column(&self) -> Option<&'static str> {
        match self {
            IncomeSortField::Date => Some(COLUMNS.date),
            IncomeSortField::Amount => Some(COLUMNS.amount),
            IncomeSortField::Category => Some("i.category"),
            IncomeSortField::PaymentMethod => Some("i.payment_method"),
            IncomeSortField::CreatedAt => Some(COLUMNS.created_at),
            IncomeSortField::ContributorName => None,
        }
    }
}

pub type IncomeListParams = ListParams<FinanceFilter, IncomeSortField>;

#[derive(Debug, Clone, Deserialize)]
pub struct IncomeCreate {
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category: String,
    pub payment_method: Option<String>,
    pub description: Option<String>,
    pub receipt_number: Option<String>,
    pub source_type: Option<String>,
    pub source: Option<String>,
    pub member_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub tag_item_id: Option<Uuid>,
    pub occasion_id: Option<Uuid>,
    pub session_id: Option<Uuid>,
    pub branch_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub organization_id: Uuid,
    pub created_by: Uuid,
    pub data: IncomeCreate,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IncomeUpdate {
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub category: Option<String>,
    pub payment_method: Option<String>,
    pub description: Option<String>,
    pub receipt_number: Option<String>,
    pub source_type: Option<String>,
    pub source: Option<String>,
    pub member_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub tag_item_id: Option<Uuid>,
    pub branch_id: Option<Uuid>,
}

impl IncomeUpdate {
    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.date.is_none()
            && self.category.is_none()
            && self.payment_method.is_none()
            && self.description.is_none()
            && self.receipt_number.is_none()
            && self.source_type.is_none()
            && self.source.is_none()
            && self.member_id.is_none()
            && self.group_id.is_none()
            && self.tag_item_id.is_none()
            && self.branch_id.is_none()
    }
}
