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
    date: "p.pledge_date",
    amount: "p.pledge_amount",
    category: Some("p.purpose"),
    payment_method: None,
    member: Some("p.member_id"),
    group: Some("p.group_id"),
    tag_item: Some("p.tag_item_id"),
    occasion: None,
    session: None,
    branch: "p.branch_id",
    is_deleted: "p.is_deleted",
    created_at: "p.created_at",
    search: &["p.purpose", "p.description", "p.source", "m.first_name", "m.last_name", "g.name", "t.name"],
};

pub fn default_order() -> Vec<Order> {
    vec![Order::desc(COLUMNS.date), Order::desc(COLUMNS.created_at)]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PledgeStatus {
    Pending,
    Partial,
    Fulfilled,
    Overdue,
}

impl PledgeStatus {
    pub fn of(pledged: Decimal, paid: Decimal, due_date: Option<NaiveDate>, today: NaiveDate) -> Self {
        if paid >= pledged {
            PledgeStatus::Fulfilled
        } else if due_date.map_or(false, |d| d < today) {
            PledgeStatus::Overdue
        } else if paid > Decimal::ZERO {
            PledgeStatus::Partial
        } else {
            PledgeStatus::Pending
        }
    }
}

/// Percentage of the pledge paid so far, capped at 100.
pub fn progress(pledged: Decimal, paid: Decimal) -> Decimal {
    if pledged <= Decimal::ZERO {
        return Decimal::ONE_HUNDRED;
    }
    match paid.checked_mul(Decimal::ONE_HUNDRED).and_then(|p| p.checked_div(pledged)) {
        Some(pct) => pct.min(Decimal::ONE_HUNDRED).max(Decimal::ZERO).round_dp(2),
        None => Decimal::ONE_HUNDRED,
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PledgeRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub branch_name: Option<String>,
    pub pledge_amount: Decimal,
    pub pledge_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub purpose: String,
    pub description: Option<String>,
    pub member_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub tag_item_id: Option<Uuid>,
    pub is_deleted: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub amount_paid: Decimal,
    pub payment_count: i64,
    #[sqlx(flatten)]
    pub contributor: ContributorRow,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pledge {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub branch_name: Option<String>,
    pub pledge_amount: Decimal,
    pub pledge_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub purpose: String,
    pub description: Option<String>,
    pub source_type: SourceType,
    pub source: Option<String>,
    pub member_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub tag_item_id: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub amount_paid: Decimal,
    pub balance: Decimal,
    pub progress: Decimal,
    pub payment_count: i64,
    pub status: PledgeStatus,
    pub contributor_name: String,
    pub contributor_avatar: Option<String>,
    pub contributor_tag_color: Option<String>,
}

impl Pledge {
    pub fn from_row(row: PledgeRow, today: NaiveDate) -> Self {
        let contributor = resolve_contributor(&row.contributor);
        let balance = (row.pledge_amount - row.amount_paid).max(Decimal::ZERO);
        Self {
            status: PledgeStatus::of(row.pledge_amount, row.amount_paid, row.due_date, today),
            progress: progress(row.pledge_amount, row.amount_paid),
            balance,
            id: row.id,
            organization_id: row.organization_id,
            branch_id: row.branch_id,
            branch_name: row.branch_name,
            pledge_amount: row.pledge_amount,
            pledge_date: row.pledge_date,
            due_date: row.due_date,
            purpose: row.purpose,
            description: row.description,
            source_type: SourceType::parse(row.contributor.source_type.as_deref()),
            source: row.contributor.source,
            member_id: row.member_id,
            group_id: row.group_id,
            tag_item_id: row.tag_item_id,
            created_by: row.created_by,
            created_at: row.created_at,
            amount_paid: row.amount_paid,
            payment_count: row.payment_count,
            contributor_name: contributor.name,
            contributor_avatar: contributor.avatar,
            contributor_tag_color: contributor.tag_color,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PledgeSortField {
    PledgeDate,
    DueDate,
    Amount,
    Purpose,
    CreatedAt,
    ContributorName,
    Balance,
}

impl PledgeSortField {
    pub fn column(&self) -> Option<&'static str> {
        match self {
            PledgeSortField::PledgeDate => Some(COLUMNS.date),
            PledgeSortField::DueDate => Some("p.due_date"),
            PledgeSortField::Amount => Some(COLUMNS.amount),
            PledgeSortField::Purpose => Some("p.purpose"),
            PledgeSortField::CreatedAt => Some(COLUMNS.created_at),
            PledgeSortField::ContributorName | PledgeSortField::Balance => None,
        }
    }
}

pub type PledgeListParams = ListParams<FinanceFilter, PledgeSortField>;

#[derive(Debug, Clone, Deserialize)]
pub struct PledgeCreate {
    pub pledge_amount: Decimal,
    pub pledge_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub purpose: String,
    pub description: Option<String>,
    pub source_type: Option<String>,
    pub source: Option<String>,
    pub member_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub tag_item_id: Option<Uuid>,
    pub branch_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub organization_id: Uuid,
    pub created_by: Uuid,
    pub data: PledgeCreate,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PledgeUpdate {
    pub pledge_amount: Option<Decimal>,
    pub pledge_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub purpose: Option<String>,
    pub description: Option<String>,
    pub branch_id: Option<Uuid>,
}

impl PledgeUpdate {
    pub fn is_empty(&self) -> bool {
        self.pledge_amount.is_none()
            && self.pledge_date.is_none()
            && self.due_date.is_none()
            && self.purpose.is_none()
            && self.description.is_none()
            && self.branch_id.is_none()
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PledgePayment {
    pub id: Uuid,
    pub pledge_id: Uuid,
    pub organization_id: Uuid,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    #[serde(skip)]
    pub is_deleted: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentCreate {
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PaymentInsert {
    pub pledge_id: Uuid,
    pub organization_id: Uuid,
    pub created_by: Uuid,
    pub data: PaymentCreate,
}

#[cfg(test)]
mod test {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_status() {
        let today = date(2024, 6, 1);
        let hundred = Decimal::from(100);
        assert_eq!(PledgeStatus::of(hundred, Decimal::ZERO, None, today), PledgeStatus::Pending);
        assert_eq!(PledgeStatus::of(hundred, Decimal::from(40), Some(date(2024, 12, 31)), today), PledgeStatus::Partial);
        assert_eq!(PledgeStatus::of(hundred, Decimal::from(40), Some(date(2024, 5, 31)), today), PledgeStatus::Overdue);
        assert_eq!(PledgeStatus::of(hundred, Decimal::from(120), Some(date(2024, 5, 31)), today), PledgeStatus::Fulfilled);
    }

    #[test]
    fn test_progress() {
        assert_eq!(progress(Decimal::from(300), Decimal::from(100)), Decimal::new(3333, 2));
        assert_eq!(progress(Decimal::from(100), Decimal::from(250)), Decimal::ONE_HUNDRED);
        assert_eq!(progress(Decimal::ZERO, Decimal::ZERO), Decimal::ONE_HUNDRED);
    }

    #[test]
    fn test_progress_of_enormous_payment() {
        assert_eq!(progress(Decimal::ONE, Decimal::MAX), Decimal::ONE_HUNDRED);
    }
}
