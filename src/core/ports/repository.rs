use crate::core::models::{
    attendance::{AttendanceRecordRow, AttendanceSession, Occasion, PresenceCount, Upsert as AttendanceUpsert},
    branch::{Branch, Query as BranchQuery},
    common::{ListQuery, Pagination, UpdateScope},
    expense::{Expense, ExpenseUpdate, Insert as ExpenseInsert},
    group::{GroupMemberRow, GroupRow, GroupUpdate, Insert as GroupInsert},
    income::{IncomeRow, IncomeUpdate, Insert as IncomeInsert},
    pledge::{Insert as PledgeInsert, PaymentInsert, PledgePayment, PledgeRow, PledgeUpdate},
    summary::CategoryTotal,
};
use crate::error::Error;
use uuid::Uuid;

pub trait BranchCommon {
    async fn query(&mut self, query: &BranchQuery) -> Result<Vec<Branch>, Error>;
    async fn get(&mut self, organization_id: Uuid, id: Uuid) -> Result<Option<Branch>, Error>;
    /// Active branches the user is assigned to.
    async fn assigned_ids(&mut self, organization_id: Uuid, user_id: Uuid) -> Result<Vec<Uuid>, Error>;
    async fn assign_user(&mut self, branch_id: Uuid, user_id: Uuid) -> Result<(), Error>;
}

pub trait IncomeCommon {
    async fn insert(&mut self, data: IncomeInsert) -> Result<Uuid, Error>;
    async fn query(&mut self, query: &ListQuery, pagination: Option<Pagination>) -> Result<Vec<IncomeRow>, Error>;
    async fn count(&mut self, query: &ListQuery) -> Result<i64, Error>;
    async fn category_totals(&mut self, query: &ListQuery) -> Result<Vec<CategoryTotal>, Error>;
    async fn get(&mut self, organization_id: Uuid, id: Uuid) -> Result<Option<IncomeRow>, Error>;
    async fn update(&mut self, scope: &UpdateScope, id: Uuid, data: IncomeUpdate) -> Result<u64, Error>;
    async fn soft_delete(&mut self, scope: &UpdateScope, id: Uuid) -> Result<u64, Error>;
}

pub trait ExpenseCommon {
    async fn insert(&mut self, data: ExpenseInsert) -> Result<Uuid, Error>;
    async fn query(&mut self, query: &ListQuery, pagination: Option<Pagination>) -> Result<Vec<Expense>, Error>;
    async fn count(&mut self, query: &ListQuery) -> Result<i64, Error>;
    async fn category_totals(&mut self, query: &ListQuery) -> Result<Vec<CategoryTotal>, Error>;
    async fn get(&mut self, organization_id: Uuid, id: Uuid) -> Result<Option<Expense>, Error>;
    async fn update(&mut self, scope: &UpdateScope, id: Uuid, data: ExpenseUpdate) -> Result<u64, Error>;
    async fn soft_delete(&mut self, scope: &UpdateScope, id: Uuid) -> Result<u64, Error>;
}

pub trait PledgeCommon {
    async fn insert(&mut self, data: PledgeInsert) -> Result<Uuid, Error>;
    async fn query(&mut self, query: &ListQuery, pagination: Option<Pagination>) -> Result<Vec<PledgeRow>, Error>;
    async fn count(&mut self, query: &ListQuery) -> Result<i64, Error>;
    async fn get(&mut self, organization_id: Uuid, id: Uuid) -> Result<Option<PledgeRow>, Error>;
    async fn update(&mut self, scope: &UpdateScope, id: Uuid, data: PledgeUpdate) -> Result<u64, Error>;
    async fn soft_delete(&mut self, scope: &UpdateScope, id: Uuid) -> Result<u64, Error>;
    async fn insert_payment(&mut self, data: PaymentInsert) -> Result<Uuid, Error>;
    async fn payments(&mut self, organization_id: Uuid, pledge_id: Uuid) -> Result<Vec<PledgePayment>, Error>;
    async fn get_payment(&mut self, organization_id: Uuid, id: Uuid) -> Result<Option<PledgePayment>, Error>;
    async fn soft_delete_payment(&mut self, scope: &UpdateScope, id: Uuid) -> Result<u64, Error>;
}

pub trait AttendanceCommon {
    async fn occasions(&mut self, query: &ListQuery) -> Result<Vec<Occasion>, Error>;
    async fn sessions(&mut self, organization_id: Uuid, occasion_id: Uuid) -> Result<Vec<AttendanceSession>, Error>;
    async fn get_session(&mut self, organization_id: Uuid, id: Uuid) -> Result<Option<AttendanceSession>, Error>;
    async fn query(&mut self, query: &ListQuery, pagination: Option<Pagination>) -> Result<Vec<AttendanceRecordRow>, Error>;
    async fn count(&mut self, query: &ListQuery) -> Result<i64, Error>;
    async fn upsert(&mut self, record: AttendanceUpsert) -> Result<(), Error>;
    async fn presence_counts(&mut self, organization_id: Uuid, session_id: Uuid) -> Result<Vec<PresenceCount>, Error>;
}

pub trait GroupCommon {
    async fn insert(&mut self, data: GroupInsert) -> Result<Uuid, Error>;
    async fn query(&mut self, query: &ListQuery, pagination: Option<Pagination>) -> Result<Vec<GroupRow>, Error>;
    async fn count(&mut self, query: &ListQuery) -> Result<i64, Error>;
    async fn get(&mut self, organization_id: Uuid, id: Uuid) -> Result<Option<GroupRow>, Error>;
    async fn update(&mut self, scope: &UpdateScope, id: Uuid, data: GroupUpdate) -> Result<u64, Error>;
    /// Only ever flips `is_closed` to true.
    async fn close(&mut self, organization_id: Uuid, id: Uuid) -> Result<u64, Error>;
    async fn members(&mut self, group_id: Uuid) -> Result<Vec<GroupMemberRow>, Error>;
    async fn assign_member(&mut self, group_id: Uuid, member_id: Uuid, position: Option<String>) -> Result<(), Error>;
    async fn remove_member(&mut self, group_id: Uuid, member_id: Uuid) -> Result<u64, Error>;
}

pub trait Common: BranchCommon + IncomeCommon + ExpenseCommon + PledgeCommon + AttendanceCommon + GroupCommon {}

pub trait Store: Common {}

pub trait TxStore: Store {
    async fn commit(self) -> Result<(), Error>;
    async fn rollback(self) -> Result<(), Error>;
}
