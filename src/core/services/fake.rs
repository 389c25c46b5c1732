//! In-memory repository used by the service tests. It records every list query it
//! receives and answers with whatever rows the test seeded, without evaluating predicates.
//! Writes made through a transaction land in shared cells so they can be inspected after
//! the store was consumed by `commit`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::context::{AuthContext, Role};
use crate::core::models::{
    attendance::{AttendanceRecordRow, AttendanceSession, Occasion, PresenceCount, Upsert as AttendanceUpsert},
    branch::{Branch, Query as BranchQuery},
    common::{ListQuery, Pagination, UpdateScope},
    contributor::ContributorRow,
    expense::{Expense, ExpenseUpdate, Insert as ExpenseInsert},
    group::{GroupMemberRow, GroupRow, GroupType, GroupUpdate, Insert as GroupInsert},
    income::{IncomeRow, IncomeUpdate, Insert as IncomeInsert},
    pledge::{Insert as PledgeInsert, PaymentInsert, PledgePayment, PledgeRow, PledgeUpdate},
    summary::CategoryTotal,
};
use crate::core::ports::repository::{AttendanceCommon, BranchCommon, Common, ExpenseCommon, GroupCommon, IncomeCommon, PledgeCommon, Store, TxStore};
use crate::error::Error;

#[derive(Default)]
pub(crate) struct FakeStore {
    pub assigned: Vec<Uuid>,
    pub assigned_lookups: usize,
    pub branches: Vec<Branch>,
    pub branch_queries: Vec<BranchQuery>,
    pub assignments: Vec<(Uuid, Uuid)>,
    pub incomes: Vec<IncomeRow>,
    pub income_inserts: Vec<IncomeInsert>,
    pub income_updates: Vec<(UpdateScope, Uuid, IncomeUpdate)>,
    pub expenses: Vec<Expense>,
    pub expense_inserts: Vec<ExpenseInsert>,
    pub expense_updates: Vec<(UpdateScope, Uuid, ExpenseUpdate)>,
    pub pledges: Vec<PledgeRow>,
    pub pledge_inserts: Vec<PledgeInsert>,
    pub pledge_updates: Vec<(UpdateScope, Uuid, PledgeUpdate)>,
    pub payments: Vec<PledgePayment>,
    pub payment_inserts: Rc<RefCell<Vec<PaymentInsert>>>,
    pub occasions: Vec<Occasion>,
    pub sessions: Vec<AttendanceSession>,
    pub records: Vec<AttendanceRecordRow>,
    pub upserts: Rc<RefCell<Vec<AttendanceUpsert>>>,
    pub presence: Vec<PresenceCount>,
    pub groups: Vec<GroupRow>,
    pub group_inserts: Vec<GroupInsert>,
    pub group_updates: Vec<(UpdateScope, Uuid, GroupUpdate)>,
    pub group_members: Vec<GroupMemberRow>,
    pub totals: Vec<CategoryTotal>,
    /// Overrides the count answered for list queries.
    pub total: Option<i64>,
    pub queries: Vec<ListQuery>,
    pub committed: Rc<Cell<bool>>,
    pub rolled_back: Rc<Cell<bool>>,
}

pub(crate) fn ctx(role: Role) -> AuthContext {
    AuthContext::new(Uuid::new_v4(), Uuid::new_v4(), role)
}

pub(crate) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn created_at() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
}

pub(crate) fn income_row(ctx: &AuthContext, branch_id: Option<Uuid>, contributor: ContributorRow) -> IncomeRow {
    IncomeRow {
        id: Uuid::new_v4(),
        organization_id: ctx.organization_id,
        branch_id,
        branch_name: None,
        amount: Decimal::from(100),
        date: today(),
        category: "tithe".into(),
        payment_method: Some("cash".into()),
        description: None,
        receipt_number: None,
        member_id: None,
        group_id: None,
        tag_item_id: None,
        occasion_id: None,
        session_id: None,
        is_deleted: false,
        created_by: ctx.user_id,
        created_at: created_at(),
        contributor,
    }
}

pub(crate) fn expense(ctx: &AuthContext, branch_id: Option<Uuid>) -> Expense {
    Expense {
        id: Uuid::new_v4(),
        organization_id: ctx.organization_id,
        branch_id,
        branch_name: None,
        amount: Decimal::from(40),
        date: today(),
        category: "utilities".into(),
        payment_method: None,
        description: None,
        vendor: Some("Power Co".into()),
        receipt_number: None,
        is_deleted: false,
        created_by: ctx.user_id,
        created_at: created_at(),
    }
}

pub(crate) fn pledge_row(ctx: &AuthContext, branch_id: Option<Uuid>, pledged: i64, paid: i64) -> PledgeRow {
    PledgeRow {
        id: Uuid::new_v4(),
        organization_id: ctx.organization_id,
        branch_id,
        branch_name: None,
        pledge_amount: Decimal::from(pledged),
        pledge_date: today(),
        due_date: None,
        purpose: "building fund".into(),
        description: None,
        member_id: None,
        group_id: None,
        tag_item_id: None,
        is_deleted: false,
        created_by: ctx.user_id,
        created_at: created_at(),
        amount_paid: Decimal::from(paid),
        payment_count: if paid > 0 { 1 } else { 0 },
        contributor: ContributorRow::default(),
    }
}

pub(crate) fn session(ctx: &AuthContext, branch_id: Option<Uuid>, is_open: bool) -> AttendanceSession {
    AttendanceSession {
        id: Uuid::new_v4(),
        occasion_id: Uuid::new_v4(),
        organization_id: ctx.organization_id,
        branch_id,
        name: "Sunday first service".into(),
        start_time: created_at(),
        end_time: None,
        is_open,
        created_at: created_at(),
    }
}

pub(crate) fn group_row(ctx: &AuthContext, type_: GroupType, is_closed: bool) -> GroupRow {
    GroupRow {
        id: Uuid::new_v4(),
        organization_id: ctx.organization_id,
        branch_id: None,
        name: "Easter choir".into(),
        description: None,
        type_: type_.as_str().into(),
        is_closed,
        start_date: None,
        end_date: None,
        created_by: ctx.user_id,
        created_at: created_at(),
        member_count: 0,
    }
}

fn page<T: Clone>(rows: &[T], pagination: Option<Pagination>) -> Vec<T> {
    match pagination {
        Some(p) => rows.iter().skip(p.offset() as usize).take(p.limit() as usize).cloned().collect(),
        None => rows.to_vec(),
    }
}

fn in_scope(scope: &UpdateScope, organization_id: Uuid, created_by: Uuid) -> bool {
    scope.organization_id == organization_id && scope.created_by.map_or(true, |u| u == created_by)
}

impl BranchCommon for FakeStore {
    async fn query(&mut self, query: &BranchQuery) -> Result<Vec<Branch>, Error> {
        self.branch_queries.push(query.clone());
        Ok(self.branches.clone())
    }

    async fn get(&mut self, organization_id: Uuid, id: Uuid) -> Result<Option<Branch>, Error> {
        Ok(self.branches.iter().find(|b| b.id == id && b.organization_id == organization_id).cloned())
    }

    async fn assigned_ids(&mut self, _organization_id: Uuid, _user_id: Uuid) -> Result<Vec<Uuid>, Error> {
        self.assigned_lookups += 1;
        Ok(self.assigned.clone())
    }

    async fn assign_user(&mut self, branch_id: Uuid, user_id: Uuid) -> Result<(), Error> {
        self.assignments.push((branch_id, user_id));
        Ok(())
    }
}

impl IncomeCommon for FakeStore {
    async fn insert(&mut self, data: IncomeInsert) -> Result<Uuid, Error> {
        self.income_inserts.push(data);
        Ok(Uuid::new_v4())
    }

    async fn query(&mut self, query: &ListQuery, pagination: Option<Pagination>) -> Result<Vec<IncomeRow>, Error> {
        self.queries.push(query.clone());
        Ok(page(&self.incomes, pagination))
    }

    async fn count(&mut self, query: &ListQuery) -> Result<i64, Error> {
        self.queries.push(query.clone());
        Ok(self.total.unwrap_or(self.incomes.len() as i64))
    }

    async fn category_totals(&mut self, query: &ListQuery) -> Result<Vec<CategoryTotal>, Error> {
        self.queries.push(query.clone());
        Ok(self.totals.clone())
    }

    async fn get(&mut self, organization_id: Uuid, id: Uuid) -> Result<Option<IncomeRow>, Error> {
        Ok(self.incomes.iter().find(|r| r.id == id && r.organization_id == organization_id).cloned())
    }

    async fn update(&mut self, scope: &UpdateScope, id: Uuid, data: IncomeUpdate) -> Result<u64, Error> {
        let hit = self.incomes.iter().any(|r| r.id == id && !r.is_deleted && in_scope(scope, r.organization_id, r.created_by));
        self.income_updates.push((*scope, id, data));
        Ok(hit as u64)
    }

    async fn soft_delete(&mut self, scope: &UpdateScope, id: Uuid) -> Result<u64, Error> {
        let mut affected = 0;
        for r in self.incomes.iter_mut().filter(|r| r.id == id && !r.is_deleted && in_scope(scope, r.organization_id, r.created_by)) {
            r.is_deleted = true;
            affected += 1;
        }
        Ok(affected)
    }
}

impl ExpenseCommon for FakeStore {
    async fn insert(&mut self, data: ExpenseInsert) -> Result<Uuid, Error> {
        self.expense_inserts.push(data);
        Ok(Uuid::new_v4())
    }

    async fn query(&mut self, query: &ListQuery, pagination: Option<Pagination>) -> Result<Vec<Expense>, Error> {
        self.queries.push(query.clone());
        Ok(page(&self.expenses, pagination))
    }

    async fn count(&mut self, query: &ListQuery) -> Result<i64, Error> {
        self.queries.push(query.clone());
        Ok(self.total.unwrap_or(self.expenses.len() as i64))
    }

    async fn category_totals(&mut self, query: &ListQuery) -> Result<Vec<CategoryTotal>, Error> {
        self.queries.push(query.clone());
        Ok(self.totals.clone())
    }

    async fn get(&mut self, organization_id: Uuid, id: Uuid) -> Result<Option<Expense>, Error> {
        Ok(self.expenses.iter().find(|r| r.id == id && r.organization_id == organization_id).cloned())
    }

    async fn update(&mut self, scope: &UpdateScope, id: Uuid, data: ExpenseUpdate) -> Result<u64, Error> {
        let hit = self.expenses.iter().any(|r| r.id == id && !r.is_deleted && in_scope(scope, r.organization_id, r.created_by));
        self.expense_updates.push((*scope, id, data));
        Ok(hit as u64)
    }

    async fn soft_delete(&mut self, scope: &UpdateScope, id: Uuid) -> Result<u64, Error> {
        let mut affected = 0;
        for r in self.expenses.iter_mut().filter(|r| r.id == id && !r.is_deleted && in_scope(scope, r.organization_id, r.created_by)) {
            r.is_deleted = true;
            affected += 1;
        }
        Ok(affected)
    }
}

impl PledgeCommon for FakeStore {
    async fn insert(&mut self, data: PledgeInsert) -> Result<Uuid, Error> {
        self.pledge_inserts.push(data);
        Ok(Uuid::new_v4())
    }

    async fn query(&mut self, query: &ListQuery, pagination: Option<Pagination>) -> Result<Vec<PledgeRow>, Error> {
        self.queries.push(query.clone());
        Ok(page(&self.pledges, pagination))
    }

    async fn count(&mut self, query: &ListQuery) -> Result<i64, Error> {
        self.queries.push(query.clone());
        Ok(self.total.unwrap_or(self.pledges.len() as i64))
    }

    async fn get(&mut self, organization_id: Uuid, id: Uuid) -> Result<Option<PledgeRow>, Error> {
        Ok(self.pledges.iter().find(|r| r.id == id && r.organization_id == organization_id).cloned())
    }

    async fn update(&mut self, scope: &UpdateScope, id: Uuid, data: PledgeUpdate) -> Result<u64, Error> {
        let hit = self.pledges.iter().any(|r| r.id == id && !r.is_deleted && in_scope(scope, r.organization_id, r.created_by));
        self.pledge_updates.push((*scope, id, data));
        Ok(hit as u64)
    }

    async fn soft_delete(&mut self, scope: &UpdateScope, id: Uuid) -> Result<u64, Error> {
        let mut affected = 0;
        for r in self.pledges.iter_mut().filter(|r| r.id == id && !r.is_deleted && in_scope(scope, r.organization_id, r.created_by)) {
            r.is_deleted = true;
            affected += 1;
        }
        Ok(affected)
    }

    async fn insert_payment(&mut self, data: PaymentInsert) -> Result<Uuid, Error> {
        self.payment_inserts.borrow_mut().push(data);
        Ok(Uuid::new_v4())
    }

    async fn payments(&mut self, organization_id: Uuid, pledge_id: Uuid) -> Result<Vec<PledgePayment>, Error> {
        Ok(self.payments.iter().filter(|p| p.pledge_id == pledge_id && p.organization_id == organization_id && !p.is_deleted).cloned().collect())
    }

    async fn get_payment(&mut self, organization_id: Uuid, id: Uuid) -> Result<Option<PledgePayment>, Error> {
        Ok(self.payments.iter().find(|p| p.id == id && p.organization_id == organization_id).cloned())
    }

    async fn soft_delete_payment(&mut self, scope: &UpdateScope, id: Uuid) -> Result<u64, Error> {
        let mut affected = 0;
        for p in self.payments.iter_mut().filter(|p| p.id == id && !p.is_deleted && in_scope(scope, p.organization_id, p.created_by)) {
            p.is_deleted = true;
            affected += 1;
        }
        Ok(affected)
    }
}

impl AttendanceCommon for FakeStore {
    async fn occasions(&mut self, query: &ListQuery) -> Result<Vec<Occasion>, Error> {
        self.queries.push(query.clone());
        Ok(self.occasions.clone())
    }

    async fn sessions(&mut self, organization_id: Uuid, occasion_id: Uuid) -> Result<Vec<AttendanceSession>, Error> {
        Ok(self.sessions.iter().filter(|s| s.organization_id == organization_id && s.occasion_id == occasion_id).cloned().collect())
    }

    async fn get_session(&mut self, organization_id: Uuid, id: Uuid) -> Result<Option<AttendanceSession>, Error> {
        Ok(self.sessions.iter().find(|s| s.id == id && s.organization_id == organization_id).cloned())
    }

    async fn query(&mut self, query: &ListQuery, pagination: Option<Pagination>) -> Result<Vec<AttendanceRecordRow>, Error> {
        self.queries.push(query.clone());
        Ok(page(&self.records, pagination))
    }

    async fn count(&mut self, query: &ListQuery) -> Result<i64, Error> {
        self.queries.push(query.clone());
        Ok(self.total.unwrap_or(self.records.len() as i64))
    }

    async fn upsert(&mut self, record: AttendanceUpsert) -> Result<(), Error> {
        self.upserts.borrow_mut().push(record);
        Ok(())
    }

    async fn presence_counts(&mut self, _organization_id: Uuid, _session_id: Uuid) -> Result<Vec<PresenceCount>, Error> {
        Ok(self.presence.clone())
    }
}

impl GroupCommon for FakeStore {
    async fn insert(&mut self, data: GroupInsert) -> Result<Uuid, Error> {
        self.group_inserts.push(data);
        Ok(Uuid::new_v4())
    }

    async fn query(&mut self, query: &ListQuery, pagination: Option<Pagination>) -> Result<Vec<GroupRow>, Error> {
        self.queries.push(query.clone());
        Ok(page(&self.groups, pagination))
    }

    async fn count(&mut self, query: &ListQuery) -> Result<i64, Error> {
        self.queries.push(query.clone());
        Ok(self.total.unwrap_or(self.groups.len() as i64))
    }

    async fn get(&mut self, organization_id: Uuid, id: Uuid) -> Result<Option<GroupRow>, Error> {
        Ok(self.groups.iter().find(|g| g.id == id && g.organization_id == organization_id).cloned())
    }

    async fn update(&mut self, scope: &UpdateScope, id: Uuid, data: GroupUpdate) -> Result<u64, Error> {
        let hit = self.groups.iter().any(|g| g.id == id && in_scope(scope, g.organization_id, g.created_by));
        self.group_updates.push((*scope, id, data));
        Ok(hit as u64)
    }

    async fn close(&mut self, organization_id: Uuid, id: Uuid) -> Result<u64, Error> {
        let mut affected = 0;
        for g in self.groups.iter_mut().filter(|g| g.id == id && g.organization_id == organization_id && !g.is_closed) {
            g.is_closed = true;
            affected += 1;
        }
        Ok(affected)
    }

    async fn members(&mut self, group_id: Uuid) -> Result<Vec<GroupMemberRow>, Error> {
        Ok(self.group_members.iter().filter(|m| m.group_id == group_id).cloned().collect())
    }

    async fn assign_member(&mut self, group_id: Uuid, member_id: Uuid, position: Option<String>) -> Result<(), Error> {
        self.group_members.retain(|m| !(m.group_id == group_id && m.member_id == member_id));
        self.group_members.push(GroupMemberRow {
            group_id,
            member_id,
            position,
            assigned_at: created_at(),
            member_first_name: None,
            member_last_name: None,
            member_avatar_url: None,
        });
        Ok(())
    }

    async fn remove_member(&mut self, group_id: Uuid, member_id: Uuid) -> Result<u64, Error> {
        let before = self.group_members.len();
        self.group_members.retain(|m| !(m.group_id == group_id && m.member_id == member_id));
        Ok((before - self.group_members.len()) as u64)
    }
}

impl Common for FakeStore {}
impl Store for FakeStore {}

impl TxStore for FakeStore {
    async fn commit(self) -> Result<(), Error> {
        self.committed.set(true);
        Ok(())
    }

    async fn rollback(self) -> Result<(), Error> {
        self.rolled_back.set(true);
        Ok(())
    }
}
