pub mod attendance;
pub mod branch;
pub mod expense;
pub mod group;
pub mod income;
pub mod pledge;

#[cfg(test)]
pub(crate) mod fake;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::context::AuthContext;
use crate::core::branch_scope::BranchScope;
use crate::core::models::common::{ListQuery, Order, SortDirection, UpdateScope};
use crate::core::models::filter::{FinanceColumns, FinanceFilter, Predicate};
use crate::core::ports::repository::BranchCommon;
use crate::error::Error;

pub(crate) async fn resolve_scope<D>(db: &mut D, ctx: &AuthContext, selected: &[Uuid]) -> Result<BranchScope, Error>
where
    D: BranchCommon,
{
    if ctx.can_manage_all_data() {
        return Ok(BranchScope::resolve(true, &[], selected));
    }
    let assigned = BranchCommon::assigned_ids(db, ctx.organization_id, ctx.user_id).await?;
    Ok(BranchScope::resolve(false, &assigned, selected))
}

pub(crate) fn update_scope(ctx: &AuthContext) -> UpdateScope {
    UpdateScope {
        organization_id: ctx.organization_id,
        created_by: ctx.owner_filter(),
    }
}

/// Organization, soft-delete and branch clauses followed by the normalized filter.
pub(crate) fn finance_query(ctx: &AuthContext, scope: &BranchScope, filter: FinanceFilter, columns: &FinanceColumns, today: NaiveDate, order: Vec<Order>) -> ListQuery {
    let filter = filter.with_resolved_dates(today);
    let mut predicates = vec![Predicate::eq(columns.is_deleted, false)];
    predicates.extend(scope.predicate(columns.branch));
    predicates.extend(filter.normalize(columns));
    ListQuery::new(ctx.organization_id, predicates, order)
}

pub(crate) fn sort_in_page<T, K, F>(items: &mut [T], direction: SortDirection, key: F)
where
    K: Ord,
    F: Fn(&T) -> K,
{
    items.sort_by(|a, b| {
        let ord = key(a).cmp(&key(b));
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

pub(crate) fn check_positive(amount: Decimal, what: &str) -> Result<(), Error> {
    if amount <= Decimal::ZERO {
        return Err(Error::BusinessError(format!("{} must be greater than zero", what)));
    }
    Ok(())
}

pub(crate) fn check_not_blank(value: &str, what: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::BusinessError(format!("{} is required", what)));
    }
    Ok(())
}

pub(crate) fn check_writable(scope: &BranchScope, branch: Option<Uuid>) -> Result<(), Error> {
    if !scope.permits_write(branch) {
        return Err(Error::Forbidden("branch is outside of your assigned branches".into()));
    }
    Ok(())
}

pub(crate) fn check_affected(affected: u64, what: &str) -> Result<(), Error> {
    if affected == 0 {
        return Err(Error::NotFound(format!("{} not found", what)));
    }
    Ok(())
}
