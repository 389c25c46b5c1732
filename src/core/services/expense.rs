use chrono::NaiveDate;
use uuid::Uuid;

use super::{check_affected, check_not_blank, check_positive, check_writable, finance_query, resolve_scope, update_scope};
use crate::context::AuthContext;
use crate::core::branch_scope::BranchScope;
use crate::core::models::{
    common::{Ordering, Page},
    expense::{default_order, Expense, ExpenseCreate, ExpenseListParams, ExpenseSortField, ExpenseUpdate, Insert, COLUMNS},
    filter::FinanceFilter,
    summary::FinanceSummary,
};
use crate::core::ports::repository::{BranchCommon, ExpenseCommon};
use crate::error::Error;

pub async fn query_expenses<D>(db: &mut D, ctx: &AuthContext, params: ExpenseListParams, today: NaiveDate) -> Result<Page<Expense>, Error>
where
    D: ExpenseCommon + BranchCommon,
{
    let pagination = params.pagination();
    let scope = resolve_scope(db, ctx, &params.filter.branch_ids).await?;
    if scope.is_empty() {
        log::debug!("user {} has no visible branch, skip expense query", ctx.user_id);
        return Ok(Page::empty(pagination));
    }
    let ordering = Ordering::new(params.sort_by, params.sort_direction, |f: ExpenseSortField| Some(f.column()), default_order(), COLUMNS.created_at);
    let query = finance_query(ctx, &scope, params.filter, &COLUMNS, today, ordering.backend);
    let total = ExpenseCommon::count(db, &query).await?;
    let expenses = ExpenseCommon::query(db, &query, Some(pagination)).await?;
    Ok(Page::new(expenses, total, pagination))
}

pub async fn expense_summary<D>(db: &mut D, ctx: &AuthContext, filter: FinanceFilter, today: NaiveDate) -> Result<FinanceSummary, Error>
where
    D: ExpenseCommon + BranchCommon,
{
    let scope = resolve_scope(db, ctx, &filter.branch_ids).await?;
    if scope.is_empty() {
        return Ok(FinanceSummary::from_totals(Vec::new()));
    }
    let query = finance_query(ctx, &scope, filter, &COLUMNS, today, Vec::new());
    let totals = ExpenseCommon::category_totals(db, &query).await?;
    Ok(FinanceSummary::from_totals(totals))
}

async fn visible<D>(db: &mut D, ctx: &AuthContext, id: Uuid) -> Result<(Expense, BranchScope), Error>
where
    D: ExpenseCommon + BranchCommon,
{
    let scope = resolve_scope(db, ctx, &[]).await?;
    match ExpenseCommon::get(db, ctx.organization_id, id).await? {
        Some(e) if !e.is_deleted && scope.admits(e.branch_id) => Ok((e, scope)),
        _ => Err(Error::NotFound(format!("expense({}) not found", id))),
    }
}

pub async fn get_expense<D>(db: &mut D, ctx: &AuthContext, id: Uuid) -> Result<Expense, Error>
where
    D: ExpenseCommon + BranchCommon,
{
    visible(db, ctx, id).await.map(|(e, _)| e)
}

pub async fn create_expense<D>(db: &mut D, ctx: &AuthContext, data: ExpenseCreate) -> Result<Uuid, Error>
where
    D: ExpenseCommon + BranchCommon,
{
    check_positive(data.amount, "amount")?;
    check_not_blank(&data.category, "category")?;
    let scope = resolve_scope(db, ctx, &[]).await?;
    check_writable(&scope, data.branch_id)?;
    let id = ExpenseCommon::insert(
        db,
        Insert {
            organization_id: ctx.organization_id,
            created_by: ctx.user_id,
            data,
        },
    )
    .await?;
    log::info!("user {} recorded expense {}", ctx.user_id, id);
    Ok(id)
}

pub async fn update_expense<D>(db: &mut D, ctx: &AuthContext, id: Uuid, data: ExpenseUpdate) -> Result<Expense, Error>
where
    D: ExpenseCommon + BranchCommon,
{
    if data.is_empty() {
        return Err(Error::BusinessError("nothing to update".into()));
    }
    if let Some(amount) = data.amount {
        check_positive(amount, "amount")?;
    }
    if let Some(category) = &data.category {
        check_not_blank(category, "category")?;
    }
    let (expense, scope) = visible(db, ctx, id).await?;
    check_writable(&scope, expense.branch_id)?;
    if data.branch_id.is_some() {
        check_writable(&scope, data.branch_id)?;
    }
    let affected = ExpenseCommon::update(db, &update_scope(ctx), id, data).await?;
    check_affected(affected, "expense")?;
    get_expense(db, ctx, id).await
}

pub async fn delete_expense<D>(db: &mut D, ctx: &AuthContext, id: Uuid) -> Result<(), Error>
where
    D: ExpenseCommon + BranchCommon,
{
    let (expense, scope) = visible(db, ctx, id).await?;
    check_writable(&scope, expense.branch_id)?;
    let affected = ExpenseCommon::soft_delete(db, &update_scope(ctx), id).await?;
    check_affected(affected, "expense")?;
    log::info!("user {} deleted expense {}", ctx.user_id, id);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::Role;
    use crate::core::models::common::{Order, SortDirection};
    use crate::core::models::filter::{AmountComparison, CompareOp, Predicate, Value};
    use crate::core::services::fake::{ctx, expense, today, FakeStore};
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_comparison_replaces_search() {
        let ctx = ctx(Role::Admin);
        let mut db = FakeStore::default();
        let params = ExpenseListParams {
            filter: FinanceFilter {
                amount_comparison: Some(AmountComparison {
                    operator: CompareOp::Lt,
                    value: Some(Decimal::from(20)),
                }),
                search: Some("power".into()),
                ..default::default()
            },
            ..Default::default()
        };
        query_expenses(&mut db, &ctx, params, today()).await.unwrap();
        assert_eq!(db.queries[0].predicates, vec![Predicate::eq("e.is_deleted", false), Predicate::Compare {
            field: "e.amount",
            op: CompareOp::Lt,
            value: Value::Decimal(Decimal::from(20)),
        }]);
    }

    #[tokio::test]
    async fn test_relation_filters_are_dropped() {
        let ctx = ctx(Role::Owner);
        let mut db = FakeStore::default();
        let params = ExpenseListParams {
            filter: FinanceFilter {
                member_ids: vec![Uuid::new_v4()],
                ..default::default()
            },
            ..Default::default()
        };
        query_expenses(&mut db, &ctx, params, today()).await.unwrap();
        assert_eq!(db.queries[0].predicates, vec![Predicate::eq("e.is_deleted", false)]);
    }

    #[tokio::test]
    async fn test_user_sort_gets_created_at_tie_break() {
        let ctx = ctx(Role::Owner);
        let mut db = FakeStore::default();
        let params = ExpenseListParams {
            sort_by: Some(ExpenseSortField::Vendor),
            sort_direction: SortDirection::Asc,
            ..Default::default()
        };
        query_expenses(&mut db, &ctx, params, today()).await.unwrap();
        assert_eq!(db.queries[0].order, vec![Order::asc("e.vendor"), Order::desc("e.created_at")]);
    }

    #[tokio::test]
    async fn test_org_wide_row_is_read_only_for_members() {
        let ctx = ctx(Role::BranchAdmin);
        let mut db = FakeStore {
            assigned: vec![Uuid::new_v4()],
            ..Default::default()
        };
        let e = expense(&ctx, None);
        let id = e.id;
        db.expenses.push(e);
        assert!(get_expense(&mut db, &ctx, id).await.is_ok());
        assert!(matches!(delete_expense(&mut db, &ctx, id).await, Err(Error::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_update_returns_fresh_row() {
        let ctx = ctx(Role::Admin);
        let mut db = FakeStore::default();
        let e = expense(&ctx, None);
        let id = e.id;
        db.expenses.push(e);
        let data = ExpenseUpdate {
            vendor: Some("Water Co".into()),
            ..Default::default()
        };
        update_expense(&mut db, &ctx, id, data).await.unwrap();
        assert_eq!(db.expense_updates.len(), 1);
        assert_eq!(db.expense_updates[0].0.created_by, None);
    }

    #[tokio::test]
    async fn test_summary_on_empty_scope() {
        let ctx = ctx(Role::Member);
        let mut db = FakeStore::default();
        let summary = expense_summary(&mut db, &ctx, FinanceFilter::default(), today()).await.unwrap();
        assert_eq!(summary.record_count, 0);
        assert!(db.queries.is_empty());
    }
}
