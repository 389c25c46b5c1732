use chrono::NaiveDate;
use uuid::Uuid;

use super::{check_affected, check_not_blank, check_positive, check_writable, finance_query, resolve_scope, sort_in_page, update_scope};
use crate::context::AuthContext;
use crate::core::branch_scope::BranchScope;
use crate::core::models::{
    common::{Ordering, Page},
    income::{default_order, Income, IncomeCreate, IncomeListParams, IncomeRow, IncomeSortField, IncomeUpdate, Insert, COLUMNS},
    filter::FinanceFilter,
    summary::FinanceSummary,
};
use crate::core::ports::repository::{BranchCommon, IncomeCommon};
use crate::error::Error;

pub async fn query_incomes<D>(db: &mut D, ctx: &AuthContext, params: IncomeListParams, today: NaiveDate) -> Result<Page<Income>, Error>
where
    D: IncomeCommon + BranchCommon,
{
    let pagination = params.pagination();
    let scope = resolve_scope(db, ctx, &params.filter.branch_ids).await?;
    if scope.is_empty() {
        log::debug!("user {} has no visible branch, skip income query", ctx.user_id);
        return Ok(Page::empty(pagination));
    }
    let ordering = Ordering::new(params.sort_by, params.sort_direction, |f: IncomeSortField| f.column(), default_order(), COLUMNS.created_at);
    let query = finance_query(ctx, &scope, params.filter, &COLUMNS, today, ordering.backend);
    let total = IncomeCommon::count(db, &query).await?;
    let rows = IncomeCommon::query(db, &query, Some(pagination)).await?;
    let mut incomes: Vec<Income> = rows.into_iter().map(Income::from).collect();
    if let Some((IncomeSortField::ContributorName, direction)) = ordering.in_page {
        sort_in_page(&mut incomes, direction, |i| i.contributor_name.to_lowercase());
    }
    Ok(Page::new(incomes, total, pagination))
}

/// Totals over the same filter a list would use, ignoring paging and sorting.
pub async fn income_summary<D>(db: &mut D, ctx: &AuthContext, filter: FinanceFilter, today: NaiveDate) -> Result<FinanceSummary, Error>
where
    D: IncomeCommon + BranchCommon,
{
    let scope = resolve_scope(db, ctx, &filter.branch_ids).await?;
    if scope.is_empty() {
        return Ok(FinanceSummary::from_totals(Vec::new()));
    }
    let query = finance_query(ctx, &scope, filter, &COLUMNS, today, Vec::new());
    let totals = IncomeCommon::category_totals(db, &query).await?;
    Ok(FinanceSummary::from_totals(totals))
}

async fn visible_row<D>(db: &mut D, ctx: &AuthContext, id: Uuid) -> Result<(IncomeRow, BranchScope), Error>
where
    D: IncomeCommon + BranchCommon,
{
    let scope = resolve_scope(db, ctx, &[]).await?;
    match IncomeCommon::get(db, ctx.organization_id, id).await? {
        Some(row) if !row.is_deleted && scope.admits(row.branch_id) => Ok((row, scope)),
        _ => Err(Error::NotFound(format!("income({}) not found", id))),
    }
}

pub async fn get_income<D>(db: &mut D, ctx: &AuthContext, id: Uuid) -> Result<Income, Error>
where
    D: IncomeCommon + BranchCommon,
{
    let (row, _) = visible_row(db, ctx, id).await?;
    Ok(row.into())
}

pub async fn create_income<D>(db: &mut D, ctx: &AuthContext, data: IncomeCreate) -> Result<Uuid, Error>
where
    D: IncomeCommon + BranchCommon,
{
    check_positive(data.amount, "amount")?;
    check_not_blank(&data.category, "category")?;
    let scope = resolve_scope(db, ctx, &[]).await?;
    check_writable(&scope, data.branch_id)?;
    let id = IncomeCommon::insert(
        db,
        Insert {
            organization_id: ctx.organization_id,
            created_by: ctx.user_id,
            data,
        },
    )
    .await?;
    log::info!("user {} recorded income {}", ctx.user_id, id);
    Ok(id)
}

pub async fn update_income<D>(db: &mut D, ctx: &AuthContext, id: Uuid, data: IncomeUpdate) -> Result<Income, Error>
where
    D: IncomeCommon + BranchCommon,
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
    let (row, scope) = visible_row(db, ctx, id).await?;
    check_writable(&scope, row.branch_id)?;
    if data.branch_id.is_some() {
        check_writable(&scope, data.branch_id)?;
    }
    let affected = IncomeCommon::update(db, &update_scope(ctx), id, data).await?;
    check_affected(affected, "income")?;
    get_income(db, ctx, id).await
}

pub async fn delete_income<D>(db: &mut D, ctx: &AuthContext, id: Uuid) -> Result<(), Error>
where
    D: IncomeCommon + BranchCommon,
{
    let (row, scope) = visible_row(db, ctx, id).await?;
    check_writable(&scope, row.branch_id)?;
    let affected = IncomeCommon::soft_delete(db, &update_scope(ctx), id).await?;
    check_affected(affected, "income")?;
    log::info!("user {} deleted income {}", ctx.user_id, id);
    Ok(())
}
