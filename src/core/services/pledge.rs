use chrono::NaiveDate;
use uuid::Uuid;

use super::{check_affected, check_not_blank, check_positive, check_writable, finance_query, resolve_scope, sort_in_page, update_scope};
use crate::context::AuthContext;
use crate::core::branch_scope::BranchScope;
use crate::core::models::{
    common::{Ordering, Page},
    pledge::{default_order, Insert, PaymentCreate, PaymentInsert, Pledge, PledgeCreate, PledgeListParams, PledgePayment, PledgeRow, PledgeSortField, PledgeUpdate, COLUMNS},
};
use crate::core::ports::repository::{BranchCommon, PledgeCommon, TxStore};
use crate::error::Error;

pub async fn query_pledges<D>(db: &mut D, ctx: &AuthContext, params: PledgeListParams, today: NaiveDate) -> Result<Page<Pledge>, Error>
where
    D: PledgeCommon + BranchCommon,
{
    let pagination = params.pagination();
    let scope = resolve_scope(db, ctx, &params.filter.branch_ids).await?;
    if scope.is_empty() {
        log::debug!("user {} has no visible branch, skip pledge query", ctx.user_id);
        return Ok(Page::empty(pagination));
    }
    let ordering = Ordering::new(params.sort_by, params.sort_direction, |f: PledgeSortField| f.column(), default_order(), COLUMNS.created_at);
    let query = finance_query(ctx, &scope, params.filter, &COLUMNS, today, ordering.backend);
    let total = PledgeCommon::count(db, &query).await?;
    let rows = PledgeCommon::query(db, &query, Some(pagination)).await?;
    let mut pledges: Vec<Pledge> = rows.into_iter().map(|r| Pledge::from_row(r, today)).collect();
    match ordering.in_page {
        Some((PledgeSortField::ContributorName, direction)) => sort_in_page(&mut pledges, direction, |p| p.contributor_name.to_lowercase()),
        Some((PledgeSortField::Balance, direction)) => sort_in_page(&mut pledges, direction, |p| p.balance),
        _ => {}
    }
    Ok(Page::new(pledges, total, pagination))
}

async fn visible_row<D>(db: &mut D, ctx: &AuthContext, id: Uuid) -> Result<(PledgeRow, BranchScope), Error>
where
    D: PledgeCommon + BranchCommon,
{
    let scope = resolve_scope(db, ctx, &[]).await?;
    match PledgeCommon::get(db, ctx.organization_id, id).await? {
        Some(row) if !row.is_deleted && scope.admits(row.branch_id) => Ok((row, scope)),
        _ => Err(Error::NotFound(format!("pledge({}) not found", id))),
    }
}

pub async fn get_pledge<D>(db: &mut D, ctx: &AuthContext, id: Uuid, today: NaiveDate) -> Result<Pledge, Error>
where
    D: PledgeCommon + BranchCommon,
{
    let (row, _) = visible_row(db, ctx, id).await?;
    Ok(Pledge::from_row(row, today))
}

fn check_due_date(pledge_date: NaiveDate, due_date: Option<NaiveDate>) -> Result<(), Error> {
    if matches!(due_date, Some(due) if due < pledge_date) {
        return Err(Error::BusinessError("due date is before pledge date".into()));
    }
    Ok(())
}

pub async fn create_pledge<D>(db: &mut D, ctx: &AuthContext, data: PledgeCreate) -> Result<Uuid, Error>
where
    D: PledgeCommon + BranchCommon,
{
    check_positive(data.pledge_amount, "pledge amount")?;
    check_not_blank(&data.purpose, "purpose")?;
    check_due_date(data.pledge_date, data.due_date)?;
    let scope = resolve_scope(db, ctx, &[]).await?;
    check_writable(&scope, data.branch_id)?;
    let id = PledgeCommon::insert(
        db,
        Insert {
            organization_id: ctx.organization_id,
            created_by: ctx.user_id,
            data,
        },
    )
    .await?;
    log::info!("user {} recorded pledge {}", ctx.user_id, id);
    Ok(id)
}

pub async fn update_pledge<D>(db: &mut D, ctx: &AuthContext, id: Uuid, data: PledgeUpdate, today: NaiveDate) -> Result<Pledge, Error>
where
    D: PledgeCommon + BranchCommon,
{
    if data.is_empty() {
        return Err(Error::BusinessError("nothing to update".into()));
    }
    if let Some(amount) = data.pledge_amount {
        check_positive(amount, "pledge amount")?;
    }
    if let Some(purpose) = &data.purpose {
        check_not_blank(purpose, "purpose")?;
    }
    let (row, scope) = visible_row(db, ctx, id).await?;
    check_writable(&scope, row.branch_id)?;
    check_due_date(data.pledge_date.unwrap_or(row.pledge_date), data.due_date.or(row.due_date))?;
    if data.branch_id.is_some() {
        check_writable(&scope, data.branch_id)?;
    }
    let affected = PledgeCommon::update(db, &update_scope(ctx), id, data).await?;
    check_affected(affected, "pledge")?;
    get_pledge(db, ctx, id, today).await
}

pub async fn delete_pledge<D>(db: &mut D, ctx: &AuthContext, id: Uuid) -> Result<(), Error>
where
    D: PledgeCommon + BranchCommon,
{
    let (row, scope) = visible_row(db, ctx, id).await?;
    check_writable(&scope, row.branch_id)?;
    let affected = PledgeCommon::soft_delete(db, &update_scope(ctx), id).await?;
    check_affected(affected, "pledge")?;
    log::info!("user {} deleted pledge {}", ctx.user_id, id);
    Ok(())
}

pub async fn list_payments<D>(db: &mut D, ctx: &AuthContext, pledge_id: Uuid) -> Result<Vec<PledgePayment>, Error>
where
    D: PledgeCommon + BranchCommon,
{
    visible_row(db, ctx, pledge_id).await?;
    PledgeCommon::payments(db, ctx.organization_id, pledge_id).await
}

/// Records a payment against a pledge and commits. Overpaying is allowed, the balance
/// simply stays at zero. Nothing is kept when any step fails.
pub async fn record_payment<T>(mut tx: T, ctx: &AuthContext, pledge_id: Uuid, data: PaymentCreate) -> Result<Uuid, Error>
where
    T: TxStore,
{
    check_positive(data.amount, "payment amount")?;
    match insert_payment(&mut tx, ctx, pledge_id, data).await {
        Ok(id) => {
            tx.commit().await?;
            log::info!("user {} recorded payment {} on pledge {}", ctx.user_id, id, pledge_id);
            Ok(id)
        }
        Err(e) => {
            tx.rollback().await?;
            Err(e)
        }
    }
}

async fn insert_payment<T>(tx: &mut T, ctx: &AuthContext, pledge_id: Uuid, data: PaymentCreate) -> Result<Uuid, Error>
where
    T: TxStore,
{
    let (row, scope) = visible_row(tx, ctx, pledge_id).await?;
    check_writable(&scope, row.branch_id)?;
    PledgeCommon::insert_payment(
        tx,
        PaymentInsert {
            pledge_id,
            organization_id: ctx.organization_id,
            created_by: ctx.user_id,
            data,
        },
    )
    .await
}

pub async fn delete_payment<D>(db: &mut D, ctx: &AuthContext, pledge_id: Uuid, payment_id: Uuid) -> Result<(), Error>
where
    D: PledgeCommon + BranchCommon,
{
    let (row, scope) = visible_row(db, ctx, pledge_id).await?;
    check_writable(&scope, row.branch_id)?;
    match PledgeCommon::get_payment(db, ctx.organization_id, payment_id).await? {
        Some(p) if p.pledge_id == pledge_id && !p.is_deleted => {}
        _ => return Err(Error::NotFound(format!("payment({}) not found", payment_id))),
    }
    let affected = PledgeCommon::soft_delete_payment(db, &update_scope(ctx), payment_id).await?;
    check_affected(affected, "payment")
}
