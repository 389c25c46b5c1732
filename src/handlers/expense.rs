use crate::actix_web::{
    web::{Json, Path},
    HttpResponse,
};
use crate::context::AuthContext;
use crate::core::models::{
    common::Page,
    expense::{Expense, ExpenseCreate, ExpenseListParams, ExpenseUpdate},
    filter::FinanceFilter,
    summary::FinanceSummary,
};
use crate::core::services::expense;
use crate::error::Error;
use crate::handlers::{today, DB};
use crate::response::Created;
use uuid::Uuid;

pub async fn search(ctx: AuthContext, body: Json<ExpenseListParams>, db: DB) -> Result<Json<Page<Expense>>, Error> {
    let mut conn = db.acquire().await?;
    let page = expense::query_expenses(&mut conn, &ctx, body.into_inner(), today()).await?;
    Ok(Json(page))
}

pub async fn summary(ctx: AuthContext, body: Json<FinanceFilter>, db: DB) -> Result<Json<FinanceSummary>, Error> {
    let mut conn = db.acquire().await?;
    let summary = expense::expense_summary(&mut conn, &ctx, body.into_inner(), today()).await?;
    Ok(Json(summary))
}

pub async fn detail(ctx: AuthContext, path: Path<(Uuid, Uuid)>, db: DB) -> Result<Json<Expense>, Error> {
    let (_, id) = path.into_inner();
    let mut conn = db.acquire().await?;
    let expense = expense::get_expense(&mut conn, &ctx, id).await?;
    Ok(Json(expense))
}

pub async fn create(ctx: AuthContext, body: Json<ExpenseCreate>, db: DB) -> Result<HttpResponse, Error> {
    let mut conn = db.acquire().await?;
    let id = expense::create_expense(&mut conn, &ctx, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(Created { id }))
}

pub async fn update(ctx: AuthContext, path: Path<(Uuid, Uuid)>, body: Json<ExpenseUpdate>, db: DB) -> Result<Json<Expense>, Error> {
    let (_, id) = path.into_inner();
    let mut conn = db.acquire().await?;
    let expense = expense::update_expense(&mut conn, &ctx, id, body.into_inner()).await?;
    Ok(Json(expense))
}

pub async fn delete(ctx: AuthContext, path: Path<(Uuid, Uuid)>, db: DB) -> Result<HttpResponse, Error> {
    let (_, id) = path.into_inner();
    let mut conn = db.acquire().await?;
    expense::delete_expense(&mut conn, &ctx, id).await?;
    Ok(HttpResponse::NoContent().finish())
}
