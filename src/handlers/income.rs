use crate::actix_web::{
    web::{Json, Path},
    HttpResponse,
};
use crate::context::AuthContext;
use crate::core::models::{
    common::Page,
    filter::FinanceFilter,
    income::{Income, IncomeCreate, IncomeListParams, IncomeUpdate},
    summary::FinanceSummary,
};
use crate::core::services::income;
use crate::error::Error;
use crate::handlers::{today, DB};
use crate::response::Created;
use uuid::Uuid;

pub async fn search(ctx: AuthContext, body: Json<IncomeListParams>, db: DB) -> Result<Json<Page<Income>>, Error> {
    let mut conn = db.acquire().await?;
    let page = income::query_incomes(&mut conn, &ctx, body.into_inner(), today()).await?;
    Ok(Json(page))
}

pub async fn summary(ctx: AuthContext, body: Json<FinanceFilter>, db: DB) -> Result<Json<FinanceSummary>, Error> {
    let mut conn = db.acquire().await?;
    let summary = income::income_summary(&mut conn, &ctx, body.into_inner(), today()).await?;
    Ok(Json(summary))
}

pub async fn detail(ctx: AuthContext, path: Path<(Uuid, Uuid)>, db: DB) -> Result<Json<Income>, Error> {
    let (_, id) = path.into_inner();
    let mut conn = db.acquire().await?;
    let income = income::get_income(&mut conn, &ctx, id).await?;
    Ok(Json(income))
}

pub async fn create(ctx: AuthContext, body: Json<IncomeCreate>, db: DB) -> Result<HttpResponse, Error> {
    let mut conn = db.acquire().await?;
    let id = income::create_income(&mut conn, &ctx, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(Created { id }))
}

pub async fn update(ctx: AuthContext, path: Path<(Uuid, Uuid)>, body: Json<IncomeUpdate>, db: DB) -> Result<Json<Income>, Error> {
    let (_, id) = path.into_inner();
    let mut conn = db.acquire().await?;
    let income = income::update_income(&mut conn, &ctx, id, body.into_inner()).await?;
    Ok(Json(income))
}

pub async fn delete(ctx: AuthContext, path: Path<(Uuid, Uuid)>, db: DB) -> Result<HttpResponse, Error> {
    let (_, id) = path.into_inner();
    let mut conn = db.acquire().await?;
    income::delete_income(&mut conn, &ctx, id).await?;
    Ok(HttpResponse::NoContent().finish())
}
