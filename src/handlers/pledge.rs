use crate::actix_web::{
    web::{Json, Path},
    HttpResponse,
};
use crate::context::AuthContext;
use crate::core::models::{
    common::Page,
    pledge::{PaymentCreate, Pledge, PledgeCreate, PledgeListParams, PledgePayment, PledgeUpdate},
};
use crate::core::services::pledge;
use crate::error::Error;
use crate::handlers::{today, DB};
use crate::response::Created;
use uuid::Uuid;

pub async fn search(ctx: AuthContext, body: Json<PledgeListParams>, db: DB) -> Result<Json<Page<Pledge>>, Error> {
    let mut conn = db.acquire().await?;
    let page = pledge::query_pledges(&mut conn, &ctx, body.into_inner(), today()).await?;
    Ok(Json(page))
}

pub async fn detail(ctx: AuthContext, path: Path<(Uuid, Uuid)>, db: DB) -> Result<Json<Pledge>, Error> {
    let (_, id) = path.into_inner();
    let mut conn = db.acquire().await?;
    let pledge = pledge::get_pledge(&mut conn, &ctx, id, today()).await?;
    Ok(Json(pledge))
}

pub async fn create(ctx: AuthContext, body: Json<PledgeCreate>, db: DB) -> Result<HttpResponse, Error> {
    let mut conn = db.acquire().await?;
    let id = pledge::create_pledge(&mut conn, &ctx, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(Created { id }))
}

pub async fn update(ctx: AuthContext, path: Path<(Uuid, Uuid)>, body: Json<PledgeUpdate>, db: DB) -> Result<Json<Pledge>, Error> {
    let (_, id) = path.into_inner();
    let mut conn = db.acquire().await?;
    let pledge = pledge::update_pledge(&mut conn, &ctx, id, body.into_inner(), today()).await?;
    Ok(Json(pledge))
}

pub async fn delete(ctx: AuthContext, path: Path<(Uuid, Uuid)>, db: DB) -> Result<HttpResponse, Error> {
    let (_, id) = path.into_inner();
    let mut conn = db.acquire().await?;
    pledge::delete_pledge(&mut conn, &ctx, id).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn payments(ctx: AuthContext, path: Path<(Uuid, Uuid)>, db: DB) -> Result<Json<Vec<PledgePayment>>, Error> {
    let (_, id) = path.into_inner();
    let mut conn = db.acquire().await?;
    let payments = pledge::list_payments(&mut conn, &ctx, id).await?;
    Ok(Json(payments))
}

pub async fn record_payment(ctx: AuthContext, path: Path<(Uuid, Uuid)>, body: Json<PaymentCreate>, db: DB) -> Result<HttpResponse, Error> {
    let (_, id) = path.into_inner();
    let tx = db.begin().await?;
    let payment_id = pledge::record_payment(tx, &ctx, id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(Created { id: payment_id }))
}

pub async fn delete_payment(ctx: AuthContext, path: Path<(Uuid, Uuid, Uuid)>, db: DB) -> Result<HttpResponse, Error> {
    let (_, id, payment_id) = path.into_inner();
    let mut conn = db.acquire().await?;
    pledge::delete_payment(&mut conn, &ctx, id, payment_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
