use crate::actix_web::{
    web::{Json, Path},
    HttpResponse,
};
use crate::context::AuthContext;
use crate::core::models::{
    common::Page,
    group::{AssignMember, Group, GroupCreate, GroupListParams, GroupMember, GroupUpdate},
};
use crate::core::services::group;
use crate::error::Error;
use crate::handlers::DB;
use crate::response::Created;
use uuid::Uuid;

pub async fn search(ctx: AuthContext, body: Json<GroupListParams>, db: DB) -> Result<Json<Page<Group>>, Error> {
    let mut conn = db.acquire().await?;
    let page = group::query_groups(&mut conn, &ctx, body.into_inner()).await?;
    Ok(Json(page))
}

pub async fn detail(ctx: AuthContext, path: Path<(Uuid, Uuid)>, db: DB) -> Result<Json<Group>, Error> {
    let (_, id) = path.into_inner();
    let mut conn = db.acquire().await?;
    let group = group::get_group(&mut conn, &ctx, id).await?;
    Ok(Json(group))
}

pub async fn create(ctx: AuthContext, body: Json<GroupCreate>, db: DB) -> Result<HttpResponse, Error> {
    let mut conn = db.acquire().await?;
    let id = group::create_group(&mut conn, &ctx, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(Created { id }))
}

pub async fn update(ctx: AuthContext, path: Path<(Uuid, Uuid)>, body: Json<GroupUpdate>, db: DB) -> Result<Json<Group>, Error> {
    let (_, id) = path.into_inner();
    let mut conn = db.acquire().await?;
    let group = group::update_group(&mut conn, &ctx, id, body.into_inner()).await?;
    Ok(Json(group))
}

pub async fn close(ctx: AuthContext, path: Path<(Uuid, Uuid)>, db: DB) -> Result<Json<Group>, Error> {
    let (_, id) = path.into_inner();
    let mut conn = db.acquire().await?;
    let group = group::close_group(&mut conn, &ctx, id).await?;
    Ok(Json(group))
}

pub async fn members(ctx: AuthContext, path: Path<(Uuid, Uuid)>, db: DB) -> Result<Json<Vec<GroupMember>>, Error> {
    let (_, id) = path.into_inner();
    let mut conn = db.acquire().await?;
    let members = group::list_members(&mut conn, &ctx, id).await?;
    Ok(Json(members))
}

pub async fn assign_member(ctx: AuthContext, path: Path<(Uuid, Uuid)>, body: Json<AssignMember>, db: DB) -> Result<HttpResponse, Error> {
    let (_, id) = path.into_inner();
    let mut conn = db.acquire().await?;
    group::assign_member(&mut conn, &ctx, id, body.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn remove_member(ctx: AuthContext, path: Path<(Uuid, Uuid, Uuid)>, db: DB) -> Result<HttpResponse, Error> {
    let (_, id, member_id) = path.into_inner();
    let mut conn = db.acquire().await?;
    group::remove_member(&mut conn, &ctx, id, member_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
