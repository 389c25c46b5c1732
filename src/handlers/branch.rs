use crate::actix_web::{
    web::{Json, Path, Query},
    HttpResponse,
};
use crate::context::AuthContext;
use crate::core::models::branch::{AssignUser, Branch, ListParams};
use crate::core::services::branch::{self, MyBranches};
use crate::error::Error;
use crate::handlers::DB;
use uuid::Uuid;

pub async fn list(ctx: AuthContext, params: Query<ListParams>, db: DB) -> Result<Json<Vec<Branch>>, Error> {
    let mut conn = db.acquire().await?;
    let branches = branch::list_branches(&mut conn, &ctx, params.into_inner()).await?;
    Ok(Json(branches))
}

pub async fn mine(ctx: AuthContext, db: DB) -> Result<Json<MyBranches>, Error> {
    let mut conn = db.acquire().await?;
    let mine = branch::my_branches(&mut conn, &ctx).await?;
    Ok(Json(mine))
}

pub async fn assign_user(ctx: AuthContext, path: Path<(Uuid, Uuid)>, body: Json<AssignUser>, db: DB) -> Result<HttpResponse, Error> {
    let (_, branch_id) = path.into_inner();
    let mut conn = db.acquire().await?;
    branch::assign_user(&mut conn, &ctx, branch_id, body.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
