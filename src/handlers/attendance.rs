use crate::actix_web::web::{Json, Path};
use crate::context::AuthContext;
use crate::core::models::{
    attendance::{AttendanceListParams, AttendanceRecord, AttendanceSession, MarkAttendance, Occasion, SessionSummary},
    common::Page,
};
use crate::core::services::attendance;
use crate::error::Error;
use crate::handlers::{today, DB};
use crate::response::Marked;
use uuid::Uuid;

pub async fn occasions(ctx: AuthContext, db: DB) -> Result<Json<Vec<Occasion>>, Error> {
    let mut conn = db.acquire().await?;
    let occasions = attendance::list_occasions(&mut conn, &ctx).await?;
    Ok(Json(occasions))
}

pub async fn sessions(ctx: AuthContext, path: Path<(Uuid, Uuid)>, db: DB) -> Result<Json<Vec<AttendanceSession>>, Error> {
    let (_, occasion_id) = path.into_inner();
    let mut conn = db.acquire().await?;
    let sessions = attendance::list_sessions(&mut conn, &ctx, occasion_id).await?;
    Ok(Json(sessions))
}

pub async fn search(ctx: AuthContext, body: Json<AttendanceListParams>, db: DB) -> Result<Json<Page<AttendanceRecord>>, Error> {
    let mut conn = db.acquire().await?;
    let page = attendance::query_attendance(&mut conn, &ctx, body.into_inner(), today()).await?;
    Ok(Json(page))
}

pub async fn mark(ctx: AuthContext, path: Path<(Uuid, Uuid)>, body: Json<MarkAttendance>, db: DB) -> Result<Json<Marked>, Error> {
    let (_, session_id) = path.into_inner();
    let tx = db.begin().await?;
    let marked = attendance::mark_attendance(tx, &ctx, session_id, body.into_inner()).await?;
    Ok(Json(Marked { marked }))
}

pub async fn summary(ctx: AuthContext, path: Path<(Uuid, Uuid)>, db: DB) -> Result<Json<SessionSummary>, Error> {
    let (_, session_id) = path.into_inner();
    let mut conn = db.acquire().await?;
    let summary = attendance::session_summary(&mut conn, &ctx, session_id).await?;
    Ok(Json(summary))
}
