use chrono::NaiveDate;
use itertools::Itertools;
use uuid::Uuid;

use super::resolve_scope;
use crate::context::AuthContext;
use crate::core::models::{
    attendance::{default_order, AttendanceListParams, AttendanceRecord, AttendanceSession, AttendanceSortField, MarkAttendance, Occasion, SessionSummary, Upsert, BRANCH},
    common::{ListQuery, Order, Ordering, Page},
    filter::Predicate,
};
use crate::core::ports::repository::{AttendanceCommon, BranchCommon, TxStore};
use crate::error::Error;

pub async fn list_occasions<D>(db: &mut D, ctx: &AuthContext) -> Result<Vec<Occasion>, Error>
where
    D: AttendanceCommon + BranchCommon,
{
    let scope = resolve_scope(db, ctx, &[]).await?;
    if scope.is_empty() {
        return Ok(Vec::new());
    }
    let mut predicates = vec![Predicate::eq("o.is_active", true)];
    predicates.extend(scope.predicate("o.branch_id"));
    let query = ListQuery::new(ctx.organization_id, predicates, vec![Order::asc("o.name")]);
    AttendanceCommon::occasions(db, &query).await
}

pub async fn list_sessions<D>(db: &mut D, ctx: &AuthContext, occasion_id: Uuid) -> Result<Vec<AttendanceSession>, Error>
where
    D: AttendanceCommon + BranchCommon,
{
    let scope = resolve_scope(db, ctx, &[]).await?;
    let sessions = AttendanceCommon::sessions(db, ctx.organization_id, occasion_id).await?;
    Ok(sessions.into_iter().filter(|s| scope.admits(s.branch_id)).collect())
}

async fn visible_session<D>(db: &mut D, ctx: &AuthContext, session_id: Uuid) -> Result<AttendanceSession, Error>
where
    D: AttendanceCommon + BranchCommon,
{
    let scope = resolve_scope(db, ctx, &[]).await?;
    match AttendanceCommon::get_session(db, ctx.organization_id, session_id).await? {
        Some(s) if scope.admits(s.branch_id) => Ok(s),
        _ => Err(Error::NotFound(format!("session({}) not found", session_id))),
    }
}

pub async fn query_attendance<D>(db: &mut D, ctx: &AuthContext, params: AttendanceListParams, today: NaiveDate) -> Result<Page<AttendanceRecord>, Error>
where
    D: AttendanceCommon + BranchCommon,
{
    let pagination = params.pagination();
    let scope = resolve_scope(db, ctx, &params.filter.branch_ids).await?;
    if scope.is_empty() {
        return Ok(Page::empty(pagination));
    }
    let ordering = Ordering::new(params.sort_by, params.sort_direction, |f: AttendanceSortField| Some(f.column()), default_order(), "ar.marked_at");
    let filter = params.filter.with_resolved_dates(today);
    let mut predicates: Vec<Predicate> = scope.predicate(BRANCH).into_iter().collect();
    predicates.extend(filter.normalize());
    let query = ListQuery::new(ctx.organization_id, predicates, ordering.backend);
    let total = AttendanceCommon::count(db, &query).await?;
    let rows = AttendanceCommon::query(db, &query, Some(pagination)).await?;
    Ok(Page::new(rows.into_iter().map(AttendanceRecord::from).collect(), total, pagination))
}

/// Upserts one record per member for the session and commits. When a member appears
/// more than once the last entry wins. Returns how many members were marked.
pub async fn mark_attendance<T>(mut tx: T, ctx: &AuthContext, session_id: Uuid, data: MarkAttendance) -> Result<usize, Error>
where
    T: TxStore,
{
    if data.entries.is_empty() {
        return Err(Error::BusinessError("no attendance entries".into()));
    }
    match upsert_entries(&mut tx, ctx, session_id, data).await {
        Ok(marked) => {
            tx.commit().await?;
            log::info!("user {} marked {} members on session {}", ctx.user_id, marked, session_id);
            Ok(marked)
        }
        Err(e) => {
            tx.rollback().await?;
            Err(e)
        }
    }
}

async fn upsert_entries<T>(tx: &mut T, ctx: &AuthContext, session_id: Uuid, data: MarkAttendance) -> Result<usize, Error>
where
    T: TxStore,
{
    let session = visible_session(tx, ctx, session_id).await?;
    if !session.is_open {
        return Err(Error::BusinessError("session is closed".into()));
    }
    let entries: Vec<_> = data.entries.into_iter().rev().unique_by(|e| e.member_id).collect();
    for entry in &entries {
        AttendanceCommon::upsert(
            tx,
            Upsert {
                organization_id: ctx.organization_id,
                branch_id: session.branch_id,
                occasion_id: session.occasion_id,
                session_id,
                member_id: entry.member_id,
                present: entry.present,
                marked_by: ctx.user_id,
                marking_method: data.marking_method,
            },
        )
        .await?;
    }
    Ok(entries.len())
}

pub async fn session_summary<D>(db: &mut D, ctx: &AuthContext, session_id: Uuid) -> Result<SessionSummary, Error>
where
    D: AttendanceCommon + BranchCommon,
{
    visible_session(db, ctx, session_id).await?;
    let counts = AttendanceCommon::presence_counts(db, ctx.organization_id, session_id).await?;
    Ok(SessionSummary::from_counts(session_id, &counts))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::Role;
    use crate::core::models::attendance::{AttendanceFilter, MarkEntry, MarkingMethod, PresenceCount};
    use crate::core::services::fake::{ctx, session, today, FakeStore};

    fn mark(entries: Vec<(Uuid, bool)>) -> MarkAttendance {
        MarkAttendance {
            entries: entries.into_iter().map(|(member_id, present)| MarkEntry { member_id, present }).collect(),
            marking_method: MarkingMethod::Kiosk,
        }
    }

    #[tokio::test]
    async fn test_mark_upserts_last_entry_per_member() {
        let ctx = ctx(Role::Admin);
        let s = session(&ctx, None, true);
        let session_id = s.id;
        let db = FakeStore {
            sessions: vec![s],
            ..Default::default()
        };
        let upserts = db.upserts.clone();
        let committed = db.committed.clone();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let marked = mark_attendance(db, &ctx, session_id, mark(vec![(a, false), (b, true), (a, true)])).await.unwrap();
        assert_eq!(marked, 2);
        assert!(committed.get());
        let upserts = upserts.borrow();
        let a_record = upserts.iter().find(|u| u.member_id == a).unwrap();
        assert!(a_record.present);
        assert_eq!(a_record.marking_method, MarkingMethod::Kiosk);
        assert_eq!(a_record.marked_by, ctx.user_id);
    }

    #[tokio::test]
    async fn test_closed_session_rejects_marking() {
        let ctx = ctx(Role::Admin);
        let s = session(&ctx, None, false);
        let session_id = s.id;
        let db = FakeStore {
            sessions: vec![s],
            ..Default::default()
        };
        let committed = db.committed.clone();
        let rolled_back = db.rolled_back.clone();
        let res = mark_attendance(db, &ctx, session_id, mark(vec![(Uuid::new_v4(), true)])).await;
        assert!(matches!(res, Err(Error::BusinessError(_))));
        assert!(!committed.get());
        assert!(rolled_back.get());
    }

    #[tokio::test]
    async fn test_member_cannot_mark_foreign_branch_session() {
        let ctx = ctx(Role::Member);
        let s = session(&ctx, Some(Uuid::new_v4()), true);
        let session_id = s.id;
        let db = FakeStore {
            assigned: vec![Uuid::new_v4()],
            sessions: vec![s],
            ..Default::default()
        };
        let upserts = db.upserts.clone();
        let rolled_back = db.rolled_back.clone();
        let res = mark_attendance(db, &ctx, session_id, mark(vec![(Uuid::new_v4(), true)])).await;
        assert!(matches!(res, Err(Error::NotFound(_))));
        assert!(upserts.borrow().is_empty());
        assert!(rolled_back.get());
    }

    #[tokio::test]
    async fn test_sessions_are_scoped() {
        let ctx = ctx(Role::BranchAdmin);
        let mine = Uuid::new_v4();
        let occasion_id = Uuid::new_v4();
        let mut sessions = vec![session(&ctx, Some(mine), true), session(&ctx, Some(Uuid::new_v4()), true), session(&ctx, None, true)];
        for s in sessions.iter_mut() {
            s.occasion_id = occasion_id;
        }
        let mut db = FakeStore {
            assigned: vec![mine],
            sessions,
            ..Default::default()
        };
        let visible = list_sessions(&mut db, &ctx, occasion_id).await.unwrap();
        assert_eq!(visible.len(), 2);
    }

    #[tokio::test]
    async fn test_query_attendance_predicates() {
        let ctx = ctx(Role::Owner);
        let member = Uuid::new_v4();
        let mut db = FakeStore::default();
        let params = AttendanceListParams {
            filter: AttendanceFilter {
                member_ids: vec![member],
                present: Some(true),
                ..default::default()
            },
            ..Default::default()
        };
        query_attendance(&mut db, &ctx, params, today()).await.unwrap();
        assert_eq!(db.queries[0].predicates, vec![Predicate::is_in("ar.member_id", vec![member]), Predicate::eq("ar.present", true)]);
        assert_eq!(db.queries[0].order, default_order());
    }

    #[tokio::test]
    async fn test_summary() {
        let ctx = ctx(Role::Owner);
        let s = session(&ctx, None, false);
        let session_id = s.id;
        let mut db = FakeStore {
            sessions: vec![s],
            presence: vec![PresenceCount { present: true, count: 3 }, PresenceCount { present: false, count: 1 }],
            ..Default::default()
        };
        let summary = session_summary(&mut db, &ctx, session_id).await.unwrap();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.attendance_rate, 75.0);
    }
}
