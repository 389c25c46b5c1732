use uuid::Uuid;

use super::{check_affected, check_not_blank, check_writable, resolve_scope, update_scope};
use crate::context::AuthContext;
use crate::core::branch_scope::BranchScope;
use crate::core::models::{
    common::{ListQuery, Ordering, Page},
    group::{check_dates, default_order, AssignMember, Group, GroupCreate, GroupListParams, GroupMember, GroupSortField, GroupUpdate, Insert, BRANCH},
};
use crate::core::ports::repository::{BranchCommon, GroupCommon};
use crate::error::Error;

pub async fn query_groups<D>(db: &mut D, ctx: &AuthContext, params: GroupListParams) -> Result<Page<Group>, Error>
where
    D: GroupCommon + BranchCommon,
{
    let pagination = params.pagination();
    let scope = resolve_scope(db, ctx, &params.filter.branch_ids).await?;
    if scope.is_empty() {
        return Ok(Page::empty(pagination));
    }
    let ordering = Ordering::new(params.sort_by, params.sort_direction, |f: GroupSortField| Some(f.column()), default_order(), "g.created_at");
    let mut predicates: Vec<_> = scope.predicate(BRANCH).into_iter().collect();
    predicates.extend(params.filter.normalize());
    let query = ListQuery::new(ctx.organization_id, predicates, ordering.backend);
    let total = GroupCommon::count(db, &query).await?;
    let rows = GroupCommon::query(db, &query, Some(pagination)).await?;
    let groups = rows.into_iter().map(Group::try_from).collect::<Result<Vec<_>, _>>()?;
    Ok(Page::new(groups, total, pagination))
}

async fn visible<D>(db: &mut D, ctx: &AuthContext, id: Uuid) -> Result<(Group, BranchScope), Error>
where
    D: GroupCommon + BranchCommon,
{
    let scope = resolve_scope(db, ctx, &[]).await?;
    match GroupCommon::get(db, ctx.organization_id, id).await? {
        Some(row) if scope.admits(row.branch_id) => Ok((row.try_into()?, scope)),
        _ => Err(Error::NotFound(format!("group({}) not found", id))),
    }
}

/// Like `visible`, but the group must also be writable and still open.
async fn modifiable<D>(db: &mut D, ctx: &AuthContext, id: Uuid) -> Result<(Group, BranchScope), Error>
where
    D: GroupCommon + BranchCommon,
{
    let (group, scope) = visible(db, ctx, id).await?;
    check_writable(&scope, group.branch_id)?;
    if group.is_closed {
        return Err(Error::BusinessError("closed groups cannot be modified".into()));
    }
    Ok((group, scope))
}

pub async fn get_group<D>(db: &mut D, ctx: &AuthContext, id: Uuid) -> Result<Group, Error>
where
    D: GroupCommon + BranchCommon,
{
    visible(db, ctx, id).await.map(|(g, _)| g)
}

pub async fn create_group<D>(db: &mut D, ctx: &AuthContext, data: GroupCreate) -> Result<Uuid, Error>
where
    D: GroupCommon + BranchCommon,
{
    check_not_blank(&data.name, "name")?;
    check_dates(data.start_date, data.end_date)?;
    let scope = resolve_scope(db, ctx, &[]).await?;
    check_writable(&scope, data.branch_id)?;
    let id = GroupCommon::insert(
        db,
        Insert {
            organization_id: ctx.organization_id,
            created_by: ctx.user_id,
            data,
        },
    )
    .await?;
    log::info!("user {} created group {}", ctx.user_id, id);
    Ok(id)
}

pub async fn update_group<D>(db: &mut D, ctx: &AuthContext, id: Uuid, data: GroupUpdate) -> Result<Group, Error>
where
    D: GroupCommon + BranchCommon,
{
    if data.is_empty() {
        return Err(Error::BusinessError("nothing to update".into()));
    }
    if let Some(name) = &data.name {
        check_not_blank(name, "name")?;
    }
    let (group, scope) = modifiable(db, ctx, id).await?;
    check_dates(data.start_date.or(group.start_date), data.end_date.or(group.end_date))?;
    if data.branch_id.is_some() {
        check_writable(&scope, data.branch_id)?;
    }
    let affected = GroupCommon::update(db, &update_scope(ctx), id, data).await?;
    check_affected(affected, "group")?;
    get_group(db, ctx, id).await
}

/// `active -> closed` for temporal groups. Closing a closed group changes nothing.
pub async fn close_group<D>(db: &mut D, ctx: &AuthContext, id: Uuid) -> Result<Group, Error>
where
    D: GroupCommon + BranchCommon,
{
    let (group, scope) = visible(db, ctx, id).await?;
    group.check_closable()?;
    check_writable(&scope, group.branch_id)?;
    if group.is_closed {
        return Ok(group);
    }
    GroupCommon::close(db, ctx.organization_id, id).await?;
    log::info!("user {} closed group {}", ctx.user_id, id);
    get_group(db, ctx, id).await
}

pub async fn list_members<D>(db: &mut D, ctx: &AuthContext, group_id: Uuid) -> Result<Vec<GroupMember>, Error>
where
    D: GroupCommon + BranchCommon,
{
    visible(db, ctx, group_id).await?;
    let rows = GroupCommon::members(db, group_id).await?;
    Ok(rows.into_iter().map(GroupMember::from).collect())
}

/// Adds the member or moves them to the given position.
pub async fn assign_member<D>(db: &mut D, ctx: &AuthContext, group_id: Uuid, data: AssignMember) -> Result<(), Error>
where
    D: GroupCommon + BranchCommon,
{
    modifiable(db, ctx, group_id).await?;
    let position = data.position.map(|p| p.trim().to_owned()).filter(|p| !p.is_empty());
    GroupCommon::assign_member(db, group_id, data.member_id, position).await
}

pub async fn remove_member<D>(db: &mut D, ctx: &AuthContext, group_id: Uuid, member_id: Uuid) -> Result<(), Error>
where
    D: GroupCommon + BranchCommon,
{
    modifiable(db, ctx, group_id).await?;
    let affected = GroupCommon::remove_member(db, group_id, member_id).await?;
    check_affected(affected, "group member")
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::Role;
    use crate::core::models::group::{GroupFilter, GroupType};
    use crate::core::models::filter::Predicate;
    use crate::core::services::fake::{ctx, group_row, FakeStore};

    #[tokio::test]
    async fn test_close_temporal_group() {
        let ctx = ctx(Role::Admin);
        let row = group_row(&ctx, GroupType::Temporal, false);
        let id = row.id;
        let mut db = FakeStore {
            groups: vec![row],
            ..Default::default()
        };
        let group = close_group(&mut db, &ctx, id).await.unwrap();
        assert!(group.is_closed);
        let again = close_group(&mut db, &ctx, id).await.unwrap();
        assert!(again.is_closed);
    }

    #[tokio::test]
    async fn test_close_permanent_group_is_rejected() {
        let ctx = ctx(Role::Admin);
        let row = group_row(&ctx, GroupType::Permanent, false);
        let id = row.id;
        let mut db = FakeStore {
            groups: vec![row],
            ..Default::default()
        };
        assert!(matches!(close_group(&mut db, &ctx, id).await, Err(Error::BusinessError(_))));
        assert!(!db.groups[0].is_closed);
    }

    #[tokio::test]
    async fn test_closed_group_cannot_change() {
        let ctx = ctx(Role::Admin);
        let row = group_row(&ctx, GroupType::Temporal, true);
        let id = row.id;
        let mut db = FakeStore {
            groups: vec![row],
            ..Default::default()
        };
        let assign = AssignMember {
            member_id: Uuid::new_v4(),
            position: None,
        };
        assert!(matches!(assign_member(&mut db, &ctx, id, assign).await, Err(Error::BusinessError(_))));
        let update = GroupUpdate {
            name: Some("renamed".into()),
            ..Default::default()
        };
        assert!(matches!(update_group(&mut db, &ctx, id, update).await, Err(Error::BusinessError(_))));
    }

    #[tokio::test]
    async fn test_assign_and_remove_member() {
        let ctx = ctx(Role::Owner);
        let row = group_row(&ctx, GroupType::Permanent, false);
        let id = row.id;
        let member_id = Uuid::new_v4();
        let mut db = FakeStore {
            groups: vec![row],
            ..Default::default()
        };
        let assign = |position: &str| AssignMember {
            member_id,
            position: Some(position.into()),
        };
        assign_member(&mut db, &ctx, id, assign("member")).await.unwrap();
        assign_member(&mut db, &ctx, id, assign(" leader ")).await.unwrap();
        let members = list_members(&mut db, &ctx, id).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].position.as_deref(), Some("leader"));
        remove_member(&mut db, &ctx, id, member_id).await.unwrap();
        assert!(matches!(remove_member(&mut db, &ctx, id, member_id).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_query_groups_filter() {
        let ctx = ctx(Role::Owner);
        let mut db = FakeStore::default();
        db.groups.push(group_row(&ctx, GroupType::Temporal, false));
        let params = GroupListParams {
            filter: GroupFilter {
                type_: Some(GroupType::Temporal),
                ..default::default()
            },
            ..Default::default()
        };
        let page = query_groups(&mut db, &ctx, params).await.unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(db.queries[0].predicates, vec![Predicate::eq("g.type", "temporal")]);
    }

    #[tokio::test]
    async fn test_create_checks_dates() {
        let ctx = ctx(Role::Owner);
        let mut db = FakeStore::default();
        let day = |d| chrono::NaiveDate::from_ymd_opt(2024, 3, d);
        let data = GroupCreate {
            name: "Lent study".into(),
            description: None,
            type_: GroupType::Temporal,
            branch_id: None,
            start_date: day(20),
            end_date: day(1),
        };
        assert!(matches!(create_group(&mut db, &ctx, data).await, Err(Error::BusinessError(_))));
        assert!(db.group_inserts.is_empty());
    }
}
