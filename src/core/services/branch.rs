use serde::Serialize;
use uuid::Uuid;

use crate::context::AuthContext;
use crate::core::models::branch::{AssignUser, Branch, ListParams, Query};
use crate::core::ports::repository::BranchCommon;
use crate::error::Error;

#[derive(Debug, Serialize)]
pub struct MyBranches {
    pub can_manage_all_data: bool,
    pub branch_ids: Vec<Uuid>,
}

/// Managers see every branch, others only the ones they are assigned to.
/// Inactive branches are listed only when a manager asks for them.
pub async fn list_branches<D>(db: &mut D, ctx: &AuthContext, params: ListParams) -> Result<Vec<Branch>, Error>
where
    D: BranchCommon,
{
    let query = if ctx.can_manage_all_data() {
        Query {
            organization_id: ctx.organization_id,
            ids: None,
            include_inactive: params.include_inactive,
        }
    } else {
        let ids = BranchCommon::assigned_ids(db, ctx.organization_id, ctx.user_id).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Query {
            organization_id: ctx.organization_id,
            ids: Some(ids),
            include_inactive: false,
        }
    };
    BranchCommon::query(db, &query).await
}

pub async fn my_branches<D>(db: &mut D, ctx: &AuthContext) -> Result<MyBranches, Error>
where
    D: BranchCommon,
{
    let branch_ids = BranchCommon::assigned_ids(db, ctx.organization_id, ctx.user_id).await?;
    Ok(MyBranches {
        can_manage_all_data: ctx.can_manage_all_data(),
        branch_ids,
    })
}

pub async fn assign_user<D>(db: &mut D, ctx: &AuthContext, branch_id: Uuid, data: AssignUser) -> Result<(), Error>
where
    D: BranchCommon,
{
    if !ctx.can_manage_all_data() {
        return Err(Error::Forbidden("only owners and admins can assign branches".into()));
    }
    match BranchCommon::get(db, ctx.organization_id, branch_id).await? {
        Some(b) if b.is_active => {}
        Some(_) => return Err(Error::BusinessError("branch is inactive".into())),
        None => return Err(Error::NotFound(format!("branch({}) not found", branch_id))),
    }
    BranchCommon::assign_user(db, branch_id, data.user_id).await?;
    log::info!("user {} assigned user {} to branch {}", ctx.user_id, data.user_id, branch_id);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::Role;
    use crate::core::services::fake::{ctx, FakeStore};
    use chrono::Utc;

    fn branch(ctx: &AuthContext, is_active: bool) -> Branch {
        Branch {
            id: Uuid::new_v4(),
            organization_id: ctx.organization_id,
            name: "North campus".into(),
            address: None,
            is_active,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_member_lists_assigned_active_only() {
        let ctx = ctx(Role::Member);
        let assigned = Uuid::new_v4();
        let mut db = FakeStore {
            assigned: vec![assigned],
            ..Default::default()
        };
        let params = ListParams { include_inactive: true };
        list_branches(&mut db, &ctx, params).await.unwrap();
        assert_eq!(db.branch_queries[0], Query {
            organization_id: ctx.organization_id,
            ids: Some(vec![assigned]),
            include_inactive: false,
        });
    }

    #[tokio::test]
    async fn test_member_without_branches_lists_nothing() {
        let ctx = ctx(Role::Member);
        let mut db = FakeStore::default();
        assert!(list_branches(&mut db, &ctx, ListParams::default()).await.unwrap().is_empty());
        assert!(db.branch_queries.is_empty());
    }

    #[tokio::test]
    async fn test_my_branches() {
        let ctx = ctx(Role::Owner);
        let mut db = FakeStore::default();
        let mine = my_branches(&mut db, &ctx).await.unwrap();
        assert!(mine.can_manage_all_data);
        assert!(mine.branch_ids.is_empty());
    }

    #[tokio::test]
    async fn test_assign_user() {
        let admin = ctx(Role::Admin);
        let b = branch(&admin, true);
        let branch_id = b.id;
        let mut db = FakeStore {
            branches: vec![b],
            ..Default::default()
        };
        let user_id = Uuid::new_v4();
        assign_user(&mut db, &admin, branch_id, AssignUser { user_id }).await.unwrap();
        assert_eq!(db.assignments, vec![(branch_id, user_id)]);
        let member = AuthContext::new(Uuid::new_v4(), admin.organization_id, Role::BranchAdmin);
        assert!(matches!(assign_user(&mut db, &member, branch_id, AssignUser { user_id }).await, Err(Error::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_assign_to_inactive_branch() {
        let admin = ctx(Role::Admin);
        let b = branch(&admin, false);
        let branch_id = b.id;
        let mut db = FakeStore {
            branches: vec![b],
            ..Default::default()
        };
        let res = assign_user(&mut db, &admin, branch_id, AssignUser { user_id: Uuid::new_v4() }).await;
        assert!(matches!(res, Err(Error::BusinessError(_))));
    }
}
