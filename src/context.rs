use crate::actix_web::dev::Payload;
use crate::actix_web::{self, FromRequest, HttpMessage};
use crate::serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Admin,
    FinanceManager,
    BranchAdmin,
    Member,
}

impl Role {
    /// Unknown role names get the least privileged role.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "owner" => Role::Owner,
            "admin" => Role::Admin,
            "finance_manager" => Role::FinanceManager,
            "branch_admin" => Role::BranchAdmin,
            _ => Role::Member,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserInfo {
    pub id: Uuid,
}

impl FromRequest for UserInfo {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;
    fn from_request(req: &actix_web::HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(user) = req.extensions().get::<Self>() {
            ready(Ok(user.clone()))
        } else {
            ready(Err(actix_web::error::ErrorUnauthorized("unauthorized")))
        }
    }
}

#[derive(Debug, Clone)]
pub struct Membership {
    pub organization_id: Uuid,
    pub role: Role,
}

/// Who is asking and on behalf of which organization. Every service call takes one.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub role: Role,
}

impl AuthContext {
    pub fn new(user_id: Uuid, organization_id: Uuid, role: Role) -> Self {
        Self { user_id, organization_id, role }
    }

    pub fn can_manage_all_data(&self) -> bool {
        matches!(self.role, Role::Owner | Role::Admin)
    }

    /// Non-privileged callers may only touch rows they created.
    pub fn owner_filter(&self) -> Option<Uuid> {
        if self.can_manage_all_data() {
            None
        } else {
            Some(self.user_id)
        }
    }
}

impl FromRequest for AuthContext {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;
    fn from_request(req: &actix_web::HttpRequest, _: &mut Payload) -> Self::Future {
        let extensions = req.extensions();
        match (extensions.get::<UserInfo>(), extensions.get::<Membership>()) {
            (Some(user), Some(membership)) => ready(Ok(AuthContext::new(user.id, membership.organization_id, membership.role))),
            (None, _) => ready(Err(actix_web::error::ErrorUnauthorized("unauthorized"))),
            (Some(_), None) => ready(Err(actix_web::error::ErrorForbidden("not a member of this organization"))),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("Admin"), Role::Admin);
        assert_eq!(Role::parse("finance_manager"), Role::FinanceManager);
        assert_eq!(Role::parse("usher"), Role::Member);
    }

    #[test]
    fn test_manage_all_data() {
        let uid = Uuid::new_v4();
        let oid = Uuid::new_v4();
        assert!(AuthContext::new(uid, oid, Role::Owner).can_manage_all_data());
        assert!(AuthContext::new(uid, oid, Role::Admin).can_manage_all_data());
        assert!(!AuthContext::new(uid, oid, Role::BranchAdmin).can_manage_all_data());
        assert_eq!(AuthContext::new(uid, oid, Role::Member).owner_filter(), Some(uid));
        assert_eq!(AuthContext::new(uid, oid, Role::Admin).owner_filter(), None);
    }
}
