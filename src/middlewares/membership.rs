use crate::actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorBadRequest, ErrorForbidden, ErrorInternalServerError, ErrorUnauthorized},
    HttpMessage,
};
use crate::context::{Membership, Role, UserInfo};
use crate::error::Error;
use sqlx::{query_scalar, PgPool};
use std::future::{ready, Future, Ready};
use std::pin::Pin;
use std::rc::Rc;
use std::task::Poll;
use uuid::Uuid;

/// Resolves the caller's role in the organization named by the path and makes it
/// available as `Membership`. Callers outside the organization get 403.
pub struct OrganizationMember {
    db: PgPool,
    path_arg_name: String,
}

impl OrganizationMember {
    pub fn new(db: PgPool, path_arg_name: &str) -> Self {
        Self {
            db,
            path_arg_name: path_arg_name.into(),
        }
    }
}

impl<S> Transform<S, ServiceRequest> for OrganizationMember
where
    S: Service<ServiceRequest, Response = ServiceResponse, Error = actix_web::Error> + 'static,
    S::Future: 'static,
{
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type Response = S::Response;
    type Error = S::Error;
    type InitError = ();
    type Transform = OrganizationMemberMiddleware<S>;
    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(OrganizationMemberMiddleware {
            db: self.db.clone(),
            path_arg_name: self.path_arg_name.clone(),
            service: Rc::new(service),
        }))
    }
}

pub struct OrganizationMemberMiddleware<S> {
    db: PgPool,
    path_arg_name: String,
    service: Rc<S>,
}

impl<S> Service<ServiceRequest> for OrganizationMemberMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse, Error = actix_web::Error> + 'static,
    S::Future: 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<ServiceResponse, Self::Error>>>>;
    fn poll_ready(&self, ctx: &mut std::task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let uid = req.extensions().get::<UserInfo>().map(|u| u.id);
        let oid = req.match_info().get(&self.path_arg_name).map(|v| v.parse::<Uuid>());
        let db = self.db.clone();
        let service = self.service.clone();
        Box::pin(async move {
            let uid = uid.ok_or_else(|| ErrorUnauthorized("unauthorized"))?;
            let oid = match oid {
                Some(Ok(oid)) => oid,
                Some(Err(_)) => return Err(ErrorBadRequest("invalid organization id")),
                None => return Err(ErrorInternalServerError("membership check mounted without an organization path argument")),
            };
            let role: Option<String> = query_scalar("SELECT role FROM organization_users WHERE organization_id = $1 AND user_id = $2")
                .bind(oid)
                .bind(uid)
                .fetch_optional(&db)
                .await
                .map_err(Error::from)?;
            match role {
                None => Err(ErrorForbidden("not a member of this organization")),
                Some(role) => {
                    req.extensions_mut().insert(Membership {
                        organization_id: oid,
                        role: Role::parse(&role),
                    });
                    service.call(req).await
                }
            }
        })
    }
}
