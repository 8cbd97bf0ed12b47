use actix_service::{self, Transform};
use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse},
    Error, HttpMessage, HttpRequest,
};
use futures::{
    future::{ready, LocalBoxFuture, Ready},
    FutureExt,
};
use serde::{Deserialize, Serialize};
use std::{rc::Rc, str::FromStr};

use crate::error::{AppError, AppResult};

pub const USER_HEADER: &str = "X-Obra-User";
pub const ROLE_HEADER: &str = "X-Obra-Role";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Site manager.
    Jefe,
    /// Intern.
    Pasante,
}

impl FromStr for Role {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "jefe" | "manager" => Ok(Role::Jefe),
            "pasante" | "intern" => Ok(Role::Pasante),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionContext {
    pub user: String,
    pub role: Role,
}

impl SessionContext {
    pub fn new(user: impl Into<String>, role: Role) -> Self {
        SessionContext {
            user: user.into(),
            role,
        }
    }
    pub fn is_manager(&self) -> bool {
        self.role == Role::Jefe
    }
    fn from_request(req: &ServiceRequest) -> Option<Self> {
        let headers = req.headers();
        let user = headers.get(USER_HEADER)?.to_str().ok()?.trim();
        let role = headers.get(ROLE_HEADER)?.to_str().ok()?.parse().ok()?;
        if user.is_empty() {
            return None;
        }
        Some(SessionContext::new(user, role))
    }
}

pub type Session = Rc<SessionContext>;

/// Returns the caller's session or `UNAUTHORIZED` for anonymous requests.
pub fn issuer(req: &HttpRequest) -> AppResult<Session> {
    req.extensions()
        .get::<Session>()
        .cloned()
        .ok_or(AppError::Unauthorized)
}

/// Like [`issuer`], but interns get `FORBIDDEN`.
pub fn manager(req: &HttpRequest) -> AppResult<Session> {
    let session = issuer(req)?;
    if session.is_manager() {
        Ok(session)
    } else {
        Err(AppError::Forbidden)
    }
}

pub struct SessionMiddleware<S> {
    service: Rc<S>,
}
pub struct SessionMiddlewareFactory;

impl<S, B> Service<ServiceRequest> for SessionMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_service::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv: Rc<S> = self.service.clone();

        async move {
            if let Some(session) = SessionContext::from_request(&req) {
                req.extensions_mut().insert::<Session>(Rc::new(session));
            }
            let res: ServiceResponse<B> = srv.call(req).await?;
            Ok(res)
        }
        .boxed_local()
    }
}
impl<S, B> Transform<S, ServiceRequest> for SessionMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = SessionMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionMiddleware {
            service: Rc::new(service),
        }))
    }
}
