/// HTTP authentication for yatube-service
///
/// [`AuthenticationMiddleware`] resolves an optional Bearer token into an
/// [`AuthenticatedUser`] request extension. It never rejects a request: a
/// missing or bad token just leaves the request anonymous. Handlers decide
/// what anonymous access means through the [`CurrentUser`] extractor.
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::auth::TokenService;
use crate::error::AppError;

/// Identity stored in request extensions after a token validates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub username: String,
}

/// Actix middleware that validates a Bearer token when one is present.
#[derive(Clone)]
pub struct AuthenticationMiddleware {
    tokens: Arc<TokenService>,
}

impl AuthenticationMiddleware {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthenticationMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthenticationMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthenticationMiddlewareService {
            service: Rc::new(service),
            tokens: self.tokens.clone(),
        }))
    }
}

pub struct AuthenticationMiddlewareService<S> {
    service: Rc<S>,
    tokens: Arc<TokenService>,
}

impl<S, B> Service<ServiceRequest> for AuthenticationMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        let token = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string());

        if let Some(token) = token {
            match self.tokens.validate(&token).and_then(|claims| {
                let id = claims.user_id()?;
                Ok(AuthenticatedUser {
                    id,
                    username: claims.username,
                })
            }) {
                Ok(user) => {
                    req.extensions_mut().insert(user);
                }
                Err(e) => {
                    debug!(error = %e, path = %req.path(), "Ignoring invalid bearer token");
                }
            }
        }

        Box::pin(async move { service.call(req).await })
    }
}

/// Logged-in user. Anonymous requests are redirected to the login page with
/// the requested path in `next`.
///
/// Use `Option<CurrentUser>` where login is optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub AuthenticatedUser);

impl CurrentUser {
    pub fn id(&self) -> Uuid {
        self.0.id
    }

    pub fn username(&self) -> &str {
        &self.0.username
    }
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthenticatedUser>()
                .cloned()
                .map(CurrentUser)
                .ok_or_else(|| AppError::LoginRequired {
                    next: requested_path(req),
                }),
        )
    }
}

fn requested_path(req: &HttpRequest) -> String {
    req.uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.path().to_string())
}
