use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, HttpMessage, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use std::sync::Arc;

use crate::auth::session::SessionVerifier;

/// Routes reachable without a session.
const PUBLIC_ROUTES: &[(&str, &str)] = &[("POST", "/api/users"), ("POST", "/api/users/login")];

/// Returns the bearer token from the `Authorization` header, or an empty
/// string when the header is absent or not a bearer credential.
pub fn bearer_token(req: &ServiceRequest) -> String {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .unwrap_or_default()
}

fn is_public(req: &ServiceRequest) -> bool {
    let path = req.path().trim_end_matches('/');
    PUBLIC_ROUTES
        .iter()
        .any(|(method, route)| req.method().as_str() == *method && path == *route)
}

/// Authenticates every non-public request and stores the resulting
/// `AuthSession` in the request extensions.
pub struct AuthMiddleware {
    verifier: Arc<SessionVerifier>,
}

impl AuthMiddleware {
    pub fn new(verifier: Arc<SessionVerifier>) -> Self {
        Self { verifier }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            verifier: Arc::clone(&self.verifier),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    verifier: Arc<SessionVerifier>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        if is_public(&req) {
            return Box::pin(async move {
                service
                    .call(req)
                    .await
                    .map(ServiceResponse::map_into_left_body)
            });
        }

        let verifier = Arc::clone(&self.verifier);
        let token = bearer_token(&req);

        Box::pin(async move {
            match verifier.verify(&token).await {
                Ok(session) => {
                    req.extensions_mut().insert(session);
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                Err(app_err) => {
                    log::debug!("rejected request to {}: {}", req.path(), app_err);
                    let response = app_err.error_response().map_into_right_body();
                    Ok(req.into_response(response))
                }
            }
        })
    }
}
