use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::session::AuthSession;
use crate::error::AppError;

/// Extracts the `AuthSession` that `AuthMiddleware` attached to the request.
///
/// Handlers take this by value; it is the only source of the caller's identity.
/// A missing session means the middleware did not run and is reported as an
/// authentication failure.
impl FromRequest for AuthSession {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthSession>().cloned() {
            Some(session) => ready(Ok(session)),
            None => ready(Err(AppError::Unauthorized.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use chrono::Utc;
    use uuid::Uuid;

    fn session() -> AuthSession {
        let now = Utc::now();
        AuthSession {
            user: User {
                id: Uuid::new_v4(),
                name: "Ada".into(),
                email: "ada@example.com".into(),
                password_hash: String::new(),
                age: 0,
                avatar: None,
                sessions: Vec::new(),
                created_at: now,
                updated_at: now,
            },
            token: "token".into(),
        }
    }

    #[actix_rt::test]
    async fn test_auth_session_extractor_success() {
        let req = test::TestRequest::default().to_http_request();
        let expected = session();
        req.extensions_mut().insert(expected.clone());

        let mut payload = Payload::None;
        let extracted = AuthSession::from_request(&req, &mut payload).await.unwrap();
        assert_eq!(extracted.user, expected.user);
        assert_eq!(extracted.token, "token");
    }

    #[actix_rt::test]
    async fn test_auth_session_extractor_failure() {
        let req = test::TestRequest::default().to_http_request();

        let mut payload = Payload::None;
        let err = AuthSession::from_request(&req, &mut payload)
            .await
            .unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }
}
