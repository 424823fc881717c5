use crate::{
    accounts::AccountService,
    auth::AuthSession,
    error::AppError,
    models::{LoginRequest, ProfileUpdate, SignUpRequest},
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use serde_json::json;

/// Register a new user
///
/// Creates the account and its first session.
///
/// ## Responses:
/// - `201 Created`: `{ user, token }`.
/// - `400 Bad Request`: invalid fields, unknown fields, or an email already in use.
#[post("")]
pub async fn sign_up(
    accounts: web::Data<AccountService>,
    body: web::Json<SignUpRequest>,
) -> Result<impl Responder, AppError> {
    let response = accounts.sign_up(body.into_inner()).await?;
    log::info!("user {} signed up", response.user.id);
    Ok(HttpResponse::Created().json(response))
}

/// Login user
///
/// Opens an additional session; sessions on other devices stay valid.
///
/// ## Responses:
/// - `200 OK`: `{ user, token }`.
/// - `401 Unauthorized`: unknown email or wrong password, reported identically.
#[post("/login")]
pub async fn login(
    accounts: web::Data<AccountService>,
    body: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let response = accounts.login(body.into_inner()).await?;
    log::info!("user {} logged in", response.user.id);
    Ok(HttpResponse::Ok().json(response))
}

/// Revokes the token this request was made with.
#[post("/logout")]
pub async fn logout(
    accounts: web::Data<AccountService>,
    session: AuthSession,
) -> Result<impl Responder, AppError> {
    accounts.logout(&session).await?;
    log::info!("user {} logged out", session.user.id);
    Ok(HttpResponse::Ok().json(json!({})))
}

/// Revokes every token held by the caller.
#[post("/logoutAll")]
pub async fn logout_all(
    accounts: web::Data<AccountService>,
    session: AuthSession,
) -> Result<impl Responder, AppError> {
    accounts.logout_all(&session).await?;
    log::info!("user {} logged out of all sessions", session.user.id);
    Ok(HttpResponse::Ok().json(json!({})))
}

#[get("/me")]
pub async fn read_profile(session: AuthSession) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(session.user))
}

/// Updates the caller's profile.
///
/// Only `name`, `email`, `password` and `age` are accepted; anything else is
/// rejected with `400` before the store is touched.
#[patch("/me")]
pub async fn update_profile(
    accounts: web::Data<AccountService>,
    session: AuthSession,
    body: web::Json<ProfileUpdate>,
) -> Result<impl Responder, AppError> {
    let user = accounts.update_profile(&session, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user))
}

#[delete("/me")]
pub async fn delete_account(
    accounts: web::Data<AccountService>,
    session: AuthSession,
) -> Result<impl Responder, AppError> {
    let user = accounts.delete_account(&session).await?;
    log::info!("user {} deleted their account", user.id);
    Ok(HttpResponse::Ok().json(user))
}

/// Upload an avatar
///
/// The request body is the raw PNG or JPEG image (at most 1 MiB).
#[post("/me/avatar")]
pub async fn upload_avatar(
    accounts: web::Data<AccountService>,
    session: AuthSession,
    body: web::Bytes,
) -> Result<impl Responder, AppError> {
    let user = accounts.set_avatar(&session, &body).await?;
    Ok(HttpResponse::Ok().json(user))
}

#[delete("/me/avatar")]
pub async fn delete_avatar(
    accounts: web::Data<AccountService>,
    session: AuthSession,
) -> Result<impl Responder, AppError> {
    let user = accounts.remove_avatar(&session).await?;
    Ok(HttpResponse::Ok().json(user))
}

#[get("/me/avatar")]
pub async fn read_avatar(
    accounts: web::Data<AccountService>,
    session: AuthSession,
) -> Result<impl Responder, AppError> {
    let avatar = accounts.avatar(&session)?;
    Ok(HttpResponse::Ok().json(avatar))
}
