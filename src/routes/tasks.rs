use crate::{
    auth::AuthSession,
    error::AppError,
    models::{TaskInput, TaskListOptions, TaskQuery, TaskUpdate},
    tasks::{parse_task_id, TaskService},
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};

/// Retrieves the authenticated user's tasks.
///
/// ## Query Parameters:
/// - `completed` (optional): `true` or `false`.
/// - `limit` (optional): page size, 1 to 100.
/// - `skip` (optional): number of tasks to skip.
/// - `sortBy` (optional): `<field>:<asc|desc>` where field is one of
///   `createdAt`, `updatedAt`, `description`, `completed`.
///
/// ## Responses:
/// - `200 OK`: JSON array of `Task` objects.
/// - `400 Bad Request`: malformed query parameters.
/// - `401 Unauthorized`: missing, invalid or revoked token.
#[get("")]
pub async fn get_tasks(
    tasks: web::Data<TaskService>,
    session: AuthSession,
    query: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    let options = TaskListOptions::try_from(query.into_inner())?;
    let tasks = tasks.list(&session, options).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task owned by the authenticated user.
///
/// ## Request Body:
/// - `description`: required, 1 to 1000 characters.
/// - `completed` (optional): defaults to `false`.
///
/// ## Responses:
/// - `201 Created`: the new `Task`.
/// - `400 Bad Request`: invalid or unknown fields.
#[post("")]
pub async fn create_task(
    tasks: web::Data<TaskService>,
    session: AuthSession,
    body: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    let task = tasks.create(&session, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(task))
}

/// ## Responses:
/// - `200 OK`: the `Task`.
/// - `404 Not Found`: no such task, or it belongs to someone else.
#[get("/{id}")]
pub async fn get_task(
    tasks: web::Data<TaskService>,
    session: AuthSession,
    path: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let task = tasks.get(&session, parse_task_id(&path)?).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Only `description` and `completed` may be changed.
#[patch("/{id}")]
pub async fn update_task(
    tasks: web::Data<TaskService>,
    session: AuthSession,
    path: web::Path<String>,
    body: web::Json<TaskUpdate>,
) -> Result<impl Responder, AppError> {
    let id = parse_task_id(&path)?;
    let task = tasks.update(&session, id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Returns the deleted task.
#[delete("/{id}")]
pub async fn delete_task(
    tasks: web::Data<TaskService>,
    session: AuthSession,
    path: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let task = tasks.delete(&session, parse_task_id(&path)?).await?;
    Ok(HttpResponse::Ok().json(task))
}
