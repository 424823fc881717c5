pub mod health;
pub mod tasks;
pub mod users;

use actix_web::web;

/// Registers the routes mounted under `/api`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .service(users::sign_up)
            .service(users::login)
            .service(users::logout)
            .service(users::logout_all)
            .service(users::read_profile)
            .service(users::update_profile)
            .service(users::delete_account)
            .service(users::upload_avatar)
            .service(users::delete_avatar)
            .service(users::read_avatar),
    )
    .service(
        web::scope("/tasks")
            .service(tasks::get_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    );
}
