//! Application wiring.
//!
//! `AppState` owns the services, built once from explicitly passed stores and
//! collaborators. `AppState::configure` registers them with an actix `App`,
//! together with the extractor configs and the authenticated `/api` scope.

use actix_web::{error, web, HttpRequest};
use std::sync::Arc;

use crate::accounts::AccountService;
use crate::auth::{AuthMiddleware, PasswordHasher, SessionVerifier, TokenIssuer};
use crate::avatar::{AvatarStorage, MemoryAvatarStorage, MAX_AVATAR_BYTES};
use crate::error::AppError;
use crate::events::EventHooks;
use crate::routes;
use crate::store::{MemoryTaskStore, MemoryUserStore, TaskStore, UserStore};
use crate::tasks::TaskService;

#[derive(Clone)]
pub struct AppState {
    pub accounts: web::Data<AccountService>,
    pub tasks: web::Data<TaskService>,
    pub verifier: Arc<SessionVerifier>,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserStore>,
        tasks: Arc<dyn TaskStore>,
        avatars: Arc<dyn AvatarStorage>,
        tokens: TokenIssuer,
        passwords: PasswordHasher,
        hooks: EventHooks,
    ) -> Self {
        let verifier = Arc::new(SessionVerifier::new(tokens.clone(), Arc::clone(&users)));
        let accounts = AccountService::new(
            users,
            Arc::clone(&tasks),
            avatars,
            tokens,
            passwords,
            hooks,
        );

        Self {
            accounts: web::Data::new(accounts),
            tasks: web::Data::new(TaskService::new(tasks)),
            verifier,
        }
    }

    /// Everything in process memory; used by tests and `STORE=memory`.
    pub fn in_memory(jwt_secret: &str, bcrypt_cost: u32, hooks: EventHooks) -> Self {
        Self::new(
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemoryTaskStore::new()),
            Arc::new(MemoryAvatarStorage::new()),
            TokenIssuer::new(jwt_secret),
            PasswordHasher::new(bcrypt_cost),
            hooks,
        )
    }

    /// Registers shared data, extractor configs and the `/api` routes.
    ///
    /// Usage: `App::new().configure(|cfg| state.configure(cfg))`.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.accounts.clone())
            .app_data(self.tasks.clone())
            .app_data(json_config())
            .app_data(query_config())
            .app_data(web::PayloadConfig::new(2 * MAX_AVATAR_BYTES))
            .service(routes::health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware::new(Arc::clone(&self.verifier)))
                    .configure(routes::config),
            );
    }
}

/// Body parse failures, unknown fields included, are validation errors.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: error::JsonPayloadError, _req: &HttpRequest| {
        AppError::ValidationError(err.to_string()).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(
        |err: error::QueryPayloadError, _req: &HttpRequest| {
            AppError::ValidationError(err.to_string()).into()
        },
    )
}
