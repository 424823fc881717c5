use actix_cors::Cors;
use actix_web::{middleware::Logger, App, HttpServer};
use std::io;
use std::sync::Arc;

use tasktrack::app::AppState;
use tasktrack::auth::{PasswordHasher, TokenIssuer};
use tasktrack::avatar::DiskAvatarStorage;
use tasktrack::config::{Config, StoreBackend};
use tasktrack::db;
use tasktrack::events::EventHooks;
use tasktrack::store::{PgTaskStore, PgUserStore};

fn to_io_error<E: std::fmt::Display>(context: &str) -> impl FnOnce(E) -> io::Error + '_ {
    move |err| io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

async fn build_state(config: &Config) -> io::Result<AppState> {
    let hooks = EventHooks::new();

    match &config.store {
        StoreBackend::Postgres { database_url } => {
            let pool = db::connect(database_url)
                .await
                .map_err(to_io_error("failed to connect to database"))?;
            db::run_migrations(&pool)
                .await
                .map_err(to_io_error("failed to run migrations"))?;

            Ok(AppState::new(
                Arc::new(PgUserStore::new(pool.clone())),
                Arc::new(PgTaskStore::new(pool)),
                Arc::new(DiskAvatarStorage::new(config.avatar_dir.clone())),
                TokenIssuer::new(&config.jwt_secret),
                PasswordHasher::new(config.bcrypt_cost),
                hooks,
            ))
        }
        StoreBackend::Memory => {
            log::warn!("STORE=memory: accounts and tasks are lost on shutdown");
            Ok(AppState::in_memory(
                &config.jwt_secret,
                config.bcrypt_cost,
                hooks,
            ))
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(to_io_error("invalid configuration"))?;
    let state = build_state(&config).await?;

    log::info!("Starting tasktrack server at {}", config.server_url());

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(|cfg| state.configure(cfg))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
