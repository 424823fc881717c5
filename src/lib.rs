#![doc = "The `tasktrack` library crate."]
#![doc = ""]
#![doc = "Session-token authentication and ownership-scoped task storage for a"]
#![doc = "multi-user task tracking API. The binary (`main.rs`) only reads the"]
#![doc = "configuration, picks a store backend and serves `app::AppState`."]

pub mod accounts;
pub mod app;
pub mod auth;
pub mod avatar;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod routes;
pub mod store;
pub mod tasks;
