#![doc = "The `tasklane` library crate."]
#![doc = ""]
#![doc = "Domain models, storage, session-bound authentication, routing and error"]
#![doc = "handling for the task service. The binary (`main.rs`) wires these pieces"]
#![doc = "to Postgres and Redis and runs the HTTP server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod response;
pub mod routes;
pub mod state;

pub use crate::error::AppError;
pub use crate::state::AppState;
