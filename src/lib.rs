//! Cookie and Redis backed sessions for the author/book catalog API.
//!
//! [`routes::api`] mounts the account routes; an outer server can also use
//! [`auth::session`] and [`auth::finalize`] directly around its own handlers.

pub mod accounts;
pub mod auth;
pub mod config;
pub mod cookie;
pub mod database;
pub mod environment;
pub mod keys;
pub mod model;
pub mod problem;
pub mod routes;
pub mod session;

pub use config::Settings;
pub use environment::Environment;
