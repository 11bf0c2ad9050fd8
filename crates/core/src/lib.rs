#![forbid(unsafe_code, clippy::unwrap_used)]
#![allow(clippy::needless_return)]
#![warn(clippy::await_holding_lock, clippy::inefficient_to_string)]

pub mod config;
pub mod connection;
pub mod constants;
pub mod database;
pub mod rest_api;
pub mod sql_to_json;

mod logging;
mod server;
mod util;

#[cfg(test)]
mod test;

pub use config::{ConfigError, DatabaseConfig, Dsn};
pub use database::{Database, DatabaseError, ErrorPayload, Record};
pub use rest_api::{RestApi, RestApiError};
pub use server::{InitError, Server, ServerOptions, init_rest_api};
