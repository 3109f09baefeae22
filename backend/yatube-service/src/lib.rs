/// Yatube Service Library
///
/// A blogging platform: authors publish posts (optionally in a group and with
/// an image), readers comment and follow authors to get a personal feed.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route table
/// - `services`: Business logic layer
/// - `db`: Repository trait with PostgreSQL and in-memory backends
/// - `cache`: Page cache for the index page
/// - `forms`: Form parsing and validation
/// - `pagination`: Page-number pagination
/// - `middleware`: Bearer token authentication and the `CurrentUser` extractor
/// - `media`: Storage for uploaded post images
/// - `auth`: Password hashing and access tokens
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Observability and metrics collection
pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod media;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod services;
pub mod state;
pub mod urls;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
