//! Restaurant feedback service: public submissions, a paginated public
//! listing with like/dislike voting, and a cookie-guarded staff dashboard
//! API for moderation, all over a single SQLite table.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod validation;
