#![forbid(unsafe_code)]
//! Blogly: a small server-rendered user directory.
//!
//! [`app`] builds the axum router over any [`blogly_core::Repository`] of
//! users; [`db::connect`] picks the backend from a database URL.

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod telemetry;
pub mod views;

pub use blogly_core::{Repository, User, UserForm, DEFAULT_IMAGE_URL};
pub use config::Config;
pub use error::AppError;
pub use routes::{app, AppState};
