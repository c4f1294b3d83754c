//! Library crate for gauntlet-back, exposing modules for binaries and integration tests.

pub mod config;
pub mod dao;
pub mod dto;
mod error;
pub mod games;
#[cfg(feature = "notifier")]
pub mod notifier;
pub mod routes;
pub mod services;
pub mod state;

pub use error::{AppError, ServiceError};
