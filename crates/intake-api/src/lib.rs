//! Intake API Library
//!
//! HTTP triggers for the ingestion pipeline and application setup.

pub mod constants;
pub mod error;
mod handlers;
pub mod setup;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
