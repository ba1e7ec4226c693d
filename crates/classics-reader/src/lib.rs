//! HTTP surface over the classical-text lookup core.
//!
//! One JSON endpoint per query function; see [`router`] for the routes.

pub mod handlers;

pub use handlers::{ApiError, AppState, router};
