//! # dobby-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **JSON REST API** for managing automations
//!   (`/api/automations`, `/api/automations/{id}`)
//! - Report liveness and device bus connectivity on `/health`
//! - Map HTTP requests into engine calls (driving adapter)
//! - Map engine results and errors into HTTP responses
//!
//! ## Dependency rule
//! Depends on `dobby-app` (for the engine and port traits) and `dobby-domain`
//! (for domain types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;

pub use router::build;
pub use state::AppState;
