//! HTTP API layer for caption-battle.
//!
//! - **Endpoints**: vote submission, battle generation, feed and leaderboard
//! - **Extractors**: optional and required voter identity
//! - **Middleware**: bearer token resolution, application state
//!
//! Built on Axum 0.8. Every endpoint is a JSON `POST`.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
