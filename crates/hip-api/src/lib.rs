//! Gateway-facing HTTP API for the HIP bridge.
//!
//! Every endpoint follows the same accept-then-callback flow: the body is
//! validated, a [`Job`] is queued for the background worker, and the handler
//! answers `202 Accepted`. Results reach the gateway on its callback paths.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let (queue, jobs) = JobQueue::bounded(64);
//! let app = hip_api::api_router(queue);
//! ```

pub mod discovery;
pub mod error;
pub mod jobs;
pub mod link;

use axum::{Router, routing::post};

pub use error::ApiError;
pub use jobs::{Job, JobQueue};

/// Build the API router feeding `queue`.
pub fn api_router(queue: JobQueue) -> Router<()> {
  Router::new()
    .route("/v1/care-contexts/discover", post(discovery::handler))
    .route("/v1/links/link/init", post(link::init))
    .route("/v1/links/link/confirm", post(link::confirm))
    .with_state(queue)
}
