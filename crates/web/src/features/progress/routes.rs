use axum::{
    middleware,
    routing::{post, put},
    Router,
};
use storage::Database;

use super::handlers::{set_feedback, submit};
use crate::middleware::auth::{require_auth, ApiKeys};

pub fn routes(api_keys: ApiKeys) -> Router<Database> {
    let protected = Router::new()
        .route("/:id/feedback", put(set_feedback))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    Router::new()
        .route("/:id/submit", post(submit))
        .merge(protected)
}
