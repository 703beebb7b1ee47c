use axum::{middleware, routing::post, Router};
use storage::Database;

use super::handlers::run_sweep;
use crate::middleware::auth::{require_auth, ApiKeys};

pub fn routes(api_keys: ApiKeys) -> Router<Database> {
    Router::new()
        .route("/sweep", post(run_sweep))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth))
}
