use axum::{
    middleware,
    routing::{get, put},
    Router,
};
use storage::Database;

use super::handlers::{create_registration, get_progress, list_registrations, update_status};
use crate::middleware::auth::{require_auth, ApiKeys};

pub fn routes(api_keys: ApiKeys) -> Router<Database> {
    let protected = Router::new()
        .route("/:id/status", put(update_status))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    Router::new()
        .route("/", get(list_registrations).post(create_registration))
        .route("/:id/progress", get(get_progress))
        .merge(protected)
}
