use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use storage::Database;

use super::handlers::{create_stage, delete_stage, list_stages, update_stage};
use crate::middleware::auth::{require_auth, ApiKeys};

pub fn routes(api_keys: ApiKeys) -> Router<Database> {
    let protected = Router::new()
        .route("/", post(create_stage))
        .route("/:id", put(update_stage).delete(delete_stage))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    Router::new()
        .route("/", get(list_stages))
        .merge(protected)
}
