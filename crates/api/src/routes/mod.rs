pub mod health;

use axum::routing::post;
use axum::Router;

use crate::handlers::optimization;
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// POST   /dna-optimization     -> optimize
/// *      /dna-optimization     -> method_not_allowed (400)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().route(
        "/dna-optimization",
        post(optimization::optimize).fallback(optimization::method_not_allowed),
    )
}
