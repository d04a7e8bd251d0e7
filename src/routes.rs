pub mod actors;
pub mod cinemas;
pub mod genres;
pub mod movies;
pub mod users;

use std::sync::Arc;

use axum::{Router, middleware, routing::MethodRouter};

use crate::{
    AppState,
    cache::{CacheScope, output_cache},
};

pub fn api(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api/genres", genres::router(state))
        .nest("/api/actors", actors::router())
        .nest("/api/cinemas", cinemas::router())
        .nest("/api/movies", movies::router(state))
        .nest("/api/users", users::router())
}

/// Puts the methods routed so far behind the output cache for `tag`. Methods
/// chained afterwards are not cached.
fn cached(
    route: MethodRouter<Arc<AppState>>,
    state: &AppState,
    tag: &'static str,
) -> MethodRouter<Arc<AppState>> {
    route.layer(middleware::from_fn_with_state(CacheScope::new(&state.cache, tag), output_cache))
}
