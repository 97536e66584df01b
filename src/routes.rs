use crate::{
    handlers, // Import handlers module
    AppState,
};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, MethodRouter},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

const MAX_BODY_BYTES: usize = 1024 * 1024;

// Serves `path` both with and without its trailing slash.
fn route_both(
    router: Router<Arc<AppState>>,
    path: &str,
    handler: MethodRouter<Arc<AppState>>,
) -> Router<Arc<AppState>> {
    let bare = path.trim_end_matches('/');
    router.route(path, handler.clone()).route(bare, handler)
}

/// Creates the Axum router and associates routes with handlers.
pub fn create_router(state: Arc<AppState>) -> Router {
    let routes = [
        ("/signup/", post(handlers::signup)),
        ("/login/", post(handlers::login)),
        ("/logout/", post(handlers::logout)),
        ("/api/memes/", post(handlers::create_meme).get(handlers::list_memes)),
        ("/api/memes/random/", get(handlers::random_meme)),
        ("/api/memes/top/", get(handlers::top_memes)),
        ("/api/memes/{id}/", get(handlers::get_meme)),
        ("/api/memes/{id}/rate/", post(handlers::rate_meme)),
        ("/api/meme_template/create/", post(handlers::create_template)),
        ("/api/templates/", get(handlers::list_templates)),
    ];

    routes
        .into_iter()
        .fold(Router::new(), |router, (path, handler)| route_both(router, path, handler))
        // Middleware Layers
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state) // Pass the application state
}
