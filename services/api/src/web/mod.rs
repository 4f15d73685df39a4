pub mod dto;
pub mod extract;
pub mod middleware;
pub mod movie;
pub mod rest;
pub mod state;
pub mod ticket;
pub mod user;
pub mod watch;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use middleware::{require_auth, require_manager};
pub use state::{Adapters, AppState};

/// Builds the API router: public routes, routes for any signed-in user, and
/// catalog writes that additionally require the manager role.
pub fn router(state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/", get(rest::ping_handler))
        .route("/user/register", post(user::register_handler))
        .route("/user/login", post(user::login_handler));

    let manager_routes = Router::new()
        .route("/movie", post(movie::create_movie_handler))
        .route(
            "/movie/{id}",
            put(movie::update_movie_handler).delete(movie::delete_movie_handler),
        )
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), require_manager));

    let customer_routes = Router::new()
        .route("/movie", get(movie::list_movies_handler))
        .route("/ticket", post(ticket::book_ticket_handler))
        .route("/watch", post(watch::watch_handler))
        .route("/watch/history", get(watch::history_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .merge(manager_routes)
        .merge(customer_routes)
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
