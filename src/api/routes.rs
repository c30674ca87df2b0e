use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{make_span_with_request_id, navigation_guard, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the application router
///
/// Every `GET` outside `/health` and `/auth/*` is a page and passes the navigation guard.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Pages
        .route("/landing", get(handlers::landing))
        .route("/", get(handlers::browse))
        .route("/trending", get(handlers::trending))
        .route("/search", get(handlers::search))
        .route("/movie/:id", get(handlers::movie))
        .route("/categories", get(handlers::categories))
        .route("/categories/:genre_id", get(handlers::category))
        .route(
            "/wishlist",
            get(handlers::wishlist).post(handlers::save_movie),
        )
        // Load more
        .route("/browse/more", post(handlers::browse_more))
        .route("/trending/more", post(handlers::trending_more))
        .route("/search/more", post(handlers::search_more))
        // Wishlist
        .route("/wishlist/:id", delete(handlers::remove_movie))
        // Session
        .route("/auth/sign-in", post(handlers::sign_in))
        .route("/auth/sign-out", post(handlers::sign_out))
        .route("/auth/session", get(handlers::session))
        .fallback(handlers::fallback)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn_with_state(state.clone(), navigation_guard)),
        )
        .with_state(state)
}
