use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::AppResult,
    models::{IdpCredential, Movie, SessionState, UserIdentity},
    services::navigation::{search_route, HOME_PATH},
    views::{
        BrowseView, CategoriesView, DetailView, LandingView, SearchView, TrendingView,
        WishlistView,
    },
};

use super::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TextQuery {
    #[serde(default)]
    pub q: String,
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Unknown paths go home
pub async fn fallback() -> Redirect {
    Redirect::temporary(HOME_PATH)
}

// Pages

pub async fn landing(State(state): State<AppState>) -> Json<LandingView> {
    Json(state.screens.landing.load().await)
}

pub async fn browse(State(state): State<AppState>) -> Json<BrowseView> {
    Json(state.screens.browse.load().await)
}

pub async fn trending(
    State(state): State<AppState>,
    Query(params): Query<TextQuery>,
) -> Json<TrendingView> {
    Json(state.screens.trending.load(&params.q).await)
}

/// Untrimmed queries are redirected to their canonical `/search?q=` form first
pub async fn search(State(state): State<AppState>, Query(params): Query<TextQuery>) -> Response {
    if params.q != params.q.trim() {
        if let Some(canonical) = search_route(&params.q) {
            return Redirect::temporary(&canonical).into_response();
        }
    }
    Json(state.screens.search.search(&params.q).await).into_response()
}

pub async fn wishlist(State(state): State<AppState>) -> Json<WishlistView> {
    Json(state.screens.wishlist.view())
}

pub async fn movie(State(state): State<AppState>, Path(movie_id): Path<u64>) -> Response {
    let view = state.screens.details.load(movie_id).await;
    match view {
        DetailView::Found(_) => Json(view).into_response(),
        DetailView::NotFound { .. } => (StatusCode::NOT_FOUND, Json(view)).into_response(),
    }
}

pub async fn categories(State(state): State<AppState>) -> Json<CategoriesView> {
    Json(state.screens.categories.load().await)
}

pub async fn category(
    State(state): State<AppState>,
    Path(genre_id): Path<u64>,
) -> Json<CategoriesView> {
    Json(state.screens.categories.select(genre_id).await)
}

// Load more

pub async fn browse_more(State(state): State<AppState>) -> Json<BrowseView> {
    Json(state.screens.browse.load_more().await)
}

pub async fn trending_more(State(state): State<AppState>) -> Json<TrendingView> {
    Json(state.screens.trending.load_more().await)
}

pub async fn search_more(State(state): State<AppState>) -> Json<SearchView> {
    Json(state.screens.search.load_more().await)
}

// Wishlist actions

/// Refreshes expired tokens; a failed refresh has already ended the session
async fn refresh_session(state: &AppState) {
    if let Err(e) = state.identity.refresh_if_expired().await {
        tracing::debug!(error = %e, "Wishlist action without a session");
    }
}

/// Accepted rather than created: the wishlist view changes when the store's next
/// snapshot arrives
pub async fn save_movie(
    State(state): State<AppState>,
    Json(movie): Json<Movie>,
) -> AppResult<StatusCode> {
    refresh_session(&state).await;
    state.wishlist.save(&movie).await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn remove_movie(
    State(state): State<AppState>,
    Path(movie_id): Path<u64>,
) -> AppResult<StatusCode> {
    refresh_session(&state).await;
    state.wishlist.remove(movie_id).await?;
    Ok(StatusCode::ACCEPTED)
}

// Session

pub async fn sign_in(
    State(state): State<AppState>,
    Json(credential): Json<IdpCredential>,
) -> AppResult<Json<UserIdentity>> {
    let identity = state.identity.sign_in(&credential).await?;
    Ok(Json(identity))
}

pub async fn sign_out(State(state): State<AppState>) -> AppResult<StatusCode> {
    state.identity.sign_out().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn session(State(state): State<AppState>) -> Json<SessionState> {
    Json(state.identity.current())
}
