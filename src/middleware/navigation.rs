use axum::{
    extract::{Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;

use crate::{
    api::AppState,
    error::AppError,
    services::navigation::{guard, Navigation, Route},
};

/// Seconds a client should wait before retrying while the session resolves
pub const RETRY_AFTER_SECS: &str = "1";

/// `GET` paths that are not pages
const UNGUARDED_PREFIXES: [&str; 2] = ["/health", "/auth/"];

/// `POST` actions that page through a protected screen's catalog
const GUARDED_ACTIONS: [&str; 3] = ["/browse/more", "/trending/more", "/search/more"];

enum Guarded {
    Page(Route),
    Action,
    Open,
}

fn classify(request: &Request) -> Guarded {
    let path = request.uri().path();
    let method = request.method();

    if method == Method::GET && !UNGUARDED_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        Guarded::Page(Route::from_uri(request.uri()))
    } else if method == Method::POST && GUARDED_ACTIONS.contains(&path) {
        Guarded::Action
    } else {
        Guarded::Open
    }
}

fn loading() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        [(header::RETRY_AFTER, RETRY_AFTER_SECS)],
        Json(json!({ "loading": true })),
    )
        .into_response()
}

/// Applies the navigation guard to pages and catalog actions; everything else passes
/// through.
///
/// Expired tokens are refreshed first, so a session whose refresh fails is treated as
/// signed out.
pub async fn navigation_guard(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let guarded = classify(&request);
    if matches!(guarded, Guarded::Open) {
        return next.run(request).await;
    }

    if let Err(e) = state.identity.refresh_if_expired().await {
        tracing::debug!(error = %e, path = %request.uri().path(), "Guarding without a session");
    }
    let session = state.identity.current();

    match guarded {
        Guarded::Open => next.run(request).await,
        Guarded::Action if !session.resolved => loading(),
        Guarded::Action if !session.is_authenticated() => {
            AppError::Unauthenticated.into_response()
        }
        Guarded::Action => next.run(request).await,
        Guarded::Page(route) => {
            match guard(session.resolved, session.is_authenticated(), &route) {
                Navigation::Render(_) => next.run(request).await,
                Navigation::ShowLoading => loading(),
                Navigation::Redirect(to) => {
                    tracing::debug!(from = %request.uri().path(), to, "Guard redirect");
                    Redirect::temporary(to).into_response()
                }
            }
        }
    }
}
