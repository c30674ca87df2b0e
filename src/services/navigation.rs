/// Navigation guard
///
/// Decides, from the session state alone, whether a page request renders, redirects, or
/// waits for the initial auth check.
use std::collections::HashMap;

use axum::{extract::Query, http::Uri};

pub const LANDING_PATH: &str = "/landing";
pub const HOME_PATH: &str = "/";

/// Page routes known to the app
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Landing,
    Browse,
    Trending { q: Option<String> },
    Wishlist,
    Search { q: Option<String> },
    Movie { id: u64 },
    Categories { genre_id: Option<u64> },
    Unknown,
}

impl Route {
    /// Classifies `path`; `q` is the decoded `q` query parameter, if any
    pub fn parse(path: &str, q: Option<&str>) -> Self {
        let q = q.map(str::to_string);
        let segments: Vec<&str> = path
            .trim_matches('/')
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();

        match segments.as_slice() {
            [] => Route::Browse,
            ["landing"] => Route::Landing,
            ["trending"] => Route::Trending { q },
            ["wishlist"] => Route::Wishlist,
            ["search"] => Route::Search { q },
            ["movie", id] => id
                .parse()
                .map(|id| Route::Movie { id })
                .unwrap_or(Route::Unknown),
            ["categories"] => Route::Categories { genre_id: None },
            ["categories", genre_id] => genre_id
                .parse()
                .map(|genre_id| Route::Categories {
                    genre_id: Some(genre_id),
                })
                .unwrap_or(Route::Unknown),
            _ => Route::Unknown,
        }
    }

    pub fn from_uri(uri: &Uri) -> Self {
        let q = Query::<HashMap<String, String>>::try_from_uri(uri)
            .ok()
            .and_then(|Query(mut params)| params.remove("q"));
        Self::parse(uri.path(), q.as_deref())
    }

    /// Canonical path, without query
    pub fn path(&self) -> String {
        match self {
            Route::Landing => LANDING_PATH.to_string(),
            Route::Browse | Route::Unknown => HOME_PATH.to_string(),
            Route::Trending { .. } => "/trending".to_string(),
            Route::Wishlist => "/wishlist".to_string(),
            Route::Search { .. } => "/search".to_string(),
            Route::Movie { id } => format!("/movie/{}", id),
            Route::Categories { genre_id: None } => "/categories".to_string(),
            Route::Categories {
                genre_id: Some(genre_id),
            } => format!("/categories/{}", genre_id),
        }
    }
}

/// Outcome of guarding a page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Session not resolved yet; show a loading indicator
    ShowLoading,
    Redirect(&'static str),
    Render(Route),
}

pub fn guard(resolved: bool, has_identity: bool, route: &Route) -> Navigation {
    if !resolved {
        return Navigation::ShowLoading;
    }

    match route {
        Route::Unknown => Navigation::Redirect(HOME_PATH),
        Route::Landing if has_identity => Navigation::Redirect(HOME_PATH),
        Route::Landing => Navigation::Render(Route::Landing),
        _ if !has_identity => Navigation::Redirect(LANDING_PATH),
        _ => Navigation::Render(route.clone()),
    }
}

/// Target of the search bar: `/search?q=<encoded trimmed input>`, or `None` for blank input
pub fn search_route(input: &str) -> Option<String> {
    let query = input.trim();
    if query.is_empty() {
        return None;
    }

    let url = reqwest::Url::parse_with_params("http://localhost/search", &[("q", query)]).ok()?;
    Some(format!("{}?{}", url.path(), url.query().unwrap_or_default()))
}
