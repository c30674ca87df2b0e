use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::Utc;
use serde_json::{json, Value};

use marquee::{
    api::{create_router, AppState},
    db::MemoryDocumentStore,
    error::{AppError, AppResult},
    models::{
        Credits, Genre, IdpCredential, Movie, SessionTokens, TimeWindow, UserIdentity,
        WishlistPhase,
    },
    services::{
        CatalogGateway, CatalogProvider, IdentityProvider, IdentitySession, ImageUrls,
        WishlistStore,
    },
};

fn movie(id: u64, title: &str) -> Movie {
    Movie {
        id,
        title: title.to_string(),
        poster_path: Some(format!("/{}.jpg", id)),
        vote_average: 7.5,
        ..Default::default()
    }
}

/// Catalog with ten movies per page; ids encode the list and page
struct FakeCatalog;

#[async_trait::async_trait]
impl CatalogProvider for FakeCatalog {
    async fn now_playing(&self, page: u32) -> AppResult<Vec<Movie>> {
        Ok((0..10).map(|n| movie(1000 + page as u64 * 10 + n, "Now")).collect())
    }

    async fn popular(&self, page: u32) -> AppResult<Vec<Movie>> {
        Ok((0..10).map(|n| movie(2000 + page as u64 * 10 + n, "Popular")).collect())
    }

    async fn trending(&self, window: TimeWindow, _page: u32) -> AppResult<Vec<Movie>> {
        let base = match window {
            TimeWindow::Week => 3000,
            TimeWindow::Day => 3005,
        };
        Ok((0..10)
            .map(|n| movie(base + n, &format!("Trend {}", base + n)))
            .collect())
    }

    async fn movie_details(&self, movie_id: u64) -> AppResult<Movie> {
        if movie_id == 404 {
            return Err(AppError::ExternalApi("status 404".to_string()));
        }
        Ok(Movie {
            runtime: Some(95),
            ..movie(movie_id, "Detail")
        })
    }

    async fn movie_credits(&self, _movie_id: u64) -> AppResult<Credits> {
        Ok(Credits::default())
    }

    async fn search(&self, query: &str, page: u32) -> AppResult<Vec<Movie>> {
        Ok(vec![movie(4000 + page as u64, query)])
    }

    async fn genres(&self) -> AppResult<Vec<Genre>> {
        Ok(vec![Genre {
            id: 28,
            name: "Action".to_string(),
        }])
    }

    async fn movies_by_genre(&self, genre_id: u64, _page: u32) -> AppResult<Vec<Movie>> {
        Ok(vec![movie(genre_id, "By genre")])
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Accepts any credential except "cancelled" and signs in as `uid-1`.
/// Refreshing always fails; with `expired_tokens` the first guarded request ends the session.
#[derive(Default)]
struct FakeIdentity {
    expired_tokens: bool,
}

#[async_trait::async_trait]
impl IdentityProvider for FakeIdentity {
    async fn sign_in(&self, credential: &IdpCredential) -> AppResult<(UserIdentity, SessionTokens)> {
        if credential.id_token == "cancelled" {
            return Err(AppError::SignIn("popup closed".to_string()));
        }
        Ok((
            UserIdentity {
                uid: "uid-1".to_string(),
                email: Some("viewer@example.com".to_string()),
                display_name: None,
            },
            SessionTokens {
                id_token: "id".to_string(),
                refresh_token: "refresh".to_string(),
                expires_at: if self.expired_tokens {
                    Utc::now() - chrono::Duration::minutes(1)
                } else {
                    Utc::now() + chrono::Duration::hours(1)
                },
            },
        ))
    }

    async fn refresh(&self, _refresh_token: &str) -> AppResult<SessionTokens> {
        Err(AppError::ExternalApi("TOKEN_EXPIRED".to_string()))
    }

    async fn sign_out(&self, _tokens: &SessionTokens) -> AppResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

struct TestApp {
    server: TestServer,
    identity: Arc<IdentitySession>,
    wishlist: Arc<WishlistStore>,
}

fn create_test_app(resolved: bool) -> TestApp {
    create_test_app_with(resolved, FakeIdentity::default())
}

fn create_test_app_with(resolved: bool, provider: FakeIdentity) -> TestApp {
    let gateway = CatalogGateway::new(Arc::new(FakeCatalog), ImageUrls::new("https://img.test"));
    let identity = Arc::new(IdentitySession::new(Arc::new(provider)));
    let wishlist = Arc::new(WishlistStore::new(Arc::new(MemoryDocumentStore::new())));
    wishlist.attach(&identity);
    if resolved {
        identity.resolve();
    }

    let app = create_router(AppState::new(
        gateway,
        Arc::clone(&identity),
        Arc::clone(&wishlist),
    ));
    TestApp {
        server: TestServer::new(app).unwrap(),
        identity,
        wishlist,
    }
}

async fn sign_in(app: &TestApp) {
    app.server
        .post("/auth/sign-in")
        .json(&json!({ "id_token": "popup-token" }))
        .await
        .assert_status_ok();
}

/// Signed in with the wishlist already live
async fn signed_in_app() -> TestApp {
    let app = create_test_app(true);
    sign_in(&app).await;
    wait_for_phase(&app.wishlist, WishlistPhase::Live).await;
    app
}

async fn wait_for_phase(wishlist: &WishlistStore, phase: WishlistPhase) {
    let mut changes = wishlist.changes();
    tokio::time::timeout(Duration::from_secs(2), changes.wait_for(|s| s.phase == phase))
        .await
        .expect("wishlist did not reach phase")
        .expect("wishlist channel closed");
}

async fn wait_for_saved(wishlist: &WishlistStore, movie_id: u64, saved: bool) {
    let mut changes = wishlist.changes();
    tokio::time::timeout(
        Duration::from_secs(2),
        changes.wait_for(|s| s.contains(movie_id) == saved),
    )
    .await
    .expect("wishlist did not reach expected contents")
    .expect("wishlist channel closed");
}

fn location(response: &axum_test::TestResponse) -> String {
    response.header("location").to_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app(false);
    let response = app.server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_pages_wait_while_session_unresolved() {
    let app = create_test_app(false);
    for path in ["/", "/landing", "/wishlist", "/movie/1"] {
        let response = app.server.get(path).await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.header("retry-after"), "1");
        let body: Value = response.json();
        assert_eq!(body["loading"], true);
    }
}

#[tokio::test]
async fn test_anonymous_pages_redirect_to_landing() {
    let app = create_test_app(true);
    for path in ["/", "/trending", "/wishlist", "/search?q=x", "/movie/5", "/categories"] {
        let response = app.server.get(path).await;
        response.assert_status(StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), "/landing", "{}", path);
    }

    let response = app.server.get("/landing").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["rows"][0][0], "https://img.test/w500/3000.jpg");
}

#[tokio::test]
async fn test_unknown_paths_redirect_home() {
    let app = signed_in_app().await;
    for path in ["/movie/abc", "/does/not/exist"] {
        let response = app.server.get(path).await;
        response.assert_status(StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), "/");
    }
}

#[tokio::test]
async fn test_signed_in_landing_redirects_home() {
    let app = signed_in_app().await;
    let response = app.server.get("/landing").await;
    response.assert_status(StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_browse_and_load_more() {
    let app = signed_in_app().await;

    let response = app.server.get("/").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["hero"].as_array().unwrap().len(), 6);
    assert_eq!(body["movies"].as_array().unwrap().len(), 10);
    assert_eq!(body["page"], 1);

    let body: Value = app.server.post("/browse/more").await.json();
    assert_eq!(body["page"], 2);
    assert_eq!(body["movies"].as_array().unwrap().len(), 20);
    assert_eq!(body["movies"][10]["id"], 2020);
}

#[tokio::test]
async fn test_trending_filter_and_merge() {
    let app = signed_in_app().await;

    let body: Value = app.server.get("/trending").add_query_param("q", "trend 3001").await.json();
    assert_eq!(body["movies"].as_array().unwrap().len(), 1);
    assert_eq!(body["can_load_more"], false);

    app.server.get("/trending").await.assert_status_ok();
    let body: Value = app.server.post("/trending/more").await.json();
    // Weekly 3000..3010 plus daily 3005..3015 without repeats
    assert_eq!(body["movies"].as_array().unwrap().len(), 15);
    assert_eq!(body["page"], 2);
}

#[tokio::test]
async fn test_search_and_load_more() {
    let app = signed_in_app().await;

    let body: Value = app.server.get("/search").add_query_param("q", "alien").await.json();
    assert_eq!(body["query"], "alien");
    assert_eq!(body["movies"][0]["id"], 4001);

    let body: Value = app.server.post("/search/more").await.json();
    assert_eq!(body["movies"][1]["id"], 4002);

    let body: Value = app.server.get("/search").add_query_param("q", "  ").await.json();
    assert!(body["movies"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_untrimmed_search_redirects_to_canonical_query() {
    let app = signed_in_app().await;

    let response = app
        .server
        .get("/search")
        .add_query_param("q", "  fast & furious ")
        .await;
    response.assert_status(StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/search?q=fast+%26+furious");

    app.server
        .get("/search")
        .add_query_param("q", "fast & furious")
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_load_more_requires_session() {
    let app = create_test_app(false);
    for path in ["/browse/more", "/trending/more", "/search/more"] {
        let response = app.server.post(path).await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.header("retry-after"), "1");
    }

    app.identity.resolve();
    for path in ["/browse/more", "/trending/more", "/search/more"] {
        app.server
            .post(path)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_movie_detail_and_not_found() {
    let app = signed_in_app().await;

    let response = app.server.get("/movie/550").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "found");
    assert_eq!(body["runtime"], "1h 35m");
    assert_eq!(body["saved"], false);

    let response = app.server.get("/movie/404").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["status"], "not_found");
}

#[tokio::test]
async fn test_categories() {
    let app = signed_in_app().await;

    let body: Value = app.server.get("/categories").await.json();
    assert_eq!(body["heading"], "Action Movies");

    let body: Value = app.server.get("/categories/28").await.json();
    assert_eq!(body["movies"][0]["id"], 28);
}

#[tokio::test]
async fn test_wishlist_requires_session() {
    let app = create_test_app(true);

    app.server
        .post("/wishlist")
        .json(&movie(42, "The Answer"))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    app.server
        .delete("/wishlist/42")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_save_immediately_after_sign_in() {
    let app = create_test_app(true);
    sign_in(&app).await;

    app.server
        .post("/wishlist")
        .json(&movie(42, "The Answer"))
        .await
        .assert_status(StatusCode::ACCEPTED);
    wait_for_saved(&app.wishlist, 42, true).await;
}

#[tokio::test]
async fn test_failed_refresh_ends_session_and_redirects_to_landing() {
    let app = create_test_app_with(
        true,
        FakeIdentity {
            expired_tokens: true,
        },
    );
    sign_in(&app).await;
    assert!(app.identity.current().is_authenticated());

    let response = app.server.get("/wishlist").await;
    response.assert_status(StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/landing");

    let body: Value = app.server.get("/auth/session").await.json();
    assert_eq!(body["identity"], Value::Null);
    wait_for_phase(&app.wishlist, WishlistPhase::Unbound).await;
}

#[tokio::test]
async fn test_failed_refresh_rejects_wishlist_writes() {
    let app = create_test_app_with(
        true,
        FakeIdentity {
            expired_tokens: true,
        },
    );
    sign_in(&app).await;

    app.server
        .post("/wishlist")
        .json(&movie(42, "The Answer"))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    assert!(!app.identity.current().is_authenticated());
}

#[tokio::test]
async fn test_save_and_remove_round_trip() {
    let app = signed_in_app().await;

    app.server
        .post("/wishlist")
        .json(&movie(42, "The Answer"))
        .await
        .assert_status(StatusCode::ACCEPTED);
    wait_for_saved(&app.wishlist, 42, true).await;

    let body: Value = app.server.get("/wishlist").await.json();
    assert_eq!(body["label"], "1 movie saved");
    assert_eq!(body["movies"][0]["id"], 42);

    let body: Value = app.server.get("/movie/42").await.json();
    assert_eq!(body["saved"], true);

    app.server
        .delete("/wishlist/42")
        .await
        .assert_status(StatusCode::ACCEPTED);
    wait_for_saved(&app.wishlist, 42, false).await;

    let body: Value = app.server.get("/wishlist").await.json();
    assert_eq!(body["label"], "0 movies saved");
}

#[tokio::test]
async fn test_failed_sign_in_stays_signed_out() {
    let app = create_test_app(true);

    app.server
        .post("/auth/sign-in")
        .json(&json!({ "id_token": "cancelled" }))
        .await
        .assert_status(StatusCode::BAD_GATEWAY);

    let body: Value = app.server.get("/auth/session").await.json();
    assert_eq!(body["resolved"], true);
    assert_eq!(body["identity"], Value::Null);
}

#[tokio::test]
async fn test_sign_out_resets_wishlist() {
    let app = signed_in_app().await;
    app.server
        .post("/wishlist")
        .json(&movie(7, "Se7en"))
        .await
        .assert_status(StatusCode::ACCEPTED);
    wait_for_saved(&app.wishlist, 7, true).await;

    app.server
        .post("/auth/sign-out")
        .await
        .assert_status(StatusCode::NO_CONTENT);
    wait_for_phase(&app.wishlist, WishlistPhase::Unbound).await;

    assert!(app.wishlist.current_wishlist().is_empty());
    assert!(!app.identity.current().is_authenticated());

    let response = app.server.get("/wishlist").await;
    response.assert_status(StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/landing");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = create_test_app(true);
    let id = "7f1c3c1e-0b8e-4c7a-9a51-2d7f0f3a9b10";
    let response = app
        .server
        .get("/health")
        .add_header(
            axum::http::HeaderName::from_static("x-request-id"),
            axum::http::HeaderValue::from_static(id),
        )
        .await;
    assert_eq!(response.header("x-request-id"), id);
}
