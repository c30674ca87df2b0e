/// Movie catalog access
///
/// `CatalogProvider` is the raw request/response seam against the external catalog and
/// propagates every failure. `CatalogGateway` is what the screens use: it never fails,
/// substituting an empty value and reporting the swallowed error in a `Fetched`.
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Credits, Genre, Movie, TimeWindow},
};

pub mod images;
pub mod tmdb;

pub use images::{image_url, ImageKind, ImageSize, ImageUrls};
pub use tmdb::TmdbProvider;

/// Trait for movie catalog providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Movies currently in theaters
    async fn now_playing(&self, page: u32) -> AppResult<Vec<Movie>>;

    async fn popular(&self, page: u32) -> AppResult<Vec<Movie>>;

    async fn trending(&self, window: TimeWindow, page: u32) -> AppResult<Vec<Movie>>;

    /// Full movie record, including genres, runtime and tagline
    async fn movie_details(&self, movie_id: u64) -> AppResult<Movie>;

    async fn movie_credits(&self, movie_id: u64) -> AppResult<Credits>;

    async fn search(&self, query: &str, page: u32) -> AppResult<Vec<Movie>>;

    async fn genres(&self) -> AppResult<Vec<Genre>>;

    async fn movies_by_genre(&self, genre_id: u64, page: u32) -> AppResult<Vec<Movie>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Outcome of a catalog call that cannot fail
#[derive(Debug)]
pub enum Fetched<T> {
    Loaded(T),
    /// The call failed; `fallback` is the empty value shown instead
    Recovered { fallback: T, error: AppError },
}

impl<T> Fetched<T> {
    pub fn value(&self) -> &T {
        match self {
            Fetched::Loaded(value) => value,
            Fetched::Recovered { fallback, .. } => fallback,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Fetched::Loaded(value) => value,
            Fetched::Recovered { fallback, .. } => fallback,
        }
    }

    pub fn is_recovered(&self) -> bool {
        matches!(self, Fetched::Recovered { .. })
    }

    pub fn error(&self) -> Option<&AppError> {
        match self {
            Fetched::Loaded(_) => None,
            Fetched::Recovered { error, .. } => Some(error),
        }
    }
}

/// Never-failing facade over a `CatalogProvider`
///
/// No caching and no retry: every call goes to the provider, and errors are logged and
/// replaced with the empty value for that operation.
#[derive(Clone)]
pub struct CatalogGateway {
    provider: Arc<dyn CatalogProvider>,
    images: ImageUrls,
}

impl CatalogGateway {
    pub fn new(provider: Arc<dyn CatalogProvider>, images: ImageUrls) -> Self {
        Self { provider, images }
    }

    pub fn images(&self) -> &ImageUrls {
        &self.images
    }

    fn recover<T>(
        &self,
        operation: &'static str,
        result: AppResult<T>,
        fallback: impl FnOnce() -> T,
    ) -> Fetched<T> {
        match result {
            Ok(value) => Fetched::Loaded(value),
            Err(error) => {
                tracing::error!(
                    error = %error,
                    operation,
                    provider = self.provider.name(),
                    "Catalog request failed, showing empty result"
                );
                Fetched::Recovered {
                    fallback: fallback(),
                    error,
                }
            }
        }
    }

    pub async fn now_playing(&self, page: u32) -> Fetched<Vec<Movie>> {
        let result = self.provider.now_playing(page).await;
        self.recover("now_playing", result, Vec::new)
    }

    pub async fn popular(&self, page: u32) -> Fetched<Vec<Movie>> {
        let result = self.provider.popular(page).await;
        self.recover("popular", result, Vec::new)
    }

    pub async fn trending(&self, window: TimeWindow, page: u32) -> Fetched<Vec<Movie>> {
        let result = self.provider.trending(window, page).await;
        self.recover("trending", result, Vec::new)
    }

    /// `Loaded(None)` never occurs; a failed lookup is `Recovered { fallback: None, .. }`
    pub async fn movie_details(&self, movie_id: u64) -> Fetched<Option<Movie>> {
        let result = self.provider.movie_details(movie_id).await.map(Some);
        self.recover("movie_details", result, || None)
    }

    pub async fn movie_credits(&self, movie_id: u64) -> Fetched<Credits> {
        let result = self.provider.movie_credits(movie_id).await;
        self.recover("movie_credits", result, Credits::default)
    }

    /// Blank queries short-circuit to an empty result without calling the provider
    pub async fn search(&self, query: &str, page: u32) -> Fetched<Vec<Movie>> {
        let query = query.trim();
        if query.is_empty() {
            return Fetched::Loaded(Vec::new());
        }

        let result = self.provider.search(query, page).await;
        self.recover("search", result, Vec::new)
    }

    pub async fn genres(&self) -> Fetched<Vec<Genre>> {
        let result = self.provider.genres().await;
        self.recover("genres", result, Vec::new)
    }

    pub async fn movies_by_genre(&self, genre_id: u64, page: u32) -> Fetched<Vec<Movie>> {
        let result = self.provider.movies_by_genre(genre_id, page).await;
        self.recover("movies_by_genre", result, Vec::new)
    }
}
