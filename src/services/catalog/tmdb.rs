/// TMDB catalog provider
///
/// Every request carries `api_key` and `language` as query parameters. List endpoints
/// answer with a `{ "results": [...] }` envelope; detail and credits answer with the
/// object itself.
use crate::{
    error::{AppError, AppResult},
    models::{Credits, Genre, Movie, TimeWindow, TmdbGenreList, TmdbPage},
    services::catalog::CatalogProvider,
};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    language: String,
}

impl TmdbProvider {
    pub fn new(api_key: String, api_url: String, language: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            language,
        }
    }

    /// GETs `{api_url}{path}` and decodes the JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", self.language.as_str()),
            ])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {} for {}: {}",
                status, path, body
            )));
        }

        let decoded = response.json::<T>().await?;
        tracing::debug!(path = %path, provider = "tmdb", "Catalog request completed");
        Ok(decoded)
    }

    async fn get_page(&self, path: &str, params: &[(&str, String)]) -> AppResult<Vec<Movie>> {
        let page: TmdbPage = self.get_json(path, params).await?;
        Ok(page.results)
    }
}

#[async_trait::async_trait]
impl CatalogProvider for TmdbProvider {
    async fn now_playing(&self, page: u32) -> AppResult<Vec<Movie>> {
        self.get_page("/movie/now_playing", &[("page", page.to_string())])
            .await
    }

    async fn popular(&self, page: u32) -> AppResult<Vec<Movie>> {
        self.get_page("/movie/popular", &[("page", page.to_string())])
            .await
    }

    async fn trending(&self, window: TimeWindow, page: u32) -> AppResult<Vec<Movie>> {
        let path = format!("/trending/movie/{}", window);
        self.get_page(&path, &[("page", page.to_string())]).await
    }

    async fn movie_details(&self, movie_id: u64) -> AppResult<Movie> {
        self.get_json(&format!("/movie/{}", movie_id), &[]).await
    }

    async fn movie_credits(&self, movie_id: u64) -> AppResult<Credits> {
        self.get_json(&format!("/movie/{}/credits", movie_id), &[])
            .await
    }

    async fn search(&self, query: &str, page: u32) -> AppResult<Vec<Movie>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let movies = self
            .get_page(
                "/search/movie",
                &[("query", query.to_string()), ("page", page.to_string())],
            )
            .await?;

        tracing::info!(
            query = %query,
            page,
            results = movies.len(),
            provider = "tmdb",
            "Movie search completed"
        );

        Ok(movies)
    }

    async fn genres(&self) -> AppResult<Vec<Genre>> {
        let list: TmdbGenreList = self.get_json("/genre/movie/list", &[]).await?;
        Ok(list.genres)
    }

    async fn movies_by_genre(&self, genre_id: u64, page: u32) -> AppResult<Vec<Movie>> {
        self.get_page(
            "/discover/movie",
            &[
                ("with_genres", genre_id.to_string()),
                ("page", page.to_string()),
            ],
        )
        .await
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
