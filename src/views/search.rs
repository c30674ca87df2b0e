use serde::Serialize;
use tokio::sync::RwLock;

use crate::{
    models::Movie,
    services::CatalogGateway,
    views::{
        cards::{cards, MovieCard},
        pagination::Paginator,
    },
};

#[derive(Debug, Clone, Serialize)]
pub struct SearchView {
    pub query: String,
    pub movies: Vec<MovieCard>,
    pub page: u32,
    pub loading_more: bool,
}

#[derive(Default)]
struct SearchState {
    query: String,
    results: Paginator<Movie>,
}

pub struct SearchScreen {
    gateway: CatalogGateway,
    state: RwLock<SearchState>,
}

impl SearchScreen {
    pub fn new(gateway: CatalogGateway) -> Self {
        Self {
            gateway,
            state: RwLock::new(SearchState::default()),
        }
    }

    /// Runs a new search from page 1. A blank query clears the results without a fetch.
    pub async fn search(&self, query: &str) -> SearchView {
        let query = query.trim().to_string();
        if query.is_empty() {
            let mut state = self.state.write().await;
            state.query.clear();
            state.results.clear();
            return self.render(&state);
        }

        let fetched = self.gateway.search(&query, 1).await;

        let mut state = self.state.write().await;
        state.query = query;
        state.results.reset(fetched.into_inner());
        self.render(&state)
    }

    pub async fn load_more(&self) -> SearchView {
        let (query, page) = {
            let mut state = self.state.write().await;
            if state.query.is_empty() {
                return self.render(&state);
            }
            match state.results.begin_load() {
                Some(page) => (state.query.clone(), page),
                None => return self.render(&state),
            }
        };

        let fetched = self.gateway.search(&query, page).await;

        let mut state = self.state.write().await;
        if state.query != query {
            // A new search replaced the list while this page was loading
            return self.render(&state);
        }
        if fetched.is_recovered() {
            state.results.fail(page);
        } else {
            state.results.complete(page, fetched.into_inner());
        }
        self.render(&state)
    }

    fn render(&self, state: &SearchState) -> SearchView {
        SearchView {
            query: state.query.clone(),
            movies: cards(state.results.items(), self.gateway.images()),
            page: state.results.page(),
            loading_more: state.results.is_loading(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog::{ImageUrls, MockCatalogProvider};
    use std::sync::Arc;

    fn screen(mock: MockCatalogProvider) -> SearchScreen {
        SearchScreen::new(CatalogGateway::new(
            Arc::new(mock),
            ImageUrls::new("https://img.test"),
        ))
    }

    fn page_of(query: &str, page: u32) -> Vec<Movie> {
        (0..2)
            .map(|n| Movie {
                id: page as u64 * 10 + n,
                title: format!("{} {}", query, n),
                ..Default::default()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_search_then_load_more() {
        let mut mock = MockCatalogProvider::new();
        mock.expect_search()
            .returning(|query, page| Ok(page_of(query, page)));

        let screen = screen(mock);
        let view = screen.search(" dune ").await;
        assert_eq!(view.query, "dune");
        assert_eq!(view.page, 1);

        let view = screen.load_more().await;
        let ids: Vec<u64> = view.movies.iter().map(|card| card.id).collect();
        assert_eq!(ids, vec![10, 11, 20, 21]);
        assert_eq!(view.page, 2);
    }

    #[tokio::test]
    async fn test_new_search_resets_to_first_page() {
        let mut mock = MockCatalogProvider::new();
        mock.expect_search()
            .returning(|query, page| Ok(page_of(query, page)));

        let screen = screen(mock);
        screen.search("dune").await;
        screen.load_more().await;
        let view = screen.search("heat").await;

        assert_eq!(view.page, 1);
        assert_eq!(view.movies.len(), 2);
        assert_eq!(view.movies[0].title, "heat 0");
    }

    #[tokio::test]
    async fn test_blank_search_clears_without_fetch() {
        let mut mock = MockCatalogProvider::new();
        mock.expect_search()
            .times(1)
            .returning(|query, page| Ok(page_of(query, page)));

        let screen = screen(mock);
        screen.search("dune").await;
        let view = screen.search("   ").await;
        assert!(view.movies.is_empty());
        assert_eq!(view.page, 0);

        // Nothing to extend
        let view = screen.load_more().await;
        assert!(view.movies.is_empty());
    }
}
