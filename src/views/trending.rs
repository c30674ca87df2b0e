use serde::Serialize;
use tokio::sync::RwLock;

use crate::{
    models::{Movie, TimeWindow},
    services::CatalogGateway,
    views::{
        cards::{cards, MovieCard},
        pagination::{filter_by_title, Paginator},
    },
};

#[derive(Debug, Clone, Serialize)]
pub struct TrendingView {
    pub query: String,
    pub movies: Vec<MovieCard>,
    pub page: u32,
    /// Load-more is hidden while a title filter is active
    pub can_load_more: bool,
    pub loading_more: bool,
}

/// Weekly trending list, extended with daily trending on demand
pub struct TrendingScreen {
    gateway: CatalogGateway,
    list: RwLock<Paginator<Movie>>,
}

impl TrendingScreen {
    pub fn new(gateway: CatalogGateway) -> Self {
        Self {
            gateway,
            list: RwLock::new(Paginator::new()),
        }
    }

    pub async fn load(&self, query: &str) -> TrendingView {
        let weekly = self.gateway.trending(TimeWindow::Week, 1).await;

        let mut list = self.list.write().await;
        list.reset(weekly.into_inner());
        self.render(&list, query)
    }

    /// Appends daily-trending movies whose ids are not already listed
    pub async fn load_more(&self) -> TrendingView {
        let page = {
            let mut list = self.list.write().await;
            match list.begin_load() {
                Some(page) => page,
                None => return self.render(&list, ""),
            }
        };

        let fetched = self.gateway.trending(TimeWindow::Day, page).await;

        let mut list = self.list.write().await;
        if fetched.is_recovered() {
            list.fail(page);
        } else {
            list.complete_with(page, fetched.into_inner(), |loaded, movie| {
                !loaded.iter().any(|existing| existing.id == movie.id)
            });
        }
        self.render(&list, "")
    }

    /// Current list filtered by title, without fetching
    pub async fn filtered(&self, query: &str) -> TrendingView {
        let list = self.list.read().await;
        self.render(&list, query)
    }

    fn render(&self, list: &Paginator<Movie>, query: &str) -> TrendingView {
        let query = query.trim();
        TrendingView {
            query: query.to_string(),
            movies: cards(filter_by_title(list.items(), query), self.gateway.images()),
            page: list.page(),
            can_load_more: query.is_empty(),
            loading_more: list.is_loading(),
        }
    }
}
