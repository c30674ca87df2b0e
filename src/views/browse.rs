use serde::Serialize;
use tokio::sync::RwLock;

use crate::{
    models::Movie,
    services::CatalogGateway,
    views::{
        cards::{cards, HeroSlide, MovieCard},
        pagination::Paginator,
    },
};

/// Now-playing movies shown in the hero carousel
pub const HERO_SIZE: usize = 6;

#[derive(Debug, Clone, Serialize)]
pub struct BrowseView {
    pub hero: Vec<HeroSlide>,
    pub movies: Vec<MovieCard>,
    pub page: u32,
    pub loading_more: bool,
}

#[derive(Default)]
struct BrowseState {
    hero: Vec<Movie>,
    grid: Paginator<Movie>,
}

/// Home screen: now-playing carousel over a grid of popular movies
pub struct BrowseScreen {
    gateway: CatalogGateway,
    state: RwLock<BrowseState>,
}

impl BrowseScreen {
    pub fn new(gateway: CatalogGateway) -> Self {
        Self {
            gateway,
            state: RwLock::new(BrowseState::default()),
        }
    }

    pub async fn load(&self) -> BrowseView {
        let (now_playing, popular) =
            tokio::join!(self.gateway.now_playing(1), self.gateway.popular(1));

        let mut state = self.state.write().await;
        state.hero = now_playing.into_inner().into_iter().take(HERO_SIZE).collect();
        state.grid.reset(popular.into_inner());
        self.render(&state)
    }

    /// Appends the next popular page; a duplicate trigger while loading is a no-op
    pub async fn load_more(&self) -> BrowseView {
        let page = {
            let mut state = self.state.write().await;
            match state.grid.begin_load() {
                Some(page) => page,
                None => return self.render(&state),
            }
        };

        let fetched = self.gateway.popular(page).await;

        let mut state = self.state.write().await;
        if fetched.is_recovered() {
            state.grid.fail(page);
        } else {
            state.grid.complete(page, fetched.into_inner());
        }
        self.render(&state)
    }

    pub async fn view(&self) -> BrowseView {
        let state = self.state.read().await;
        self.render(&state)
    }

    fn render(&self, state: &BrowseState) -> BrowseView {
        let images = self.gateway.images();
        BrowseView {
            hero: state
                .hero
                .iter()
                .map(|movie| HeroSlide::new(movie, images))
                .collect(),
            movies: cards(state.grid.items(), images),
            page: state.grid.page(),
            loading_more: state.grid.is_loading(),
        }
    }
}
