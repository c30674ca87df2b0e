use serde::Serialize;
use tokio::sync::RwLock;

use crate::{
    models::{Genre, Movie},
    services::CatalogGateway,
    views::cards::{cards, MovieCard},
};

#[derive(Debug, Clone, Serialize)]
pub struct CategoriesView {
    pub genres: Vec<Genre>,
    pub selected: Option<Genre>,
    pub heading: String,
    pub movies: Vec<MovieCard>,
}

#[derive(Default)]
struct CategoriesState {
    genres: Vec<Genre>,
    selected: Option<Genre>,
    movies: Vec<Movie>,
}

/// Genre picker with the selected genre's movies
pub struct CategoriesScreen {
    gateway: CatalogGateway,
    state: RwLock<CategoriesState>,
}

impl CategoriesScreen {
    pub fn new(gateway: CatalogGateway) -> Self {
        Self {
            gateway,
            state: RwLock::new(CategoriesState::default()),
        }
    }

    /// Loads the genre list and selects the first genre
    pub async fn load(&self) -> CategoriesView {
        let genres = self.gateway.genres().await.into_inner();
        let first = genres.first().cloned();
        let movies = match &first {
            Some(genre) => self.gateway.movies_by_genre(genre.id, 1).await.into_inner(),
            None => Vec::new(),
        };

        let mut state = self.state.write().await;
        *state = CategoriesState {
            genres,
            selected: first,
            movies,
        };
        self.render(&state)
    }

    /// Selects `genre_id`, loading the genre list first if needed. Unknown ids leave
    /// the selection unchanged.
    pub async fn select(&self, genre_id: u64) -> CategoriesView {
        let has_genres = !self.state.read().await.genres.is_empty();
        if !has_genres {
            let genres = self.gateway.genres().await.into_inner();
            self.state.write().await.genres = genres;
        }

        let genre = {
            let state = self.state.read().await;
            state.genres.iter().find(|genre| genre.id == genre_id).cloned()
        };
        let Some(genre) = genre else {
            tracing::warn!(genre_id, "Unknown genre selected");
            let state = self.state.read().await;
            return self.render(&state);
        };

        let movies = self.gateway.movies_by_genre(genre.id, 1).await.into_inner();

        let mut state = self.state.write().await;
        state.selected = Some(genre);
        state.movies = movies;
        self.render(&state)
    }

    fn render(&self, state: &CategoriesState) -> CategoriesView {
        let heading = match &state.selected {
            Some(genre) => format!("{} Movies", genre.name),
            None => "Select a Category".to_string(),
        };
        CategoriesView {
            genres: state.genres.clone(),
            selected: state.selected.clone(),
            heading,
            movies: cards(&state.movies, self.gateway.images()),
        }
    }
}
