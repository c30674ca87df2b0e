use serde::Serialize;

use crate::{
    models::Movie,
    services::catalog::{ImageSize, ImageUrls},
};

/// Grid tile for a movie
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MovieCard {
    pub id: u64,
    pub title: String,
    pub poster_url: Option<String>,
    pub rating: String,
    pub year: Option<i32>,
}

impl MovieCard {
    pub fn new(movie: &Movie, images: &ImageUrls) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            poster_url: images.poster(movie.poster_path.as_deref(), ImageSize::Medium),
            rating: movie.display_rating(),
            year: movie.release_year(),
        }
    }
}

/// Full-width carousel slide
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HeroSlide {
    pub id: u64,
    pub title: String,
    pub overview: String,
    pub backdrop_url: Option<String>,
    pub rating: String,
    pub year: Option<i32>,
}

impl HeroSlide {
    pub fn new(movie: &Movie, images: &ImageUrls) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            overview: movie.overview.clone(),
            backdrop_url: images.backdrop(movie.backdrop_path.as_deref(), ImageSize::Original),
            rating: movie.display_rating(),
            year: movie.release_year(),
        }
    }
}

pub fn cards<'a>(movies: impl IntoIterator<Item = &'a Movie>, images: &ImageUrls) -> Vec<MovieCard> {
    movies
        .into_iter()
        .map(|movie| MovieCard::new(movie, images))
        .collect()
}
