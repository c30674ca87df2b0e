use std::sync::Arc;

use serde::Serialize;

use crate::{
    models::Movie,
    services::{catalog::ImageSize, CatalogGateway, WishlistStore},
};

/// Cast members shown on the detail page
pub const TOP_CAST: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct CastCard {
    pub id: u64,
    pub name: String,
    pub character: String,
    pub profile_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MovieDetail {
    pub movie: Movie,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub rating: String,
    pub runtime: String,
    pub year: Option<i32>,
    pub genres: Vec<String>,
    pub director: Option<String>,
    pub cast: Vec<CastCard>,
    pub saved: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DetailView {
    Found(Box<MovieDetail>),
    NotFound { movie_id: u64 },
}

pub struct DetailScreen {
    gateway: CatalogGateway,
    wishlist: Arc<WishlistStore>,
}

impl DetailScreen {
    pub fn new(gateway: CatalogGateway, wishlist: Arc<WishlistStore>) -> Self {
        Self { gateway, wishlist }
    }

    /// Fetches detail and credits concurrently. Missing credits still render the page;
    /// a missing detail does not.
    pub async fn load(&self, movie_id: u64) -> DetailView {
        let (detail, credits) = tokio::join!(
            self.gateway.movie_details(movie_id),
            self.gateway.movie_credits(movie_id)
        );

        let Some(movie) = detail.into_inner() else {
            return DetailView::NotFound { movie_id };
        };
        let credits = credits.into_inner();
        let images = self.gateway.images();

        let cast = credits
            .top_cast(TOP_CAST)
            .iter()
            .map(|member| CastCard {
                id: member.id,
                name: member.name.clone(),
                character: member.character.clone(),
                profile_url: images.profile(member.profile_path.as_deref(), ImageSize::Small),
            })
            .collect();

        DetailView::Found(Box::new(MovieDetail {
            poster_url: images.poster(movie.poster_path.as_deref(), ImageSize::Large),
            backdrop_url: images.backdrop(movie.backdrop_path.as_deref(), ImageSize::Original),
            rating: movie.display_rating(),
            runtime: movie.display_runtime(),
            year: movie.release_year(),
            genres: movie.genres.iter().map(|genre| genre.name.clone()).collect(),
            director: credits.director().map(|person| person.name.clone()),
            cast,
            saved: self.wishlist.is_saved(movie.id),
            movie,
        }))
    }
}
