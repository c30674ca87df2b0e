use serde::Serialize;

use crate::{
    models::{Movie, TimeWindow},
    services::{catalog::ImageSize, CatalogGateway},
};

pub const ROW_COUNT: usize = 3;
pub const ROW_LENGTH: usize = 20;

/// Poster wall behind the sign-in button
#[derive(Debug, Clone, Serialize)]
pub struct LandingView {
    pub rows: Vec<Vec<String>>,
}

pub struct LandingScreen {
    gateway: CatalogGateway,
}

impl LandingScreen {
    pub fn new(gateway: CatalogGateway) -> Self {
        Self { gateway }
    }

    /// Weekly trending pages 1-3, split into rows of twenty large posters
    pub async fn load(&self) -> LandingView {
        let (first, second, third) = tokio::join!(
            self.gateway.trending(TimeWindow::Week, 1),
            self.gateway.trending(TimeWindow::Week, 2),
            self.gateway.trending(TimeWindow::Week, 3),
        );

        let movies: Vec<Movie> = [first, second, third]
            .into_iter()
            .flat_map(|fetched| fetched.into_inner())
            .collect();

        let images = self.gateway.images();
        let rows = movies
            .chunks(ROW_LENGTH)
            .take(ROW_COUNT)
            .map(|row| {
                row.iter()
                    .filter_map(|movie| images.poster(movie.poster_path.as_deref(), ImageSize::Large))
                    .collect()
            })
            .collect();

        LandingView { rows }
    }
}
