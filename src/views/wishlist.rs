use std::sync::Arc;

use serde::Serialize;

use crate::{
    models::WishlistPhase,
    services::{CatalogGateway, WishlistStore},
    views::cards::{cards, MovieCard},
};

#[derive(Debug, Clone, Serialize)]
pub struct WishlistView {
    pub phase: WishlistPhase,
    pub loading: bool,
    pub label: String,
    pub movies: Vec<MovieCard>,
}

pub fn count_label(count: usize) -> String {
    if count == 1 {
        "1 movie saved".to_string()
    } else {
        format!("{} movies saved", count)
    }
}

/// Renders whatever the wishlist store last received; never fetches
pub struct WishlistScreen {
    gateway: CatalogGateway,
    wishlist: Arc<WishlistStore>,
}

impl WishlistScreen {
    pub fn new(gateway: CatalogGateway, wishlist: Arc<WishlistStore>) -> Self {
        Self { gateway, wishlist }
    }

    pub fn view(&self) -> WishlistView {
        let snapshot = self.wishlist.snapshot();
        WishlistView {
            phase: snapshot.phase,
            loading: snapshot.loading,
            label: count_label(snapshot.entries.len()),
            movies: cards(
                snapshot.entries.iter().map(|entry| &entry.movie),
                self.gateway.images(),
            ),
        }
    }
}
