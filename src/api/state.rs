use std::sync::Arc;

use crate::{
    services::{CatalogGateway, IdentitySession, WishlistStore},
    views::{
        BrowseScreen, CategoriesScreen, DetailScreen, LandingScreen, SearchScreen, TrendingScreen,
        WishlistScreen,
    },
};

/// Per-page view state
pub struct Screens {
    pub landing: LandingScreen,
    pub browse: BrowseScreen,
    pub trending: TrendingScreen,
    pub search: SearchScreen,
    pub categories: CategoriesScreen,
    pub details: DetailScreen,
    pub wishlist: WishlistScreen,
}

impl Screens {
    pub fn new(gateway: &CatalogGateway, wishlist: &Arc<WishlistStore>) -> Self {
        Self {
            landing: LandingScreen::new(gateway.clone()),
            browse: BrowseScreen::new(gateway.clone()),
            trending: TrendingScreen::new(gateway.clone()),
            search: SearchScreen::new(gateway.clone()),
            categories: CategoriesScreen::new(gateway.clone()),
            details: DetailScreen::new(gateway.clone(), Arc::clone(wishlist)),
            wishlist: WishlistScreen::new(gateway.clone(), Arc::clone(wishlist)),
        }
    }
}

/// Shared application state
///
/// One identity session and one wishlist: the server backs a single local user.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<IdentitySession>,
    pub wishlist: Arc<WishlistStore>,
    pub screens: Arc<Screens>,
}

impl AppState {
    pub fn new(
        gateway: CatalogGateway,
        identity: Arc<IdentitySession>,
        wishlist: Arc<WishlistStore>,
    ) -> Self {
        let screens = Arc::new(Screens::new(&gateway, &wishlist));
        Self {
            identity,
            wishlist,
            screens,
        }
    }
}
