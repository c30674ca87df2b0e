pub mod catalog;
pub mod identity;
pub mod navigation;
pub mod wishlist;

pub use catalog::{CatalogGateway, CatalogProvider, Fetched, ImageUrls, TmdbProvider};
pub use identity::{FirebaseIdentityProvider, IdentityProvider, IdentitySession};
pub use navigation::{guard, search_route, Navigation, Route};
pub use wishlist::WishlistStore;
