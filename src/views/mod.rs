pub mod browse;
pub mod cards;
pub mod categories;
pub mod details;
pub mod landing;
pub mod pagination;
pub mod search;
pub mod trending;
pub mod wishlist;

pub use browse::{BrowseScreen, BrowseView};
pub use cards::{HeroSlide, MovieCard};
pub use categories::{CategoriesScreen, CategoriesView};
pub use details::{DetailScreen, DetailView};
pub use landing::{LandingScreen, LandingView};
pub use pagination::{filter_by_title, Paginator};
pub use search::{SearchScreen, SearchView};
pub use trending::{TrendingScreen, TrendingView};
pub use wishlist::{WishlistScreen, WishlistView};
