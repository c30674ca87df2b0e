mod movie;
mod session;
mod wishlist;

pub use movie::{
    CastMember, Credits, CrewMember, Genre, Movie, TimeWindow, TmdbGenreList, TmdbPage,
};
pub use session::{IdpCredential, SessionState, SessionTokens, UserIdentity};
pub use wishlist::{WishlistEntry, WishlistPhase, WishlistSnapshot};
