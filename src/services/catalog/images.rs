use serde::{Deserialize, Serialize};

/// Asset class of a catalog image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Poster,
    Backdrop,
    /// Cast/crew photos; sized like posters
    Profile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSize {
    Small,
    Medium,
    Large,
    Original,
}

impl ImageKind {
    pub const ALL: [ImageKind; 3] = [ImageKind::Poster, ImageKind::Backdrop, ImageKind::Profile];
}

impl ImageSize {
    pub const ALL: [ImageSize; 4] = [
        ImageSize::Small,
        ImageSize::Medium,
        ImageSize::Large,
        ImageSize::Original,
    ];
}

/// CDN size token for an asset class and size
pub fn size_token(kind: ImageKind, size: ImageSize) -> &'static str {
    match (kind, size) {
        (ImageKind::Backdrop, ImageSize::Small) => "w300",
        (ImageKind::Backdrop, ImageSize::Medium) => "w780",
        (ImageKind::Backdrop, ImageSize::Large) => "w1280",
        (ImageKind::Poster | ImageKind::Profile, ImageSize::Small) => "w185",
        (ImageKind::Poster | ImageKind::Profile, ImageSize::Medium) => "w342",
        (ImageKind::Poster | ImageKind::Profile, ImageSize::Large) => "w500",
        (_, ImageSize::Original) => "original",
    }
}

/// Builds `{base}/{token}{path}`; absent or empty paths produce no URL
pub fn image_url(base: &str, path: Option<&str>, kind: ImageKind, size: ImageSize) -> Option<String> {
    let path = path.filter(|p| !p.is_empty())?;
    Some(format!(
        "{}/{}{}",
        base.trim_end_matches('/'),
        size_token(kind, size),
        path
    ))
}

/// Image URL builder bound to the configured CDN base
#[derive(Debug, Clone)]
pub struct ImageUrls {
    base: String,
}

impl ImageUrls {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    pub fn url(&self, path: Option<&str>, kind: ImageKind, size: ImageSize) -> Option<String> {
        image_url(&self.base, path, kind, size)
    }

    pub fn poster(&self, path: Option<&str>, size: ImageSize) -> Option<String> {
        self.url(path, ImageKind::Poster, size)
    }

    pub fn backdrop(&self, path: Option<&str>, size: ImageSize) -> Option<String> {
        self.url(path, ImageKind::Backdrop, size)
    }

    pub fn profile(&self, path: Option<&str>, size: ImageSize) -> Option<String> {
        self.url(path, ImageKind::Profile, size)
    }
}
