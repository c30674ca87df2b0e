use serde::{Deserialize, Serialize};

/// A movie as delivered by the catalog. Never mutated locally.
///
/// List endpoints only carry `genre_ids`; the detail endpoint fills in
/// `genres`, `runtime` and `tagline`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Movie {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub genre_ids: Vec<u64>,
    #[serde(default)]
    pub tagline: Option<String>,
}

impl Movie {
    /// Rating with one decimal, or "N/A" when the catalog has no votes
    pub fn display_rating(&self) -> String {
        if self.vote_average > 0.0 {
            format!("{:.1}", self.vote_average)
        } else {
            "N/A".to_string()
        }
    }

    /// Runtime as "2h 28m", or "N/A" when unknown
    pub fn display_runtime(&self) -> String {
        match self.runtime {
            Some(minutes) if minutes > 0 => format!("{}h {}m", minutes / 60, minutes % 60),
            _ => "N/A".to_string(),
        }
    }

    /// Year part of the release date, if the date is present and well-formed
    pub fn release_year(&self) -> Option<i32> {
        self.release_date
            .as_deref()
            .and_then(|date| date.get(0..4))
            .and_then(|year| year.parse().ok())
    }
}

/// Movie genre
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CastMember {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub character: String,
    #[serde(default)]
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrewMember {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub job: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub profile_path: Option<String>,
}

/// Cast and crew of one movie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

impl Credits {
    /// First crew member credited as Director
    pub fn director(&self) -> Option<&CrewMember> {
        self.crew.iter().find(|person| person.job == "Director")
    }

    /// Top billed cast, in catalog order
    pub fn top_cast(&self, n: usize) -> &[CastMember] {
        &self.cast[..self.cast.len().min(n)]
    }
}

/// Trending time window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    Day,
    Week,
}

impl TimeWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
        }
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// TMDB API Envelopes
// ============================================================================

/// Paged list envelope (`results` is absent on some error bodies)
#[derive(Debug, Deserialize)]
pub struct TmdbPage {
    #[serde(default)]
    pub results: Vec<Movie>,
}

#[derive(Debug, Deserialize)]
pub struct TmdbGenreList {
    #[serde(default)]
    pub genres: Vec<Genre>,
}
