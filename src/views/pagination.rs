use serde::Serialize;

use crate::models::Movie;

/// Paged list with at most one load in flight
///
/// Callers take the page to fetch from `begin_load`, fetch without holding any lock, then
/// hand the batch back to `complete`. A second `begin_load` while one is pending returns
/// `None`, and a completion for any page other than the pending one is dropped.
#[derive(Debug, Clone, Serialize)]
pub struct Paginator<T> {
    items: Vec<T>,
    page: u32,
    #[serde(skip)]
    in_flight: Option<u32>,
}

impl<T> Default for Paginator<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            page: 0,
            in_flight: None,
        }
    }
}

impl<T> Paginator<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Last page appended; 0 before the first load
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Reserves the next page, unless a load is already pending
    pub fn begin_load(&mut self) -> Option<u32> {
        if self.in_flight.is_some() {
            return None;
        }
        let next = self.page + 1;
        self.in_flight = Some(next);
        Some(next)
    }

    /// Appends `batch` as `page`. Returns false when the completion was stale.
    pub fn complete(&mut self, page: u32, batch: Vec<T>) -> bool {
        if self.in_flight != Some(page) {
            tracing::debug!(page, pending = ?self.in_flight, "Ignoring stale page");
            return false;
        }
        self.items.extend(batch);
        self.page = page;
        self.in_flight = None;
        true
    }

    /// Like `complete`, but only keeps items `keep` accepts given what is already loaded
    pub fn complete_with(
        &mut self,
        page: u32,
        batch: Vec<T>,
        keep: impl Fn(&[T], &T) -> bool,
    ) -> bool {
        if self.in_flight != Some(page) {
            tracing::debug!(page, pending = ?self.in_flight, "Ignoring stale page");
            return false;
        }
        for item in batch {
            if keep(&self.items, &item) {
                self.items.push(item);
            }
        }
        self.page = page;
        self.in_flight = None;
        true
    }

    /// Releases the pending load without changing the list
    pub fn fail(&mut self, page: u32) {
        if self.in_flight == Some(page) {
            self.in_flight = None;
        }
    }

    /// Replaces the list with a fresh first page
    pub fn reset(&mut self, first_batch: Vec<T>) {
        self.items = first_batch;
        self.page = 1;
        self.in_flight = None;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Case-insensitive substring match on titles; a blank query keeps everything
pub fn filter_by_title<'a>(movies: &'a [Movie], query: &str) -> Vec<&'a Movie> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return movies.iter().collect();
    }
    movies
        .iter()
        .filter(|movie| movie.title.to_lowercase().contains(&needle))
        .collect()
}
