//! One page of a listing

use serde::Serialize;

/// Items of one listing page with the server's pagination metadata
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,

    /// Page size actually applied, never above the requested size or the total
    pub max_results: u64,

    /// Number of matching items across all pages
    pub total: u64,

    /// 1-based page number
    pub page: u64,
}

impl<T> Page<T> {
    /// Whether this page holds every matching item
    pub fn is_exhaustive(&self) -> bool {
        self.max_results >= self.total
    }

    /// One-line summary shown above a listing, `noun` being a plural
    pub fn summary(&self, noun: &str) -> String {
        if self.is_exhaustive() {
            format!("Showing all the {} {}", self.total, noun)
        } else {
            format!(
                "Showing {} on {} {} - Page {}",
                self.max_results, self.total, noun, self.page
            )
        }
    }
}
