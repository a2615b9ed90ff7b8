//! Paginated result sets.

use serde::{Deserialize, Serialize};

/// One page of a larger result set: items plus the total match count and
/// the requested window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: usize,
    pub size: usize,
}

impl<T> Page<T> {
    /// An empty page for the given window
    pub fn empty(page: usize, size: usize) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page,
            size,
        }
    }

    /// Slice the requested window out of a complete, already-ordered
    /// result set. `total` reflects the full set, not the window.
    pub fn from_complete(all: Vec<T>, page: usize, size: usize) -> Self {
        let total = all.len() as u64;
        let start = page.saturating_mul(size).min(all.len());
        let end = start.saturating_add(size).min(all.len());
        let items = all.into_iter().skip(start).take(end - start).collect();
        Self {
            items,
            total,
            page,
            size,
        }
    }

    /// Map the page items, keeping the window metadata
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            size: self.size,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
