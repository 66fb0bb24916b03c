use serde::{Deserialize, Serialize};

/// Paginated list envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    /// Number of pages for the given page size. Never less than one.
    pub fn total_pages(&self, page_size: u32) -> u64 {
        let size = u64::from(page_size.max(1));
        self.count.div_ceil(size).max(1)
    }
}

/// A list endpoint that answers either with a bare array or with a page.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Items(Vec<T>),
    Page(Page<T>),
}

impl<T> Listing<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            Listing::Items(items) => items,
            Listing::Page(page) => page.results,
        }
    }
}
