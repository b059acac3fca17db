//! Cursor bookkeeping for one paginated connection.

use crate::graphql::PageInfo;

/// Tracks the cursor, page count and page ceiling of a connection walk.
#[derive(Debug, Clone)]
pub struct Paginator {
    max_pages: u32,
    pages: u32,
    cursor: Option<String>,
    truncated: bool,
}

impl Paginator {
    pub fn new(max_pages: u32) -> Self {
        Self {
            max_pages: max_pages.max(1),
            pages: 0,
            cursor: None,
            truncated: false,
        }
    }

    /// Cursor for the next request; `None` on the first page.
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Pages consumed so far.
    pub fn pages(&self) -> u32 {
        self.pages
    }

    /// Record a fetched page. Returns `true` if another page should be fetched.
    ///
    /// Stops at the ceiling, and also when the provider reports more pages
    /// without a usable cursor; both count as truncation.
    pub fn advance(&mut self, page_info: &PageInfo) -> bool {
        self.pages += 1;
        if !page_info.has_next_page {
            return false;
        }
        let next = match page_info.end_cursor.as_deref() {
            Some(next) if Some(next) != self.cursor.as_deref() => next,
            _ => {
                tracing::warn!(page = self.pages, "pagination cursor did not advance");
                self.truncated = true;
                return false;
            }
        };
        if self.pages >= self.max_pages {
            self.truncated = true;
            return false;
        }
        self.cursor = Some(next.to_string());
        true
    }

    /// The walk stopped before the last page.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(has_next: bool, cursor: Option<&str>) -> PageInfo {
        PageInfo {
            has_next_page: has_next,
            end_cursor: cursor.map(str::to_string),
        }
    }

    #[test]
    fn walks_until_last_page() {
        let mut pages = Paginator::new(10);
        assert_eq!(pages.cursor(), None);
        assert!(pages.advance(&page(true, Some("a"))));
        assert_eq!(pages.cursor(), Some("a"));
        assert!(!pages.advance(&page(false, Some("b"))));
        assert_eq!(pages.pages(), 2);
        assert!(!pages.is_truncated());
    }

    #[test]
    fn stops_at_ceiling() {
        let mut pages = Paginator::new(3);
        assert!(pages.advance(&page(true, Some("a"))));
        assert!(pages.advance(&page(true, Some("b"))));
        assert!(!pages.advance(&page(true, Some("c"))));
        assert_eq!(pages.pages(), 3);
        assert!(pages.is_truncated());
    }

    #[test]
    fn repeated_cursor_terminates() {
        let mut pages = Paginator::new(100);
        assert!(pages.advance(&page(true, Some("a"))));
        assert!(!pages.advance(&page(true, Some("a"))));
        assert!(pages.is_truncated());
    }

    #[test]
    fn missing_cursor_terminates() {
        let mut pages = Paginator::new(100);
        assert!(!pages.advance(&page(true, None)));
        assert!(pages.is_truncated());
    }
}
