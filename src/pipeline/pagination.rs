//! Pagination bookkeeping over the control path.
//!
//! [`PaginationState`] is the owned cursor that decides which page, if any,
//! is fetched next. The invariants it maintains:
//!
//! - `next` starts at 1 and is advanced exactly once per fetched page,
//!   before the following page's fetch is considered;
//! - fetching stops the first time `next` exceeds the discovered total;
//! - the first page is always fetched, because the total is unknowable
//!   before the first response has been scanned.

use crate::error::{MalformedPageError, Result};
use crate::pipeline::fork::ForkStream;
use crate::pipeline::json::FieldScanner;
use crate::types::PageNumber;
use futures::StreamExt;

/// The pagination cursor: next page to fetch and the discovered total.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaginationState {
    next: u32,
    total_pages: Option<u32>,
}

impl PaginationState {
    /// Fresh cursor positioned at page 1 with the total still unknown.
    pub fn new() -> Self {
        Self {
            next: PageNumber::FIRST.get(),
            total_pages: None,
        }
    }

    /// The page to fetch now, or `None` when pagination is complete.
    pub fn next_to_fetch(&self) -> Option<PageNumber> {
        match self.total_pages {
            Some(total) if self.next > total => None,
            _ => Some(PageNumber::new(self.next)),
        }
    }

    /// Record the total page count discovered on a control stream.
    pub fn record_total(&mut self, total: u32) {
        self.total_pages = Some(total);
    }

    /// Advance past the page that was just fetched.
    pub fn advance(&mut self) {
        self.next += 1;
    }

    /// The discovered total, once known.
    pub fn total_pages(&self) -> Option<u32> {
        self.total_pages
    }

    /// Whether at least one more page remains to be fetched.
    pub fn has_more(&self) -> bool {
        matches!(self.total_pages, Some(total) if self.next <= total)
    }
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new()
    }
}

/// Scan a page's control fork for the total page count.
///
/// Reads only as much of the fork as needed to complete the field's value,
/// then stops; the remainder of the fork is left for its owner to discard.
/// A fork that ends without the field yields
/// [`MalformedPageError::MissingTotalPages`]; a field holding anything other
/// than a non-negative integer yields
/// [`MalformedPageError::InvalidTotalPages`].
pub(crate) async fn find_total_pages(
    control: &mut ForkStream,
    page: PageNumber,
    key: &str,
) -> Result<u32> {
    let mut scanner = FieldScanner::new(key);
    while let Some(chunk) = control.next().await {
        if let Some(raw) = scanner.push(&chunk)? {
            return parse_total(&raw, page);
        }
    }
    Err(MalformedPageError::MissingTotalPages { page }.into())
}

fn parse_total(raw: &[u8], page: PageNumber) -> Result<u32> {
    let invalid = || MalformedPageError::InvalidTotalPages {
        page,
        value: String::from_utf8_lossy(raw).into_owned(),
    };
    let value: serde_json::Value = serde_json::from_slice(raw).map_err(|_| invalid())?;
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| invalid().into())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::pipeline::fetch::PageBody;
    use crate::pipeline::fork::fork;
    use bytes::Bytes;

    fn control_for(chunks: &[&'static str]) -> ForkStream {
        let body: PageBody = futures::stream::iter(
            chunks
                .iter()
                .map(|s| Ok(Bytes::from_static(s.as_bytes())))
                .collect::<Vec<_>>(),
        )
        .boxed();
        fork(body).control
    }

    /// Walk the cursor through a full export and collect the fetched pages.
    fn fetched_pages(total: u32) -> Vec<u32> {
        let mut state = PaginationState::new();
        let mut fetched = Vec::new();
        while let Some(page) = state.next_to_fetch() {
            fetched.push(page.get());
            state.record_total(total);
            state.advance();
        }
        fetched
    }

    #[test]
    fn test_single_page_fetches_exactly_once() {
        assert_eq!(fetched_pages(1), vec![1]);
    }

    #[test]
    fn test_two_pages_fetch_in_order() {
        assert_eq!(fetched_pages(2), vec![1, 2]);
    }

    #[test]
    fn test_many_pages_fetch_in_strictly_increasing_order() {
        let pages = fetched_pages(12);
        assert_eq!(pages, (1..=12).collect::<Vec<_>>());
    }

    #[test]
    fn test_zero_total_still_fetches_the_first_page() {
        // The total is unknowable before page 1 has been scanned.
        assert_eq!(fetched_pages(0), vec![1]);
    }

    #[test]
    fn test_has_more_tracks_remaining_pages() {
        let mut state = PaginationState::new();
        assert!(!state.has_more()); // total unknown
        state.record_total(2);
        assert!(state.has_more());
        state.advance();
        assert!(state.has_more());
        state.advance();
        assert!(!state.has_more());
        assert_eq!(state.total_pages(), Some(2));
    }

    #[tokio::test]
    async fn test_find_total_in_control_stream() {
        let mut control = control_for(&[r#"{"page":1,"total_pages":2,"data":[{"a":1}]}"#]);
        let total = find_total_pages(&mut control, PageNumber::FIRST, "total_pages")
            .await
            .unwrap();
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn test_find_total_stops_before_stream_end() {
        // The field arrives in the first chunk; the rest of the body must not
        // be needed to make the pagination decision.
        let mut control = control_for(&[r#"{"total_pages":3,"data":["#, r#"{"a":1}]}"#]);
        let total = find_total_pages(&mut control, PageNumber::FIRST, "total_pages")
            .await
            .unwrap();
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn test_missing_total_is_a_malformed_page() {
        let mut control = control_for(&[r#"{"page":1,"data":[]}"#]);
        let err = find_total_pages(&mut control, PageNumber::new(4), "total_pages")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedPage(MalformedPageError::MissingTotalPages { page }) if page == 4u32
        ));
    }

    #[tokio::test]
    async fn test_non_integer_total_is_a_malformed_page() {
        let mut control = control_for(&[r#"{"total_pages":"two"}"#]);
        let err = find_total_pages(&mut control, PageNumber::FIRST, "total_pages")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedPage(MalformedPageError::InvalidTotalPages { .. })
        ));
    }

    #[tokio::test]
    async fn test_negative_total_is_a_malformed_page() {
        let mut control = control_for(&[r#"{"total_pages":-1}"#]);
        let err = find_total_pages(&mut control, PageNumber::FIRST, "total_pages")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedPage(MalformedPageError::InvalidTotalPages { .. })
        ));
    }
}
