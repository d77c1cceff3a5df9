//! Forward-only pagination over listing endpoints.
//!
//! Listings are windows of `step` items at an `offset`. New content keeps
//! arriving at position zero while a listing is walked, so walking by offset
//! alone would see items shift under the cursor. The pager therefore pins the
//! id of the very first item it sees and repeats it on every later request;
//! the server then serves the listing as it looked at that moment.
//!
//! A short page, including an empty one, means the listing is exhausted. The
//! cursor only moves forward and a finished pager stays finished.

use futures::future::BoxFuture;
use futures::stream::{self, Stream};

use otvet_core::HasId;

use crate::error::OtvetError;

/// Listing window size used when the caller does not pick one.
pub(crate) const DEFAULT_STEP: u32 = 20;

/// One window of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Number of items to request.
    pub step: u32,
    /// Offset of the first item.
    pub offset: u64,
    /// Id of the item the listing should be pinned to, once known.
    pub anchor: Option<u64>,
}

impl Default for PageRequest {
    /// The first window of a listing, at the default size.
    fn default() -> Self {
        Self {
            step: DEFAULT_STEP,
            offset: 0,
            anchor: None,
        }
    }
}

/// Fetches one window of a listing.
pub(crate) type PageFetch<'a, T> =
    Box<dyn FnMut(PageRequest) -> BoxFuture<'a, Result<Vec<T>, OtvetError>> + Send + 'a>;

/// Lazy walker over a paged listing.
///
/// Returned by the listing methods of [`OtvetClient`](crate::OtvetClient).
/// Each [`try_next`](Self::try_next) call performs one request; nothing is
/// fetched up front.
pub struct Pages<'a, T> {
    fetch: PageFetch<'a, T>,
    step: u32,
    offset: u64,
    anchor: Option<u64>,
    anchored: bool,
    done: bool,
}

impl<'a, T: HasId + Send> Pages<'a, T> {
    /// Pager that walks by offset alone.
    pub(crate) fn plain(step: u32, fetch: PageFetch<'a, T>) -> Self {
        Self {
            fetch,
            step,
            offset: 0,
            anchor: None,
            anchored: false,
            done: false,
        }
    }

    /// Pager that pins the listing to the first id it sees.
    pub(crate) fn anchored(step: u32, fetch: PageFetch<'a, T>) -> Self {
        Self {
            anchored: true,
            ..Self::plain(step, fetch)
        }
    }

    /// Fetches the next page.
    ///
    /// Returns `Ok(None)` once the listing is exhausted. A trailing short
    /// page is still returned; the `None` follows on the next call. Errors
    /// do not advance the cursor, so a failed call can be retried.
    ///
    /// # Errors
    ///
    /// Propagates any error of the underlying request.
    pub async fn try_next(&mut self) -> Result<Option<Vec<T>>, OtvetError> {
        if self.done {
            return Ok(None);
        }
        let request = PageRequest {
            step: self.step,
            offset: self.offset,
            anchor: self.anchor,
        };
        let page = (self.fetch)(request).await?;
        if self.anchored && self.offset == 0 {
            self.anchor = page.first().map(HasId::id);
        }
        self.offset += u64::from(self.step);
        if page.len() < self.step as usize {
            self.done = true;
        }
        if page.is_empty() {
            Ok(None)
        } else {
            Ok(Some(page))
        }
    }

    /// Adapts the pager into a stream of pages.
    pub fn into_stream(self) -> impl Stream<Item = Result<Vec<T>, OtvetError>> + Send {
        stream::try_unfold(self, |mut pages| async move {
            let page = pages.try_next().await?;
            Ok(page.map(|items| (items, pages)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Item(u64);

    impl HasId for Item {
        fn id(&self) -> u64 {
            self.0
        }
    }

    type Log = Arc<Mutex<Vec<PageRequest>>>;

    fn scripted(script: Vec<Result<Vec<u64>, OtvetError>>, log: Log) -> PageFetch<'static, Item> {
        let mut script = VecDeque::from(script);
        Box::new(move |request| {
            log.lock().unwrap().push(request);
            let page = script.pop_front().unwrap_or_else(|| Ok(Vec::new()));
            Box::pin(async move { page.map(|ids| ids.into_iter().map(Item).collect()) })
        })
    }

    fn ids(range: std::ops::RangeInclusive<u64>) -> Vec<u64> {
        range.rev().collect()
    }

    #[tokio::test]
    async fn test_stops_after_short_page() {
        let log: Log = Arc::default();
        let script = vec![Ok(ids(86..=105)), Ok(ids(66..=85)), Ok(ids(60..=66))];
        let mut pages = Pages::plain(20, scripted(script, log.clone()));

        assert_eq!(pages.try_next().await.unwrap().unwrap().len(), 20);
        assert_eq!(pages.try_next().await.unwrap().unwrap().len(), 20);
        assert_eq!(pages.try_next().await.unwrap().unwrap().len(), 7);
        assert_eq!(pages.try_next().await.unwrap(), None);
        assert_eq!(pages.try_next().await.unwrap(), None);

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(log[0].offset, 0);
        assert_eq!(log[1].offset, 20);
        assert_eq!(log[2].offset, 40);
    }

    #[tokio::test]
    async fn test_exact_multiple_ends_on_empty_page() {
        let log: Log = Arc::default();
        let script = vec![Ok(ids(86..=105)), Ok(ids(66..=85)), Ok(Vec::new())];
        let mut pages = Pages::plain(20, scripted(script, log.clone()));

        assert_eq!(pages.try_next().await.unwrap().unwrap().len(), 20);
        assert_eq!(pages.try_next().await.unwrap().unwrap().len(), 20);
        assert_eq!(pages.try_next().await.unwrap(), None);
        assert_eq!(log.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_listing() {
        let log: Log = Arc::default();
        let mut pages = Pages::anchored(20, scripted(vec![Ok(Vec::new())], log.clone()));

        assert_eq!(pages.try_next().await.unwrap(), None);
        assert_eq!(pages.try_next().await.unwrap(), None);
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_anchor_pins_first_seen_id() {
        let log: Log = Arc::default();
        let script = vec![Ok(ids(86..=105)), Ok(ids(66..=85)), Ok(vec![65])];
        let mut pages = Pages::anchored(20, scripted(script, log.clone()));
        while pages.try_next().await.unwrap().is_some() {}

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(log[0].anchor, None);
        assert_eq!(log[1].anchor, Some(105));
        assert_eq!(log[2].anchor, Some(105));
    }

    #[tokio::test]
    async fn test_plain_pager_never_anchors() {
        let log: Log = Arc::default();
        let script = vec![Ok(ids(86..=105)), Ok(vec![65])];
        let mut pages = Pages::plain(20, scripted(script, log.clone()));
        while pages.try_next().await.unwrap().is_some() {}

        assert!(log.lock().unwrap().iter().all(|request| request.anchor.is_none()));
    }

    #[tokio::test]
    async fn test_error_does_not_advance_cursor() {
        let log: Log = Arc::default();
        let script = vec![Err(OtvetError::parse("boom")), Ok(vec![3, 2, 1])];
        let mut pages = Pages::plain(20, scripted(script, log.clone()));

        assert!(pages.try_next().await.is_err());
        let page = pages.try_next().await.unwrap().unwrap();
        assert_eq!(page, vec![Item(3), Item(2), Item(1)]);
        assert_eq!(pages.try_next().await.unwrap(), None);

        let log = log.lock().unwrap();
        assert_eq!(log[0].offset, 0);
        assert_eq!(log[1].offset, 0);
    }

    #[tokio::test]
    async fn test_into_stream() {
        let log: Log = Arc::default();
        let script = vec![Ok(ids(86..=105)), Ok(vec![85, 84])];
        let pages = Pages::anchored(20, scripted(script, log));

        let collected: Vec<Vec<Item>> = pages.into_stream().try_collect().await.unwrap();
        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0].len(), 20);
        assert_eq!(collected[1], vec![Item(85), Item(84)]);
    }
}
