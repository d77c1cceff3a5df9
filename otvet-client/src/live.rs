//! Live polling of a listing's head.
//!
//! New items of a listing are detected by refetching its first window on a
//! fixed interval and keeping a high-water mark, the id of the newest item
//! seen so far. Each poll returns only items above the mark. More new items
//! than one window holds means the overflow is never seen; the mark still
//! jumps to the newest id, so a burst is lossy rather than duplicated.
//!
//! Polling runs inside the caller's task. Dropping the feed is the way to
//! stop it; there is nothing else to cancel.

use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::{self, Stream};
use tokio::time::Instant;

use otvet_core::HasId;

use crate::error::OtvetError;
use crate::paging::DEFAULT_STEP;

/// Tuning knobs for a live feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveOptions {
    /// Size of the listing window each poll fetches.
    pub step: u32,
    /// Interval between polls, measured from the start of one fetch to the
    /// start of the next.
    pub delay: Duration,
    /// Whether to return the batch of items that already existed when the
    /// feed started.
    pub include_first_batch: bool,
}

impl Default for LiveOptions {
    fn default() -> Self {
        Self {
            step: DEFAULT_STEP,
            delay: Duration::from_secs(10),
            include_first_batch: true,
        }
    }
}

/// Fetches the current head of the listing.
pub(crate) type BatchFetch<'a, T> =
    Box<dyn FnMut() -> BoxFuture<'a, Result<Vec<T>, OtvetError>> + Send + 'a>;

/// Endless feed of new items in a listing.
///
/// Returned by
/// [`OtvetClient::new_questions`](crate::OtvetClient::new_questions).
pub struct LiveFeed<'a, T> {
    fetch: BatchFetch<'a, T>,
    delay: Duration,
    include_first_batch: bool,
    high_water: u64,
    started: bool,
    last_poll: Option<Instant>,
}

impl<'a, T: HasId + Send> LiveFeed<'a, T> {
    pub(crate) fn new(options: &LiveOptions, fetch: BatchFetch<'a, T>) -> Self {
        Self {
            fetch,
            delay: options.delay,
            include_first_batch: options.include_first_batch,
            high_water: 0,
            started: false,
            last_poll: None,
        }
    }

    /// Waits for the next non-empty batch of new items, newest first.
    ///
    /// The first call fetches immediately and, when configured, returns the
    /// items that already existed. Later calls poll on the configured
    /// interval until something above the high-water mark shows up.
    ///
    /// # Errors
    ///
    /// Propagates any error of the underlying request. The feed stays
    /// usable; the next call polls again after the usual delay.
    pub async fn next_batch(&mut self) -> Result<Vec<T>, OtvetError> {
        if !self.started {
            self.last_poll = Some(Instant::now());
            let page = (self.fetch)().await?;
            self.high_water = page.first().map(HasId::id).unwrap_or(0);
            self.started = true;
            if self.include_first_batch && !page.is_empty() {
                return Ok(page);
            }
        }
        loop {
            if let Some(previous) = self.last_poll {
                tokio::time::sleep_until(previous + self.delay).await;
            }
            self.last_poll = Some(Instant::now());
            let page = (self.fetch)().await?;
            let newest = page.first().map(HasId::id);
            let mark = self.high_water;
            let fresh: Vec<T> = page.into_iter().filter(|item| item.id() > mark).collect();
            if !fresh.is_empty() {
                if let Some(newest) = newest {
                    self.high_water = newest;
                }
                return Ok(fresh);
            }
        }
    }

    /// Adapts the feed into an endless stream of batches.
    pub fn into_stream(self) -> impl Stream<Item = Result<Vec<T>, OtvetError>> + Send {
        stream::try_unfold(self, |mut feed| async move {
            let batch = feed.next_batch().await?;
            Ok(Some((batch, feed)))
        })
    }
}
