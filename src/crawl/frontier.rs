// src/crawl/frontier.rs
// =============================================================================
// The frontier: the shared queue of URLs waiting to be crawled.
//
// How it works:
// 1. Workers call next_url() to take the next URL off the front
// 2. They add_url() the links that survived admission
// 3. They mark_complete() the URL once they are done with it
//
// With several workers, an empty queue does not mean the crawl is over: a
// page still being processed may add more links. So next_url() waits while
// other URLs are in flight and only returns None once the queue is empty AND
// nothing is in flight (or the page budget is spent).
//
// Rust concepts:
// - VecDeque: breadth-first queue (push_back / pop_front)
// - Mutex + Notify: the lock guards the queue, Notify wakes waiting workers
// =============================================================================

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::future::Future;
use tokio::sync::Notify;
use url::Url;

/// The work queue contract the crawl workers rely on.
///
/// Implementations must be internally synchronized: concurrent `next_url`
/// calls never return the same queued entry twice, and concurrent `add_url`
/// calls never lose an entry.
pub trait Frontier: Send + Sync {
    /// Next URL to crawl, or None when the crawl is finished
    fn next_url(&self) -> impl Future<Output = Option<Url>> + Send;

    fn add_url(&self, url: Url);

    fn mark_complete(&self, url: &Url);
}

#[derive(Debug, Default)]
struct FrontierState {
    queue: VecDeque<Url>,
    in_flight: usize,
    handed_out: usize,
    completed: usize,
}

/// In-process frontier shared by all workers of one crawl.
#[derive(Debug, Default)]
pub struct MemoryFrontier {
    state: Mutex<FrontierState>,
    changed: Notify,
    max_pages: Option<usize>,
}

impl MemoryFrontier {
    pub fn new(max_pages: Option<usize>) -> Self {
        Self {
            state: Mutex::new(FrontierState::default()),
            changed: Notify::new(),
            max_pages,
        }
    }

    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub fn completed(&self) -> usize {
        self.state.lock().completed
    }
}

impl Frontier for MemoryFrontier {
    async fn next_url(&self) -> Option<Url> {
        loop {
            // Register for wakeups before looking, so an add_url between the
            // check and the await is not missed
            let notified = self.changed.notified();
            {
                let mut state = self.state.lock();
                if self.max_pages.is_some_and(|max| state.handed_out >= max) {
                    return None;
                }
                if let Some(url) = state.queue.pop_front() {
                    state.in_flight += 1;
                    state.handed_out += 1;
                    return Some(url);
                }
                if state.in_flight == 0 {
                    // Wake the other waiters so they can see the crawl is over
                    self.changed.notify_waiters();
                    return None;
                }
            }
            notified.await;
        }
    }

    fn add_url(&self, url: Url) {
        self.state.lock().queue.push_back(url);
        self.changed.notify_waiters();
    }

    fn mark_complete(&self, _url: &Url) {
        {
            let mut state = self.state.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
            state.completed += 1;
        }
        self.changed.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_fifo_order_and_exhaustion() {
        let frontier = MemoryFrontier::new(None);
        frontier.add_url(url("https://www.ics.uci.edu/a"));
        frontier.add_url(url("https://www.ics.uci.edu/b"));

        let first = frontier.next_url().await.unwrap();
        assert_eq!(first.path(), "/a");
        frontier.mark_complete(&first);

        let second = frontier.next_url().await.unwrap();
        assert_eq!(second.path(), "/b");
        frontier.mark_complete(&second);

        assert!(frontier.next_url().await.is_none());
        assert_eq!(frontier.completed(), 2);
    }

    #[tokio::test]
    async fn test_empty_frontier_ends_immediately() {
        let frontier = MemoryFrontier::new(None);
        assert!(frontier.next_url().await.is_none());
    }

    #[tokio::test]
    async fn test_page_budget() {
        let frontier = MemoryFrontier::new(Some(1));
        frontier.add_url(url("https://www.ics.uci.edu/a"));
        frontier.add_url(url("https://www.ics.uci.edu/b"));

        assert!(frontier.next_url().await.is_some());
        assert!(frontier.next_url().await.is_none());
        assert_eq!(frontier.pending(), 1);
    }

    #[tokio::test]
    async fn test_waits_for_in_flight_work() {
        let frontier = Arc::new(MemoryFrontier::new(None));
        frontier.add_url(url("https://www.ics.uci.edu/seed"));
        let seed = frontier.next_url().await.unwrap();

        // Another worker finds the queue empty but the seed still in flight
        let waiter = {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move { frontier.next_url().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        frontier.add_url(url("https://www.ics.uci.edu/child"));
        frontier.mark_complete(&seed);

        let got = waiter.await.unwrap();
        assert_eq!(got.map(|u| u.path().to_string()), Some("/child".to_string()));
    }
}
