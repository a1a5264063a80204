//! Navigation observers
//!
//! The controller only sees [`NavigationObserver`]. Hosts with a native
//! navigation event forward it through a [`NavigationHandle`] into
//! [`HistoryEvents`]; hosts without one fall back to [`LocationPoller`],
//! which watches the document location on an interval.

use async_trait::async_trait;
use idlabel_dom::{DocumentTree, Location};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, Interval, MissedTickBehavior};

/// Source of navigation transitions
#[async_trait]
pub trait NavigationObserver: Send {
    /// Wait for the next transition; `None` once the source is gone
    async fn next_navigation(&mut self) -> Option<Location>;

    /// Short name for logs
    fn kind(&self) -> &'static str;
}

/// Sending side of [`HistoryEvents`], held by the host
#[derive(Debug, Clone)]
pub struct NavigationHandle {
    sender: mpsc::UnboundedSender<Location>,
}

impl NavigationHandle {
    /// Report a navigation to `location`; returns `false` once the observer
    /// is gone
    pub fn navigated(&self, location: Location) -> bool {
        self.sender.send(location).is_ok()
    }
}

/// Observer fed by native navigation events
#[derive(Debug)]
pub struct HistoryEvents {
    receiver: mpsc::UnboundedReceiver<Location>,
}

impl HistoryEvents {
    /// Connected handle/observer pair
    #[must_use]
    pub fn channel() -> (NavigationHandle, Self) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (NavigationHandle { sender }, Self { receiver })
    }
}

#[async_trait]
impl NavigationObserver for HistoryEvents {
    async fn next_navigation(&mut self) -> Option<Location> {
        self.receiver.recv().await
    }

    fn kind(&self) -> &'static str {
        "history-events"
    }
}

/// Fallback observer polling the document location
pub struct LocationPoller<D> {
    document: Arc<Mutex<D>>,
    last: Location,
    ticker: Interval,
}

impl<D: DocumentTree> LocationPoller<D> {
    /// Poll `document` every `period`
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(document: Arc<Mutex<D>>, period: Duration) -> Self {
        let last = document.lock().location();
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            document,
            last,
            ticker,
        }
    }
}

impl<D> std::fmt::Debug for LocationPoller<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationPoller")
            .field("last", &self.last)
            .field("period", &self.ticker.period())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<D: DocumentTree + Send + 'static> NavigationObserver for LocationPoller<D> {
    async fn next_navigation(&mut self) -> Option<Location> {
        loop {
            self.ticker.tick().await;
            let current = self.document.lock().location();
            if current != self.last {
                self.last = current.clone();
                return Some(current);
            }
        }
    }

    fn kind(&self) -> &'static str {
        "location-poller"
    }
}
