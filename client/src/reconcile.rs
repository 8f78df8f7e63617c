//! Glue between live events and cached data.
//!
//! A consumer holding, say, the species list wants to refetch it when an
//! `obis_sync` event arrives. [`Reconciler`] answers "is a refresh due?" from
//! the event log, and [`LiveResource`] runs that loop in a task, publishing
//! the latest fetch result on a `watch` channel.

use log::{debug, warn};
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use matsya_common::events::DataDomain;

use crate::error::ClientResult;
use crate::live::{EventFeed, Observed};

/// Tracks how far a consumer has read into a channel's event log.
#[derive(Debug, Clone)]
pub struct Reconciler {
    domain: DataDomain,
    last_seen: u64,
}

impl Reconciler {
    pub fn new(domain: DataDomain) -> Self {
        Self {
            domain,
            last_seen: 0,
        }
    }

    pub fn domain(&self) -> DataDomain {
        self.domain
    }

    pub fn last_seen(&self) -> u64 {
        self.last_seen
    }

    /// Consume `events` and report whether the cached data is stale.
    ///
    /// Stale means a new event touches this domain, or events between the
    /// last one seen and the first one given were evicted before being read.
    /// Events at or before `last_seen` are ignored.
    pub fn observe(&mut self, events: &[Observed]) -> bool {
        let fresh: Vec<&Observed> = events.iter().filter(|o| o.seq > self.last_seen).collect();
        let Some(first) = fresh.first() else {
            return false;
        };
        let gap = first.seq > self.last_seen + 1;
        let relevant = fresh
            .iter()
            .any(|o| o.event.domain() == Some(self.domain));
        if let Some(last) = fresh.last() {
            self.last_seen = last.seq;
        }
        if gap {
            debug!("Missed live events before #{}, refreshing {:?}", first.seq, self.domain);
        }
        gap || relevant
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResourceState<T> {
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> ResourceState<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            ResourceState::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// A value refetched whenever it may have changed.
///
/// The fetch runs once at start, then again on every tick of `refresh_every`
/// (if set) and whenever the event feed (if set) reports an event for
/// `domain`. Dropping the resource stops the task.
pub struct LiveResource<T> {
    state: watch::Receiver<ResourceState<T>>,
    task: JoinHandle<()>,
}

impl<T> LiveResource<T>
where
    T: Send + Sync + 'static,
{
    pub fn spawn<F, Fut>(
        domain: DataDomain,
        fetch: F,
        feed: Option<EventFeed>,
        refresh_every: Option<Duration>,
    ) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ClientResult<T>> + Send,
    {
        let (tx, state) = watch::channel(ResourceState::Loading);
        let task = tokio::spawn(async move {
            let mut reconciler = Reconciler::new(domain);
            if let Some(feed) = &feed {
                // Events from before the first fetch are already reflected in it.
                reconciler.last_seen = feed.latest_seq();
            }
            let mut feed = feed;
            let mut ticker = refresh_every.map(|period| {
                let mut ticker = interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                ticker
            });

            loop {
                let next = match fetch().await {
                    Ok(value) => ResourceState::Ready(value),
                    Err(e) => {
                        warn!("Refreshing {domain:?} failed: {e}");
                        ResourceState::Failed(e.to_string())
                    }
                };
                if tx.send(next).is_err() {
                    return;
                }

                loop {
                    tokio::select! {
                        _ = tick(&mut ticker) => break,
                        _ = next_event(&mut feed) => {
                            if let Some(feed) = &feed {
                                if reconciler.observe(&feed.since(reconciler.last_seen())) {
                                    break;
                                }
                            }
                        }
                        _ = tx.closed() => return,
                    }
                }
            }
        });
        Self { state, task }
    }

    pub fn state(&self) -> watch::Ref<'_, ResourceState<T>> {
        self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ResourceState<T>> {
        self.state.clone()
    }

    /// Wait for the next published state.
    pub async fn changed(&mut self) -> bool {
        self.state.changed().await.is_ok()
    }
}

impl<T> Drop for LiveResource<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn next_event(feed: &mut Option<EventFeed>) {
    match feed {
        Some(feed) => feed.changed().await,
        None => std::future::pending().await,
    }
}
