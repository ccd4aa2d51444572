//! Timer-driven quote feed.
//!
//! Two independent interval tasks (a full refresh and a faster watchlist
//! nudge) write into a single `watch` cell. Each write swaps in a whole new
//! `QuoteMap`, so subscribers never observe a partially updated map. The
//! simulator sits behind a mutex, which serializes ticks coming from either
//! timer and from manual [`MarketFeed::refresh`] calls.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::{MarketSimulator, QuoteMap, DEFAULT_WATCHLIST};

/// What subscribers see after each tick
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub quotes: Arc<QuoteMap>,
    pub loading: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Default for FeedSnapshot {
    fn default() -> Self {
        Self {
            quotes: Arc::new(QuoteMap::new()),
            loading: true,
            last_updated: None,
        }
    }
}

/// Timer periods and the symbols that get the fast update
#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub main_interval: Duration,
    pub watchlist_interval: Duration,
    pub watchlist: Vec<String>,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            main_interval: Duration::from_secs(30),
            watchlist_interval: Duration::from_secs(10),
            watchlist: DEFAULT_WATCHLIST.iter().map(|s| s.to_string()).collect(),
        }
    }
}

struct FeedInner {
    symbols: Vec<String>,
    simulator: Mutex<MarketSimulator>,
    state: watch::Sender<FeedSnapshot>,
}

impl FeedInner {
    /// Regenerate every symbol. On failure the previous map is kept and only
    /// the loading flag is cleared.
    async fn full_tick(&self) {
        let mut simulator = self.simulator.lock().await;

        match simulator.generate(self.symbols.as_slice()) {
            Ok(quotes) => {
                debug!("Generated {} quotes", quotes.len());
                let quotes = Arc::new(quotes);
                self.state.send_modify(|snapshot| {
                    snapshot.quotes = quotes;
                    snapshot.loading = false;
                    snapshot.last_updated = Some(Utc::now());
                });
            }
            Err(e) => {
                warn!("Quote generation failed, keeping previous quotes: {}", e);
                self.state.send_modify(|snapshot| snapshot.loading = false);
            }
        }
    }

    async fn watchlist_tick(&self, watchlist: &[String]) {
        let mut simulator = self.simulator.lock().await;
        let current = self.state.borrow().quotes.clone();

        if !watchlist.iter().any(|s| current.contains_key(s)) {
            return;
        }

        match simulator.perturb(&current, watchlist) {
            Ok(quotes) => {
                let quotes = Arc::new(quotes);
                self.state.send_modify(|snapshot| snapshot.quotes = quotes);
            }
            Err(e) => warn!("Watchlist update failed: {}", e),
        }
    }
}

/// Periodically refreshed quotes for a fixed set of symbols
pub struct MarketFeed {
    inner: Arc<FeedInner>,
    tasks: Vec<JoinHandle<()>>,
}

impl MarketFeed {
    /// Create a feed for `symbols`. Nothing runs until [`MarketFeed::start`]
    /// or [`MarketFeed::refresh`] is called.
    pub fn new<I, S>(simulator: MarketSimulator, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let symbols: Vec<String> = symbols.into_iter().map(Into::into).collect();
        let (state, _) = watch::channel(FeedSnapshot::default());

        Self {
            inner: Arc::new(FeedInner {
                symbols,
                simulator: Mutex::new(simulator),
                state,
            }),
            tasks: Vec::new(),
        }
    }

    pub fn symbols(&self) -> &[String] {
        &self.inner.symbols
    }

    /// Spawn the two timers. The main timer fires immediately, which serves
    /// as the initial load; the watchlist timer first fires after one period.
    ///
    /// Must be called from within a tokio runtime. Calling it again restarts
    /// the timers.
    pub fn start(&mut self, settings: &FeedSettings) {
        self.shutdown();
        info!(
            "Starting market feed for {} symbols (every {:?}, watchlist every {:?})",
            self.inner.symbols.len(),
            settings.main_interval,
            settings.watchlist_interval
        );

        let inner = Arc::clone(&self.inner);
        let period = settings.main_interval;
        self.tasks.push(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now(), period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                inner.full_tick().await;
            }
        }));

        if !settings.watchlist.is_empty() {
            let inner = Arc::clone(&self.inner);
            let period = settings.watchlist_interval;
            let watchlist = settings.watchlist.clone();
            self.tasks.push(tokio::spawn(async move {
                let mut ticker = interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    ticker.tick().await;
                    inner.watchlist_tick(&watchlist).await;
                }
            }));
        }
    }

    /// Regenerate all quotes now and return the published map.
    pub async fn refresh(&self) -> Arc<QuoteMap> {
        self.inner.full_tick().await;
        self.inner.state.borrow().quotes.clone()
    }

    /// Current value of the feed
    pub fn snapshot(&self) -> FeedSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every published update
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.inner.state.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.tasks.iter().any(|t| !t.is_finished())
    }

    /// Stop both timers. Already published quotes stay readable.
    pub fn shutdown(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        for task in self.tasks.drain(..) {
            task.abort();
        }
        debug!("Market feed timers stopped");
    }
}

impl Drop for MarketFeed {
    fn drop(&mut self) {
        self.shutdown();
    }
}
