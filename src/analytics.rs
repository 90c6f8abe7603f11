//! Rolling key-press analytics
//!
//! Counts qualifying key presses into caller-defined trailing windows
//! ("last 60 seconds", "last hour", ...). Presses arrive from the key-event
//! context; a periodic refresh recomputes every window and notifies
//! subscribers once per window index, in window order, so a presentation
//! row can rebind without diffing.
//!
//! Counts are exact: the record log is mutex-guarded, not sampled.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

/// Rate statistics for one trailing window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyticsSnapshot {
    pub window: Duration,
    pub total_presses: u64,
    pub average_per_second: f64,
}

/// One refreshed row, tagged with its position in the window list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyticsUpdate {
    pub index: usize,
    pub snapshot: AnalyticsSnapshot,
}

/// Concurrent-safe rolling aggregator of key-press timestamps.
pub struct KeyAnalytics {
    windows: Vec<Duration>,
    records: Mutex<VecDeque<Instant>>,
    updates: broadcast::Sender<AnalyticsUpdate>,
}

impl KeyAnalytics {
    pub fn new(windows: Vec<Duration>) -> Self {
        let (updates, _) = broadcast::channel(64);
        Self {
            windows,
            records: Mutex::new(VecDeque::new()),
            updates,
        }
    }

    /// The configured windows, in notification order.
    pub fn windows(&self) -> &[Duration] {
        &self.windows
    }

    /// Record one qualifying key press at the current instant.
    pub fn record(&self) {
        self.record_at(Instant::now());
    }

    /// Record a press at an explicit instant (deterministic tests, replay).
    pub fn record_at(&self, at: Instant) {
        self.records.lock().unwrap().push_back(at);
    }

    /// Presses within the trailing window. A zero window counts nothing;
    /// negative windows cannot be expressed.
    pub fn total_presses(&self, window: Duration) -> u64 {
        self.total_presses_at(window, Instant::now())
    }

    fn total_presses_at(&self, window: Duration, now: Instant) -> u64 {
        if window.is_zero() {
            return 0;
        }
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|at| now.duration_since(**at) <= window)
            .count() as u64
    }

    /// Presses per second over the trailing window; 0.0 for a zero window.
    pub fn average_per_second(&self, window: Duration) -> f64 {
        self.average_per_second_at(window, Instant::now())
    }

    fn average_per_second_at(&self, window: Duration, now: Instant) -> f64 {
        if window.is_zero() {
            return 0.0;
        }
        self.total_presses_at(window, now) as f64 / window.as_secs_f64()
    }

    /// Subscribe to per-row refresh notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<AnalyticsUpdate> {
        self.updates.subscribe()
    }

    /// Recompute every window, prune stale records, and notify subscribers
    /// row by row. Called on a fixed cadence regardless of typing activity.
    pub fn refresh(&self) -> Vec<AnalyticsSnapshot> {
        self.refresh_at(Instant::now())
    }

    fn refresh_at(&self, now: Instant) -> Vec<AnalyticsSnapshot> {
        self.prune(now);

        let mut snapshots = Vec::with_capacity(self.windows.len());
        for (index, window) in self.windows.iter().copied().enumerate() {
            let snapshot = AnalyticsSnapshot {
                window,
                total_presses: self.total_presses_at(window, now),
                average_per_second: self.average_per_second_at(window, now),
            };
            snapshots.push(snapshot);
            // Nobody subscribed yet is fine; rows are recomputed next tick
            let _ = self.updates.send(AnalyticsUpdate { index, snapshot });
        }
        snapshots
    }

    /// Drop records no window can see anymore. Purely an optimization:
    /// queries are already bounded by their window.
    fn prune(&self, now: Instant) {
        let Some(max_window) = self.windows.iter().copied().max() else {
            return;
        };
        self.records
            .lock()
            .unwrap()
            .retain(|at| now.duration_since(*at) <= max_window);
    }
}

/// Human-readable window label: "90 seconds" -> "1 minute: 30 seconds".
pub fn format_window(window: Duration) -> String {
    let total = window.as_secs();
    let (days, rest) = (total / 86_400, total % 86_400);
    let (hours, rest) = (rest / 3_600, rest % 3_600);
    let (minutes, seconds) = (rest / 60, rest % 60);

    let mut parts = Vec::new();
    for (amount, unit) in [
        (days, "day"),
        (hours, "hour"),
        (minutes, "minute"),
        (seconds, "second"),
    ] {
        match amount {
            0 => {}
            1 => parts.push(format!("1 {}", unit)),
            n => parts.push(format!("{} {}s", n, unit)),
        }
    }

    if parts.is_empty() {
        "0 seconds".to_string()
    } else {
        parts.join(": ")
    }
}
