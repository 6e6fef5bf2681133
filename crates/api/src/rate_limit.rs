//! Fixed-window request limiter for the unauthenticated log ingest.
//!
//! Deliberately small: an in-process `Mutex<HashMap>` of per-key window
//! counters. Limits are per API instance; the ingest endpoint is
//! best-effort telemetry, not an accounting surface.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Per-key fixed-window counter.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    window: Duration,
    max_per_window: u32,
    windows: Mutex<HashMap<String, Window>>,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: Instant,
    count: u32,
}

impl FixedWindowLimiter {
    pub fn new(window: Duration, max_per_window: u32) -> Self {
        FixedWindowLimiter {
            window,
            max_per_window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Record one request for `key`. Returns `false` when the key has
    /// exhausted its budget for the current window.
    pub fn try_acquire(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock().expect("limiter mutex poisoned");

        // Opportunistic cleanup so idle keys do not accumulate.
        windows.retain(|_, w| now.duration_since(w.started_at) < self.window);

        let window = windows.entry(key.to_string()).or_insert(Window {
            started_at: now,
            count: 0,
        });

        if window.count >= self.max_per_window {
            return false;
        }
        window.count += 1;
        true
    }
}
