//! Bounded id window
//!
//! Ids are kept in insertion order together with the time they were first
//! seen. An id is forgotten when it is older than `ttl` or when the window
//! holds more than `capacity` ids, whichever happens first. A duplicate that
//! arrives after its id was forgotten is accepted again; `capacity` and `ttl`
//! trade memory for how late a duplicate can still be caught.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use parking_lot::Mutex;

use crate::verifier::MessageIdempotentVerifier;

pub const DEFAULT_CAPACITY: usize = 10_000;
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Default)]
struct Window {
    seen: HashMap<String, i64>,
    order: VecDeque<(String, i64)>,
}

#[derive(Debug)]
pub struct WindowedVerifier {
    window: Mutex<Window>,
    capacity: usize,
    ttl_millis: i64,
}

impl Default for WindowedVerifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}

impl WindowedVerifier {
    /// `capacity` is clamped to at least one id.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            window: Mutex::new(Window::default()),
            capacity: capacity.max(1),
            ttl_millis: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of ids currently remembered.
    pub fn len(&self) -> usize {
        self.window.lock().seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `verify` with an explicit clock, in milliseconds since the Unix epoch.
    pub fn verify_at(&self, id: &str, now: i64) -> bool {
        let mut window = self.window.lock();

        let horizon = now.saturating_sub(self.ttl_millis);
        while let Some((_, seen_at)) = window.order.front() {
            if *seen_at > horizon {
                break;
            }
            if let Some((expired, _)) = window.order.pop_front() {
                window.seen.remove(&expired);
            }
        }

        if window.seen.contains_key(id) {
            return false;
        }

        if window.seen.len() >= self.capacity {
            if let Some((oldest, _)) = window.order.pop_front() {
                window.seen.remove(&oldest);
            }
        }

        window.seen.insert(id.to_string(), now);
        window.order.push_back((id.to_string(), now));
        true
    }
}

impl MessageIdempotentVerifier for WindowedVerifier {
    fn verify(&self, id: &str) -> bool {
        self.verify_at(id, chrono::Utc::now().timestamp_millis())
    }
}
