use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

#[derive(Debug)]
struct WindowState {
    start: Instant,
    count: u32,
}

impl WindowState {
    fn fresh(now: Instant) -> Self {
        Self { start: now, count: 0 }
    }

    fn roll(&mut self, now: Instant, window: Duration) {
        if now.duration_since(self.start) >= window {
            *self = Self::fresh(now);
        }
    }

    fn take(&mut self, limit: u32) -> bool {
        if self.count < limit {
            self.count += 1;
            true
        } else {
            false
        }
    }
}

/// Fixed-window counter shared across clones.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    state: Arc<Mutex<WindowState>>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit: limit.max(1),
            window,
            state: Arc::new(Mutex::new(WindowState::fresh(Instant::now()))),
        }
    }

    fn current(&self) -> MutexGuard<'_, WindowState> {
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        guard.roll(Instant::now(), self.window);
        guard
    }

    /// Records one hit; `false` once the window's limit is used up.
    pub fn allow(&self) -> bool {
        self.current().take(self.limit)
    }
}

/// One fixed window per key. Idle keys are dropped once their window lapses.
#[derive(Clone, Debug)]
pub struct KeyedRateLimiter<K> {
    limit: u32,
    window: Duration,
    state: Arc<Mutex<HashMap<K, WindowState>>>,
}

impl<K: Eq + Hash + Clone> KeyedRateLimiter<K> {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit: limit.max(1),
            window,
            state: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn with_entry<R>(&self, key: &K, f: impl FnOnce(&mut WindowState) -> R) -> R {
        let mut map = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let window = self.window;
        map.retain(|_, s| now.duration_since(s.start) < window);
        let entry = map
            .entry(key.clone())
            .or_insert_with(|| WindowState::fresh(now));
        f(entry)
    }

    /// Atomically checks and takes one slot for `key`.
    pub fn allow(&self, key: &K) -> bool {
        let limit = self.limit;
        self.with_entry(key, |s| s.take(limit))
    }

    /// Gives back a slot taken by [`allow`](Self::allow).
    pub fn release(&self, key: &K) {
        self.with_entry(key, |s| s.count = s.count.saturating_sub(1));
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

pub async fn rps_middleware(
    State(state): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !state.allow() {
        return (StatusCode::TOO_MANY_REQUESTS, "rate_limit_exceeded").into_response();
    }
    next.run(req).await
}

pub fn new_rps_state(rps: u32) -> RateLimiter {
    RateLimiter::new(rps, Duration::from_secs(1))
}
