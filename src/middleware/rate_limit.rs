use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::Error;

const WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct WindowState {
    start: Instant,
    count: u32,
}

/// Fixed one-second window request limiter shared by every clone.
#[derive(Clone, Debug)]
pub struct RequestLimiter {
    per_window: u32,
    window: Arc<Mutex<WindowState>>,
}

impl RequestLimiter {
    pub fn new(per_second: u32) -> Self {
        Self {
            per_window: per_second.max(1),
            window: Arc::new(Mutex::new(WindowState {
                start: Instant::now(),
                count: 0,
            })),
        }
    }

    /// Counts a request at `now`; returns the wait until the window reopens
    /// when the request is over budget.
    fn admit_at(&self, now: Instant) -> Option<Duration> {
        let mut guard = self.window.lock().unwrap_or_else(|p| p.into_inner());
        let elapsed = now.saturating_duration_since(guard.start);
        if elapsed >= WINDOW {
            guard.start = now;
            guard.count = 0;
        }
        if guard.count < self.per_window {
            guard.count += 1;
            None
        } else {
            Some(WINDOW.saturating_sub(elapsed))
        }
    }
}

pub async fn limit_requests(
    State(limiter): State<RequestLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(wait) = limiter.admit_at(Instant::now()) {
        tracing::warn!(path = %req.uri().path(), "Rate limit exceeded");
        let retry_after_secs = wait.as_secs_f64().ceil().max(1.0) as u64;
        return Error::RateLimited { retry_after_secs }.into_response();
    }
    next.run(req).await
}
