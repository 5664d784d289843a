use reqwest::Response;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration};

/// Shared limiter honoring `x-ratelimit-*` headers plus a soft per-minute cap.
#[derive(Clone)]
pub struct RateLimiter {
    state: Arc<Mutex<RateLimitState>>,
    per_minute: u32,
}

struct RateLimitState {
    remaining: f64,
    reset_at: Option<Instant>,
    requests_this_minute: u32,
    minute_start: Instant,
}

impl RateLimiter {
    pub fn new(per_minute: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(RateLimitState {
                remaining: f64::MAX,
                reset_at: None,
                requests_this_minute: 0,
                minute_start: Instant::now(),
            })),
            per_minute: per_minute.max(1),
        }
    }

    pub async fn wait(&self) {
        let mut state = self.state.lock().await;

        if state.remaining < 1.0 {
            if let Some(reset_at) = state.reset_at {
                let now = Instant::now();
                if reset_at > now {
                    let wait_duration = reset_at - now;
                    drop(state);
                    tracing::info!("Rate limited, waiting {:?}", wait_duration);
                    sleep(wait_duration).await;
                    state = self.state.lock().await;
                }
            }
            state.remaining = f64::MAX;
            state.reset_at = None;
        }

        let minute_elapsed = state.minute_start.elapsed();
        if minute_elapsed < Duration::from_secs(60) {
            if state.requests_this_minute >= self.per_minute {
                let wait_time = Duration::from_secs(60) - minute_elapsed;
                drop(state);
                tracing::debug!("Soft rate limiting, waiting {:?}", wait_time);
                sleep(wait_time).await;
                state = self.state.lock().await;
                state.requests_this_minute = 0;
                state.minute_start = Instant::now();
            }
        } else {
            state.requests_this_minute = 0;
            state.minute_start = Instant::now();
        }

        state.requests_this_minute += 1;
    }

    /// Reddit reports `remaining` as a float and `reset` as seconds from now.
    pub async fn update_from_response(&self, response: &Response) {
        let headers = response.headers();
        let remaining = headers
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<f64>().ok());
        let reset_secs = headers
            .get("x-ratelimit-reset")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<f64>().ok());

        self.record(remaining, reset_secs).await;
    }

    async fn record(&self, remaining: Option<f64>, reset_secs: Option<f64>) {
        let Some(remaining) = remaining else {
            return;
        };
        let mut state = self.state.lock().await;
        state.remaining = remaining;
        if let Some(secs) = reset_secs.filter(|s| s.is_finite() && *s > 0.0) {
            state.reset_at = Some(Instant::now() + Duration::from_secs_f64(secs));
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(30)
    }
}
