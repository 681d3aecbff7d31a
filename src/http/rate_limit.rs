use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use warp::{Filter, Rejection};

/// Expired windows are swept once the table grows past this many clients.
const SWEEP_THRESHOLD: usize = 10_000;

/// Rejection raised when a client has used up its window.
#[derive(Debug)]
pub struct RateLimited {
    pub retry_after: Duration,
}

impl warp::reject::Reject for RateLimited {}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window request counter per client address.
///
/// Clients without a known address share the `None` bucket. A `max` of zero
/// turns limiting off.
pub struct RateLimiter {
    inner: Mutex<HashMap<Option<IpAddr>, Window>>,
    max: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            max,
            window,
        }
    }

    /// Count one request from `client`. `Err` carries the time left until
    /// the client's window resets.
    pub fn check(&self, client: Option<IpAddr>) -> Result<(), Duration> {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: Option<IpAddr>, now: Instant) -> Result<(), Duration> {
        if self.max == 0 {
            return Ok(());
        }

        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if inner.len() > SWEEP_THRESHOLD {
            let window = self.window;
            inner.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = inner.entry(client).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        if entry.count >= self.max {
            return Err(self.window - now.duration_since(entry.started));
        }
        entry.count += 1;
        Ok(())
    }
}

/// Filter that counts the request against its peer address and rejects
/// with [`RateLimited`] once the window is full.
pub fn limit(limiter: Arc<RateLimiter>) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::addr::remote()
        .and_then(move |addr: Option<SocketAddr>| {
            let limiter = limiter.clone();
            async move {
                limiter
                    .check(addr.map(|a| a.ip()))
                    .map_err(|retry_after| warp::reject::custom(RateLimited { retry_after }))
            }
        })
        .untuple_one()
}
