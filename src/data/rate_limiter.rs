//! Global per-minute REST weight budget. Many symbols can close the same
//! 5m candle at once; the limiter spreads the resulting kline fetches so
//! the exchange budget is never breached.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct WeightLimiter {
    inner: Arc<Mutex<Bucket>>,
}

struct Bucket {
    used: u32,
    /// The wall-clock minute the current count belongs to.
    minute_idx: u64,
    limit: u32,
}

impl WeightLimiter {
    pub fn new(limit: u32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Bucket {
                used: 0,
                minute_idx: Self::current_minute_idx(),
                limit,
            })),
        }
    }

    /// Waits until `cost` weight fits in the current minute, then books it.
    pub async fn acquire(&self, cost: u32) {
        loop {
            let wait = {
                let mut bucket = self.inner.lock().await;
                let now_idx = Self::current_minute_idx();

                if now_idx > bucket.minute_idx {
                    bucket.used = 0;
                    bucket.minute_idx = now_idx;
                }

                if bucket.used + cost <= bucket.limit {
                    bucket.used += cost;
                    return;
                }

                // Sleep through to the next minute boundary, with a small
                // margin so we land inside it.
                let now_secs = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or(Duration::ZERO)
                    .as_secs();
                Duration::from_secs(60 - now_secs % 60) + Duration::from_millis(100)
            };

            log::warn!("REST weight budget exhausted; waiting {:?}.", wait);
            tokio::time::sleep(wait).await;
        }
    }

    fn current_minute_idx() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs()
            / 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquisitions_within_budget_do_not_block() {
        let limiter = WeightLimiter::new(10);
        for _ in 0..5 {
            limiter.acquire(2).await;
        }
        assert_eq!(limiter.inner.lock().await.used, 10);
    }
}
