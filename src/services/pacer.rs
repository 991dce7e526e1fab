use async_trait::async_trait;
use std::time::Duration;

/// Spaces out calls to the quiz generator. Awaited once after every
/// generation attempt, whatever its outcome.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self);
}

#[derive(Debug, Clone)]
pub struct FixedIntervalPacer {
    interval: Duration,
}

impl FixedIntervalPacer {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[async_trait]
impl Pacer for FixedIntervalPacer {
    async fn pause(&self) {
        if !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }
    }
}
