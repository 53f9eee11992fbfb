use tokio::time::{sleep, sleep_until, Duration, Instant};

/// Keeps consecutive calls at least `interval` apart.
///
/// The interval counts from the moment the previous call finished, so nothing waits
/// after the last call.
#[derive(Debug)]
pub struct RateGate {
    interval: Duration,
    last: Option<Instant>,
}

impl RateGate {
    pub fn new(interval: Duration) -> Self {
        RateGate {
            interval,
            last: None,
        }
    }

    /// Waits until the next call may start.
    pub async fn ready(&self) {
        if let Some(last) = self.last {
            match last.checked_add(self.interval) {
                Some(deadline) => sleep_until(deadline).await,
                None => sleep(self.interval).await,
            }
        }
    }

    /// Marks the end of a call.
    pub fn record(&mut self) {
        self.last = Some(Instant::now());
    }
}
