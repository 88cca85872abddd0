//! Periodic city bulletin - reads balances, never touches them.

use std::sync::Arc;
use std::time::Duration;

use coinville_domain::StopSignal;

use crate::City;

/// Logs the state of the city at a fixed interval until the day ends.
pub struct Reporter {
    city: Arc<City>,
    interval: Duration,
}

impl Reporter {
    pub fn new(city: Arc<City>, interval: Duration) -> Self {
        Self { city, interval }
    }

    pub async fn run(self, stop: StopSignal) {
        loop {
            self.report();
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = stop.stopped() => break,
            }
        }
    }

    /// One bulletin: the total at info, every account at debug.
    pub fn report(&self) {
        tracing::info!(total = self.city.total_money(), "city bulletin");
        for bank in self.city.banks() {
            tracing::debug!(
                name = %bank.name(),
                balance = bank.balance(),
                busy = bank.is_busy(),
                "bank"
            );
        }
        for worker in self.city.workers() {
            tracing::debug!(
                name = %worker.name(),
                balance = worker.balance(),
                hired = worker.is_hired(),
                "worker"
            );
        }
        for spender in self.city.spenders() {
            tracing::debug!(
                name = %spender.name(),
                balance = spender.balance(),
                "spender"
            );
        }
    }
}
