//! Day lifecycle - start every agent, let the day run, stop, join.

use std::sync::Arc;

use coinville_domain::{SimConfig, StopHandle};

use crate::{City, Reporter};

/// Opening and closing totals of one simulated day. Conservation holds
/// when the two are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayReport {
    pub opening: i64,
    pub closing: i64,
}

impl DayReport {
    pub fn is_balanced(&self) -> bool {
        self.opening == self.closing
    }
}

/// Runs one day over a built [`City`].
///
/// Exactly one task is spawned per worker and per spender. Banks are
/// passive resources and get no task of their own; they are only told to
/// stop so queued requests drain as cancelled.
pub struct Simulation {
    city: Arc<City>,
    cfg: SimConfig,
}

impl Simulation {
    pub fn new(city: Arc<City>, cfg: SimConfig) -> Self {
        Self { city, cfg }
    }

    pub async fn run_day(&self) -> DayReport {
        let opening = self.city.total_money();
        tracing::info!(opening, "day starting");

        let stop = StopHandle::new();
        let mut agents = Vec::new();
        for worker in self.city.workers() {
            agents.push(tokio::spawn(worker.clone().run(stop.signal())));
        }
        for spender in self.city.spenders() {
            agents.push(tokio::spawn(spender.clone().run(stop.signal())));
        }
        let reporter = (self.cfg.report_interval_ms > 0).then(|| {
            let reporter = Reporter::new(self.city.clone(), self.cfg.report_interval());
            tokio::spawn(reporter.run(stop.signal()))
        });

        tokio::time::sleep(self.cfg.day_duration()).await;

        stop.stop();
        for bank in self.city.banks() {
            bank.stop();
        }
        for agent in agents {
            if let Err(err) = agent.await {
                tracing::error!(%err, "agent task failed");
            }
        }
        if let Some(reporter) = reporter {
            if let Err(err) = reporter.await {
                tracing::error!(%err, "reporter task failed");
            }
        }

        let closing = self.city.total_money();
        tracing::info!(closing, "day ended");
        DayReport { opening, closing }
    }
}
