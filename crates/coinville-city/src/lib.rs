//! Coinville City - the registry of banks, workers, and spenders.
//!
//! A [`City`] is built exactly once from a [`SimConfig`] and is immutable
//! in shape from then on; only balances and hire flags mutate. Iterating
//! the collections therefore needs no locking.

pub mod engine;
pub mod reporter;

pub use engine::{DayReport, Simulation};
pub use reporter::Reporter;

use std::sync::Arc;

use coinville_agents::{Spender, Worker};
use coinville_bank::Bank;
use coinville_domain::{ConfigError, SimConfig};
use tokio::sync::Notify;

/// Offset separating spender RNG streams from worker streams under the
/// same configured seed.
const SPENDER_SEED_OFFSET: u64 = 0x5EED;

/// All the inhabitants of one simulation run.
pub struct City {
    banks: Arc<Vec<Arc<Bank>>>,
    workers: Arc<Vec<Arc<Worker>>>,
    spenders: Vec<Arc<Spender>>,
}

impl City {
    /// Builds banks, then workers, then spenders, sized and funded from
    /// the configuration.
    pub fn build(cfg: &SimConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;

        let idle_notify = Arc::new(Notify::new());

        let banks: Arc<Vec<Arc<Bank>>> = Arc::new(
            (1..=cfg.banks_count)
                .map(|i| Arc::new(Bank::new(i as u32, cfg.bank_initial_money)))
                .collect(),
        );

        let workers: Arc<Vec<Arc<Worker>>> = Arc::new(
            (1..=cfg.workers_count)
                .map(|i| {
                    Arc::new(Worker::new(
                        i as u32,
                        cfg.client_initial_money,
                        cfg.worker_salary,
                        cfg.worker_money_limit,
                        cfg.work_duration(),
                        banks.clone(),
                        idle_notify.clone(),
                        cfg.rng_seed.wrapping_add(i as u64),
                    ))
                })
                .collect(),
        );

        let spenders = (1..=cfg.spenders_count)
            .map(|i| {
                Arc::new(Spender::new(
                    i as u32,
                    cfg.client_initial_money,
                    cfg.worker_salary,
                    banks.clone(),
                    workers.clone(),
                    idle_notify.clone(),
                    cfg.rng_seed
                        .wrapping_add(SPENDER_SEED_OFFSET)
                        .wrapping_add(i as u64),
                ))
            })
            .collect();

        Ok(Self {
            banks,
            workers,
            spenders,
        })
    }

    pub fn banks(&self) -> &[Arc<Bank>] {
        &self.banks
    }

    pub fn workers(&self) -> &[Arc<Worker>] {
        &self.workers
    }

    pub fn spenders(&self) -> &[Arc<Spender>] {
        &self.spenders
    }

    /// Sum of every account in the city at the instant of the call.
    ///
    /// Each balance is an atomic read; the sum is not a single snapshot,
    /// so call it while the city is quiescent to check conservation.
    pub fn total_money(&self) -> i64 {
        self.banks.iter().map(|b| b.balance()).sum::<i64>()
            + self.workers.iter().map(|w| w.balance()).sum::<i64>()
            + self.spenders.iter().map(|s| s.balance()).sum::<i64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_sizes_and_funds_from_config() {
        let cfg = SimConfig {
            banks_count: 2,
            workers_count: 3,
            spenders_count: 4,
            bank_initial_money: 500,
            client_initial_money: 25,
            ..SimConfig::default()
        };
        let city = City::build(&cfg).unwrap();

        assert_eq!(city.banks().len(), 2);
        assert_eq!(city.workers().len(), 3);
        assert_eq!(city.spenders().len(), 4);
        assert_eq!(city.banks()[0].name(), "Bank-1");
        assert_eq!(city.workers()[2].name(), "Worker-3");
        assert_eq!(city.spenders()[3].name(), "Spender-4");
        assert_eq!(city.workers()[0].salary(), cfg.worker_salary);
        assert_eq!(city.total_money(), 2 * 500 + (3 + 4) * 25);
    }

    #[test]
    fn build_rejects_invalid_config() {
        let cfg = SimConfig {
            workers_count: 0,
            ..SimConfig::default()
        };
        assert!(City::build(&cfg).is_err());
    }
}
