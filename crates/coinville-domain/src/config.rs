//! Simulation parameters — the resolved, typed configuration bundle.
//!
//! Every component receives a `&SimConfig` once, at construction time.
//! There is no process-wide configuration singleton.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Errors from validating a [`SimConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    ZeroField { field: &'static str },
}

/// All tunables for one simulated day.
///
/// Durations are expressed in milliseconds in the file and exposed as
/// [`Duration`] through accessors.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// How long the day lasts before the stop signal fires.
    pub day_duration_ms: u64,
    /// How long a worker holds a hire before releasing.
    pub worker_work_duration_ms: u64,
    pub banks_count: usize,
    pub workers_count: usize,
    pub spenders_count: usize,
    pub bank_initial_money: u64,
    /// Starting balance for every worker and spender.
    pub client_initial_money: u64,
    pub worker_salary: u64,
    /// Savings threshold at which a worker deposits its balance to a bank.
    pub worker_money_limit: u64,
    /// Interval between city-state reports. Zero disables the reporter.
    pub report_interval_ms: u64,
    /// Seed for every agent's RNG; runs with the same seed pick the same
    /// banks and workers in the same order, modulo task scheduling.
    pub rng_seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            day_duration_ms: 10_000,
            worker_work_duration_ms: 200,
            banks_count: 2,
            workers_count: 4,
            spenders_count: 3,
            bank_initial_money: 1_000,
            client_initial_money: 100,
            worker_salary: 20,
            worker_money_limit: 100,
            report_interval_ms: 2_000,
            rng_seed: 42,
        }
    }
}

impl SimConfig {
    pub fn day_duration(&self) -> Duration {
        Duration::from_millis(self.day_duration_ms)
    }

    pub fn work_duration(&self) -> Duration {
        Duration::from_millis(self.worker_work_duration_ms)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }

    /// Checks the parameters a run cannot function without.
    ///
    /// `report_interval_ms` may be zero (reporter disabled); everything
    /// that agents divide the day into may not.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let nonzero: [(&'static str, u64); 6] = [
            ("day_duration_ms", self.day_duration_ms),
            ("worker_work_duration_ms", self.worker_work_duration_ms),
            ("banks_count", self.banks_count as u64),
            ("workers_count", self.workers_count as u64),
            ("spenders_count", self.spenders_count as u64),
            ("worker_salary", self.worker_salary),
        ];
        for (field, value) in nonzero {
            if value == 0 {
                return Err(ConfigError::ZeroField { field });
            }
        }
        Ok(())
    }
}
