//! Coinville Agents - the worker and spender state machines.
//!
//! Each agent runs as one tokio task:
//!
//! - **[`Worker`]**: waits to be hired, works, banks its savings once they
//!   reach a threshold.
//! - **[`Spender`]**: claims an idle worker, borrows from a bank when short
//!   of funds, pays the salary.
//!
//! Both loops observe the shared [`coinville_domain::StopSignal`] at every
//! suspension point and drain cooperatively at the end of a day.

pub mod spender;
pub mod worker;

pub use spender::Spender;
pub use worker::Worker;

use std::sync::Arc;
use std::time::Duration;

use coinville_bank::Bank;
use rand::rngs::StdRng;
use rand::Rng;

/// Pause between retries after a cancelled bank call, and between idle
/// scans when no worker is claimable.
pub(crate) const RETRY_BACKOFF: Duration = Duration::from_millis(50);

/// Uniform pick among the configured banks. The city guarantees at least
/// one bank exists.
pub(crate) fn random_bank(rng: &mut StdRng, banks: &[Arc<Bank>]) -> Arc<Bank> {
    banks[rng.gen_range(0..banks.len())].clone()
}
