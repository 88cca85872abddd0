//! Spender - hires workers and pays their salaries, on credit if need be.

use std::sync::Arc;
use std::time::Duration;

use coinville_bank::{Bank, BankClient, ServeError, TxKind};
use coinville_domain::StopSignal;
use coinville_ledger::{Account, LedgerError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Notify;

use crate::worker::Worker;
use crate::{random_bank, RETRY_BACKOFF};

/// Pause after a completed pay cycle before looking for the next hire.
const PAY_PAUSE: Duration = Duration::from_millis(100);

/// A spender cycling through search, hire, borrow-if-short, and pay.
pub struct Spender {
    id: u32,
    name: String,
    account: Arc<Account>,
    salary: u64,
    banks: Arc<Vec<Arc<Bank>>>,
    workers: Arc<Vec<Arc<Worker>>>,
    /// City-wide: pinged whenever a worker is released.
    idle_notify: Arc<Notify>,
    rng_seed: u64,
}

impl Spender {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u32,
        initial_money: u64,
        salary: u64,
        banks: Arc<Vec<Arc<Bank>>>,
        workers: Arc<Vec<Arc<Worker>>>,
        idle_notify: Arc<Notify>,
        rng_seed: u64,
    ) -> Self {
        Self {
            id,
            name: format!("Spender-{id}"),
            account: Arc::new(Account::new(initial_money)),
            salary,
            banks,
            workers,
            idle_notify,
            rng_seed,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn salary(&self) -> u64 {
        self.salary
    }

    pub fn balance(&self) -> i64 {
        self.account.balance()
    }

    /// One pass over the currently idle workers, in uniformly random
    /// order, attempting to claim each until one sticks.
    pub(crate) fn find_claimable(&self, rng: &mut StdRng) -> Option<Arc<Worker>> {
        let mut idle: Vec<&Arc<Worker>> = self.workers.iter().filter(|w| !w.is_hired()).collect();
        while !idle.is_empty() {
            let candidate = idle.swap_remove(rng.gen_range(0..idle.len()));
            if candidate.try_claim() {
                return Some(candidate.clone());
            }
        }
        None
    }

    /// Scans until a worker is claimed. Between scans, waits for a release
    /// ping bounded by a short backoff. None means the day ended first.
    pub(crate) async fn hire(&self, rng: &mut StdRng, stop: &StopSignal) -> Option<Arc<Worker>> {
        loop {
            if stop.is_stopped() {
                return None;
            }
            if let Some(worker) = self.find_claimable(rng) {
                return Some(worker);
            }
            let released = self.idle_notify.notified();
            tokio::select! {
                _ = released => {}
                _ = tokio::time::sleep(RETRY_BACKOFF) => {}
                _ = stop.stopped() => return None,
            }
        }
    }

    /// Takes a loan for the full salary when the balance cannot cover it.
    /// The shortfall is not computed; the whole salary is borrowed even
    /// when the account is only one coin short. True means funds are
    /// ready; false means the stop signal cut the borrowing off.
    pub(crate) async fn borrow_if_short(&self, rng: &mut StdRng, stop: &StopSignal) -> bool {
        if self.balance() >= self.salary as i64 {
            return true;
        }
        loop {
            if stop.is_stopped() {
                return false;
            }
            let bank = random_bank(rng, &self.banks);
            match bank.serve(self, TxKind::Loan, self.salary).await {
                Ok(()) => return true,
                Err(ServeError::Cancelled) => {
                    tokio::select! {
                        _ = tokio::time::sleep(RETRY_BACKOFF) => {}
                        _ = stop.stopped() => return false,
                    }
                }
                Err(ServeError::Ledger(err)) => {
                    // Loans never debit the client; unreachable in practice.
                    tracing::warn!(spender = %self.name, %err, "loan failed");
                    return false;
                }
            }
        }
    }

    /// Moves one salary from this spender to the hired worker.
    pub(crate) fn pay(&self, worker: &Worker) -> Result<(), LedgerError> {
        self.account.debit(self.salary)?;
        worker.receive_salary(self.salary);
        tracing::info!(
            spender = %self.name,
            worker = %worker.name(),
            amount = self.salary,
            "paid salary"
        );
        Ok(())
    }

    /// The spender's day: hire, top up funds, pay, release, pause.
    pub async fn run(self: Arc<Self>, stop: StopSignal) {
        let mut rng = StdRng::seed_from_u64(self.rng_seed);
        while !stop.is_stopped() {
            let Some(worker) = self.hire(&mut rng, &stop).await else {
                break;
            };
            if !self.borrow_if_short(&mut rng, &stop).await {
                // Half-started hire: undo the claim without paying.
                worker.release();
                break;
            }
            if let Err(err) = self.pay(&worker) {
                tracing::warn!(spender = %self.name, %err, "salary payment failed");
            }
            worker.release();
            tokio::select! {
                _ = tokio::time::sleep(PAY_PAUSE) => {}
                _ = stop.stopped() => break,
            }
        }
        tracing::debug!(spender = %self.name, "stopped");
    }
}

impl BankClient for Spender {
    fn client_name(&self) -> &str {
        &self.name
    }

    fn client_account(&self) -> &Account {
        &self.account
    }
}
