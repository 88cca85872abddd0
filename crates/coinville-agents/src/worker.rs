//! Worker - hired for a work period at a time, banks its savings.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use coinville_bank::{Bank, BankClient, ServeError, TxKind};
use coinville_domain::StopSignal;
use coinville_ledger::Account;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::Notify;

use crate::{random_bank, RETRY_BACKOFF};

/// A worker alternating between idle and hired.
///
/// The hired flag is the claim: a spender takes it with a single atomic
/// compare-and-set through [`Worker::try_claim`], so two spenders can
/// never hold the same worker at once.
pub struct Worker {
    id: u32,
    name: String,
    account: Arc<Account>,
    salary: u64,
    deposit_threshold: u64,
    work_duration: Duration,
    banks: Arc<Vec<Arc<Bank>>>,
    hired: AtomicBool,
    /// Wakes this worker's run loop when a spender claims it.
    hired_notify: Notify,
    /// City-wide: pinged on release so scanning spenders wake up.
    idle_notify: Arc<Notify>,
    rng_seed: u64,
}

impl Worker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u32,
        initial_money: u64,
        salary: u64,
        deposit_threshold: u64,
        work_duration: Duration,
        banks: Arc<Vec<Arc<Bank>>>,
        idle_notify: Arc<Notify>,
        rng_seed: u64,
    ) -> Self {
        Self {
            id,
            name: format!("Worker-{id}"),
            account: Arc::new(Account::new(initial_money)),
            salary,
            deposit_threshold,
            work_duration,
            banks,
            hired: AtomicBool::new(false),
            hired_notify: Notify::new(),
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

    pub fn is_hired(&self) -> bool {
        self.hired.load(Ordering::Acquire)
    }

    /// Atomically claims an idle worker. Returns false, leaving the state
    /// untouched, if some spender already holds the claim.
    pub fn try_claim(&self) -> bool {
        let claimed = self
            .hired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if claimed {
            self.hired_notify.notify_one();
        }
        claimed
    }

    /// Returns the worker to idle and pings one scanning spender.
    /// Idempotent; both the worker and its employer may call it.
    pub fn release(&self) {
        if self.hired.swap(false, Ordering::AcqRel) {
            self.idle_notify.notify_one();
        }
    }

    /// Credits a paycheck. Never fails.
    pub fn receive_salary(&self, amount: u64) {
        self.account.credit(amount);
    }

    /// Blocks until claimed or until the day ends. True means hired.
    pub(crate) async fn wait_hired(&self, stop: &StopSignal) -> bool {
        loop {
            let notified = self.hired_notify.notified();
            if self.is_hired() {
                return true;
            }
            if stop.is_stopped() {
                return false;
            }
            tokio::select! {
                _ = notified => {}
                _ = stop.stopped() => return false,
            }
        }
    }

    /// Deposits the current balance snapshot into a random bank, retrying
    /// with a short backoff while banks cancel. True means deposited (or
    /// nothing to deposit); false means the stop signal cut the retry off.
    pub(crate) async fn deposit_savings(&self, rng: &mut StdRng, stop: &StopSignal) -> bool {
        let Ok(amount) = u64::try_from(self.balance()) else {
            return true;
        };
        if amount == 0 {
            return true;
        }
        loop {
            if stop.is_stopped() {
                return false;
            }
            let bank = random_bank(rng, &self.banks);
            match bank.serve(self, TxKind::Deposit, amount).await {
                Ok(()) => {
                    tracing::info!(
                        worker = %self.name,
                        bank = %bank.name(),
                        amount,
                        "deposited savings"
                    );
                    return true;
                }
                Err(ServeError::Cancelled) => {
                    tokio::select! {
                        _ = tokio::time::sleep(RETRY_BACKOFF) => {}
                        _ = stop.stopped() => return false,
                    }
                }
                Err(ServeError::Ledger(err)) => {
                    // Nothing else debits a worker's account, so the
                    // snapshot is always covered; log and move on.
                    tracing::warn!(worker = %self.name, %err, "deposit failed");
                    return true;
                }
            }
        }
    }

    /// The worker's day: wait for a hire, work, release, bank the savings
    /// once they reach the threshold.
    pub async fn run(self: Arc<Self>, stop: StopSignal) {
        let mut rng = StdRng::seed_from_u64(self.rng_seed);
        while !stop.is_stopped() {
            if !self.wait_hired(&stop).await {
                break;
            }
            tokio::time::sleep(self.work_duration).await;
            self.release();
            if self.balance() >= self.deposit_threshold as i64
                && !self.deposit_savings(&mut rng, &stop).await
            {
                break;
            }
        }
        tracing::debug!(worker = %self.name, "stopped");
    }
}

impl BankClient for Worker {
    fn client_name(&self) -> &str {
        &self.name
    }

    fn client_account(&self) -> &Account {
        &self.account
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinville_domain::StopHandle;

    fn test_banks(money: u64) -> Arc<Vec<Arc<Bank>>> {
        Arc::new(vec![Arc::new(Bank::new(1, money))])
    }

    fn test_worker(initial: u64, threshold: u64, banks: Arc<Vec<Arc<Bank>>>) -> Arc<Worker> {
        Arc::new(Worker::new(
            1,
            initial,
            10,
            threshold,
            Duration::from_millis(10),
            banks,
            Arc::new(Notify::new()),
            7,
        ))
    }

    #[tokio::test]
    async fn claim_is_exclusive_until_released() {
        let worker = test_worker(0, 100, test_banks(100));
        assert!(worker.try_claim());
        assert!(!worker.try_claim());
        worker.release();
        assert!(worker.try_claim());
    }

    #[tokio::test]
    async fn concurrent_claims_have_exactly_one_winner() {
        let worker = test_worker(0, 100, test_banks(100));
        let mut attempts = Vec::new();
        for _ in 0..32 {
            let worker = worker.clone();
            attempts.push(tokio::spawn(async move { worker.try_claim() }));
        }
        let mut winners = 0;
        for attempt in attempts {
            if attempt.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn release_is_idempotent() {
        let worker = test_worker(0, 100, test_banks(100));
        assert!(worker.try_claim());
        worker.release();
        worker.release();
        assert!(!worker.is_hired());
    }

    #[tokio::test]
    async fn salary_lands_on_the_account() {
        let worker = test_worker(5, 100, test_banks(100));
        worker.receive_salary(10);
        assert_eq!(worker.balance(), 15);
    }

    #[tokio::test(start_paused = true)]
    async fn deposit_moves_full_balance_snapshot() {
        let banks = test_banks(100);
        let worker = test_worker(20, 20, banks.clone());
        let stop = StopHandle::new();
        let mut rng = StdRng::seed_from_u64(1);

        assert!(worker.deposit_savings(&mut rng, &stop.signal()).await);

        assert_eq!(worker.balance(), 0);
        assert_eq!(banks[0].balance(), 120);
    }

    #[tokio::test(start_paused = true)]
    async fn deposit_retry_abandons_on_stop_without_deadlock() {
        let banks = test_banks(100);
        banks[0].stop();
        let worker = test_worker(50, 20, banks.clone());
        let handle = StopHandle::new();
        let signal = handle.signal();

        let retrying = {
            let worker = worker.clone();
            tokio::spawn(async move {
                let mut rng = StdRng::seed_from_u64(1);
                worker.deposit_savings(&mut rng, &signal).await
            })
        };

        // Let a few cancelled attempts happen, then end the day.
        tokio::time::sleep(RETRY_BACKOFF * 3).await;
        handle.stop();

        let deposited = tokio::time::timeout(Duration::from_secs(5), retrying)
            .await
            .expect("retry loop should exit after stop")
            .unwrap();
        assert!(!deposited);
        assert_eq!(worker.balance(), 50);
        assert_eq!(banks[0].balance(), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_hired_returns_false_on_stop() {
        let worker = test_worker(0, 100, test_banks(100));
        let handle = StopHandle::new();
        let signal = handle.signal();

        let waiting = {
            let worker = worker.clone();
            tokio::spawn(async move { worker.wait_hired(&signal).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.stop();

        let hired = waiting.await.unwrap();
        assert!(!hired);
    }

    #[tokio::test(start_paused = true)]
    async fn run_loop_works_and_deposits_at_threshold() {
        let banks = test_banks(100);
        let worker = test_worker(0, 20, banks.clone());
        let handle = StopHandle::new();

        let running = tokio::spawn(worker.clone().run(handle.signal()));

        // Two hire/pay rounds reach the 20 threshold.
        for _ in 0..2 {
            while !worker.try_claim() {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            worker.receive_salary(10);
            // Wait out the work period until the worker releases itself.
            while worker.is_hired() {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        }
        // Give the deposit a chance to land, then stop the day.
        while banks[0].balance() != 120 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        handle.stop();
        running.await.unwrap();

        assert_eq!(worker.balance(), 0);
        assert_eq!(banks[0].balance(), 120);
    }
}
