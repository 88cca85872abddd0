//! Coinville Bank - one teller, one transaction at a time.
//!
//! A [`Bank`] is a passive shared resource: clients call [`Bank::serve`]
//! and wait their turn at the single teller. Stopping a bank wakes every
//! queued waiter so no request stays blocked across shutdown.
//!
//! # Invariants
//!
//! 1. At most one transaction is in flight per bank at any instant.
//! 2. A transaction moves money between exactly two accounts, both sides
//!    inside the critical section, or moves nothing at all.
//! 3. Loans are money creation: the vault is debited without a reserve
//!    check and may go negative without bound.

use std::sync::atomic::{AtomicBool, Ordering};

use coinville_ledger::{Account, LedgerError};
use thiserror::Error;
use tokio::sync::{Mutex, Notify};

/// Errors that can occur while a bank serves a client.
#[derive(Debug, Error)]
pub enum ServeError {
    /// The bank was stopping while the request was pending; no money moved.
    #[error("bank is stopping, request cancelled")]
    Cancelled,

    /// The client could not cover a deposit.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

pub type Result<T> = std::result::Result<T, ServeError>;

/// Loan or deposit, from the client's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxKind {
    /// Bank credits the client and overdraws its own vault.
    Loan,
    /// Client's account is debited, vault credited.
    Deposit,
}

/// The seam between banks and their clients: anything with a display name
/// and an account can be served.
pub trait BankClient: Send + Sync {
    fn client_name(&self) -> &str;
    fn client_account(&self) -> &Account;
}

/// A bank with a single teller window.
#[derive(Debug)]
pub struct Bank {
    id: u32,
    name: String,
    vault: Account,
    /// The teller window. Held for the duration of one transaction.
    teller: Mutex<()>,
    /// True while a transaction is inside the critical section.
    busy: AtomicBool,
    stopping: AtomicBool,
    stop_notify: Notify,
}

impl Bank {
    pub fn new(id: u32, initial_money: u64) -> Self {
        Self {
            id,
            name: format!("Bank-{id}"),
            vault: Account::new(initial_money),
            teller: Mutex::new(()),
            busy: AtomicBool::new(false),
            stopping: AtomicBool::new(false),
            stop_notify: Notify::new(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Snapshot of the vault balance. Negative once loans exceed reserves.
    pub fn balance(&self) -> i64 {
        self.vault.balance()
    }

    /// True while a transaction occupies the teller.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::Acquire)
    }

    /// Marks the bank as stopping and wakes every queued [`Bank::serve`]
    /// call so each returns [`ServeError::Cancelled`] instead of hanging.
    pub fn stop(&self) {
        self.stopping.store(true, Ordering::Release);
        self.stop_notify.notify_waiters();
    }

    async fn stopped(&self) {
        loop {
            let notified = self.stop_notify.notified();
            if self.is_stopping() {
                return;
            }
            notified.await;
        }
    }

    /// Handles one loan or deposit for `client`.
    ///
    /// Blocks while another transaction holds the teller. If the bank is
    /// signaled to stop while this call is waiting (or before the money
    /// moves), returns [`ServeError::Cancelled`] and transfers nothing.
    /// A deposit the client cannot cover fails with
    /// [`LedgerError::InsufficientFunds`] and leaves both accounts intact.
    pub async fn serve(&self, client: &dyn BankClient, kind: TxKind, amount: u64) -> Result<()> {
        let _teller = tokio::select! {
            guard = self.teller.lock() => guard,
            _ = self.stopped() => return Err(ServeError::Cancelled),
        };
        // A stop can land between winning the teller and this point.
        if self.is_stopping() {
            return Err(ServeError::Cancelled);
        }

        let was_busy = self.busy.swap(true, Ordering::AcqRel);
        debug_assert!(!was_busy, "second transaction entered the teller");

        let result = match kind {
            TxKind::Loan => {
                client.client_account().credit(amount);
                self.vault.overdraw(amount);
                tracing::info!(
                    bank = %self.name,
                    client = client.client_name(),
                    amount,
                    "issued loan"
                );
                Ok(())
            }
            TxKind::Deposit => match client.client_account().debit(amount) {
                Ok(_) => {
                    self.vault.credit(amount);
                    tracing::info!(
                        bank = %self.name,
                        client = client.client_name(),
                        amount,
                        "accepted deposit"
                    );
                    Ok(())
                }
                Err(err) => Err(err.into()),
            },
        };

        self.busy.store(false, Ordering::Release);
        result
    }
}
