//! Coinville Ledger - the thread-safe money primitive.
//!
//! Every bank, worker, and spender owns exactly one [`Account`]. Balances
//! move only through [`Account::credit`] and [`Account::debit`]; reads are
//! atomic snapshots. All operations are linearizable.
//!
//! # Invariants
//!
//! 1. No negative balances — `debit` fails with [`LedgerError::InsufficientFunds`]
//!    instead of going below zero, with no side effect on failure.
//! 2. One documented exception: [`Account::overdraw`] subtracts
//!    unconditionally and exists only for a bank vault issuing a loan.
//! 3. Amounts are `u64`; a negative amount is unrepresentable.

use std::sync::atomic::{AtomicI64, Ordering};

use thiserror::Error;

/// Errors that can occur in account operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("insufficient funds: have {available}, need {required}")]
    InsufficientFunds { available: i64, required: u64 },
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// A single money balance shared between concurrent tasks.
///
/// The balance is signed: worker and spender accounts stay non-negative
/// because every withdrawal goes through [`Account::debit`], while a bank
/// vault may be driven negative by [`Account::overdraw`].
#[derive(Debug, Default)]
pub struct Account {
    balance: AtomicI64,
}

/// Amounts above `i64::MAX` cannot be represented in a balance.
///
/// # Panics
///
/// Panics on such amounts; simulation money is small integers.
fn to_delta(amount: u64) -> i64 {
    i64::try_from(amount).expect("amount exceeds i64::MAX")
}

impl Account {
    pub fn new(initial: u64) -> Self {
        Self {
            balance: AtomicI64::new(to_delta(initial)),
        }
    }

    /// Atomic snapshot of the current balance.
    pub fn balance(&self) -> i64 {
        self.balance.load(Ordering::Acquire)
    }

    /// Adds `amount` to the balance. Returns the new balance.
    pub fn credit(&self, amount: u64) -> i64 {
        let delta = to_delta(amount);
        self.balance.fetch_add(delta, Ordering::AcqRel) + delta
    }

    /// Subtracts `amount` if the balance covers it. Returns the new balance.
    ///
    /// On [`LedgerError::InsufficientFunds`] the balance is untouched.
    pub fn debit(&self, amount: u64) -> Result<i64> {
        let delta = to_delta(amount);
        let mut current = self.balance.load(Ordering::Acquire);
        loop {
            if current < delta {
                return Err(LedgerError::InsufficientFunds {
                    available: current,
                    required: amount,
                });
            }
            match self.balance.compare_exchange_weak(
                current,
                current - delta,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(current - delta),
                Err(observed) => current = observed,
            }
        }
    }

    /// Subtracts `amount` unconditionally, allowing the balance to go
    /// negative. Loan issuance only: a bank creates money without a
    /// reserve check, and its vault carries the debt.
    pub fn overdraw(&self, amount: u64) -> i64 {
        let delta = to_delta(amount);
        self.balance.fetch_sub(delta, Ordering::AcqRel) - delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn credit_and_balance() {
        let account = Account::new(100);
        assert_eq!(account.balance(), 100);
        assert_eq!(account.credit(50), 150);
        assert_eq!(account.balance(), 150);
    }

    #[test]
    fn debit_within_balance() {
        let account = Account::new(100);
        assert_eq!(account.debit(40).unwrap(), 60);
        assert_eq!(account.balance(), 60);
    }

    #[test]
    fn debit_insufficient_has_no_side_effect() {
        let account = Account::new(30);
        let result = account.debit(31);
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientFunds {
                available: 30,
                required: 31
            })
        ));
        assert_eq!(account.balance(), 30);
    }

    #[test]
    fn debit_exact_balance_empties_account() {
        let account = Account::new(25);
        assert_eq!(account.debit(25).unwrap(), 0);
    }

    #[test]
    fn overdraw_goes_negative() {
        let account = Account::new(10);
        assert_eq!(account.overdraw(25), -15);
        assert_eq!(account.balance(), -15);
    }

    #[test]
    fn concurrent_transfers_conserve_total() {
        let a = Arc::new(Account::new(10_000));
        let b = Arc::new(Account::new(10_000));

        let mut handles = Vec::new();
        for i in 0..8 {
            let (from, to) = if i % 2 == 0 {
                (a.clone(), b.clone())
            } else {
                (b.clone(), a.clone())
            };
            handles.push(std::thread::spawn(move || {
                for _ in 0..1_000 {
                    if from.debit(3).is_ok() {
                        to.credit(3);
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(a.balance() + b.balance(), 20_000);
        assert!(a.balance() >= 0);
        assert!(b.balance() >= 0);
    }
}
