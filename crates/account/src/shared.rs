//! Thread-safe handle around a single [`Account`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::account::{Account, AccountId};
use crate::error::AccountError;

/// Cloneable, lock-guarded account handle.
///
/// Every operation runs its read-check-write under one mutex, so concurrent
/// withdrawals can never jointly overdraw the balance. Clones share the same
/// account.
#[derive(Debug, Clone)]
pub struct SharedAccount {
    inner: Arc<Mutex<Account>>,
}

impl SharedAccount {
    pub fn new(initial_balance: f64) -> Result<Self, AccountError> {
        Ok(Self::from_account(Account::new(initial_balance)?))
    }

    pub fn from_account(account: Account) -> Self {
        Self {
            inner: Arc::new(Mutex::new(account)),
        }
    }

    pub fn id(&self) -> AccountId {
        self.lock().id_typed()
    }

    pub fn balance(&self) -> f64 {
        self.lock().balance()
    }

    /// Copy of the account as of now.
    pub fn snapshot(&self) -> Account {
        self.lock().clone()
    }

    pub fn deposit(&self, amount: f64) -> Result<(), AccountError> {
        let mut account = self.lock();
        match account.deposit(amount) {
            Ok(()) => {
                tracing::debug!(
                    account_id = %account.id_typed(),
                    amount,
                    balance = account.balance(),
                    "deposit accepted"
                );
                Ok(())
            }
            Err(err) => {
                tracing::info!(account_id = %account.id_typed(), error = %err, "deposit rejected");
                Err(err)
            }
        }
    }

    pub fn withdraw(&self, amount: f64) -> Result<(), AccountError> {
        let mut account = self.lock();
        match account.withdraw(amount) {
            Ok(()) => {
                tracing::debug!(
                    account_id = %account.id_typed(),
                    amount,
                    balance = account.balance(),
                    "withdrawal accepted"
                );
                Ok(())
            }
            Err(err) => {
                tracing::info!(account_id = %account.id_typed(), error = %err, "withdrawal rejected");
                Err(err)
            }
        }
    }

    // Account state is only replaced after validation, so a poisoned guard
    // still holds a consistent account.
    fn lock(&self) -> MutexGuard<'_, Account> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<Account> for SharedAccount {
    fn from(account: Account) -> Self {
        Self::from_account(account)
    }
}
