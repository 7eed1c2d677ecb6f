use thiserror::Error;

/// Rejected account operation. A rejection never mutates the balance.
///
/// Each variant carries the amounts involved; use [`AccountError::kind`] to
/// match on the bare category.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum AccountError {
    /// Deposit was zero, negative, or not finite (also used for a negative opening balance).
    #[error("invalid deposit of {amount}: amount must be positive")]
    NegativeDeposit { amount: f64 },

    /// Withdrawal amount was zero, negative, or not finite.
    #[error("invalid withdrawal of {amount}: amount must be positive")]
    NegativeWithdrawal { amount: f64 },

    /// Withdrawal amount exceeds the current balance.
    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: f64, available: f64 },
}

/// Payload-free error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountErrorKind {
    NegativeDeposit,
    NegativeWithdrawal,
    InsufficientFunds,
}

impl AccountError {
    pub fn kind(&self) -> AccountErrorKind {
        match self {
            AccountError::NegativeDeposit { .. } => AccountErrorKind::NegativeDeposit,
            AccountError::NegativeWithdrawal { .. } => AccountErrorKind::NegativeWithdrawal,
            AccountError::InsufficientFunds { .. } => AccountErrorKind::InsufficientFunds,
        }
    }
}
