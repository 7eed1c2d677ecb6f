//! Account domain module.
//!
//! A single monetary account with guarded deposits and withdrawals. The
//! [`Account`] aggregate is pure domain logic; [`SharedAccount`] adds the
//! locking (and logging) needed when several threads hold the same account.

pub mod account;
pub mod error;
pub mod shared;

pub use account::{
    Account, AccountCommand, AccountEvent, AccountId, AccountOpened, Deposit, FundsDeposited,
    FundsWithdrawn, Withdraw,
};
pub use error::{AccountError, AccountErrorKind};
pub use shared::SharedAccount;
