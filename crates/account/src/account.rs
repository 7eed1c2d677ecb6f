use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bankacct_core::{Aggregate, AggregateId, AggregateRoot};
use bankacct_events::Event;

use crate::error::AccountError;

/// Account identifier (aggregate id).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub AggregateId);

impl AccountId {
    pub fn new() -> Self {
        Self(AggregateId::new())
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for AccountId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Aggregate root: a single monetary account.
///
/// The balance is private and only changes through [`Account::deposit`],
/// [`Account::withdraw`] or by applying an [`AccountEvent`]. Deposits follow
/// plain `f64` addition, so only a sum beyond `f64::MAX` leaves it non-finite.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    id: AccountId,
    balance: f64,
    version: u64,
}

/// Command: Deposit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Deposit {
    pub amount: f64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Withdraw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Withdraw {
    pub amount: f64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AccountCommand {
    Deposit(Deposit),
    Withdraw(Withdraw),
}

impl AccountCommand {
    pub fn deposit(amount: f64) -> Self {
        Self::Deposit(Deposit {
            amount,
            occurred_at: Utc::now(),
        })
    }

    pub fn withdraw(amount: f64) -> Self {
        Self::Withdraw(Withdraw {
            amount,
            occurred_at: Utc::now(),
        })
    }
}

/// Event: AccountOpened.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccountOpened {
    pub account_id: AccountId,
    pub initial_balance: f64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: FundsDeposited.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FundsDeposited {
    pub account_id: AccountId,
    pub amount: f64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: FundsWithdrawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FundsWithdrawn {
    pub account_id: AccountId,
    pub amount: f64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AccountEvent {
    Opened(AccountOpened),
    Deposited(FundsDeposited),
    Withdrawn(FundsWithdrawn),
}

impl Event for AccountEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AccountEvent::Opened(_) => "account.opened",
            AccountEvent::Deposited(_) => "account.deposited",
            AccountEvent::Withdrawn(_) => "account.withdrawn",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            AccountEvent::Opened(e) => e.occurred_at,
            AccountEvent::Deposited(e) => e.occurred_at,
            AccountEvent::Withdrawn(e) => e.occurred_at,
        }
    }
}

impl Account {
    /// Empty, not-yet-opened account for rehydration from events.
    pub fn empty(id: AccountId) -> Self {
        Self {
            id,
            balance: 0.0,
            version: 0,
        }
    }

    /// Open an account with a fresh id.
    ///
    /// Rejects a negative or non-finite `initial_balance` with
    /// [`AccountError::NegativeDeposit`]. Zero is accepted.
    pub fn new(initial_balance: f64) -> Result<Self, AccountError> {
        Self::open(AccountId::new(), initial_balance, Utc::now())
    }

    /// Open an account with an explicit id and business time.
    pub fn open(
        id: AccountId,
        initial_balance: f64,
        occurred_at: DateTime<Utc>,
    ) -> Result<Self, AccountError> {
        if initial_balance < 0.0 || !initial_balance.is_finite() {
            return Err(AccountError::NegativeDeposit {
                amount: initial_balance,
            });
        }

        let mut account = Self::empty(id);
        account.apply(&AccountEvent::Opened(AccountOpened {
            account_id: id,
            // Adding +0.0 turns -0.0 into +0.0.
            initial_balance: initial_balance + 0.0,
            occurred_at,
        }));
        Ok(account)
    }

    pub fn id_typed(&self) -> AccountId {
        self.id
    }

    /// Current balance, exactly as stored.
    pub fn balance(&self) -> f64 {
        self.balance
    }

    /// Add a positive amount to the balance.
    pub fn deposit(&mut self, amount: f64) -> Result<(), AccountError> {
        self.execute(&AccountCommand::deposit(amount))?;
        Ok(())
    }

    /// Take a positive amount not exceeding the balance. Withdrawing the whole
    /// balance leaves exactly zero.
    pub fn withdraw(&mut self, amount: f64) -> Result<(), AccountError> {
        self.execute(&AccountCommand::withdraw(amount))?;
        Ok(())
    }
}

impl AggregateRoot for Account {
    type Id = AccountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Aggregate for Account {
    type Command = AccountCommand;
    type Event = AccountEvent;
    type Error = AccountError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            AccountEvent::Opened(e) => {
                self.id = e.account_id;
                self.balance = e.initial_balance;
            }
            AccountEvent::Deposited(e) => {
                self.balance += e.amount;
            }
            AccountEvent::Withdrawn(e) => {
                self.balance -= e.amount;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            AccountCommand::Deposit(cmd) => self.handle_deposit(cmd),
            AccountCommand::Withdraw(cmd) => self.handle_withdraw(cmd),
        }
    }
}

impl Account {
    fn handle_deposit(&self, cmd: &Deposit) -> Result<Vec<AccountEvent>, AccountError> {
        let amount = cmd.amount;
        // `<= 0.0` alone lets NaN through.
        if amount <= 0.0 || !amount.is_finite() {
            return Err(AccountError::NegativeDeposit { amount });
        }

        Ok(vec![AccountEvent::Deposited(FundsDeposited {
            account_id: self.id,
            amount,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_withdraw(&self, cmd: &Withdraw) -> Result<Vec<AccountEvent>, AccountError> {
        let amount = cmd.amount;
        if amount <= 0.0 || !amount.is_finite() {
            return Err(AccountError::NegativeWithdrawal { amount });
        }
        if amount > self.balance {
            return Err(AccountError::InsufficientFunds {
                requested: amount,
                available: self.balance,
            });
        }

        Ok(vec![AccountEvent::Withdrawn(FundsWithdrawn {
            account_id: self.id,
            amount,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AccountErrorKind;
    use proptest::prelude::*;

    fn test_account() -> Account {
        Account::new(100.0).unwrap()
    }

    #[test]
    fn new_account_holds_initial_balance() {
        let account = test_account();
        assert_eq!(account.balance(), 100.0);
        assert_eq!(account.version(), 1);
    }

    #[test]
    fn negative_initial_balance_is_rejected() {
        let err = Account::new(-100.0).unwrap_err();
        assert_eq!(err, AccountError::NegativeDeposit { amount: -100.0 });
    }

    #[test]
    fn zero_initial_balance_is_allowed() {
        let account = Account::new(0.0).unwrap();
        assert_eq!(account.balance(), 0.0);
    }

    #[test]
    fn non_finite_initial_balance_is_rejected() {
        for initial in [f64::NAN, f64::INFINITY] {
            let err = Account::new(initial).unwrap_err();
            assert_eq!(err.kind(), AccountErrorKind::NegativeDeposit);
        }
    }

    #[test]
    fn open_uses_given_id() {
        let id = AccountId::new();
        let account = Account::open(id, 5.0, Utc::now()).unwrap();
        assert_eq!(account.id_typed(), id);
        assert_eq!(*account.id(), id);
    }

    #[test]
    fn handle_does_not_mutate() {
        let account = test_account();
        let before = account.clone();

        let events = account.handle(&AccountCommand::deposit(25.0)).unwrap();
        assert_eq!(events.len(), 1);
        match &events[0] {
            AccountEvent::Deposited(e) => {
                assert_eq!(e.amount, 25.0);
                assert_eq!(e.account_id, account.id_typed());
            }
            other => panic!("expected Deposited, got {other:?}"),
        }
        assert_eq!(account, before);
    }

    #[test]
    fn execute_applies_events_and_bumps_version() {
        let mut account = test_account();
        let events = account.execute(&AccountCommand::withdraw(40.0)).unwrap();
        assert_eq!(events[0].event_type(), "account.withdrawn");
        assert_eq!(account.balance(), 60.0);
        assert_eq!(account.version(), 2);
    }

    #[test]
    fn rejected_command_leaves_version_untouched() {
        let mut account = test_account();
        account.withdraw(200.0).unwrap_err();
        account.deposit(0.0).unwrap_err();
        assert_eq!(account.version(), 1);
        assert_eq!(account.balance(), 100.0);
    }

    #[test]
    fn nan_amounts_are_rejected() {
        let mut account = test_account();
        assert_eq!(
            account.deposit(f64::NAN).unwrap_err().kind(),
            AccountErrorKind::NegativeDeposit
        );
        assert_eq!(
            account.withdraw(f64::NAN).unwrap_err().kind(),
            AccountErrorKind::NegativeWithdrawal
        );
        assert_eq!(account.balance(), 100.0);
    }

    #[test]
    fn deposit_past_max_follows_float_semantics() {
        let mut account = Account::new(f64::MAX).unwrap();
        account.deposit(f64::MAX).unwrap();
        assert_eq!(account.balance(), f64::INFINITY);
        assert_eq!(account.version(), 2);
    }

    #[test]
    fn infinite_deposit_is_rejected() {
        let mut account = test_account();
        let err = account.deposit(f64::INFINITY).unwrap_err();
        assert_eq!(err.kind(), AccountErrorKind::NegativeDeposit);
        assert_eq!(account.balance(), 100.0);
    }

    #[test]
    fn negative_zero_initial_balance_is_stored_as_zero() {
        let account = Account::new(-0.0).unwrap();
        assert_eq!(account.balance(), 0.0);
        assert!(account.balance().is_sign_positive());
    }

    #[test]
    fn insufficient_funds_reports_available_balance() {
        let mut account = test_account();
        let err = account.withdraw(100.5).unwrap_err();
        assert_eq!(
            err,
            AccountError::InsufficientFunds {
                requested: 100.5,
                available: 100.0,
            }
        );
    }

    #[test]
    fn events_serialize_with_their_payload() {
        let mut account = test_account();
        let events = account.execute(&AccountCommand::deposit(12.5)).unwrap();
        let json = serde_json::to_value(&events[0]).unwrap();
        assert_eq!(json["Deposited"]["amount"], 12.5);

        let back: AccountEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, events[0]);
    }

    #[test]
    fn replaying_events_rebuilds_state() {
        let id = AccountId::new();
        let at = Utc::now();
        let events = [
            AccountEvent::Opened(AccountOpened {
                account_id: id,
                initial_balance: 10.0,
                occurred_at: at,
            }),
            AccountEvent::Deposited(FundsDeposited {
                account_id: id,
                amount: 5.0,
                occurred_at: at,
            }),
            AccountEvent::Withdrawn(FundsWithdrawn {
                account_id: id,
                amount: 15.0,
                occurred_at: at,
            }),
        ];

        let mut account = Account::empty(AccountId::new());
        for e in &events {
            account.apply(e);
        }
        assert_eq!(account.id_typed(), id);
        assert_eq!(account.balance(), 0.0);
        assert_eq!(account.version(), events.len() as u64);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        #[test]
        fn positive_deposit_adds_to_balance(
            initial in 0.0f64..1e9,
            amount in 1e-6f64..1e9,
        ) {
            let mut account = Account::new(initial).unwrap();
            account.deposit(amount).unwrap();
            prop_assert_eq!(account.balance(), initial + amount);
        }

        #[test]
        fn non_positive_deposit_is_rejected(
            initial in 0.0f64..1e9,
            amount in -1e9f64..=0.0,
        ) {
            let mut account = Account::new(initial).unwrap();
            let err = account.deposit(amount).unwrap_err();
            prop_assert_eq!(err.kind(), AccountErrorKind::NegativeDeposit);
            prop_assert_eq!(account.balance(), initial);
        }

        #[test]
        fn covered_withdrawal_subtracts_from_balance(
            initial in 1e-3f64..1e9,
            fraction in 0.0f64..=1.0,
        ) {
            let amount = initial * fraction;
            prop_assume!(amount > 0.0);

            let mut account = Account::new(initial).unwrap();
            account.withdraw(amount).unwrap();
            prop_assert_eq!(account.balance(), initial - amount);
            prop_assert!(account.balance() >= 0.0);
        }

        #[test]
        fn overdraft_is_rejected(
            initial in 0.0f64..1e9,
            excess in 1e-2f64..1e6,
        ) {
            let amount = initial + excess;
            let mut account = Account::new(initial).unwrap();
            let err = account.withdraw(amount).unwrap_err();
            prop_assert_eq!(err.kind(), AccountErrorKind::InsufficientFunds);
            prop_assert_eq!(account.balance(), initial);
        }

        /// Positivity is checked first, even when |amount| is covered.
        #[test]
        fn non_positive_withdrawal_is_rejected(
            initial in 0.0f64..1e9,
            amount in -1e9f64..=0.0,
        ) {
            let mut account = Account::new(initial).unwrap();
            let err = account.withdraw(amount).unwrap_err();
            prop_assert_eq!(err.kind(), AccountErrorKind::NegativeWithdrawal);
            prop_assert_eq!(account.balance(), initial);
        }

        #[test]
        fn withdrawing_everything_leaves_zero(initial in 1e-6f64..1e12) {
            let mut account = Account::new(initial).unwrap();
            account.withdraw(initial).unwrap();
            prop_assert_eq!(account.balance(), 0.0);
        }

        #[test]
        fn reads_are_stable(initial in 0.0f64..1e9) {
            let account = Account::new(initial).unwrap();
            prop_assert_eq!(account.balance(), account.balance());
        }

        /// Version counts the opening event plus every accepted operation.
        #[test]
        fn version_tracks_accepted_operations(
            ops in prop::collection::vec((any::<bool>(), -50.0f64..150.0), 0..32)
        ) {
            let mut account = Account::new(100.0).unwrap();
            let mut accepted = 0u64;
            for (is_deposit, amount) in ops {
                let result = if is_deposit {
                    account.deposit(amount)
                } else {
                    account.withdraw(amount)
                };
                if result.is_ok() {
                    accepted += 1;
                }
                prop_assert!(account.balance().is_finite());
                prop_assert!(account.balance() >= 0.0);
            }
            prop_assert_eq!(account.version(), 1 + accepted);
        }
    }
}
