use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// A balance-holding bank account. The balance never becomes negative: it can only be changed via
/// [Account::withdraw] and [Account::deposit], both of which reject invalid amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Account {
    id: Uuid,
    #[schema(value_type = String, example = "42.00")]
    balance: Decimal,
}

impl Account {
    /// Open an account with the given initial balance, which must not be negative.
    pub fn open(id: Uuid, balance: Decimal) -> Result<Self, OpenAccountError> {
        if balance < Decimal::ZERO {
            return Err(OpenAccountError::NegativeBalance(balance));
        }

        Ok(Self { id, balance })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn has_sufficient_balance(&self, amount: Decimal) -> bool {
        amount > Decimal::ZERO && self.balance >= amount
    }

    pub fn withdraw(&mut self, amount: Decimal) -> Result<(), WithdrawError> {
        if amount <= Decimal::ZERO {
            return Err(WithdrawError::InvalidAmount(amount));
        }
        if amount > self.balance {
            return Err(WithdrawError::InsufficientBalance(self.id));
        }

        self.balance -= amount;
        Ok(())
    }

    pub fn deposit(&mut self, amount: Decimal) -> Result<(), DepositError> {
        if amount <= Decimal::ZERO {
            return Err(DepositError::InvalidAmount(amount));
        }

        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(DepositError::BalanceOverflow(self.id))?;
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OpenAccountError {
    #[error("initial balance {0} must not be negative")]
    NegativeBalance(Decimal),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WithdrawError {
    #[error("amount {0} to withdraw must be greater than zero")]
    InvalidAmount(Decimal),

    #[error("account with ID {0} has insufficient balance for withdrawal")]
    InsufficientBalance(Uuid),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DepositError {
    #[error("amount {0} to deposit must be greater than zero")]
    InvalidAmount(Decimal),

    #[error("balance of account with ID {0} would exceed the maximum")]
    BalanceOverflow(Uuid),
}

#[cfg(test)]
mod tests {
    use crate::domain::{Account, DepositError, OpenAccountError, WithdrawError};
    use assert_matches::assert_matches;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[test]
    fn test_open() {
        let account = Account::open(Uuid::now_v7(), dec!(0));
        assert_matches!(account, Ok(account) if account.balance() == Decimal::ZERO);

        let account = Account::open(Uuid::now_v7(), dec!(-0.01));
        assert_matches!(account, Err(OpenAccountError::NegativeBalance(_)));
    }

    #[test]
    fn test_withdraw() {
        let id = Uuid::now_v7();
        let mut account = Account::open(id, dec!(2.00)).unwrap();

        assert_eq!(account.withdraw(dec!(0.01)), Ok(()));
        assert_eq!(account.balance(), dec!(1.99));

        assert_eq!(
            account.withdraw(dec!(0)),
            Err(WithdrawError::InvalidAmount(dec!(0)))
        );
        assert_eq!(
            account.withdraw(dec!(-1)),
            Err(WithdrawError::InvalidAmount(dec!(-1)))
        );
        assert_eq!(
            account.withdraw(dec!(2.00)),
            Err(WithdrawError::InsufficientBalance(id))
        );
        assert_eq!(account.balance(), dec!(1.99));

        assert_eq!(account.withdraw(dec!(1.99)), Ok(()));
        assert_eq!(account.balance(), Decimal::ZERO);
    }

    #[test]
    fn test_deposit() {
        let mut account = Account::open(Uuid::now_v7(), dec!(0)).unwrap();

        assert_eq!(account.deposit(dec!(0.01)), Ok(()));
        assert_eq!(account.balance(), dec!(0.01));

        assert_eq!(
            account.deposit(dec!(0)),
            Err(DepositError::InvalidAmount(dec!(0)))
        );
        assert_eq!(account.balance(), dec!(0.01));
    }

    #[test]
    fn test_deposit_overflow() {
        let id = Uuid::now_v7();
        let mut account = Account::open(id, Decimal::MAX).unwrap();

        assert_eq!(
            account.deposit(dec!(0.01)),
            Err(DepositError::BalanceOverflow(id))
        );
        assert_eq!(account.balance(), Decimal::MAX);

        let mut account = Account::open(id, Decimal::MAX - dec!(1)).unwrap();
        assert_eq!(account.deposit(dec!(1)), Ok(()));
        assert_eq!(account.balance(), Decimal::MAX);
    }

    #[test]
    fn test_has_sufficient_balance() {
        let account = Account::open(Uuid::now_v7(), dec!(1.99)).unwrap();

        assert!(account.has_sufficient_balance(dec!(1.99)));
        assert!(account.has_sufficient_balance(dec!(0.01)));
        assert!(!account.has_sufficient_balance(dec!(2.00)));
        assert!(!account.has_sufficient_balance(dec!(0)));
    }
}
