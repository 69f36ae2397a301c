use crate::domain::{DepositError, WithdrawError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Failure of a transfer. All variants but [TransferError::InternalError] and
/// [TransferError::DeadlineExceeded] are deterministic given the same state and must not be
/// retried.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("amount {0} must be greater than zero")]
    InvalidAmount(Decimal),

    #[error("account IDs must not be nil")]
    InvalidAccountId,

    #[error("source and destination account are both {0}")]
    SameAccount(Uuid),

    #[error("source account with ID {0} not found")]
    SourceAccountNotFound(Uuid),

    #[error("destination account with ID {0} not found")]
    DestinationAccountNotFound(Uuid),

    #[error("account with ID {0} has insufficient balance for transfer")]
    InsufficientBalance(Uuid),

    #[error("balance of account with ID {0} would exceed the maximum")]
    BalanceOverflow(Uuid),

    #[error("deadline exceeded before transfer could be applied")]
    DeadlineExceeded,

    #[error("internal error")]
    InternalError,
}

impl TransferError {
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::InvalidAmount(_) => "Transfer.InvalidAmount",
            TransferError::InvalidAccountId => "Transfer.InvalidAccountId",
            TransferError::SameAccount(_) => "Transfer.SameAccount",
            TransferError::SourceAccountNotFound(_) => "Transfer.SourceAccountNotFound",
            TransferError::DestinationAccountNotFound(_) => "Transfer.DestinationAccountNotFound",
            TransferError::InsufficientBalance(_) => "Transfer.InsufficientBalance",
            TransferError::BalanceOverflow(_) => "Transfer.BalanceOverflow",
            TransferError::DeadlineExceeded => "Transfer.DeadlineExceeded",
            TransferError::InternalError => "Transfer.InternalError",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransferError::InternalError | TransferError::DeadlineExceeded
        )
    }
}

impl From<WithdrawError> for TransferError {
    fn from(error: WithdrawError) -> Self {
        match error {
            WithdrawError::InvalidAmount(amount) => TransferError::InvalidAmount(amount),
            WithdrawError::InsufficientBalance(id) => TransferError::InsufficientBalance(id),
        }
    }
}

impl From<DepositError> for TransferError {
    fn from(error: DepositError) -> Self {
        match error {
            DepositError::InvalidAmount(amount) => TransferError::InvalidAmount(amount),
            DepositError::BalanceOverflow(id) => TransferError::BalanceOverflow(id),
        }
    }
}

/// Value representation of a failure, e.g. for HTTP responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Error {
    pub code: String,
    pub description: String,
}

impl Error {
    /// Empty sentinel, never used for an actual failure.
    pub const NONE: Error = Error {
        code: String::new(),
        description: String::new(),
    };

    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
        }
    }

    pub fn is_none(&self) -> bool {
        self == &Self::NONE
    }
}

impl From<&TransferError> for Error {
    fn from(error: &TransferError) -> Self {
        Error::new(error.code(), error.to_string())
    }
}

impl From<TransferError> for Error {
    fn from(error: TransferError) -> Self {
        Error::from(&error)
    }
}
