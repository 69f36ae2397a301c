use crate::domain::TransferError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Command to move `amount` from the source to the destination account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TransferCommand {
    pub source_account_id: Uuid,
    pub destination_account_id: Uuid,
    #[schema(value_type = String, example = "0.01")]
    pub amount: Decimal,
}

/// Immutable record of a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Transfer {
    id: Uuid,
    source_account_id: Uuid,
    destination_account_id: Uuid,
    #[schema(value_type = String, example = "0.01")]
    amount: Decimal,
}

impl Transfer {
    /// Create a transfer with a freshly generated ID.
    pub fn new(
        source_account_id: Uuid,
        destination_account_id: Uuid,
        amount: Decimal,
    ) -> Result<Self, TransferError> {
        Self::with_id(
            Uuid::now_v7(),
            source_account_id,
            destination_account_id,
            amount,
        )
    }

    /// Create a transfer with the given ID. The amount is checked first, then the account IDs,
    /// which must be non-nil and distinct.
    pub fn with_id(
        id: Uuid,
        source_account_id: Uuid,
        destination_account_id: Uuid,
        amount: Decimal,
    ) -> Result<Self, TransferError> {
        if amount <= Decimal::ZERO {
            return Err(TransferError::InvalidAmount(amount));
        }
        if source_account_id.is_nil() || destination_account_id.is_nil() {
            return Err(TransferError::InvalidAccountId);
        }
        if source_account_id == destination_account_id {
            return Err(TransferError::SameAccount(source_account_id));
        }

        Ok(Self {
            id,
            source_account_id,
            destination_account_id,
            amount,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn source_account_id(&self) -> Uuid {
        self.source_account_id
    }

    pub fn destination_account_id(&self) -> Uuid {
        self.destination_account_id
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }
}

impl TryFrom<TransferCommand> for Transfer {
    type Error = TransferError;

    fn try_from(command: TransferCommand) -> Result<Self, Self::Error> {
        let TransferCommand {
            source_account_id,
            destination_account_id,
            amount,
        } = command;
        Self::new(source_account_id, destination_account_id, amount)
    }
}
