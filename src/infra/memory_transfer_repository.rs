use crate::{
    domain::{DepositError, Transfer, TransferRepository, WithdrawError},
    infra::MemoryAccountRepository,
};
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Transfer repository keeping transfers in memory. Inserting a transfer updates the accounts of
/// the given account repository while holding its write lock, hence atomically.
#[derive(Debug, Clone)]
pub struct MemoryTransferRepository {
    account_repository: MemoryAccountRepository,
    transfers: Arc<RwLock<HashMap<Uuid, Transfer>>>,
}

impl MemoryTransferRepository {
    pub fn new(account_repository: MemoryAccountRepository) -> Self {
        Self {
            account_repository,
            transfers: Arc::default(),
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.transfers.read().await.len()
    }
}

impl TransferRepository for MemoryTransferRepository {
    type Error = MemoryTransferRepositoryError;

    #[instrument(skip(self))]
    async fn insert(&self, transfer: &Transfer) -> Result<(), Self::Error> {
        let mut accounts = self.account_repository.accounts.write().await;
        let mut transfers = self.transfers.write().await;

        let source_id = transfer.source_account_id();
        let mut source = accounts
            .get(&source_id)
            .cloned()
            .ok_or(MemoryTransferRepositoryError::AccountNotFound(source_id))?;
        source.withdraw(transfer.amount())?;

        let destination_id = transfer.destination_account_id();
        let mut destination = accounts
            .get(&destination_id)
            .cloned()
            .ok_or(MemoryTransferRepositoryError::AccountNotFound(destination_id))?;
        destination.deposit(transfer.amount())?;

        accounts.insert(source_id, source);
        accounts.insert(destination_id, destination);
        transfers.insert(transfer.id(), transfer.clone());

        debug!(id = %transfer.id(), "inserted transfer");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn transfer_by_id(&self, id: Uuid) -> Result<Option<Transfer>, Self::Error> {
        let transfer = self.transfers.read().await.get(&id).cloned();
        Ok(transfer)
    }
}

#[derive(Debug, Error)]
pub enum MemoryTransferRepositoryError {
    #[error("account with ID {0} not found")]
    AccountNotFound(Uuid),

    #[error("cannot withdraw from source account")]
    Withdraw(#[from] WithdrawError),

    #[error("cannot deposit into destination account")]
    Deposit(#[from] DepositError),
}
