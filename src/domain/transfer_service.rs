use crate::domain::{
    Account, AccountLocks, AccountPairGuard, AccountRepository, Transfer, TransferCommand,
    TransferError, TransferRepository,
};
use error_ext::StdErrorExt;
use std::error::Error as StdError;
use tokio::time::{timeout_at, Instant};
use tracing::{error, info, instrument};

/// Executes transfers between accounts. Both accounts of a transfer are locked for the balance
/// check, the mutation and the persistence of the result, which the [TransferRepository] applies
/// all or nothing.
#[derive(Debug, Clone)]
pub struct TransferService<A, T> {
    account_repository: A,
    transfer_repository: T,
    locks: AccountLocks,
}

impl<A, T> TransferService<A, T>
where
    A: AccountRepository,
    T: TransferRepository,
{
    pub fn new(account_repository: A, transfer_repository: T) -> Self {
        Self {
            account_repository,
            transfer_repository,
            locks: AccountLocks::default(),
        }
    }

    pub async fn transfer(&self, command: TransferCommand) -> Result<Transfer, TransferError> {
        self.run(command, None).await
    }

    /// Like [TransferService::transfer], but abort with [TransferError::DeadlineExceeded] if the
    /// accounts cannot be locked and loaded before the given deadline. Balances are never mutated
    /// in that case.
    pub async fn transfer_with_deadline(
        &self,
        command: TransferCommand,
        deadline: Instant,
    ) -> Result<Transfer, TransferError> {
        self.run(command, Some(deadline)).await
    }

    #[instrument(skip(self))]
    async fn run(
        &self,
        command: TransferCommand,
        deadline: Option<Instant>,
    ) -> Result<Transfer, TransferError> {
        let transfer = Transfer::try_from(command)?;

        let prepared = match deadline {
            Some(deadline) => timeout_at(deadline, self.prepare(&transfer))
                .await
                .map_err(|_| TransferError::DeadlineExceeded)??,
            None => self.prepare(&transfer).await?,
        };
        let Prepared {
            _guard,
            mut source,
            mut destination,
        } = prepared;

        // Apply to the loaded copies first, so that invalid results never reach the repository.
        let amount = transfer.amount();
        source.withdraw(amount)?;
        destination.deposit(amount)?;

        self.transfer_repository
            .insert(&transfer)
            .await
            .map_err(internal_error("insert transfer"))?;

        info!(
            id = %transfer.id(),
            source_account_id = %transfer.source_account_id(),
            destination_account_id = %transfer.destination_account_id(),
            %amount,
            source_balance = %source.balance(),
            destination_balance = %destination.balance(),
            "transfer completed"
        );
        Ok(transfer)
    }

    /// Lock both accounts, load them and check the balance of the source account.
    async fn prepare(&self, transfer: &Transfer) -> Result<Prepared, TransferError> {
        let source_id = transfer.source_account_id();
        let destination_id = transfer.destination_account_id();

        let guard = self.locks.lock_pair(source_id, destination_id).await;

        let source = self
            .account_repository
            .account_by_id(source_id)
            .await
            .map_err(internal_error("load source account"))?
            .ok_or(TransferError::SourceAccountNotFound(source_id))?;

        if !source.has_sufficient_balance(transfer.amount()) {
            return Err(TransferError::InsufficientBalance(source_id));
        }

        let destination = self
            .account_repository
            .account_by_id(destination_id)
            .await
            .map_err(internal_error("load destination account"))?
            .ok_or(TransferError::DestinationAccountNotFound(destination_id))?;

        Ok(Prepared {
            _guard: guard,
            source,
            destination,
        })
    }
}

struct Prepared {
    _guard: AccountPairGuard,
    source: Account,
    destination: Account,
}

fn internal_error<E>(context: &'static str) -> impl FnOnce(E) -> TransferError
where
    E: StdError,
{
    move |error| {
        error!(error = error.as_chain(), context, "repository failure");
        TransferError::InternalError
    }
}
