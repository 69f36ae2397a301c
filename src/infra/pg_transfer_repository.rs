use crate::domain::{self, TransferRepository};
use rust_decimal::Decimal;
use sqlx::{prelude::FromRow, PgPool, Postgres, QueryBuilder, Transaction};
use std::iter::once;
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PgTransferRepository {
    pool: PgPool,
}

impl PgTransferRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl TransferRepository for PgTransferRepository {
    type Error = PgTransferRepositoryError;

    #[instrument(skip(self))]
    async fn insert(&self, transfer: &domain::Transfer) -> Result<(), Self::Error> {
        let source_id = transfer.source_account_id();
        let destination_id = transfer.destination_account_id();
        let amount = transfer.amount();

        // Not committing, e.g. because of an early return, rolls back.
        let mut tx = self.pool.begin().await?;

        // Relative updates guarded by the balance, hence safe against concurrent writers.
        let withdrawn = QueryBuilder::new("UPDATE account SET balance = balance - ")
            .push_bind(amount)
            .push(" WHERE id = ")
            .push_bind(source_id)
            .push(" AND balance >= ")
            .push_bind(amount)
            .build()
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if withdrawn != 1 {
            return Err(PgTransferRepositoryError::Withdraw(source_id));
        }

        let deposited = QueryBuilder::new("UPDATE account SET balance = balance + ")
            .push_bind(amount)
            .push(" WHERE id = ")
            .push_bind(destination_id)
            .build()
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deposited != 1 {
            return Err(PgTransferRepositoryError::Deposit(destination_id));
        }

        insert_transfer(transfer, &mut tx).await?;
        tx.commit().await?;

        info!(id = %transfer.id(), "inserted transfer");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn transfer_by_id(&self, id: Uuid) -> Result<Option<domain::Transfer>, Self::Error> {
        let transfer = QueryBuilder::new(
            "SELECT id, source_account_id, destination_account_id, amount FROM transfer WHERE id = ",
        )
        .push_bind(id)
        .build_query_as::<Transfer>()
        .fetch_optional(&self.pool)
        .await?;
        let transfer = transfer.map(domain::Transfer::try_from).transpose()?;
        Ok(transfer)
    }
}

#[derive(Debug, Error)]
pub enum PgTransferRepositoryError {
    #[error("database error")]
    Sqlx(#[from] sqlx::Error),

    #[error("cannot withdraw from account with ID {0}: not found or insufficient balance")]
    Withdraw(Uuid),

    #[error("cannot deposit into account with ID {0}: not found")]
    Deposit(Uuid),
}

async fn insert_transfer(
    transfer: &domain::Transfer,
    tx: &mut Transaction<'static, Postgres>,
) -> Result<(), sqlx::Error> {
    QueryBuilder::new(
        "INSERT INTO transfer (id, source_account_id, destination_account_id, amount) ",
    )
    .push_values(once(transfer), |mut q, transfer| {
        q.push_bind(transfer.id())
            .push_bind(transfer.source_account_id())
            .push_bind(transfer.destination_account_id())
            .push_bind(transfer.amount());
    })
    .build()
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[derive(Debug, FromRow)]
struct Transfer {
    id: Uuid,
    source_account_id: Uuid,
    destination_account_id: Uuid,
    amount: Decimal,
}

impl TryFrom<Transfer> for domain::Transfer {
    type Error = sqlx::Error;

    fn try_from(transfer: Transfer) -> Result<Self, Self::Error> {
        let Transfer {
            id,
            source_account_id,
            destination_account_id,
            amount,
        } = transfer;
        domain::Transfer::with_id(id, source_account_id, destination_account_id, amount)
            .map_err(|error| sqlx::Error::Decode(error.into()))
    }
}
