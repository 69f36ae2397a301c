use crate::domain::{self, AccountRepository};
use futures::{future, Stream, TryStreamExt};
use rust_decimal::Decimal;
use sqlx::{prelude::FromRow, PgPool, QueryBuilder};
use std::iter::once;
use tracing::{debug, instrument};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl AccountRepository for PgAccountRepository {
    type Error = sqlx::Error;

    #[instrument(skip(self))]
    async fn accounts(
        &self,
    ) -> Result<impl Stream<Item = Result<domain::Account, Self::Error>> + Send, Self::Error> {
        let accounts = sqlx::query_as::<_, Account>("SELECT id, balance FROM account ORDER BY id")
            .fetch(&self.pool)
            .and_then(|account| future::ready(domain::Account::try_from(account)));
        Ok(accounts)
    }

    #[instrument(skip(self))]
    async fn account_by_id(&self, id: Uuid) -> Result<Option<domain::Account>, Self::Error> {
        let account = QueryBuilder::new("SELECT id, balance FROM account WHERE id = ")
            .push_bind(id)
            .build_query_as::<Account>()
            .fetch_optional(&self.pool)
            .await?;
        account.map(domain::Account::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn save(&self, account: &domain::Account) -> Result<(), Self::Error> {
        QueryBuilder::new("INSERT INTO account (id, balance) ")
            .push_values(once(account), |mut q, account| {
                q.push_bind(account.id()).push_bind(account.balance());
            })
            .push(" ON CONFLICT (id) DO UPDATE SET balance = EXCLUDED.balance")
            .build()
            .execute(&self.pool)
            .await?;

        debug!(id = %account.id(), balance = %account.balance(), "saved account");
        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct Account {
    id: Uuid,
    balance: Decimal,
}

impl TryFrom<Account> for domain::Account {
    type Error = sqlx::Error;

    fn try_from(Account { id, balance }: Account) -> Result<Self, Self::Error> {
        domain::Account::open(id, balance).map_err(|error| sqlx::Error::Decode(error.into()))
    }
}
