use crate::domain::{Account, AccountRepository};
use futures::{stream, Stream};
use std::{collections::HashMap, convert::Infallible, sync::Arc};
use tokio::sync::RwLock;
use tracing::instrument;
use uuid::Uuid;

/// Account repository keeping accounts in memory, e.g. for tests or local demos.
#[derive(Debug, Clone, Default)]
pub struct MemoryAccountRepository {
    pub(super) accounts: Arc<RwLock<HashMap<Uuid, Account>>>,
}

impl AccountRepository for MemoryAccountRepository {
    type Error = Infallible;

    async fn accounts(
        &self,
    ) -> Result<impl Stream<Item = Result<Account, Self::Error>> + Send, Self::Error> {
        let mut accounts = self
            .accounts
            .read()
            .await
            .values()
            .cloned()
            .collect::<Vec<_>>();
        accounts.sort_by_key(Account::id);
        Ok(stream::iter(accounts.into_iter().map(Ok)))
    }

    #[instrument(skip(self))]
    async fn account_by_id(&self, id: Uuid) -> Result<Option<Account>, Self::Error> {
        let account = self.accounts.read().await.get(&id).cloned();
        Ok(account)
    }

    #[instrument(skip(self))]
    async fn save(&self, account: &Account) -> Result<(), Self::Error> {
        self.accounts
            .write()
            .await
            .insert(account.id(), account.clone());
        Ok(())
    }
}
