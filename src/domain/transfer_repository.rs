use crate::domain::Transfer;
use std::error::Error as StdError;
use uuid::Uuid;

#[trait_variant::make(Send)]
pub trait TransferRepository
where
    Self: Clone + Send + Sync + 'static,
{
    type Error: StdError + Send + Sync + 'static;

    /// Insert the given transfer and apply it to the balances of its source and destination
    /// accounts, all or nothing. Fails without any change if the source account does not cover
    /// the amount at the time of writing or if either account does not exist.
    async fn insert(&self, transfer: &Transfer) -> Result<(), Self::Error>;

    async fn transfer_by_id(&self, id: Uuid) -> Result<Option<Transfer>, Self::Error>;
}
