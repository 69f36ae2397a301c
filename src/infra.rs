mod memory_account_repository;
mod memory_transfer_repository;
mod pg_account_repository;
mod pg_transfer_repository;

pub use memory_account_repository::*;
pub use memory_transfer_repository::*;
pub use pg_account_repository::*;
pub use pg_transfer_repository::*;
