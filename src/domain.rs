mod account;
mod account_locks;
mod account_repository;
mod error;
mod transfer;
mod transfer_repository;
mod transfer_service;

pub use account::*;
pub use account_locks::*;
pub use account_repository::*;
pub use error::*;
pub use transfer::*;
pub use transfer_repository::*;
pub use transfer_service::*;
