//! Transaction scope port.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::domain::DomainError;

/// A unit of work handed to [`TransactionManager::run`].
pub type TxFuture<'a> = Pin<Box<dyn Future<Output = Result<(), DomainError>> + Send + 'a>>;

/// Runs a unit of work atomically: every write inside `work` is committed
/// when it returns `Ok`, and none of them survive when it returns `Err`.
/// The error from `work` is returned unchanged.
#[async_trait]
pub trait TransactionManager: Send + Sync {
    async fn run<'a>(&'a self, work: TxFuture<'a>) -> Result<(), DomainError>;
}
