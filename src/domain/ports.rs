use crate::domain::events::LendingEvent;
use crate::domain::ledger::Ledger;
use crate::domain::model::IdentityRef;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Keyed storage for the lending entities. Each `read`/`write` call is one
/// transaction: no other writer observes the ledger while `f` runs.
///
/// A `write` closure that fails must do so before its first mutation;
/// adapters are not required to undo partial changes.
pub trait EntityStore: Send + Sync {
    fn read<F, R>(&self, f: F) -> impl std::future::Future<Output = Result<R>> + Send
    where
        F: FnOnce(&Ledger) -> Result<R> + Send,
        R: Send;

    fn write<F, R>(&self, f: F) -> impl std::future::Future<Output = Result<R>> + Send
    where
        F: FnOnce(&mut Ledger) -> Result<R> + Send,
        R: Send;
}

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Notified after a lending transaction commits. Failures stay inside the
/// observer.
pub trait LendingObserver: Send + Sync {
    fn on_lending_event(&self, event: &LendingEvent);
}

/// An authenticated actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub identity: IdentityRef,
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify_token(&self, token: &str) -> Result<Option<Principal>>;
}

pub trait ConfigProvider: Send + Sync {
    fn bind_address(&self) -> &str;
    fn loan_period_days(&self) -> i64;
    fn snapshot_path(&self) -> Option<&str>;
}
