use crate::domain::ledger::{Ledger, LedgerSnapshot};
use crate::domain::ports::EntityStore;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Entity store backed by a single in-process ledger.
///
/// Writers are serialised by the lock. Without a snapshot path `f` runs on the
/// live ledger, so it must return any error before its first mutation (the
/// `Ledger` transition methods already check before they mutate). With a
/// snapshot path the write runs on a staged copy that replaces the live
/// ledger only once both `f` and the snapshot write succeed.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    ledger: RwLock<Ledger>,
    snapshot_path: Option<PathBuf>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a store persisted at `path`, loading the existing snapshot if
    /// there is one.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let ledger = if tokio::fs::try_exists(&path).await? {
            let content = tokio::fs::read_to_string(&path).await?;
            let snapshot: LedgerSnapshot = serde_json::from_str(&content)?;
            let ledger = Ledger::from_snapshot(snapshot)?;
            tracing::info!(path = %path.display(), "Loaded ledger snapshot");
            ledger
        } else {
            tracing::info!(path = %path.display(), "No snapshot found, starting empty");
            Ledger::new()
        };

        Ok(Self {
            ledger: RwLock::new(ledger),
            snapshot_path: Some(path),
        })
    }

    async fn persist(path: &Path, ledger: &Ledger) -> Result<()> {
        let serialized = serde_json::to_vec_pretty(&ledger.snapshot())?;
        let staging = path.with_extension("tmp");

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&staging, serialized).await?;
        tokio::fs::rename(&staging, path).await?;
        tracing::debug!(path = %path.display(), "Ledger snapshot written");
        Ok(())
    }
}

impl EntityStore for InMemoryStore {
    async fn read<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Ledger) -> Result<R> + Send,
        R: Send,
    {
        let ledger = self.ledger.read().await;
        f(&ledger)
    }

    async fn write<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Ledger) -> Result<R> + Send,
        R: Send,
    {
        let mut ledger = self.ledger.write().await;
        let Some(path) = &self.snapshot_path else {
            return f(&mut ledger);
        };

        // staged so a failed snapshot write can roll back
        let mut staged = ledger.clone();
        let output = f(&mut staged)?;
        Self::persist(path, &staged).await.inspect_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "Snapshot write failed, rolling back");
        })?;

        *ledger = staged;
        Ok(output)
    }
}
