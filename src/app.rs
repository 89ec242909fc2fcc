use crate::adapters::auth::StaticTokenVerifier;
use crate::adapters::clock::SystemClock;
use crate::adapters::http::AppState;
use crate::adapters::memory::InMemoryStore;
use crate::config::LibraryConfig;
use crate::core::lifecycle::LendingEngine;
use crate::core::observers::TracingHistoryRecorder;
use crate::domain::model::IdentityRef;
use crate::domain::ports::{Clock, ConfigProvider, EntityStore};
use crate::utils::error::Result;
use std::sync::Arc;

/// Wires store, engine and verifier from a validated config, using the
/// system clock.
pub async fn build_state(config: &LibraryConfig) -> Result<AppState<InMemoryStore>> {
    build_state_with_clock(config, Arc::new(SystemClock)).await
}

pub async fn build_state_with_clock(
    config: &LibraryConfig,
    clock: Arc<dyn Clock>,
) -> Result<AppState<InMemoryStore>> {
    let store = match ConfigProvider::snapshot_path(config) {
        Some(path) => InMemoryStore::open(path).await?,
        None => InMemoryStore::new(),
    };

    let catalog = config.catalog.clone();
    let seeded = store
        .write(move |ledger| {
            if ledger.is_empty() {
                catalog.seed(ledger).map(Some)
            } else {
                Ok(None)
            }
        })
        .await?;
    match seeded {
        Some(summary) => tracing::info!(
            books = summary.books,
            readers = summary.readers,
            librarians = summary.librarians,
            "Seeded catalog"
        ),
        None => tracing::info!("Existing ledger found, catalog seed skipped"),
    }

    let store = Arc::new(store);
    warn_unknown_token_identities(&store, config).await?;

    let mut engine =
        LendingEngine::new(Arc::clone(&store), clock).with_loan_period(config.loan_period_days());
    engine.register_observer(Arc::new(TracingHistoryRecorder));

    let verifier = StaticTokenVerifier::new(config.auth.tokens.clone());
    if verifier.is_empty() {
        tracing::warn!("No bearer tokens configured; every request will be rejected");
    }

    Ok(AppState::new(Arc::new(engine), Arc::new(verifier)))
}

async fn warn_unknown_token_identities(
    store: &InMemoryStore,
    config: &LibraryConfig,
) -> Result<()> {
    let identities: Vec<String> = config.auth.tokens.values().cloned().collect();
    let unknown = store
        .read(move |ledger| {
            Ok(identities
                .into_iter()
                .filter(|identity| {
                    let identity = IdentityRef::new(identity.as_str());
                    ledger.reader_by_identity(&identity).is_none()
                        && ledger.librarian_by_identity(&identity).is_none()
                })
                .collect::<Vec<_>>())
        })
        .await?;

    for identity in unknown {
        tracing::warn!(%identity, "Token maps to an identity with no reader or librarian record");
    }
    Ok(())
}
