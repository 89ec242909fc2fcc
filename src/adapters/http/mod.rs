//! JSON and form-post surface over the lending engine.
//!
//! Every route authenticates through [`extractor::AuthorizedUser`] before the
//! engine is touched; engine failures become responses via the
//! `IntoResponse` impl in [`response`].

pub mod extractor;
pub mod handlers;
pub mod response;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::core::lifecycle::LendingEngine;
use crate::domain::ports::{EntityStore, IdentityVerifier};
use crate::utils::error::Result;

pub struct AppState<S: EntityStore> {
    pub engine: Arc<LendingEngine<S>>,
    pub verifier: Arc<dyn IdentityVerifier>,
}

impl<S: EntityStore> AppState<S> {
    pub fn new(engine: Arc<LendingEngine<S>>, verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self { engine, verifier }
    }
}

impl<S: EntityStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            verifier: Arc::clone(&self.verifier),
        }
    }
}

pub fn router<S: EntityStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/api/books", get(handlers::list_books::<S>))
        .route("/api/books/:book_id/history", get(handlers::book_history::<S>))
        .route("/api/borrow/:book_id", post(handlers::borrow_book::<S>))
        .route("/api/return/:book_id", post(handlers::return_book::<S>))
        .route("/api/my_books", get(handlers::my_books::<S>))
        .route("/api/overdue", get(handlers::overdue::<S>))
        .route("/borrow/:book_id", post(handlers::borrow_form::<S>))
        .route("/return/:book_id", post(handlers::return_form::<S>))
        .with_state(state)
}

/// Serves `app` until ctrl-c.
pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Could not install ctrl-c handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
