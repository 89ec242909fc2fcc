//! Library book lending: books, readers, librarians and the borrow/return
//! lifecycle that ties them together, served over a small JSON API.

pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::adapters::http::{router, AppState};
pub use crate::adapters::memory::InMemoryStore;
pub use crate::config::LibraryConfig;
pub use crate::core::lifecycle::{LendingEngine, LoanView};
pub use crate::utils::error::{LendingError, Result};
