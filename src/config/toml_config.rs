use crate::core::lifecycle::DEFAULT_LOAN_PERIOD_DAYS;
use crate::domain::ledger::Ledger;
use crate::domain::model::{NewBook, NewLibrarian, NewReader};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{LendingError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8000";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibraryConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub lending: LendingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LendingConfig {
    pub loan_period_days: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    pub snapshot_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// bearer token -> identity
    #[serde(default)]
    pub tokens: HashMap<String, String>,
}

/// Records created when the store starts empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub books: Vec<NewBook>,
    #[serde(default)]
    pub readers: Vec<NewReader>,
    #[serde(default)]
    pub librarians: Vec<NewLibrarian>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub books: usize,
    pub readers: usize,
    pub librarians: usize,
}

impl CatalogConfig {
    pub fn is_empty(&self) -> bool {
        self.books.is_empty() && self.readers.is_empty() && self.librarians.is_empty()
    }

    pub fn seed(&self, ledger: &mut Ledger) -> Result<SeedSummary> {
        for book in &self.books {
            ledger.insert_book(book.clone());
        }
        for reader in &self.readers {
            ledger.register_reader(reader.clone())?;
        }
        for librarian in &self.librarians {
            ledger.register_librarian(librarian.clone())?;
        }

        Ok(SeedSummary {
            books: self.books.len(),
            readers: self.readers.len(),
            librarians: self.librarians.len(),
        })
    }
}

impl LibraryConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LendingError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| LendingError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value. An unset variable is a
    /// config error, so a placeholder never survives as a literal value.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LendingError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        if let Some(missing) = re
            .captures_iter(content)
            .map(|caps| caps[1].to_string())
            .find(|name| std::env::var(name).is_err())
        {
            return Err(LendingError::ConfigError {
                message: format!("Environment variable '{}' is not set", missing),
            });
        }

        let result = re.replace_all(content, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_socket_addr("server.bind_address", self.bind_address())?;
        validation::validate_positive_number("lending.loan_period_days", self.loan_period_days(), 1)?;

        if let Some(path) = &self.storage.snapshot_path {
            validation::validate_path("storage.snapshot_path", path)?;
        }

        for (token, identity) in &self.auth.tokens {
            validation::validate_non_empty("auth.tokens", token)?;
            validation::validate_non_empty("auth.tokens.<identity>", identity)?;
            if token.contains("${") {
                return Err(LendingError::InvalidConfigValueError {
                    field: "auth.tokens".to_string(),
                    value: token.clone(),
                    reason: "unresolved placeholder cannot be used as a token".to_string(),
                });
            }
        }

        for book in &self.catalog.books {
            validation::validate_non_empty("catalog.books.title", &book.title)?;
        }
        for reader in &self.catalog.readers {
            validation::validate_non_empty("catalog.readers.identity", &reader.identity)?;
        }
        for librarian in &self.catalog.librarians {
            validation::validate_non_empty("catalog.librarians.identity", &librarian.identity)?;
            validation::validate_non_empty(
                "catalog.librarians.employee_id",
                &librarian.employee_id,
            )?;
        }

        Ok(())
    }

    pub fn bind_address(&self) -> &str {
        self.server
            .bind_address
            .as_deref()
            .unwrap_or(DEFAULT_BIND_ADDRESS)
    }

    pub fn loan_period_days(&self) -> i64 {
        self.lending
            .loan_period_days
            .unwrap_or(DEFAULT_LOAN_PERIOD_DAYS)
    }
}

impl ConfigProvider for LibraryConfig {
    fn bind_address(&self) -> &str {
        self.bind_address()
    }

    fn loan_period_days(&self) -> i64 {
        self.loan_period_days()
    }

    fn snapshot_path(&self) -> Option<&str> {
        self.storage.snapshot_path.as_deref()
    }
}

impl Validate for LibraryConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
