use crate::utils::error::{LendingError, Result};
use std::net::SocketAddr;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_socket_addr(field_name: &str, addr: &str) -> Result<()> {
    if addr.is_empty() {
        return Err(LendingError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: addr.to_string(),
            reason: "Address cannot be empty".to_string(),
        });
    }

    addr.parse::<SocketAddr>()
        .map(|_| ())
        .map_err(|e| LendingError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: addr.to_string(),
            reason: format!("Invalid socket address: {}", e),
        })
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(LendingError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(LendingError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: i64, min_value: i64) -> Result<()> {
    if value < min_value {
        return Err(LendingError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LendingError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be blank".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_socket_addr() {
        assert!(validate_socket_addr("server.bind_address", "127.0.0.1:8000").is_ok());
        assert!(validate_socket_addr("server.bind_address", "[::1]:0").is_ok());
        assert!(validate_socket_addr("server.bind_address", "").is_err());
        assert!(validate_socket_addr("server.bind_address", "localhost").is_err());
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("storage.snapshot_path", "./library.json").is_ok());
        assert!(validate_path("storage.snapshot_path", "").is_err());
        assert!(validate_path("storage.snapshot_path", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("lending.loan_period_days", 14, 1).is_ok());
        let err = validate_positive_number("lending.loan_period_days", 0, 1).unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn test_validate_non_empty() {
        assert!(validate_non_empty("auth.tokens", "abc").is_ok());
        assert!(validate_non_empty("auth.tokens", "   ").is_err());
    }
}
