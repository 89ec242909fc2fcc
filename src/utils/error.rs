use thiserror::Error;

#[derive(Error, Debug)]
pub enum LendingError {
    #[error("Book not found")]
    BookNotFound,

    #[error("Reader not found")]
    ReaderNotFound,

    #[error("Borrowing record not found")]
    BorrowingNotFound,

    #[error("Book is already borrowed")]
    AlreadyBorrowed,

    #[error("Book is not borrowed")]
    NotBorrowed,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Librarian access required")]
    Forbidden,

    #[error("Identity '{identity}' is already registered")]
    DuplicateIdentity { identity: String },

    #[error("Employee id '{employee_id}' is already in use")]
    DuplicateEmployeeId { employee_id: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

/// Coarse classification used by the access layer to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Unauthenticated,
    Forbidden,
    Invalid,
    Internal,
}

impl LendingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BookNotFound | Self::ReaderNotFound | Self::BorrowingNotFound => {
                ErrorKind::NotFound
            }
            Self::AlreadyBorrowed | Self::NotBorrowed => ErrorKind::Conflict,
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::Forbidden => ErrorKind::Forbidden,
            Self::DuplicateIdentity { .. }
            | Self::DuplicateEmployeeId { .. }
            | Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorKind::Invalid,
            Self::StorageError { .. } | Self::IoError(_) | Self::SerializationError(_) => {
                ErrorKind::Internal
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.kind() {
            ErrorKind::NotFound => "Check the book id and that you are registered as a reader",
            ErrorKind::Conflict => "Refresh the book list; its state changed",
            ErrorKind::Unauthenticated => "Send a valid bearer token",
            ErrorKind::Forbidden => "Use a librarian account",
            ErrorKind::Invalid => "Fix the configuration file and restart",
            ErrorKind::Internal => "Check the server logs and the snapshot file",
        }
    }
}

pub type Result<T> = std::result::Result<T, LendingError>;
