use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! surrogate_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn parse_str(raw: &str) -> Option<Self> {
                Uuid::parse_str(raw).ok().map(Self)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

surrogate_id!(BookId);
surrogate_id!(ReaderId);
surrogate_id!(LibrarianId);
surrogate_id!(BorrowingId);

/// Reference to an authenticated identity (the principal's username).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityRef(String);

impl IdentityRef {
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lending state of a book
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookState {
    /// Book is on the shelf
    #[default]
    Available,
    /// Book has an open borrowing
    CheckedOut,
}

impl BookState {
    pub fn from_flag(is_checked_out: bool) -> Self {
        if is_checked_out {
            Self::CheckedOut
        } else {
            Self::Available
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub genre: String,
    /// Cached "has an open borrowing". Only `Ledger::open_loan` and
    /// `Ledger::close_loan` write it.
    pub is_checked_out: bool,
}

impl Book {
    pub fn state(&self) -> BookState {
        BookState::from_flag(self.is_checked_out)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reader {
    pub id: ReaderId,
    pub identity: IdentityRef,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
}

impl Reader {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Librarian {
    pub id: LibrarianId,
    pub identity: IdentityRef,
    pub employee_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Borrowing {
    pub id: BorrowingId,
    pub reader_id: ReaderId,
    pub book_id: BookId,
    pub borrowed_date: NaiveDate,
    pub returned_date: Option<NaiveDate>,
}

impl Borrowing {
    pub fn is_open(&self) -> bool {
        self.returned_date.is_none()
    }

    /// Whole calendar days on loan: up to `today` while open, up to the
    /// return date once closed.
    pub fn days_borrowed(&self, today: NaiveDate) -> i64 {
        let end = self.returned_date.unwrap_or(today);
        (end - self.borrowed_date).num_days()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub genre: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReader {
    pub identity: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLibrarian {
    pub identity: String,
    pub employee_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_borrowed_open_uses_today() {
        let borrowing = Borrowing {
            id: BorrowingId::new(),
            reader_id: ReaderId::new(),
            book_id: BookId::new(),
            borrowed_date: date(2024, 2, 27),
            returned_date: None,
        };

        assert_eq!(borrowing.days_borrowed(date(2024, 2, 27)), 0);
        // leap day counts as a calendar day
        assert_eq!(borrowing.days_borrowed(date(2024, 3, 1)), 3);
    }

    #[test]
    fn test_days_borrowed_closed_stops_at_return() {
        let borrowing = Borrowing {
            id: BorrowingId::new(),
            reader_id: ReaderId::new(),
            book_id: BookId::new(),
            borrowed_date: date(2024, 1, 1),
            returned_date: Some(date(2024, 1, 11)),
        };

        assert!(!borrowing.is_open());
        assert_eq!(borrowing.days_borrowed(date(2024, 6, 1)), 10);
    }

    #[test]
    fn test_ids_parse_and_reject_garbage() {
        let id = BookId::new();
        assert_eq!(BookId::parse_str(&id.to_string()), Some(id));
        assert_eq!(BookId::parse_str("42"), None);
    }

    #[test]
    fn test_book_state_follows_flag() {
        assert_eq!(BookState::from_flag(true), BookState::CheckedOut);
        assert_eq!(BookState::default(), BookState::Available);
    }
}
