use crate::domain::model::{BookId, BookState, BorrowingId, ReaderId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A committed change to a book's lending state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LendingEvent {
    /// A reader took the book off the shelf
    Borrowed {
        borrowing_id: BorrowingId,
        book_id: BookId,
        reader_id: ReaderId,
        borrowed_date: NaiveDate,
    },
    /// A reader brought the book back
    Returned {
        borrowing_id: BorrowingId,
        book_id: BookId,
        reader_id: ReaderId,
        returned_date: NaiveDate,
    },
}

impl LendingEvent {
    pub fn book_id(&self) -> BookId {
        match self {
            Self::Borrowed { book_id, .. } | Self::Returned { book_id, .. } => *book_id,
        }
    }

    pub fn borrowing_id(&self) -> BorrowingId {
        match self {
            Self::Borrowed { borrowing_id, .. } | Self::Returned { borrowing_id, .. } => {
                *borrowing_id
            }
        }
    }

    /// The `(from, to)` book state transition this event records.
    pub fn transition(&self) -> (BookState, BookState) {
        match self {
            Self::Borrowed { .. } => (BookState::Available, BookState::CheckedOut),
            Self::Returned { .. } => (BookState::CheckedOut, BookState::Available),
        }
    }
}
