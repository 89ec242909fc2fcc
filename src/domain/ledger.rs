//! In-memory tables for books, readers, librarians and borrowings.
//!
//! The ledger owns every index the lending rules query (open borrowing per
//! book, reader per identity, ...) and is the only place the cached
//! `Book::is_checked_out` flag is written. Callers reach it through an
//! `EntityStore`, which decides how access is serialised.

use crate::domain::model::{
    Book, BookId, Borrowing, BorrowingId, IdentityRef, Librarian, LibrarianId, NewBook,
    NewLibrarian, NewReader, Reader, ReaderId,
};
use crate::utils::error::{LendingError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Plain serialisable form of a ledger; indices are rebuilt on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub books: Vec<Book>,
    pub readers: Vec<Reader>,
    pub librarians: Vec<Librarian>,
    /// In creation order.
    pub borrowings: Vec<Borrowing>,
}

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    books: HashMap<BookId, Book>,
    readers: HashMap<ReaderId, Reader>,
    librarians: HashMap<LibrarianId, Librarian>,
    /// Append-only; position is creation order.
    borrowings: Vec<Borrowing>,
    borrowing_index: HashMap<BorrowingId, usize>,
    readers_by_identity: HashMap<IdentityRef, ReaderId>,
    librarians_by_identity: HashMap<IdentityRef, LibrarianId>,
    librarians_by_employee_id: HashMap<String, LibrarianId>,
    open_by_book: HashMap<BookId, BorrowingId>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty() && self.readers.is_empty() && self.librarians.is_empty()
    }

    pub fn insert_book(&mut self, new_book: NewBook) -> Book {
        let book = Book {
            id: BookId::new(),
            title: new_book.title,
            author: new_book.author,
            genre: new_book.genre,
            is_checked_out: false,
        };
        self.books.insert(book.id, book.clone());
        book
    }

    pub fn register_reader(&mut self, new_reader: NewReader) -> Result<Reader> {
        let identity = IdentityRef::new(new_reader.identity);
        if self.readers_by_identity.contains_key(&identity) {
            return Err(LendingError::DuplicateIdentity {
                identity: identity.to_string(),
            });
        }

        let reader = Reader {
            id: ReaderId::new(),
            identity,
            first_name: new_reader.first_name,
            last_name: new_reader.last_name,
            address: new_reader.address,
        };
        self.readers_by_identity
            .insert(reader.identity.clone(), reader.id);
        self.readers.insert(reader.id, reader.clone());
        Ok(reader)
    }

    pub fn register_librarian(&mut self, new_librarian: NewLibrarian) -> Result<Librarian> {
        let identity = IdentityRef::new(new_librarian.identity);
        if self.librarians_by_identity.contains_key(&identity) {
            return Err(LendingError::DuplicateIdentity {
                identity: identity.to_string(),
            });
        }
        if self
            .librarians_by_employee_id
            .contains_key(&new_librarian.employee_id)
        {
            return Err(LendingError::DuplicateEmployeeId {
                employee_id: new_librarian.employee_id,
            });
        }

        let librarian = Librarian {
            id: LibrarianId::new(),
            identity,
            employee_id: new_librarian.employee_id,
        };
        self.librarians_by_identity
            .insert(librarian.identity.clone(), librarian.id);
        self.librarians_by_employee_id
            .insert(librarian.employee_id.clone(), librarian.id);
        self.librarians.insert(librarian.id, librarian.clone());
        Ok(librarian)
    }

    pub fn book(&self, id: BookId) -> Option<&Book> {
        self.books.get(&id)
    }

    /// All books ordered by title.
    pub fn books_by_title(&self) -> Vec<&Book> {
        let mut books: Vec<&Book> = self.books.values().collect();
        books.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        books
    }

    pub fn reader(&self, id: ReaderId) -> Option<&Reader> {
        self.readers.get(&id)
    }

    pub fn reader_by_identity(&self, identity: &IdentityRef) -> Option<&Reader> {
        self.readers_by_identity
            .get(identity)
            .and_then(|id| self.readers.get(id))
    }

    pub fn librarian_by_identity(&self, identity: &IdentityRef) -> Option<&Librarian> {
        self.librarians_by_identity
            .get(identity)
            .and_then(|id| self.librarians.get(id))
    }

    pub fn borrowing(&self, id: BorrowingId) -> Option<&Borrowing> {
        self.borrowing_index
            .get(&id)
            .and_then(|&idx| self.borrowings.get(idx))
    }

    pub fn open_borrowing_for_book(&self, book_id: BookId) -> Option<&Borrowing> {
        self.open_by_book
            .get(&book_id)
            .and_then(|&id| self.borrowing(id))
    }

    pub fn open_borrowings_for_reader(&self, reader_id: ReaderId) -> Vec<&Borrowing> {
        self.borrowings
            .iter()
            .filter(|b| b.is_open() && b.reader_id == reader_id)
            .collect()
    }

    pub fn open_borrowings(&self) -> Vec<&Borrowing> {
        self.borrowings.iter().filter(|b| b.is_open()).collect()
    }

    /// Every borrowing of a book, open and closed, oldest first.
    pub fn borrowings_for_book(&self, book_id: BookId) -> Vec<&Borrowing> {
        self.borrowings
            .iter()
            .filter(|b| b.book_id == book_id)
            .collect()
    }

    /// Creates an open borrowing and marks the book checked out, as one step.
    pub fn open_loan(
        &mut self,
        reader_id: ReaderId,
        book_id: BookId,
        borrowed_date: NaiveDate,
    ) -> Result<Borrowing> {
        if !self.readers.contains_key(&reader_id) {
            return Err(LendingError::ReaderNotFound);
        }
        let book = self
            .books
            .get_mut(&book_id)
            .ok_or(LendingError::BookNotFound)?;
        if book.is_checked_out || self.open_by_book.contains_key(&book_id) {
            return Err(LendingError::AlreadyBorrowed);
        }

        let borrowing = Borrowing {
            id: BorrowingId::new(),
            reader_id,
            book_id,
            borrowed_date,
            returned_date: None,
        };
        book.is_checked_out = true;
        self.open_by_book.insert(book_id, borrowing.id);
        self.borrowing_index
            .insert(borrowing.id, self.borrowings.len());
        self.borrowings.push(borrowing.clone());
        Ok(borrowing)
    }

    /// Closes an open borrowing and marks its book available, as one step.
    ///
    /// A `returned_date` earlier than the borrow date (clock moved backwards)
    /// is recorded as the borrow date.
    pub fn close_loan(
        &mut self,
        borrowing_id: BorrowingId,
        returned_date: NaiveDate,
    ) -> Result<Borrowing> {
        let idx = *self
            .borrowing_index
            .get(&borrowing_id)
            .ok_or(LendingError::BorrowingNotFound)?;
        let borrowing = self
            .borrowings
            .get_mut(idx)
            .ok_or(LendingError::BorrowingNotFound)?;
        if !borrowing.is_open() {
            return Err(LendingError::BorrowingNotFound);
        }
        let book = self
            .books
            .get_mut(&borrowing.book_id)
            .ok_or(LendingError::BookNotFound)?;

        borrowing.returned_date = Some(returned_date.max(borrowing.borrowed_date));
        book.is_checked_out = false;
        self.open_by_book.remove(&borrowing.book_id);
        Ok(borrowing.clone())
    }

    /// Verifies that every cached flag and index agrees with the borrowing
    /// records.
    pub fn check_invariants(&self) -> Result<()> {
        let mut open_counts: HashMap<BookId, usize> = HashMap::new();
        for borrowing in &self.borrowings {
            if !self.books.contains_key(&borrowing.book_id) {
                return Err(corrupt(format!(
                    "borrowing {} references missing book {}",
                    borrowing.id, borrowing.book_id
                )));
            }
            if !self.readers.contains_key(&borrowing.reader_id) {
                return Err(corrupt(format!(
                    "borrowing {} references missing reader {}",
                    borrowing.id, borrowing.reader_id
                )));
            }
            if let Some(returned) = borrowing.returned_date {
                if returned < borrowing.borrowed_date {
                    return Err(corrupt(format!(
                        "borrowing {} returned before it was borrowed",
                        borrowing.id
                    )));
                }
            } else {
                *open_counts.entry(borrowing.book_id).or_default() += 1;
            }
        }

        for book in self.books.values() {
            let open = open_counts.get(&book.id).copied().unwrap_or(0);
            if open > 1 {
                return Err(corrupt(format!(
                    "book {} has {} open borrowings",
                    book.id, open
                )));
            }
            if book.is_checked_out != (open == 1) {
                return Err(corrupt(format!(
                    "book {} is_checked_out={} but has {} open borrowings",
                    book.id, book.is_checked_out, open
                )));
            }
            let indexed = self
                .open_borrowing_for_book(book.id)
                .map(|b| b.book_id == book.id && b.is_open());
            if indexed.unwrap_or(false) != (open == 1) {
                return Err(corrupt(format!(
                    "open-borrowing index out of sync for book {}",
                    book.id
                )));
            }
        }

        Ok(())
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        let mut books: Vec<Book> = self.books.values().cloned().collect();
        books.sort_by_key(|b| b.id);
        let mut readers: Vec<Reader> = self.readers.values().cloned().collect();
        readers.sort_by_key(|r| r.id);
        let mut librarians: Vec<Librarian> = self.librarians.values().cloned().collect();
        librarians.sort_by_key(|l| l.id);

        LedgerSnapshot {
            books,
            readers,
            librarians,
            borrowings: self.borrowings.clone(),
        }
    }

    /// Rebuilds a ledger from a snapshot, rejecting duplicates and any state
    /// that breaks the lending invariants.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Result<Self> {
        let mut ledger = Self::new();

        for book in snapshot.books {
            if ledger.books.insert(book.id, book).is_some() {
                return Err(corrupt("duplicate book id in snapshot".to_string()));
            }
        }
        for reader in snapshot.readers {
            if ledger
                .readers_by_identity
                .insert(reader.identity.clone(), reader.id)
                .is_some()
            {
                return Err(LendingError::DuplicateIdentity {
                    identity: reader.identity.to_string(),
                });
            }
            ledger.readers.insert(reader.id, reader);
        }
        for librarian in snapshot.librarians {
            if ledger
                .librarians_by_identity
                .insert(librarian.identity.clone(), librarian.id)
                .is_some()
            {
                return Err(LendingError::DuplicateIdentity {
                    identity: librarian.identity.to_string(),
                });
            }
            if ledger
                .librarians_by_employee_id
                .insert(librarian.employee_id.clone(), librarian.id)
                .is_some()
            {
                return Err(LendingError::DuplicateEmployeeId {
                    employee_id: librarian.employee_id,
                });
            }
            ledger.librarians.insert(librarian.id, librarian);
        }
        for borrowing in snapshot.borrowings {
            if ledger
                .borrowing_index
                .insert(borrowing.id, ledger.borrowings.len())
                .is_some()
            {
                return Err(corrupt("duplicate borrowing id in snapshot".to_string()));
            }
            if borrowing.is_open()
                && ledger
                    .open_by_book
                    .insert(borrowing.book_id, borrowing.id)
                    .is_some()
            {
                return Err(corrupt(format!(
                    "book {} has more than one open borrowing",
                    borrowing.book_id
                )));
            }
            ledger.borrowings.push(borrowing);
        }

        ledger.check_invariants()?;
        Ok(ledger)
    }
}

fn corrupt(message: String) -> LendingError {
    LendingError::StorageError { message }
}
