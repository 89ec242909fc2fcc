use crate::core::{
    Book, BookId, Borrowing, Clock, EntityStore, IdentityRef, LendingEvent, LendingObserver,
    Result,
};
use crate::domain::ledger::Ledger;
use crate::utils::error::LendingError;
use chrono::NaiveDate;
use std::sync::Arc;

pub const DEFAULT_LOAN_PERIOD_DAYS: i64 = 14;

/// A borrowing joined with the names a caller wants to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanView {
    pub borrowing: Borrowing,
    pub book_title: String,
    pub reader_name: String,
    pub days_borrowed: i64,
}

impl LoanView {
    fn build(ledger: &Ledger, borrowing: &Borrowing, today: NaiveDate) -> Self {
        Self {
            borrowing: borrowing.clone(),
            book_title: ledger
                .book(borrowing.book_id)
                .map(|b| b.title.clone())
                .unwrap_or_default(),
            reader_name: ledger
                .reader(borrowing.reader_id)
                .map(|r| r.full_name())
                .unwrap_or_default(),
            days_borrowed: borrowing.days_borrowed(today),
        }
    }
}

/// Runs borrow/return transitions against an entity store.
///
/// Every transition checks its preconditions and mutates the ledger inside a
/// single `EntityStore::write`, so two requests racing on the same book
/// cannot both pass the "is it available" check. Observers hear about a
/// change only once it has committed.
pub struct LendingEngine<S: EntityStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    observers: Vec<Arc<dyn LendingObserver>>,
    loan_period_days: i64,
}

impl<S: EntityStore> LendingEngine<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            observers: Vec::new(),
            loan_period_days: DEFAULT_LOAN_PERIOD_DAYS,
        }
    }

    pub fn with_loan_period(mut self, days: i64) -> Self {
        self.loan_period_days = days;
        self
    }

    pub fn register_observer(&mut self, observer: Arc<dyn LendingObserver>) {
        self.observers.push(observer);
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn loan_period_days(&self) -> i64 {
        self.loan_period_days
    }

    pub async fn list_books(&self) -> Result<Vec<Book>> {
        self.store
            .read(|ledger| Ok(ledger.books_by_title().into_iter().cloned().collect()))
            .await
    }

    pub async fn is_reader(&self, identity: &IdentityRef) -> Result<bool> {
        let identity = identity.clone();
        self.store
            .read(move |ledger| Ok(ledger.reader_by_identity(&identity).is_some()))
            .await
    }

    pub async fn borrow_book(&self, identity: &IdentityRef, book_id: BookId) -> Result<LoanView> {
        let clock = Arc::clone(&self.clock);
        let identity = identity.clone();

        let view = self
            .store
            .write(move |ledger| {
                let book = ledger.book(book_id).ok_or(LendingError::BookNotFound)?;
                if book.is_checked_out {
                    return Err(LendingError::AlreadyBorrowed);
                }
                let reader_id = ledger
                    .reader_by_identity(&identity)
                    .ok_or(LendingError::ReaderNotFound)?
                    .id;

                // read under the write lock so dates follow commit order
                let today = clock.today();
                let borrowing = ledger.open_loan(reader_id, book_id, today)?;
                Ok(LoanView::build(ledger, &borrowing, today))
            })
            .await
            .inspect_err(|e| tracing::debug!(%book_id, error = %e, "Borrow rejected"))?;

        tracing::info!(
            %book_id,
            borrowing_id = %view.borrowing.id,
            title = %view.book_title,
            "Book borrowed"
        );
        self.notify(&LendingEvent::Borrowed {
            borrowing_id: view.borrowing.id,
            book_id,
            reader_id: view.borrowing.reader_id,
            borrowed_date: view.borrowing.borrowed_date,
        });

        Ok(view)
    }

    pub async fn return_book(&self, identity: &IdentityRef, book_id: BookId) -> Result<LoanView> {
        let clock = Arc::clone(&self.clock);
        let identity = identity.clone();

        let view = self
            .store
            .write(move |ledger| {
                let book = ledger.book(book_id).ok_or(LendingError::BookNotFound)?;
                if !book.is_checked_out {
                    return Err(LendingError::NotBorrowed);
                }
                let reader_id = ledger
                    .reader_by_identity(&identity)
                    .ok_or(LendingError::ReaderNotFound)?
                    .id;
                // a reader can only close their own borrowing
                let borrowing_id = ledger
                    .open_borrowing_for_book(book_id)
                    .filter(|b| b.reader_id == reader_id)
                    .ok_or(LendingError::BorrowingNotFound)?
                    .id;

                let today = clock.today();
                let borrowing = ledger.close_loan(borrowing_id, today)?;
                Ok(LoanView::build(ledger, &borrowing, today))
            })
            .await
            .inspect_err(|e| tracing::debug!(%book_id, error = %e, "Return rejected"))?;

        tracing::info!(
            %book_id,
            borrowing_id = %view.borrowing.id,
            days_borrowed = view.days_borrowed,
            "Book returned"
        );
        self.notify(&LendingEvent::Returned {
            borrowing_id: view.borrowing.id,
            book_id,
            reader_id: view.borrowing.reader_id,
            returned_date: view
                .borrowing
                .returned_date
                .unwrap_or(view.borrowing.borrowed_date),
        });

        Ok(view)
    }

    /// The caller's open borrowings, ordered by book title.
    pub async fn my_books(&self, identity: &IdentityRef) -> Result<Vec<LoanView>> {
        let today = self.clock.today();
        let identity = identity.clone();

        self.store
            .read(move |ledger| {
                let reader = ledger
                    .reader_by_identity(&identity)
                    .ok_or(LendingError::ReaderNotFound)?;
                let mut loans: Vec<LoanView> = ledger
                    .open_borrowings_for_reader(reader.id)
                    .into_iter()
                    .map(|b| LoanView::build(ledger, b, today))
                    .collect();
                loans.sort_by(|a, b| a.book_title.cmp(&b.book_title));
                Ok(loans)
            })
            .await
    }

    /// Open borrowings past the loan period, longest overdue first.
    pub async fn overdue(&self, identity: &IdentityRef) -> Result<Vec<LoanView>> {
        let today = self.clock.today();
        let identity = identity.clone();
        let loan_period_days = self.loan_period_days;

        self.store
            .read(move |ledger| {
                require_librarian(ledger, &identity)?;
                let mut loans: Vec<LoanView> = ledger
                    .open_borrowings()
                    .into_iter()
                    .filter(|b| b.days_borrowed(today) > loan_period_days)
                    .map(|b| LoanView::build(ledger, b, today))
                    .collect();
                loans.sort_by(|a, b| {
                    b.days_borrowed
                        .cmp(&a.days_borrowed)
                        .then_with(|| a.book_title.cmp(&b.book_title))
                });
                Ok(loans)
            })
            .await
    }

    /// Every borrowing of a book, newest first.
    pub async fn book_history(
        &self,
        identity: &IdentityRef,
        book_id: BookId,
    ) -> Result<Vec<LoanView>> {
        let today = self.clock.today();
        let identity = identity.clone();

        self.store
            .read(move |ledger| {
                require_librarian(ledger, &identity)?;
                ledger.book(book_id).ok_or(LendingError::BookNotFound)?;
                Ok(ledger
                    .borrowings_for_book(book_id)
                    .into_iter()
                    .rev()
                    .map(|b| LoanView::build(ledger, b, today))
                    .collect())
            })
            .await
    }

    fn notify(&self, event: &LendingEvent) {
        for observer in &self.observers {
            observer.on_lending_event(event);
        }
    }
}

fn require_librarian(ledger: &Ledger, identity: &IdentityRef) -> Result<()> {
    ledger
        .librarian_by_identity(identity)
        .map(|_| ())
        .ok_or(LendingError::Forbidden)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::FixedClock;
    use crate::adapters::memory::InMemoryStore;
    use crate::core::observers::InMemoryHistory;
    use crate::domain::model::{NewBook, NewLibrarian, NewReader};

    fn start_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    struct Fixture {
        engine: LendingEngine<InMemoryStore>,
        clock: Arc<FixedClock>,
        history: Arc<InMemoryHistory>,
        dune: BookId,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let dune = store
            .write(|ledger| {
                for identity in ["alice", "bob"] {
                    ledger.register_reader(NewReader {
                        identity: identity.to_string(),
                        first_name: identity.to_string(),
                        last_name: "Reader".to_string(),
                        address: "1 Main St".to_string(),
                    })?;
                }
                ledger.register_librarian(NewLibrarian {
                    identity: "carol".to_string(),
                    employee_id: "E-1".to_string(),
                })?;
                ledger.insert_book(NewBook {
                    title: "Solaris".to_string(),
                    author: "Lem".to_string(),
                    genre: "SciFi".to_string(),
                });
                Ok(ledger
                    .insert_book(NewBook {
                        title: "Dune".to_string(),
                        author: "Herbert".to_string(),
                        genre: "SciFi".to_string(),
                    })
                    .id)
            })
            .await
            .unwrap();

        let clock = Arc::new(FixedClock::new(start_date()));
        let history = Arc::new(InMemoryHistory::new());
        let mut engine = LendingEngine::new(store, clock.clone());
        engine.register_observer(history.clone());

        Fixture {
            engine,
            clock,
            history,
            dune,
        }
    }

    fn alice() -> IdentityRef {
        IdentityRef::new("alice")
    }

    fn bob() -> IdentityRef {
        IdentityRef::new("bob")
    }

    async fn assert_consistent(engine: &LendingEngine<InMemoryStore>) {
        engine
            .store()
            .read(|ledger| ledger.check_invariants())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_borrow_marks_book_checked_out() {
        let f = fixture().await;

        let loan = f.engine.borrow_book(&alice(), f.dune).await.unwrap();

        assert_eq!(loan.book_title, "Dune");
        assert_eq!(loan.days_borrowed, 0);
        assert_eq!(loan.borrowing.borrowed_date, start_date());
        assert!(loan.borrowing.is_open());
        let books = f.engine.list_books().await.unwrap();
        assert!(books.iter().find(|b| b.id == f.dune).unwrap().is_checked_out);
        assert_consistent(&f.engine).await;
    }

    #[tokio::test]
    async fn test_borrow_already_borrowed_leaves_state_unchanged() {
        let f = fixture().await;
        f.engine.borrow_book(&alice(), f.dune).await.unwrap();
        let before = f.engine.store().read(|l| Ok(l.snapshot())).await.unwrap();

        let err = f.engine.borrow_book(&bob(), f.dune).await.unwrap_err();

        assert!(matches!(err, LendingError::AlreadyBorrowed));
        let after = f.engine.store().read(|l| Ok(l.snapshot())).await.unwrap();
        assert_eq!(before, after);
        assert_eq!(f.history.events().len(), 1);
    }

    #[tokio::test]
    async fn test_borrow_unknown_book_or_reader() {
        let f = fixture().await;

        let err = f.engine.borrow_book(&alice(), BookId::new()).await.unwrap_err();
        assert!(matches!(err, LendingError::BookNotFound));

        let err = f
            .engine
            .borrow_book(&IdentityRef::new("mallory"), f.dune)
            .await
            .unwrap_err();
        assert!(matches!(err, LendingError::ReaderNotFound));
        assert!(f.history.events().is_empty());
        assert_consistent(&f.engine).await;
    }

    #[tokio::test]
    async fn test_return_round_trip_keeps_borrowed_date() {
        let f = fixture().await;
        let loan = f.engine.borrow_book(&alice(), f.dune).await.unwrap();
        f.clock.advance_days(5);

        let returned = f.engine.return_book(&alice(), f.dune).await.unwrap();

        assert_eq!(returned.borrowing.id, loan.borrowing.id);
        assert_eq!(returned.borrowing.borrowed_date, start_date());
        assert_eq!(returned.borrowing.returned_date, Some(f.clock.today()));
        assert_eq!(returned.days_borrowed, 5);

        let history = f
            .engine
            .book_history(&IdentityRef::new("carol"), f.dune)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert!(!history[0].borrowing.is_open());
        assert!(f.engine.my_books(&alice()).await.unwrap().is_empty());
        assert_consistent(&f.engine).await;
    }

    #[tokio::test]
    async fn test_return_not_borrowed_is_conflict() {
        let f = fixture().await;

        let err = f.engine.return_book(&alice(), f.dune).await.unwrap_err();
        assert!(matches!(err, LendingError::NotBorrowed));

        f.engine.borrow_book(&alice(), f.dune).await.unwrap();
        f.engine.return_book(&alice(), f.dune).await.unwrap();
        let err = f.engine.return_book(&alice(), f.dune).await.unwrap_err();
        assert!(matches!(err, LendingError::NotBorrowed));
    }

    #[tokio::test]
    async fn test_reader_cannot_return_someone_elses_book() {
        let f = fixture().await;
        f.engine.borrow_book(&alice(), f.dune).await.unwrap();

        let err = f.engine.return_book(&bob(), f.dune).await.unwrap_err();

        assert!(matches!(err, LendingError::BorrowingNotFound));
        assert_eq!(f.engine.my_books(&alice()).await.unwrap().len(), 1);
        assert_consistent(&f.engine).await;
    }

    #[tokio::test]
    async fn test_my_books_sorted_with_days_borrowed() {
        let f = fixture().await;
        let solaris = f
            .engine
            .list_books()
            .await
            .unwrap()
            .into_iter()
            .find(|b| b.title == "Solaris")
            .unwrap()
            .id;

        f.engine.borrow_book(&alice(), solaris).await.unwrap();
        f.clock.advance_days(2);
        f.engine.borrow_book(&alice(), f.dune).await.unwrap();
        f.clock.advance_days(1);

        let loans = f.engine.my_books(&alice()).await.unwrap();
        let summary: Vec<(&str, i64)> = loans
            .iter()
            .map(|l| (l.book_title.as_str(), l.days_borrowed))
            .collect();
        assert_eq!(summary, vec![("Dune", 1), ("Solaris", 3)]);
    }

    #[tokio::test]
    async fn test_overdue_requires_librarian_and_filters() {
        let f = fixture().await;
        f.engine.borrow_book(&alice(), f.dune).await.unwrap();

        let err = f.engine.overdue(&alice()).await.unwrap_err();
        assert!(matches!(err, LendingError::Forbidden));

        let carol = IdentityRef::new("carol");
        f.clock.advance_days(DEFAULT_LOAN_PERIOD_DAYS.unsigned_abs());
        assert!(f.engine.overdue(&carol).await.unwrap().is_empty());

        f.clock.advance_days(1);
        let overdue = f.engine.overdue(&carol).await.unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].reader_name, "alice Reader");
        assert_eq!(overdue[0].days_borrowed, DEFAULT_LOAN_PERIOD_DAYS + 1);
    }

    #[tokio::test]
    async fn test_observers_see_committed_transitions() {
        let f = fixture().await;
        f.engine.borrow_book(&alice(), f.dune).await.unwrap();
        f.engine.return_book(&alice(), f.dune).await.unwrap();

        let events = f.history.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], LendingEvent::Borrowed { .. }));
        assert!(matches!(events[1], LendingEvent::Returned { .. }));
        assert_eq!(events[0].borrowing_id(), events[1].borrowing_id());
    }
}
