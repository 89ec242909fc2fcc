use chrono::NaiveDate;
use library_lending::adapters::clock::FixedClock;
use library_lending::core::observers::InMemoryHistory;
use library_lending::domain::model::{BookId, IdentityRef, NewBook, NewReader};
use library_lending::domain::ports::EntityStore;
use library_lending::{InMemoryStore, LendingEngine, LendingError};
use std::sync::Arc;

const READERS: usize = 16;

async fn engine_with_readers() -> (Arc<LendingEngine<InMemoryStore>>, Arc<InMemoryHistory>, BookId) {
    let store = Arc::new(InMemoryStore::new());
    let book_id = store
        .write(|ledger| {
            for i in 0..READERS {
                ledger.register_reader(NewReader {
                    identity: format!("reader-{}", i),
                    first_name: format!("Reader{}", i),
                    last_name: "Test".to_string(),
                    address: "Somewhere".to_string(),
                })?;
            }
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

    let clock = Arc::new(FixedClock::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()));
    let history = Arc::new(InMemoryHistory::new());
    let mut engine = LendingEngine::new(store, clock);
    engine.register_observer(history.clone());

    (Arc::new(engine), history, book_id)
}

fn reader(i: usize) -> IdentityRef {
    IdentityRef::new(format!("reader-{}", i))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_borrows_exactly_one_wins() {
    let (engine, history, book_id) = engine_with_readers().await;

    let handles: Vec<_> = (0..READERS)
        .map(|i| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.borrow_book(&reader(i), book_id).await })
        })
        .collect();

    let mut successes = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(LendingError::AlreadyBorrowed) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(conflicts, READERS - 1);
    assert_eq!(history.events().len(), 1);
    engine
        .store()
        .read(|ledger| {
            assert_eq!(ledger.open_borrowings().len(), 1);
            ledger.check_invariants()
        })
        .await
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_returns_exactly_one_wins() {
    let (engine, _history, book_id) = engine_with_readers().await;
    engine.borrow_book(&reader(0), book_id).await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.return_book(&reader(0), book_id).await })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(loan) => {
                successes += 1;
                assert!(loan.borrowing.returned_date.is_some());
            }
            Err(e) => assert!(matches!(e, LendingError::NotBorrowed)),
        }
    }

    assert_eq!(successes, 1);
    engine
        .store()
        .read(|ledger| {
            assert!(ledger.open_borrowing_for_book(book_id).is_none());
            assert_eq!(ledger.borrowings_for_book(book_id).len(), 1);
            ledger.check_invariants()
        })
        .await
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_interleaved_borrow_and_return_keep_invariants() {
    let (engine, history, book_id) = engine_with_readers().await;

    let handles: Vec<_> = (0..READERS)
        .map(|i| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                for _ in 0..10 {
                    if engine.borrow_book(&reader(i), book_id).await.is_ok() {
                        engine.return_book(&reader(i), book_id).await.unwrap();
                    }
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let events = history.events();
    assert!(!events.is_empty());
    assert_eq!(events.len() % 2, 0);
    engine
        .store()
        .read(|ledger| {
            let book = ledger.book(book_id).unwrap();
            assert!(!book.is_checked_out);
            assert_eq!(ledger.borrowings_for_book(book_id).len(), events.len() / 2);
            ledger.check_invariants()
        })
        .await
        .unwrap();
}
