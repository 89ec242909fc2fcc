use crate::core::{LendingEvent, LendingObserver};
use std::sync::Mutex;

/// Writes one structured log line per committed lending change.
#[derive(Debug, Default)]
pub struct TracingHistoryRecorder;

impl LendingObserver for TracingHistoryRecorder {
    fn on_lending_event(&self, event: &LendingEvent) {
        let (from, to) = event.transition();
        tracing::info!(
            target: "library_lending::history",
            book_id = %event.book_id(),
            borrowing_id = %event.borrowing_id(),
            ?from,
            ?to,
            "Book state changed"
        );
    }
}

/// Keeps every event it is told about, in order.
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    events: Mutex<Vec<LendingEvent>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LendingEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl LendingObserver for InMemoryHistory {
    fn on_lending_event(&self, event: &LendingEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{BookId, BookState, BorrowingId, ReaderId};
    use chrono::NaiveDate;

    #[test]
    fn test_in_memory_history_keeps_order() {
        let history = InMemoryHistory::new();
        let borrowing_id = BorrowingId::new();
        let book_id = BookId::new();
        let reader_id = ReaderId::new();
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        history.on_lending_event(&LendingEvent::Borrowed {
            borrowing_id,
            book_id,
            reader_id,
            borrowed_date: date,
        });
        history.on_lending_event(&LendingEvent::Returned {
            borrowing_id,
            book_id,
            reader_id,
            returned_date: date,
        });

        let events = history.events();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0].transition(),
            (BookState::Available, BookState::CheckedOut)
        );
        assert_eq!(
            events[1].transition(),
            (BookState::CheckedOut, BookState::Available)
        );
    }
}
