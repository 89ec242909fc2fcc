pub mod lifecycle;
pub mod observers;

pub use crate::domain::events::LendingEvent;
pub use crate::domain::model::{Book, BookId, Borrowing, IdentityRef};
pub use crate::domain::ports::{Clock, EntityStore, LendingObserver};
pub use crate::utils::error::Result;
