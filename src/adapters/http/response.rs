use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::lifecycle::LoanView;
use crate::domain::model::{Book, BookId, BorrowingId};
use crate::utils::error::{ErrorKind, LendingError};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookResponse {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub genre: String,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            genre: book.genre,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BorrowingResponse {
    pub id: BorrowingId,
    pub book_title: String,
    pub borrowed_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returned_date: Option<NaiveDate>,
    pub days_borrowed: i64,
}

impl From<LoanView> for BorrowingResponse {
    fn from(view: LoanView) -> Self {
        Self {
            id: view.borrowing.id,
            book_title: view.book_title,
            borrowed_date: view.borrowing.borrowed_date,
            returned_date: view.borrowing.returned_date,
            days_borrowed: view.days_borrowed,
        }
    }
}

/// Librarian-facing row: a borrowing plus who holds it.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoanReportResponse {
    pub id: BorrowingId,
    pub book_id: BookId,
    pub book_title: String,
    pub reader_name: String,
    pub borrowed_date: NaiveDate,
    pub returned_date: Option<NaiveDate>,
    pub days_borrowed: i64,
}

impl From<LoanView> for LoanReportResponse {
    fn from(view: LoanView) -> Self {
        Self {
            id: view.borrowing.id,
            book_id: view.borrowing.book_id,
            book_title: view.book_title,
            reader_name: view.reader_name,
            borrowed_date: view.borrowing.borrowed_date,
            returned_date: view.borrowing.returned_date,
            days_borrowed: view.days_borrowed,
        }
    }
}

impl IntoResponse for LendingError {
    fn into_response(self) -> Response {
        let status_code = match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict | ErrorKind::Invalid => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let error = if status_code.is_server_error() {
            tracing::error!(
                error.cause_chain = ?self,
                error.message = %self,
                "Unexpected error happened"
            );
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status_code, Json(ErrorBody { error })).into_response()
    }
}
