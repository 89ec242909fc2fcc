use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Redirect,
    Json,
};

use crate::adapters::http::extractor::AuthorizedUser;
use crate::adapters::http::response::{BookResponse, BorrowingResponse, LoanReportResponse};
use crate::adapters::http::AppState;
use crate::domain::model::BookId;
use crate::domain::ports::EntityStore;
use crate::utils::error::{LendingError, Result};

/// Home page of the HTML front end, which is served outside this router.
const HOME: &str = "/";

// An id that is not even a UUID cannot name a book.
fn parse_book_id(raw: &str) -> Result<BookId> {
    BookId::parse_str(raw).ok_or(LendingError::BookNotFound)
}

pub async fn list_books<S: EntityStore + 'static>(
    State(state): State<AppState<S>>,
    _user: AuthorizedUser,
) -> Result<Json<Vec<BookResponse>>> {
    let books = state.engine.list_books().await?;
    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

pub async fn borrow_book<S: EntityStore + 'static>(
    State(state): State<AppState<S>>,
    user: AuthorizedUser,
    Path(book_id): Path<String>,
) -> Result<(StatusCode, Json<BorrowingResponse>)> {
    let book_id = parse_book_id(&book_id)?;
    let loan = state.engine.borrow_book(user.identity(), book_id).await?;
    Ok((StatusCode::CREATED, Json(loan.into())))
}

pub async fn return_book<S: EntityStore + 'static>(
    State(state): State<AppState<S>>,
    user: AuthorizedUser,
    Path(book_id): Path<String>,
) -> Result<Json<BorrowingResponse>> {
    let book_id = parse_book_id(&book_id)?;
    let loan = state.engine.return_book(user.identity(), book_id).await?;
    Ok(Json(loan.into()))
}

pub async fn my_books<S: EntityStore + 'static>(
    State(state): State<AppState<S>>,
    user: AuthorizedUser,
) -> Result<Json<Vec<BorrowingResponse>>> {
    let loans = state.engine.my_books(user.identity()).await?;
    Ok(Json(loans.into_iter().map(BorrowingResponse::from).collect()))
}

pub async fn overdue<S: EntityStore + 'static>(
    State(state): State<AppState<S>>,
    user: AuthorizedUser,
) -> Result<Json<Vec<LoanReportResponse>>> {
    let loans = state.engine.overdue(user.identity()).await?;
    Ok(Json(loans.into_iter().map(LoanReportResponse::from).collect()))
}

pub async fn book_history<S: EntityStore + 'static>(
    State(state): State<AppState<S>>,
    user: AuthorizedUser,
    Path(book_id): Path<String>,
) -> Result<Json<Vec<LoanReportResponse>>> {
    let book_id = parse_book_id(&book_id)?;
    let loans = state.engine.book_history(user.identity(), book_id).await?;
    Ok(Json(loans.into_iter().map(LoanReportResponse::from).collect()))
}

/// Form-post borrow: non-readers and successful borrows are sent home.
pub async fn borrow_form<S: EntityStore + 'static>(
    State(state): State<AppState<S>>,
    user: AuthorizedUser,
    Path(book_id): Path<String>,
) -> Result<Redirect> {
    if !state.engine.is_reader(user.identity()).await? {
        return Ok(Redirect::to(HOME));
    }
    let book_id = parse_book_id(&book_id)?;
    state.engine.borrow_book(user.identity(), book_id).await?;
    Ok(Redirect::to(HOME))
}

pub async fn return_form<S: EntityStore + 'static>(
    State(state): State<AppState<S>>,
    user: AuthorizedUser,
    Path(book_id): Path<String>,
) -> Result<Redirect> {
    let book_id = parse_book_id(&book_id)?;
    state.engine.return_book(user.identity(), book_id).await?;
    Ok(Redirect::to(HOME))
}
