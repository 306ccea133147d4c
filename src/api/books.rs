//! Book endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::Redirect,
    Json,
};
use chrono::Local;

use crate::{
    error::{AppError, AppResult},
    models::{book::BookForm, BookDetail, BookShort, Caller, PageQuery},
};

use super::{PaginatedResponse, BOOK_EDIT};

/// List books, ten per page, ordered by title
#[utoipa::path(
    get,
    path = "/catalog/books/",
    tag = "books",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of books", body = PaginatedResponse<BookShort>),
        (status = 404, description = "Page out of range")
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<BookShort>>> {
    let (books, page) = state.services.catalog.list_books(query.page).await?;
    Ok(Json(PaginatedResponse::new(books, &page)))
}

/// Get book details
#[utoipa::path(
    get,
    path = "/catalog/book/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book with author, language, genres and copies", body = BookDetail),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<BookDetail>> {
    let book = state.services.catalog.get_book(id, Local::now().date_naive()).await?;
    Ok(Json(book))
}

/// Empty book form
#[utoipa::path(
    get,
    path = "/catalog/book/create/",
    tag = "books",
    responses(
        (status = 200, description = "Blank form", body = BookForm),
        (status = 403, description = "Missing catalog.can_edit_book")
    )
)]
pub async fn create_book_form(caller: Caller) -> AppResult<Json<BookForm>> {
    caller.authorize(BOOK_EDIT.permission)?;
    Ok(Json(BookForm::default()))
}

/// Create a book
#[utoipa::path(
    post,
    path = "/catalog/book/create/",
    tag = "books",
    request_body = BookForm,
    responses(
        (status = 303, description = "Created, redirect to the book"),
        (status = 400, description = "Invalid form"),
        (status = 403, description = "Missing catalog.can_edit_book")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    caller: Caller,
    payload: Result<Json<BookForm>, JsonRejection>,
) -> AppResult<Redirect> {
    caller.authorize(BOOK_EDIT.permission)?;
    let Json(form) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let book = state.services.catalog.create_book(form).await?;
    Ok(BOOK_EDIT.to_detail(book.id))
}

/// Current book values for editing
#[utoipa::path(
    get,
    path = "/catalog/book/{id}/update/",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Editable fields", body = BookForm),
        (status = 403, description = "Missing catalog.can_edit_book"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book_form(
    State(state): State<crate::AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> AppResult<Json<BookForm>> {
    caller.authorize(BOOK_EDIT.permission)?;
    let form = state.services.catalog.book_form(id).await?;
    Ok(Json(form))
}

/// Replace every field of a book
#[utoipa::path(
    post,
    path = "/catalog/book/{id}/update/",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    request_body = BookForm,
    responses(
        (status = 303, description = "Updated, redirect to the book"),
        (status = 400, description = "Invalid form"),
        (status = 403, description = "Missing catalog.can_edit_book"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    caller: Caller,
    Path(id): Path<i32>,
    payload: Result<Json<BookForm>, JsonRejection>,
) -> AppResult<Redirect> {
    caller.authorize(BOOK_EDIT.permission)?;
    let Json(form) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let book = state.services.catalog.update_book(id, form).await?;
    Ok(BOOK_EDIT.to_detail(book.id))
}

/// Book about to be deleted
#[utoipa::path(
    get,
    path = "/catalog/book/{id}/delete/",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book to confirm", body = BookDetail),
        (status = 403, description = "Missing catalog.can_edit_book"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book_confirm(
    State(state): State<crate::AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> AppResult<Json<BookDetail>> {
    caller.authorize(BOOK_EDIT.permission)?;
    let book = state.services.catalog.get_book(id, Local::now().date_naive()).await?;
    Ok(Json(book))
}

/// Delete a book with its copies
#[utoipa::path(
    post,
    path = "/catalog/book/{id}/delete/",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 303, description = "Deleted, redirect to the book list"),
        (status = 403, description = "Missing catalog.can_edit_book"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> AppResult<Redirect> {
    caller.authorize(BOOK_EDIT.permission)?;
    state.services.catalog.delete_book(id).await?;
    Ok(BOOK_EDIT.to_list())
}
