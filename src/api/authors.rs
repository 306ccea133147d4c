//! Author endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::Redirect,
    Json,
};
use chrono::Local;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{AuthorFormValues, CreateAuthor, UpdateAuthor},
        Author, AuthorDetail, Caller, PageQuery,
    },
};

use super::{PaginatedResponse, AUTHOR_EDIT};

/// List authors, ten per page, ordered by last name
#[utoipa::path(
    get,
    path = "/catalog/authors/",
    tag = "authors",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of authors", body = PaginatedResponse<Author>),
        (status = 404, description = "Page out of range")
    )
)]
pub async fn list_authors(
    State(state): State<crate::AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<Author>>> {
    let (authors, page) = state.services.catalog.list_authors(query.page).await?;
    Ok(Json(PaginatedResponse::new(authors, &page)))
}

/// Get author details
#[utoipa::path(
    get,
    path = "/catalog/author/{id}",
    tag = "authors",
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author with their books", body = AuthorDetail),
        (status = 404, description = "Author not found")
    )
)]
pub async fn get_author(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<AuthorDetail>> {
    let author = state.services.catalog.get_author(id).await?;
    Ok(Json(author))
}

/// Initial author form; the date of death starts at today
#[utoipa::path(
    get,
    path = "/catalog/author/create/",
    tag = "authors",
    responses(
        (status = 200, description = "Initial form values", body = CreateAuthor),
        (status = 403, description = "Missing catalog.can_edit_author")
    )
)]
pub async fn create_author_form(caller: Caller) -> AppResult<Json<CreateAuthor>> {
    caller.authorize(AUTHOR_EDIT.permission)?;
    Ok(Json(CreateAuthor {
        first_name: String::new(),
        last_name: String::new(),
        date_of_birth: None,
        date_of_death: Some(Local::now().date_naive()),
    }))
}

/// Create an author
#[utoipa::path(
    post,
    path = "/catalog/author/create/",
    tag = "authors",
    request_body = CreateAuthor,
    responses(
        (status = 303, description = "Created, redirect to the author"),
        (status = 400, description = "Invalid form"),
        (status = 403, description = "Missing catalog.can_edit_author")
    )
)]
pub async fn create_author(
    State(state): State<crate::AppState>,
    caller: Caller,
    payload: Result<Json<CreateAuthor>, JsonRejection>,
) -> AppResult<Redirect> {
    caller.authorize(AUTHOR_EDIT.permission)?;
    let Json(author) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let author = state.services.catalog.create_author(author).await?;
    Ok(AUTHOR_EDIT.to_detail(author.id))
}

/// Current author values for editing
#[utoipa::path(
    get,
    path = "/catalog/author/{id}/update/",
    tag = "authors",
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Editable fields", body = AuthorFormValues),
        (status = 403, description = "Missing catalog.can_edit_author"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn update_author_form(
    State(state): State<crate::AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> AppResult<Json<AuthorFormValues>> {
    caller.authorize(AUTHOR_EDIT.permission)?;
    let values = state.services.catalog.author_form(id).await?;
    Ok(Json(values))
}

/// Update an author's names and dates
#[utoipa::path(
    post,
    path = "/catalog/author/{id}/update/",
    tag = "authors",
    params(("id" = i32, Path, description = "Author ID")),
    request_body = UpdateAuthor,
    responses(
        (status = 303, description = "Updated, redirect to the author"),
        (status = 400, description = "Invalid form"),
        (status = 403, description = "Missing catalog.can_edit_author"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn update_author(
    State(state): State<crate::AppState>,
    caller: Caller,
    Path(id): Path<i32>,
    payload: Result<Json<UpdateAuthor>, JsonRejection>,
) -> AppResult<Redirect> {
    caller.authorize(AUTHOR_EDIT.permission)?;
    let Json(changes) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let author = state.services.catalog.update_author(id, changes).await?;
    Ok(AUTHOR_EDIT.to_detail(author.id))
}

/// Author about to be deleted
#[utoipa::path(
    get,
    path = "/catalog/author/{id}/delete/",
    tag = "authors",
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author to confirm", body = AuthorDetail),
        (status = 403, description = "Missing catalog.can_edit_author"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn delete_author_confirm(
    State(state): State<crate::AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> AppResult<Json<AuthorDetail>> {
    caller.authorize(AUTHOR_EDIT.permission)?;
    let author = state.services.catalog.get_author(id).await?;
    Ok(Json(author))
}

/// Delete an author; their books are kept without an author
#[utoipa::path(
    post,
    path = "/catalog/author/{id}/delete/",
    tag = "authors",
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 303, description = "Deleted, redirect to the author list"),
        (status = 403, description = "Missing catalog.can_edit_author"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn delete_author(
    State(state): State<crate::AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> AppResult<Redirect> {
    caller.authorize(AUTHOR_EDIT.permission)?;
    state.services.catalog.delete_author(id).await?;
    Ok(AUTHOR_EDIT.to_list())
}
