//! Borrowed books and renewal endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use chrono::Local;

use crate::{
    error::{AppError, AppResult},
    forms::{RenewBookForm, RenewalFormView},
    models::{BorrowedInstance, Caller, PageQuery, Permission},
    services::loans::RenewalOutcome,
};

use super::{parse_uuid, PaginatedResponse};

/// Copies on loan to the caller, soonest due first
#[utoipa::path(
    get,
    path = "/catalog/mybooks/",
    tag = "loans",
    params(PageQuery),
    responses(
        (status = 200, description = "Caller's borrowed copies", body = PaginatedResponse<BorrowedInstance>),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn my_borrowed(
    State(state): State<crate::AppState>,
    caller: Caller,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<BorrowedInstance>>> {
    let identity = caller.require_login()?;

    let (instances, page) = state
        .services
        .loans
        .on_loan(Some(identity.user_id), query.page, Local::now().date_naive())
        .await?;
    Ok(Json(PaginatedResponse::new(instances, &page)))
}

/// Every copy on loan, soonest due first
#[utoipa::path(
    get,
    path = "/catalog/borrowed/",
    tag = "loans",
    params(PageQuery),
    responses(
        (status = 200, description = "All borrowed copies with their borrowers", body = PaginatedResponse<BorrowedInstance>),
        (status = 403, description = "Missing catalog.can_mark_returned")
    )
)]
pub async fn all_borrowed(
    State(state): State<crate::AppState>,
    caller: Caller,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<BorrowedInstance>>> {
    caller.authorize(Permission::CanMarkReturned)?;

    let (instances, page) = state
        .services
        .loans
        .on_loan(None, query.page, Local::now().date_naive())
        .await?;
    Ok(Json(PaginatedResponse::new(instances, &page)))
}

/// Renewal form with a proposed date three weeks out
#[utoipa::path(
    get,
    path = "/catalog/book/{id}/renew/",
    tag = "loans",
    params(("id" = String, Path, description = "Book instance UUID")),
    responses(
        (status = 200, description = "Renewal form", body = RenewalFormView),
        (status = 403, description = "Missing catalog.can_mark_returned"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn renew_form(
    State(state): State<crate::AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> AppResult<Json<RenewalFormView>> {
    caller.authorize(Permission::CanMarkReturned)?;
    let id = parse_uuid(&id)?;

    let view = state
        .services
        .loans
        .renewal_form(id, Local::now().date_naive())
        .await?;
    Ok(Json(view))
}

/// Set a new due-back date, at most four weeks out
#[utoipa::path(
    post,
    path = "/catalog/book/{id}/renew/",
    tag = "loans",
    params(("id" = String, Path, description = "Book instance UUID")),
    request_body = RenewBookForm,
    responses(
        (status = 303, description = "Renewed, redirect to all borrowed books"),
        (status = 400, description = "Rejected date, form returned with errors", body = RenewalFormView),
        (status = 403, description = "Missing catalog.can_mark_returned"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn renew(
    State(state): State<crate::AppState>,
    caller: Caller,
    Path(id): Path<String>,
    payload: Result<Json<RenewBookForm>, JsonRejection>,
) -> AppResult<Response> {
    caller.authorize(Permission::CanMarkReturned)?;
    let id = parse_uuid(&id)?;
    let Json(form) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let outcome = state
        .services
        .loans
        .renew(id, form, Local::now().date_naive())
        .await?;

    Ok(match outcome {
        RenewalOutcome::Renewed => Redirect::to("/catalog/borrowed/").into_response(),
        RenewalOutcome::Rejected(view) => (StatusCode::BAD_REQUEST, Json(view)).into_response(),
    })
}
