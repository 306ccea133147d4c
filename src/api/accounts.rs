//! Registration, activation and login endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};

use crate::{
    error::{AppError, AppResult},
    forms::{RegistrationForm, RegistrationFormView},
    models::user::{LoginRequest, UserInfo},
    services::{
        session::{Session, AUTH_USER_KEY},
        users::RegistrationOutcome,
    },
};

use super::parse_uuid;

/// Empty registration form
#[utoipa::path(
    get,
    path = "/catalog/register/",
    tag = "accounts",
    responses(
        (status = 200, description = "Blank form", body = RegistrationFormView)
    )
)]
pub async fn register_form() -> Json<RegistrationFormView> {
    Json(RegistrationFormView::empty())
}

/// Register an inactive account
#[utoipa::path(
    post,
    path = "/catalog/register/",
    tag = "accounts",
    request_body = RegistrationForm,
    responses(
        (status = 201, description = "Account created, activation pending", body = crate::forms::RegistrationDone),
        (status = 400, description = "Invalid form or registration failed", body = RegistrationFormView)
    )
)]
pub async fn register(
    State(state): State<crate::AppState>,
    payload: Result<Json<RegistrationForm>, JsonRejection>,
) -> AppResult<Response> {
    let Json(form) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    Ok(match state.services.users.register(form).await? {
        RegistrationOutcome::Registered(done) => (StatusCode::CREATED, Json(done)).into_response(),
        RegistrationOutcome::Rejected(view) => (StatusCode::BAD_REQUEST, Json(view)).into_response(),
    })
}

/// Activate an account and send the user to the login page
#[utoipa::path(
    get,
    path = "/catalog/activate/{id}",
    tag = "accounts",
    params(("id" = String, Path, description = "Activation UUID")),
    responses(
        (status = 303, description = "Activated, redirect to login"),
        (status = 404, description = "Unknown, used or expired activation")
    )
)]
pub async fn activate(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<Redirect> {
    let id = parse_uuid(&id)?;
    state.services.users.activate(id).await?;
    Ok(Redirect::to("/accounts/login/"))
}

/// Sign in and bind the session to the account
#[utoipa::path(
    post,
    path = "/accounts/login/",
    tag = "accounts",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = UserInfo),
        (status = 401, description = "Invalid credentials or inactive account")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    session: Session,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<UserInfo>> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let user = state
        .services
        .users
        .authenticate(&request.username, &request.password)
        .await?;

    session.cycle_id().await?;
    session.insert(AUTH_USER_KEY, user.id).await?;

    let mut permissions: Vec<_> = state
        .services
        .users
        .identity(user.id)
        .await?
        .map(|identity| identity.permissions.into_iter().collect())
        .unwrap_or_default();
    permissions.sort_by_key(|p| p.codename());

    tracing::info!("User {} signed in", user.username);

    Ok(Json(UserInfo {
        id: user.id,
        username: user.username,
        email: user.email,
        permissions,
    }))
}

/// Sign out, discarding the whole session
#[utoipa::path(
    post,
    path = "/accounts/logout/",
    tag = "accounts",
    responses(
        (status = 204, description = "Signed out")
    )
)]
pub async fn logout(session: Session) -> AppResult<StatusCode> {
    session.flush().await?;
    Ok(StatusCode::NO_CONTENT)
}
