//! API handlers for the Local Library endpoints

pub mod accounts;
pub mod authors;
pub mod books;
pub mod catalog;
pub mod health;
pub mod loans;
pub mod openapi;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Caller, Page, Permission},
    services::session::{generate_session_id, is_valid_session_id, Session, AUTH_USER_KEY},
    AppState,
};

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Entries on this page
    pub items: Vec<T>,
    /// Current page number (1-based)
    pub page: i64,
    /// Number of pages
    pub num_pages: i64,
    /// Total number of entries
    pub total: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(items: Vec<T>, page: &Page) -> Self {
        Self {
            items,
            page: page.number,
            num_pages: page.num_pages,
            total: page.total,
            has_next: page.has_next(),
            has_previous: page.has_previous(),
        }
    }
}

/// Permission and redirect targets shared by the create/update/delete
/// handlers of one entity
pub struct EditPolicy {
    pub permission: Permission,
    pub list_path: &'static str,
    pub detail_prefix: &'static str,
}

pub const AUTHOR_EDIT: EditPolicy = EditPolicy {
    permission: Permission::CanEditAuthor,
    list_path: "/catalog/authors/",
    detail_prefix: "/catalog/author/",
};

pub const BOOK_EDIT: EditPolicy = EditPolicy {
    permission: Permission::CanEditBook,
    list_path: "/catalog/books/",
    detail_prefix: "/catalog/book/",
};

impl EditPolicy {
    pub fn detail_path(&self, id: i32) -> String {
        format!("{}{}", self.detail_prefix, id)
    }

    /// 303 to the detail view of `id`
    pub fn to_detail(&self, id: i32) -> Redirect {
        Redirect::to(&self.detail_path(id))
    }

    /// 303 to the list view
    pub fn to_list(&self) -> Redirect {
        Redirect::to(self.list_path)
    }
}

/// Parse a UUID path segment; anything else names no resource
pub fn parse_uuid(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("No resource with id {}", raw)))
}

/// Attach a session to every request and issue its cookie once data is
/// written to it
pub async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let cookie_name = state.config.session.cookie_name.clone();
    let presented = jar
        .get(&cookie_name)
        .map(|c| c.value().to_string())
        .filter(|id| is_valid_session_id(id));

    let session = Session::new(
        presented.clone().unwrap_or_else(generate_session_id),
        state.sessions.clone(),
    );
    request.extensions_mut().insert(session.clone());

    let response = next.run(request).await;

    let id = session.id();
    if session.is_written() && presented.as_deref() != Some(id.as_str()) {
        let cookie = Cookie::build((cookie_name, id))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(state.config.session.secure_cookie);
        return (jar.add(cookie), response).into_response();
    }
    response
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("Session layer is not installed".to_string()))
    }
}

/// Resolve the caller from the session. Sessions pointing at a missing or
/// inactive account are anonymous.
#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        let Some(user_id) = session.get::<i32>(AUTH_USER_KEY).await? else {
            return Ok(Caller::anonymous());
        };

        Ok(match state.services.users.identity(user_id).await? {
            Some(identity) => Caller::signed_in(identity),
            None => Caller::anonymous(),
        })
    }
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let site = Router::new()
        .route("/", get(catalog::root_redirect))
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Catalog
        .route("/catalog/", get(catalog::index))
        .route("/catalog/books/", get(books::list_books))
        .route("/catalog/book/:id", get(books::get_book))
        .route("/catalog/authors/", get(authors::list_authors))
        .route("/catalog/author/:id", get(authors::get_author))
        // Loans
        .route("/catalog/mybooks/", get(loans::my_borrowed))
        .route("/catalog/borrowed/", get(loans::all_borrowed))
        .route("/catalog/book/:id/renew/", get(loans::renew_form).post(loans::renew))
        // Authors editing
        .route(
            "/catalog/author/create/",
            get(authors::create_author_form).post(authors::create_author),
        )
        .route(
            "/catalog/author/:id/update/",
            get(authors::update_author_form).post(authors::update_author),
        )
        .route(
            "/catalog/author/:id/delete/",
            get(authors::delete_author_confirm).post(authors::delete_author),
        )
        // Books editing
        .route(
            "/catalog/book/create/",
            get(books::create_book_form).post(books::create_book),
        )
        .route(
            "/catalog/book/:id/update/",
            get(books::update_book_form).post(books::update_book),
        )
        .route(
            "/catalog/book/:id/delete/",
            get(books::delete_book_confirm).post(books::delete_book),
        )
        // Accounts
        .route(
            "/catalog/register/",
            get(accounts::register_form).post(accounts::register),
        )
        .route("/catalog/activate/:id", get(accounts::activate))
        .route("/accounts/login/", post(accounts::login))
        .route("/accounts/logout/", post(accounts::logout))
        .layer(middleware::from_fn_with_state(state.clone(), session_middleware))
        .with_state(state);

    // OpenAPI documentation
    let openapi = openapi::create_openapi_router();

    Router::new()
        .merge(site)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, time::Duration};

    use axum::{
        body::{to_bytes, Body},
        http::{
            header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
            Request as HttpRequest, StatusCode,
        },
    };
    use serde_json::{json, Value};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::{
        config::{AppConfig, SessionBackend, SessionConfig},
        repository::Repository,
        services::{
            session::{record_visit, MemorySessionStore},
            Services,
        },
    };

    /// State whose database is never reached by the requests under test
    fn test_state() -> AppState {
        let config = AppConfig {
            server: Default::default(),
            database: Default::default(),
            logging: Default::default(),
            redis: Default::default(),
            session: SessionConfig {
                backend: SessionBackend::Memory,
                ..Default::default()
            },
            registration: Default::default(),
        };
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database.url)
            .unwrap();
        let services = Services::new(Repository::new(pool), config.registration.clone());
        AppState {
            config: Arc::new(config),
            services: Arc::new(services),
            sessions: Arc::new(MemorySessionStore::new(Duration::from_secs(3600))),
        }
    }

    fn get_request(uri: &str) -> HttpRequest<Body> {
        HttpRequest::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> HttpRequest<Body> {
        HttpRequest::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn root_redirects_to_catalog() {
        let response = router(test_state()).oneshot(get_request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/catalog/");
    }

    #[tokio::test]
    async fn my_books_requires_login() {
        let response = router(test_state())
            .oneshot(get_request("/catalog/mybooks/"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"], "NotAuthenticated");
    }

    #[tokio::test]
    async fn anonymous_callers_are_forbidden_from_librarian_routes() {
        let app = router(test_state());
        let requests = [
            get_request("/catalog/borrowed/"),
            get_request("/catalog/book/6f1c1a52-8f1e-4c3a-9a57-1f0c4a1e2b3d/renew/"),
            get_request("/catalog/author/create/"),
            get_request("/catalog/book/3/update/"),
            post_json("/catalog/author/4/delete/", json!({})),
        ];
        for request in requests {
            let uri = request.uri().to_string();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{}", uri);
        }
    }

    #[tokio::test]
    async fn permission_is_checked_before_the_body_is_read() {
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/catalog/book/6f1c1a52-8f1e-4c3a-9a57-1f0c4a1e2b3d/renew/")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("not json"))
            .unwrap();
        let response = router(test_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn malformed_activation_id_is_not_found() {
        let response = router(test_state())
            .oneshot(get_request("/catalog/activate/not-a-uuid"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_registration_returns_form_errors() {
        let response = router(test_state())
            .oneshot(post_json(
                "/catalog/register/",
                json!({
                    "username": "reader",
                    "email": "nowhere",
                    "password1": "s3cret-pass",
                    "password2": "different-pass"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(body["username"], "reader");
        assert!(body["errors"]["email"].is_array());
        assert!(body["errors"]["password2"].is_array());
        assert!(body.get("password1").is_none());
    }

    #[tokio::test]
    async fn session_cookie_is_issued_once_and_counts_visits() {
        let state = test_state();
        let app = Router::new()
            .route(
                "/visit",
                get(|session: Session| async move {
                    record_visit(&session).await.map(|n| n.to_string())
                }),
            )
            .layer(middleware::from_fn_with_state(state.clone(), session_middleware))
            .with_state(state);

        let first = app.clone().oneshot(get_request("/visit")).await.unwrap();
        let cookie = first.headers()[SET_COOKIE].to_str().unwrap().to_string();
        assert!(cookie.starts_with("sessionid="));
        assert!(cookie.contains("HttpOnly"));
        let pair = cookie.split(';').next().unwrap().to_string();
        let bytes = to_bytes(first.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"1");

        let second = HttpRequest::builder()
            .uri("/visit")
            .header(COOKIE, pair)
            .body(Body::empty())
            .unwrap();
        let second = app.oneshot(second).await.unwrap();
        assert!(second.headers().get(SET_COOKIE).is_none());
        let bytes = to_bytes(second.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"2");
    }

    #[tokio::test]
    async fn logout_replaces_the_session_cookie() {
        let old = generate_session_id();
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/accounts/logout/")
            .header(COOKIE, format!("sessionid={}", old))
            .body(Body::empty())
            .unwrap();

        let response = router(test_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let cookie = response.headers()[SET_COOKIE].to_str().unwrap();
        let new = cookie
            .split(';')
            .next()
            .and_then(|pair| pair.strip_prefix("sessionid="))
            .unwrap();
        assert_ne!(new, old);
        assert!(is_valid_session_id(new));
    }

    #[test]
    fn edit_policies_redirect_to_their_views() {
        let response = BOOK_EDIT.to_detail(12).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/catalog/book/12");

        let response = AUTHOR_EDIT.to_list().into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/catalog/authors/");
    }

    #[test]
    fn edit_policies_guard_with_their_own_permission() {
        assert_eq!(AUTHOR_EDIT.permission, Permission::CanEditAuthor);
        assert_eq!(BOOK_EDIT.permission, Permission::CanEditBook);
    }

    #[test]
    fn non_uuid_ids_are_not_found() {
        assert!(matches!(parse_uuid("42"), Err(AppError::NotFound(_))));
        assert!(parse_uuid("6f1c1a52-8f1e-4c3a-9a57-1f0c4a1e2b3d").is_ok());
    }

    #[test]
    fn page_metadata_is_copied() {
        let page = Page::resolve(Some(2), 25).unwrap();
        let response = PaginatedResponse::<crate::models::Genre>::new(vec![], &page);
        assert_eq!(response.num_pages, 3);
        assert!(response.has_next);
        assert!(response.has_previous);
    }
}
