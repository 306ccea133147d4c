//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{accounts, authors, books, catalog, health, loans};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Local Library API",
        version = "0.1.0",
        description = "Library catalog, loans and accounts"
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Catalog
        catalog::index,
        // Books
        books::list_books,
        books::get_book,
        books::create_book_form,
        books::create_book,
        books::update_book_form,
        books::update_book,
        books::delete_book_confirm,
        books::delete_book,
        // Authors
        authors::list_authors,
        authors::get_author,
        authors::create_author_form,
        authors::create_author,
        authors::update_author_form,
        authors::update_author,
        authors::delete_author_confirm,
        authors::delete_author,
        // Loans
        loans::my_borrowed,
        loans::all_borrowed,
        loans::renew_form,
        loans::renew,
        // Accounts
        accounts::register_form,
        accounts::register,
        accounts::activate,
        accounts::login,
        accounts::logout,
    ),
    components(
        schemas(
            // Catalog
            catalog::CatalogSummary,
            crate::models::Book,
            crate::models::BookShort,
            crate::models::BookDetail,
            crate::models::book::BookAuthor,
            crate::models::book::BookForm,
            crate::models::Author,
            crate::models::AuthorDetail,
            crate::models::author::CreateAuthor,
            crate::models::author::UpdateAuthor,
            crate::models::author::AuthorFormValues,
            crate::models::Genre,
            crate::models::Language,
            // Loans
            crate::models::BookInstance,
            crate::models::BorrowedInstance,
            crate::models::LoanStatus,
            crate::forms::RenewBookForm,
            crate::forms::RenewalFormView,
            // Accounts
            crate::forms::RegistrationForm,
            crate::forms::RegistrationFormView,
            crate::forms::RegistrationDone,
            crate::models::user::LoginRequest,
            crate::models::user::UserInfo,
            crate::models::Permission,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "catalog", description = "Catalog summary"),
        (name = "books", description = "Books"),
        (name = "authors", description = "Authors"),
        (name = "loans", description = "Borrowed copies and renewals"),
        (name = "accounts", description = "Registration, activation and login")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
