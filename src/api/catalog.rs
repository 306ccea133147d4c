//! Catalog home page

use axum::{extract::State, response::Redirect, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    services::{
        catalog::TITLE_WORD,
        session::{record_visit, Session},
    },
};

/// Catalog summary with the caller's visit count
#[derive(Serialize, ToSchema)]
pub struct CatalogSummary {
    pub num_books: i64,
    pub num_instances: i64,
    /// Copies with status Available
    pub num_instances_available: i64,
    pub num_authors: i64,
    pub num_genres: i64,
    /// Word searched for in book titles
    pub title_word: String,
    /// Books whose title contains `title_word`, ignoring case
    pub num_books_with_title_word: i64,
    /// Visits in this session, this one included
    pub num_visits: i64,
}

/// Send the site root to the catalog
pub async fn root_redirect() -> Redirect {
    Redirect::to("/catalog/")
}

/// Catalog summary
#[utoipa::path(
    get,
    path = "/catalog/",
    tag = "catalog",
    responses(
        (status = 200, description = "Record counts and session visit count", body = CatalogSummary)
    )
)]
pub async fn index(
    State(state): State<crate::AppState>,
    session: Session,
) -> AppResult<Json<CatalogSummary>> {
    let counts = state.services.catalog.counts().await?;
    let num_visits = record_visit(&session).await?;

    Ok(Json(CatalogSummary {
        num_books: counts.books,
        num_instances: counts.instances,
        num_instances_available: counts.instances_available,
        num_authors: counts.authors,
        num_genres: counts.genres,
        title_word: TITLE_WORD.to_string(),
        num_books_with_title_word: counts.books_with_title_word,
        num_visits,
    }))
}
