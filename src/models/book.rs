//! Book model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use super::{
    book_instance::BookInstance,
    genre::{Genre, Language},
};

/// Full book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author_id: Option<i32>,
    pub summary: String,
    pub isbn: String,
    pub language_id: Option<i32>,
}

/// Short book representation for lists
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookShort {
    pub id: i32,
    pub title: String,
    pub author_id: Option<i32>,
    /// "Last, First" of the author, if any
    pub author_name: Option<String>,
}

/// Author reference embedded in a book detail
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookAuthor {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
}

/// Book with author, language, genres and copies
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetail {
    pub id: i32,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author: Option<BookAuthor>,
    pub language: Option<Language>,
    pub genres: Vec<Genre>,
    /// First three genre names, comma separated
    pub genre_display: String,
    pub instances: Vec<BookInstance>,
}

/// Comma-separated names of the first three genres
pub fn display_genre(genres: &[Genre]) -> String {
    genres
        .iter()
        .take(3)
        .map(|g| g.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Create or update book request; books are always written as a whole
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct BookForm {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    pub author_id: Option<i32>,
    #[validate(length(max = 1000, message = "Summary must be at most 1000 characters"))]
    #[serde(default)]
    pub summary: String,
    /// 13 character ISBN
    #[validate(length(equal = 13, message = "ISBN must be exactly 13 characters"))]
    pub isbn: String,
    pub language_id: Option<i32>,
    #[validate(length(min = 1, message = "Select at least one genre"))]
    #[serde(default)]
    pub genre_ids: Vec<i32>,
}

impl BookForm {
    /// Field checks, with title and ISBN trimmed first
    pub fn clean(&mut self) -> Result<(), ValidationErrors> {
        self.title = self.title.trim().to_string();
        self.isbn = self.isbn.trim().to_string();
        self.validate()
    }

    /// Current values of a stored book, as shown on the update form
    pub fn from_book(book: &Book, genre_ids: Vec<i32>) -> Self {
        Self {
            title: book.title.clone(),
            author_id: book.author_id,
            summary: book.summary.clone(),
            isbn: book.isbn.clone(),
            language_id: book.language_id,
            genre_ids,
        }
    }

    /// Genre ids without duplicates, in submission order
    pub fn distinct_genre_ids(&self) -> Vec<i32> {
        let mut seen = Vec::with_capacity(self.genre_ids.len());
        for id in &self.genre_ids {
            if !seen.contains(id) {
                seen.push(*id);
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genre(id: i32, name: &str) -> Genre {
        Genre { id, name: name.into() }
    }

    fn valid_form() -> BookForm {
        BookForm {
            title: "The Shining".into(),
            author_id: Some(1),
            summary: "A family heads to an isolated hotel for the winter.".into(),
            isbn: "9780307743657".into(),
            language_id: Some(1),
            genre_ids: vec![2],
        }
    }

    #[test]
    fn genre_display_keeps_first_three() {
        let genres = vec![
            genre(1, "Fantasy"),
            genre(2, "Horror"),
            genre(3, "Science Fiction"),
            genre(4, "Western"),
        ];
        assert_eq!(display_genre(&genres), "Fantasy, Horror, Science Fiction");
        assert_eq!(display_genre(&[]), "");
    }

    #[test]
    fn valid_form_passes() {
        assert!(valid_form().validate().is_ok());
    }

    #[test]
    fn empty_title_and_short_isbn_are_field_errors() {
        let form = BookForm {
            title: String::new(),
            isbn: "12345".into(),
            ..valid_form()
        };
        let errors = form.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("isbn"));
    }

    #[test]
    fn blank_title_is_rejected_after_trimming() {
        let mut form = BookForm {
            title: "   ".into(),
            ..valid_form()
        };
        assert!(form.clean().unwrap_err().field_errors().contains_key("title"));
        assert_eq!(form.title, "");
    }

    #[test]
    fn clean_trims_title_and_isbn() {
        let mut form = BookForm {
            title: "  The Shining ".into(),
            isbn: " 9780307743657\n".into(),
            ..valid_form()
        };
        assert!(form.clean().is_ok());
        assert_eq!(form.title, "The Shining");
        assert_eq!(form.isbn, "9780307743657");
    }

    #[test]
    fn at_least_one_genre_is_required() {
        let form = BookForm {
            genre_ids: vec![],
            ..valid_form()
        };
        assert!(form.validate().unwrap_err().field_errors().contains_key("genre_ids"));
    }

    #[test]
    fn duplicate_genres_collapse() {
        let form = BookForm {
            genre_ids: vec![3, 1, 3, 1, 2],
            ..valid_form()
        };
        assert_eq!(form.distinct_genre_ids(), vec![3, 1, 2]);
    }
}
