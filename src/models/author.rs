//! Author model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use super::book::BookShort;

/// Full author model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl Author {
    /// "Last, First", the form used in listings
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}

/// Author with the books attributed to them
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorDetail {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
    pub books: Vec<BookShort>,
}

impl AuthorDetail {
    pub fn new(author: Author, books: Vec<BookShort>) -> Self {
        Self {
            id: author.id,
            first_name: author.first_name,
            last_name: author.last_name,
            date_of_birth: author.date_of_birth,
            date_of_death: author.date_of_death,
            books,
        }
    }
}

/// Create author request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateAuthor {
    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl CreateAuthor {
    /// Field checks on the trimmed names plus the birth/death ordering rule
    pub fn clean(&mut self) -> Result<(), ValidationErrors> {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        if let Err(e) = check_lifespan(self.date_of_birth, self.date_of_death) {
            errors.add("date_of_death", e);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Update author request.
///
/// Only names and dates are editable. A date sent as `null` is cleared, an
/// omitted field is left untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAuthor {
    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, format = Date)]
    pub date_of_birth: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, format = Date)]
    pub date_of_death: Option<Option<NaiveDate>>,
}

impl UpdateAuthor {
    /// Apply the changes on top of the stored author and validate the result
    pub fn merge(mut self, current: &Author) -> Result<Author, ValidationErrors> {
        for name in [&mut self.first_name, &mut self.last_name].into_iter().flatten() {
            *name = name.trim().to_string();
        }
        self.validate()?;

        let merged = Author {
            id: current.id,
            first_name: self.first_name.unwrap_or_else(|| current.first_name.clone()),
            last_name: self.last_name.unwrap_or_else(|| current.last_name.clone()),
            date_of_birth: self.date_of_birth.unwrap_or(current.date_of_birth),
            date_of_death: self.date_of_death.unwrap_or(current.date_of_death),
        };

        if let Err(e) = check_lifespan(merged.date_of_birth, merged.date_of_death) {
            let mut errors = ValidationErrors::new();
            errors.add("date_of_death", e);
            return Err(errors);
        }
        Ok(merged)
    }
}

/// Editable author fields as shown on the update form
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorFormValues {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl From<Author> for AuthorFormValues {
    fn from(a: Author) -> Self {
        Self {
            first_name: a.first_name,
            last_name: a.last_name,
            date_of_birth: a.date_of_birth,
            date_of_death: a.date_of_death,
        }
    }
}

fn check_lifespan(birth: Option<NaiveDate>, death: Option<NaiveDate>) -> Result<(), ValidationError> {
    match (birth, death) {
        (Some(b), Some(d)) if d < b => Err(ValidationError::new("lifespan")
            .with_message("Date of death cannot precede date of birth".into())),
        _ => Ok(()),
    }
}

fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}
