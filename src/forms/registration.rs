//! Account registration form

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

/// Submitted registration form: username, e-mail and the password twice
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct RegistrationForm {
    #[validate(
        length(min = 1, max = 150, message = "Required. 150 characters or fewer."),
        custom(function = "validate_username")
    )]
    #[serde(default)]
    pub username: String,
    #[validate(email(message = "Enter a valid email address."))]
    #[serde(default)]
    pub email: String,
    #[validate(length(min = 8, message = "This password is too short. It must contain at least 8 characters."))]
    #[serde(default)]
    pub password1: String,
    #[validate(must_match(other = "password1", message = "The two password fields didn't match."))]
    #[serde(default)]
    pub password2: String,
}

/// Letters, digits and `@ . + - _` only
fn validate_username(username: &str) -> Result<(), ValidationError> {
    let ok = username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));
    if ok {
        Ok(())
    } else {
        Err(ValidationError::new("username_chars").with_message(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                .into(),
        ))
    }
}

impl RegistrationForm {
    /// Field checks, with the username and e-mail trimmed first
    pub fn clean(&mut self) -> Result<(), ValidationErrors> {
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_string();
        self.validate()
    }

    /// Mark the username as taken
    pub fn username_taken() -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.add(
            "username",
            ValidationError::new("unique").with_message("A user with that username already exists.".into()),
        );
        errors
    }
}

/// Whether an address belongs to the trusted librarian domain.
///
/// The whole `@domain` suffix must match, case-insensitively; an empty domain
/// never matches.
pub fn is_librarian_email(email: &str, domain: &str) -> bool {
    let domain = domain.trim().trim_start_matches('@');
    if domain.is_empty() {
        return false;
    }
    email
        .to_lowercase()
        .ends_with(&format!("@{}", domain.to_lowercase()))
}

/// Empty form description returned on GET
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RegistrationFormView {
    pub username: String,
    pub email: String,
    pub errors: BTreeMap<String, Vec<String>>,
}

impl RegistrationFormView {
    pub fn empty() -> Self {
        Self {
            username: String::new(),
            email: String::new(),
            errors: BTreeMap::new(),
        }
    }

    /// Re-shown form: submitted username and e-mail kept, passwords never echoed
    pub fn rejected(form: &RegistrationForm, errors: &ValidationErrors) -> Self {
        Self {
            username: form.username.clone(),
            email: form.email.clone(),
            errors: crate::error::field_messages(errors),
        }
    }
}

/// Confirmation returned once the inactive account exists
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RegistrationDone {
    pub username: String,
    pub activation_id: Uuid,
    pub activation_code: String,
    /// Path to visit to activate the account
    pub activation_url: String,
}
