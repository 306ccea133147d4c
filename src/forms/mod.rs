//! Input forms: parsing and validation of submitted data

pub mod registration;
pub mod renewal;

pub use registration::{RegistrationDone, RegistrationForm, RegistrationFormView};
pub use renewal::{RenewBookForm, RenewalFormView};
