//! Loan renewal form

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{ValidationError, ValidationErrors};

use crate::models::book_instance::BorrowedInstance;

/// Furthest a librarian may push a due date, in days from today
pub const MAX_RENEWAL_DAYS: i64 = 28;

/// Date proposed when the form is first shown, in days from today
pub const PROPOSED_RENEWAL_DAYS: i64 = 21;

pub const HELP_TEXT: &str = "Enter a date between now and 4 weeks (default 3).";

/// Accepted input formats for a submitted date
const DATE_INPUT_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y"];

/// Accept `value` iff `today <= value <= today + 4 weeks`.
pub fn validate_renewal_date(value: NaiveDate, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    if value < today {
        return Err(ValidationError::new("renewal_in_past")
            .with_message("Invalid date - renewal in past".into()));
    }
    if value > today + Duration::days(MAX_RENEWAL_DAYS) {
        return Err(ValidationError::new("renewal_too_far")
            .with_message("Invalid date - renewal more than 4 weeks ahead".into()));
    }
    Ok(value)
}

fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    DATE_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
}

/// Submitted renewal form
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RenewBookForm {
    /// New due-back date, `YYYY-MM-DD`
    #[serde(default)]
    pub renewal_date: String,
}

impl RenewBookForm {
    /// Parse and range-check the submitted date
    pub fn clean(&self, today: NaiveDate) -> Result<NaiveDate, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.renewal_date.trim().is_empty() {
            errors.add(
                "renewal_date",
                ValidationError::new("required").with_message("This field is required.".into()),
            );
            return Err(errors);
        }

        let Some(date) = parse_date(&self.renewal_date) else {
            errors.add(
                "renewal_date",
                ValidationError::new("invalid").with_message("Enter a valid date.".into()),
            );
            return Err(errors);
        };

        validate_renewal_date(date, today).map_err(|e| {
            errors.add("renewal_date", e);
            errors
        })
    }
}

/// Renewal form as shown to the librarian
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RenewalFormView {
    pub book_instance: BorrowedInstance,
    /// Proposed or previously submitted value
    pub renewal_date: String,
    pub help_text: String,
    pub errors: BTreeMap<String, Vec<String>>,
}

impl RenewalFormView {
    /// Unbound form pre-filled with today + 3 weeks
    pub fn initial(book_instance: BorrowedInstance, today: NaiveDate) -> Self {
        let proposed = today + Duration::days(PROPOSED_RENEWAL_DAYS);
        Self {
            book_instance,
            renewal_date: proposed.format("%Y-%m-%d").to_string(),
            help_text: HELP_TEXT.to_string(),
            errors: BTreeMap::new(),
        }
    }

    /// Bound form carrying the submitted value and its errors
    pub fn rejected(book_instance: BorrowedInstance, submitted: String, errors: &ValidationErrors) -> Self {
        Self {
            book_instance,
            renewal_date: submitted,
            help_text: HELP_TEXT.to_string(),
            errors: crate::error::field_messages(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::book_instance::LoanStatus;
    use uuid::Uuid;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 15).unwrap()
    }

    fn form(value: &str) -> RenewBookForm {
        RenewBookForm {
            renewal_date: value.to_string(),
        }
    }

    fn instance() -> BorrowedInstance {
        BorrowedInstance {
            id: Uuid::new_v4(),
            book_id: 1,
            book_title: "Dune".into(),
            imprint: "Chilton, 1965".into(),
            due_back: Some(today()),
            status: LoanStatus::OnLoan,
            borrower_id: Some(2),
            borrower_username: Some("patron".into()),
            is_overdue: false,
        }
    }

    #[test]
    fn accepts_exactly_the_four_week_window() {
        let today = today();
        for offset in -3..=31 {
            let date = today + Duration::days(offset);
            let accepted = validate_renewal_date(date, today).is_ok();
            assert_eq!(accepted, (0..=28).contains(&offset), "offset {}", offset);
        }
    }

    #[test]
    fn accepted_date_passes_through_unchanged() {
        let date = today() + Duration::days(10);
        assert_eq!(validate_renewal_date(date, today()), Ok(date));
    }

    #[test]
    fn past_and_far_dates_have_distinct_messages() {
        let past = form("2024-02-14").clean(today()).unwrap_err();
        let far = form("2024-03-15").clean(today()).unwrap_err();
        let past_msg = crate::error::field_messages(&past);
        let far_msg = crate::error::field_messages(&far);
        assert_eq!(past_msg["renewal_date"], vec!["Invalid date - renewal in past"]);
        assert_eq!(far_msg["renewal_date"], vec!["Invalid date - renewal more than 4 weeks ahead"]);
    }

    #[test]
    fn alternate_input_formats_are_understood() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(form("03/01/2024").clean(today()), Ok(expected));
        assert_eq!(form(" 2024-03-01 ").clean(today()), Ok(expected));
    }

    #[test]
    fn garbage_and_blank_are_field_errors() {
        let garbage = crate::error::field_messages(&form("next tuesday").clean(today()).unwrap_err());
        let blank = crate::error::field_messages(&form("").clean(today()).unwrap_err());
        assert_eq!(garbage["renewal_date"], vec!["Enter a valid date."]);
        assert_eq!(blank["renewal_date"], vec!["This field is required."]);
    }

    #[test]
    fn initial_form_proposes_three_weeks() {
        let view = RenewalFormView::initial(instance(), today());
        assert_eq!(view.renewal_date, "2024-03-07");
        assert!(view.errors.is_empty());
    }

    #[test]
    fn rejected_form_preserves_submitted_value() {
        let submitted = "2030-01-01".to_string();
        let errors = form(&submitted).clean(today()).unwrap_err();
        let view = RenewalFormView::rejected(instance(), submitted.clone(), &errors);
        assert_eq!(view.renewal_date, submitted);
        assert!(view.errors.contains_key("renewal_date"));
    }
}
