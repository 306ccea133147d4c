//! Loan listing and renewal service

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    error::AppResult,
    forms::{RenewBookForm, RenewalFormView},
    models::{book_instance::is_overdue, BorrowedInstance, Page},
    repository::Repository,
};

/// Result of submitting the renewal form
#[derive(Debug)]
pub enum RenewalOutcome {
    Renewed,
    Rejected(RenewalFormView),
}

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Copies on loan, all of them or those held by one borrower
    pub async fn on_loan(
        &self,
        borrower_id: Option<i32>,
        page: Option<i64>,
        today: NaiveDate,
    ) -> AppResult<(Vec<BorrowedInstance>, Page)> {
        let total = self.repository.instances.count_on_loan(borrower_id).await?;
        let page = Page::resolve(page, total)?;
        let mut instances = self
            .repository
            .instances
            .list_on_loan(borrower_id, &page)
            .await?;
        for instance in &mut instances {
            instance.is_overdue = is_overdue(instance.due_back, today);
        }
        Ok((instances, page))
    }

    /// Renewal form pre-filled with the proposed date
    pub async fn renewal_form(&self, id: Uuid, today: NaiveDate) -> AppResult<RenewalFormView> {
        let instance = self.repository.instances.get_by_id(id).await?;
        Ok(RenewalFormView::initial(instance, today))
    }

    /// Validate the submitted date and store it as the new due-back date
    pub async fn renew(
        &self,
        id: Uuid,
        form: RenewBookForm,
        today: NaiveDate,
    ) -> AppResult<RenewalOutcome> {
        let instance = self.repository.instances.get_by_id(id).await?;

        match form.clean(today) {
            Ok(due_back) => {
                self.repository.instances.set_due_back(id, due_back).await?;
                tracing::info!(
                    "Renewed book instance {} ({}) until {}",
                    id,
                    instance.book_title,
                    due_back
                );
                Ok(RenewalOutcome::Renewed)
            }
            Err(errors) => Ok(RenewalOutcome::Rejected(RenewalFormView::rejected(
                instance,
                form.renewal_date,
                &errors,
            ))),
        }
    }
}
