//! Registration, activation and authentication service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    config::RegistrationConfig,
    error::{is_unique_violation, AppError, AppResult},
    forms::{
        registration::is_librarian_email, RegistrationDone, RegistrationForm, RegistrationFormView,
    },
    models::{activation::generate_code, user::LIBRARIANS_GROUP, Identity, User},
    repository::Repository,
};

/// Result of submitting the registration form
#[derive(Debug)]
pub enum RegistrationOutcome {
    Registered(RegistrationDone),
    Rejected(RegistrationFormView),
}

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: RegistrationConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: RegistrationConfig) -> Self {
        Self { repository, config }
    }

    /// Create an inactive account and its activation.
    ///
    /// Form errors come back as `Rejected`. Once the form is valid, any
    /// failure to persist is reported as a generic registration failure.
    pub async fn register(&self, mut form: RegistrationForm) -> AppResult<RegistrationOutcome> {
        if let Err(errors) = form.clean() {
            return Ok(RegistrationOutcome::Rejected(RegistrationFormView::rejected(
                &form, &errors,
            )));
        }
        if self.repository.users.username_exists(&form.username).await? {
            let errors = RegistrationForm::username_taken();
            return Ok(RegistrationOutcome::Rejected(RegistrationFormView::rejected(
                &form, &errors,
            )));
        }

        let password_hash = hash_password(&form.password1)?;
        let librarian = is_librarian_email(&form.email, &self.config.librarian_email_domain);

        let persisted = self
            .persist_registration(&form, &password_hash, librarian)
            .await;
        let (user, activation_id, code) = match persisted {
            Ok(done) => done,
            Err(e) => {
                if is_unique_violation(&e) {
                    tracing::warn!("Registration of {:?} lost a race: {}", form.username, e);
                } else {
                    tracing::error!("Registration of {:?} failed: {}", form.username, e);
                }
                return Err(AppError::RegistrationFailed);
            }
        };

        tracing::info!(
            "Registered user id={} username={:?} librarian={}",
            user.id,
            user.username,
            librarian
        );

        Ok(RegistrationOutcome::Registered(RegistrationDone {
            username: user.username,
            activation_id,
            activation_code: code,
            activation_url: format!("/catalog/activate/{}", activation_id),
        }))
    }

    async fn persist_registration(
        &self,
        form: &RegistrationForm,
        password_hash: &str,
        librarian: bool,
    ) -> Result<(User, Uuid, String), sqlx::Error> {
        let mut tx = self.repository.pool.begin().await?;

        let user = self
            .repository
            .users
            .create_inactive(&mut tx, &form.username, &form.email, password_hash)
            .await?;

        if librarian {
            self.repository
                .users
                .add_to_group(&mut tx, user.id, LIBRARIANS_GROUP)
                .await?;
        }

        let code = generate_code();
        let activation = self
            .repository
            .activations
            .create(&mut tx, user.id, &code)
            .await?;

        tx.commit().await?;
        Ok((user, activation.id, code))
    }

    /// Consume an activation and enable its account.
    ///
    /// Unknown, consumed and expired activations are all reported as not
    /// found and change nothing.
    pub async fn activate(&self, id: Uuid) -> AppResult<User> {
        let mut tx = self.repository.pool.begin().await?;

        let activation = self
            .repository
            .activations
            .get_for_update(&mut tx, id)
            .await?
            .filter(|a| a.is_usable(Utc::now(), self.config.activation_ttl_hours))
            .ok_or_else(|| AppError::NotFound("Activation not found".to_string()))?;

        self.repository
            .users
            .set_active(&mut tx, activation.user_id)
            .await?;
        self.repository
            .activations
            .mark_consumed(&mut tx, activation.id)
            .await?;
        tx.commit().await?;

        let user = self.repository.users.get_by_id(activation.user_id).await?;
        tracing::info!("Activated user id={} username={:?}", user.id, user.username);
        Ok(user)
    }

    /// Check a username and password against an active account
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<User> {
        let user = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !verify_password(&user, password)? || !user.is_active {
            return Err(AppError::Authentication(
                "Invalid username or password".to_string(),
            ));
        }
        Ok(user)
    }

    /// Identity of a signed-in user; `None` once the account is gone or inactive
    pub async fn identity(&self, user_id: i32) -> AppResult<Option<Identity>> {
        let user = match self.repository.users.get_by_id(user_id).await {
            Ok(user) => user,
            Err(AppError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        if !user.is_active {
            return Ok(None);
        }

        let permissions = self.repository.users.get_permissions(user.id).await?;
        Ok(Some(Identity {
            user_id: user.id,
            username: user.username,
            is_superuser: user.is_superuser,
            permissions,
        }))
    }
}

fn verify_password(user: &User, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}
