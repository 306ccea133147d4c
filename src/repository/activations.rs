//! Activation records repository

use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::{error::AppResult, models::UserActivation};

/// Activation rows are only touched inside registration and activation
/// transactions, so every query takes the caller's transaction.
#[derive(Clone, Default)]
pub struct ActivationsRepository;

impl ActivationsRepository {
    pub fn new() -> Self {
        Self
    }

    /// Issue the activation for a freshly registered user
    pub async fn create(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: i32,
        code: &str,
    ) -> Result<UserActivation, sqlx::Error> {
        sqlx::query_as::<_, UserActivation>(
            r#"
            INSERT INTO user_activations (id, user_id, code)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, code, created_at, consumed_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(code)
        .fetch_one(&mut **tx)
        .await
    }

    /// Lock an activation row for the duration of the transaction
    pub async fn get_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> AppResult<Option<UserActivation>> {
        let activation = sqlx::query_as::<_, UserActivation>(
            r#"
            SELECT id, user_id, code, created_at, consumed_at
            FROM user_activations
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(activation)
    }

    pub async fn mark_consumed(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> AppResult<()> {
        sqlx::query("UPDATE user_activations SET consumed_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}
