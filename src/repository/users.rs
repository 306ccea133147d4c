//! Users repository for database operations

use std::collections::HashSet;

use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::{Permission, User},
};

const USER_COLUMNS: &str =
    "id, username, email, password_hash, is_active, is_superuser, date_joined";

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user by username (exact match)
    pub async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Check if username already exists
    pub async fn username_exists(&self, username: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Permissions granted through every group the user belongs to.
    /// Unknown codenames are skipped.
    pub async fn get_permissions(&self, user_id: i32) -> AppResult<HashSet<Permission>> {
        let codenames: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT gp.codename
            FROM user_groups ug
            JOIN group_permissions gp ON gp.group_id = ug.group_id
            WHERE ug.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(codenames
            .iter()
            .filter_map(|c| c.parse::<Permission>().ok())
            .collect())
    }

    // =========================================================================
    // WRITE
    // =========================================================================

    /// Insert an account that cannot log in until activated
    pub async fn create_inactive(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO users (username, email, password_hash, is_active)
            VALUES ($1, $2, $3, FALSE)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .bind(email)
            .bind(password_hash)
            .fetch_one(&mut **tx)
            .await
    }

    /// Add a user to a named group; a missing group is an error
    pub async fn add_to_group(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: i32,
        group: &str,
    ) -> Result<(), sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_groups (user_id, group_id)
            SELECT $1, id FROM groups WHERE name = $2
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(group)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM groups WHERE name = $1)")
                .bind(group)
                .fetch_one(&mut **tx)
                .await?;
            if !exists {
                return Err(sqlx::Error::RowNotFound);
            }
        }
        Ok(())
    }

    /// Mark an account active
    pub async fn set_active(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: i32,
    ) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET is_active = TRUE WHERE id = $1")
            .bind(user_id)
            .execute(&mut **tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", user_id)));
        }
        Ok(())
    }
}
