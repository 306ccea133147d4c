//! User accounts, permissions and the request caller

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::error::AppError;

/// Name of the group granted every catalog permission
pub const LIBRARIANS_GROUP: &str = "Librarians";

/// Named capabilities checked before privileged operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Permission {
    #[serde(rename = "catalog.can_mark_returned")]
    CanMarkReturned,
    #[serde(rename = "catalog.can_edit_author")]
    CanEditAuthor,
    #[serde(rename = "catalog.can_edit_book")]
    CanEditBook,
}

impl Permission {
    pub fn codename(&self) -> &'static str {
        match self {
            Permission::CanMarkReturned => "catalog.can_mark_returned",
            Permission::CanEditAuthor => "catalog.can_edit_author",
            Permission::CanEditBook => "catalog.can_edit_book",
        }
    }

    pub fn all() -> [Permission; 3] {
        [
            Permission::CanMarkReturned,
            Permission::CanEditAuthor,
            Permission::CanEditBook,
        ]
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.codename())
    }
}

impl std::str::FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::all()
            .into_iter()
            .find(|p| p.codename() == s)
            .ok_or_else(|| format!("Unknown permission: {}", s))
    }
}

/// Full user model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
}

/// An authenticated account together with its effective permissions
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: i32,
    pub username: String,
    pub is_superuser: bool,
    pub permissions: HashSet<Permission>,
}

impl Identity {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.is_superuser || self.permissions.contains(&permission)
    }
}

/// Whoever issued the current request, signed in or not
#[derive(Debug, Clone, Default)]
pub struct Caller {
    pub identity: Option<Identity>,
}

impl Caller {
    pub fn anonymous() -> Self {
        Self { identity: None }
    }

    pub fn signed_in(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    /// Require a signed-in account
    pub fn require_login(&self) -> Result<&Identity, AppError> {
        self.identity
            .as_ref()
            .ok_or_else(|| AppError::Authentication("Login required".to_string()))
    }

    /// Require a named permission. Anonymous callers are refused the same way
    /// as signed-in callers lacking the grant.
    pub fn authorize(&self, permission: Permission) -> Result<&Identity, AppError> {
        match &self.identity {
            Some(identity) if identity.has_permission(permission) => Ok(identity),
            _ => Err(AppError::Authorization(format!(
                "Permission {} required",
                permission
            ))),
        }
    }
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Public account information
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserInfo {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub permissions: Vec<Permission>,
}
