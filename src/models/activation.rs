//! Account activation records

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One-time activation issued at registration
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserActivation {
    pub id: Uuid,
    pub user_id: i32,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
}

impl UserActivation {
    /// Unconsumed and younger than `ttl_hours`
    pub fn is_usable(&self, now: DateTime<Utc>, ttl_hours: i64) -> bool {
        self.consumed_at.is_none() && now < self.created_at + Duration::hours(ttl_hours)
    }
}

/// Random 32-character hex activation code
pub fn generate_code() -> String {
    use rand::Rng;
    let bytes: [u8; 16] = rand::thread_rng().gen();
    hex::encode(bytes)
}
