//! Server-side sessions keyed by a random cookie value

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::{Duration, Instant},
};

use async_trait::async_trait;
use rand::Rng;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};

/// Session key holding the signed-in user id
pub const AUTH_USER_KEY: &str = "_auth_user_id";

/// Session key holding the catalog visit counter
pub const VISITS_KEY: &str = "num_visits";

/// Key/value data stored for one session
pub type SessionData = HashMap<String, Value>;

/// Backing storage for session data
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &str) -> AppResult<Option<SessionData>>;

    async fn save(&self, id: &str, data: &SessionData) -> AppResult<()>;

    async fn delete(&self, id: &str) -> AppResult<()>;
}

/// Random 64-character hex session id
pub fn generate_session_id() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}

/// Accept only ids we could have issued
pub fn is_valid_session_id(id: &str) -> bool {
    id.len() == 64 && id.chars().all(|c| c.is_ascii_hexdigit())
}

struct SessionInner {
    id: Mutex<String>,
    written: AtomicBool,
    store: Arc<dyn SessionStore>,
}

/// Handle on the current request's session.
///
/// Every read goes to the store and every write is a load-modify-save, so two
/// concurrent requests in one session can overwrite each other's changes.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    pub fn new(id: String, store: Arc<dyn SessionStore>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                id: Mutex::new(id),
                written: AtomicBool::new(false),
                store,
            }),
        }
    }

    pub fn id(&self) -> String {
        self.inner
            .id
            .lock()
            .map(|id| id.clone())
            .unwrap_or_default()
    }

    /// True once something was saved during this request
    pub fn is_written(&self) -> bool {
        self.inner.written.load(Ordering::Relaxed)
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        let data = self.inner.store.load(&self.id()).await?.unwrap_or_default();
        match data.get(key) {
            Some(value) => Ok(serde_json::from_value(value.clone()).ok()),
            None => Ok(None),
        }
    }

    pub async fn insert<T: Serialize>(&self, key: &str, value: T) -> AppResult<()> {
        let value = serde_json::to_value(value)
            .map_err(|e| AppError::Internal(format!("Failed to encode session value: {}", e)))?;
        let id = self.id();
        let mut data = self.inner.store.load(&id).await?.unwrap_or_default();
        data.insert(key.to_string(), value);
        self.inner.store.save(&id, &data).await?;
        self.inner.written.store(true, Ordering::Relaxed);
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> AppResult<()> {
        let id = self.id();
        if let Some(mut data) = self.inner.store.load(&id).await? {
            if data.remove(key).is_some() {
                self.inner.store.save(&id, &data).await?;
                self.inner.written.store(true, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Move the data to a fresh id, dropping the old one
    pub async fn cycle_id(&self) -> AppResult<()> {
        let old = self.id();
        let data = self.inner.store.load(&old).await?.unwrap_or_default();
        let new = generate_session_id();
        self.inner.store.save(&new, &data).await?;
        self.inner.store.delete(&old).await?;
        if let Ok(mut id) = self.inner.id.lock() {
            *id = new;
        }
        self.inner.written.store(true, Ordering::Relaxed);
        Ok(())
    }

    /// Drop every key and start over with a new id
    pub async fn flush(&self) -> AppResult<()> {
        self.inner.store.delete(&self.id()).await?;
        if let Ok(mut id) = self.inner.id.lock() {
            *id = generate_session_id();
        }
        self.inner.written.store(true, Ordering::Relaxed);
        Ok(())
    }
}

/// Count a visit: report the stored counter (1 when unset) and store it plus one
pub async fn record_visit(session: &Session) -> AppResult<i64> {
    let visits = session.get::<i64>(VISITS_KEY).await?.unwrap_or(1);
    session.insert(VISITS_KEY, visits + 1).await?;
    Ok(visits)
}

/// Process-local session store for development and tests
pub struct MemorySessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<String, (SessionData, Instant)>>,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &str) -> AppResult<Option<SessionData>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(id)
            .filter(|(_, expires)| *expires > Instant::now())
            .map(|(data, _)| data.clone()))
    }

    async fn save(&self, id: &str, data: &SessionData) -> AppResult<()> {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();
        sessions.retain(|_, (_, expires)| *expires > now);
        sessions.insert(id.to_string(), (data.clone(), now + self.ttl));
        Ok(())
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        self.sessions.write().await.remove(id);
        Ok(())
    }
}
