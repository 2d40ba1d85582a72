//! In-memory screening sessions with TTL eviction

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::ItemType;

/// Everything the wizard accumulates for one uploaded image
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: String,
    pub customer_image_url: String,
    pub content_type: String,
    pub similar_image_urls: Vec<String>,
    pub item_type: ItemType,
    pub analysis: Option<String>,
    pub enhanced_analysis: Option<String>,
    pub offer_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Start a session for a freshly stored image
    pub fn new(id: impl Into<String>, customer_image_url: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            customer_image_url: customer_image_url.into(),
            content_type: content_type.into(),
            similar_image_urls: Vec::new(),
            item_type: ItemType::Art,
            analysis: None,
            enhanced_analysis: None,
            offer_text: None,
            created_at: Utc::now(),
        }
    }

    /// Generate a fresh session id
    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => now - self.created_at >= ttl,
            Err(_) => false,
        }
    }
}

/// Shared session map; entries older than the TTL are invisible and swept
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn insert(&self, session: Session) {
        self.inner.write().await.insert(session.id.clone(), session);
    }

    /// Snapshot of a live session
    pub async fn get(&self, id: &str) -> Option<Session> {
        let now = Utc::now();
        self.inner
            .read()
            .await
            .get(id)
            .filter(|session| !session.is_expired(now, self.ttl))
            .cloned()
    }

    /// Apply `f` to a live session; returns false when it does not exist
    pub async fn update<F>(&self, id: &str, f: F) -> bool
    where
        F: FnOnce(&mut Session),
    {
        let now = Utc::now();
        let mut sessions = self.inner.write().await;
        match sessions.get_mut(id) {
            Some(session) if !session.is_expired(now, self.ttl) => {
                f(session);
                true
            }
            _ => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Drop sessions expired as of `now`; returns the removed ids
    pub async fn purge_expired_at(&self, now: DateTime<Utc>) -> Vec<String> {
        let mut sessions = self.inner.write().await;
        let expired: Vec<String> = sessions
            .values()
            .filter(|session| session.is_expired(now, self.ttl))
            .map(|session| session.id.clone())
            .collect();
        for id in &expired {
            sessions.remove(id);
        }
        expired
    }

    pub async fn purge_expired(&self) -> Vec<String> {
        self.purge_expired_at(Utc::now()).await
    }
}
