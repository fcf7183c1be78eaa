//! Live recommendation sessions.
//!
//! Each session owns one cursor. Sessions idle for longer than the configured
//! TTL are dropped by a background sweep and are treated as missing even before
//! the sweep reaches them. When the store is full, opening a new session evicts
//! the least recently used one.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    services::cursor::RecommendationCursor,
};

struct Session {
    cursor: RecommendationCursor,
    last_used: Instant,
}

impl Session {
    fn is_expired(&self, now: Instant, idle_ttl: Duration) -> bool {
        now.saturating_duration_since(self.last_used) > idle_ttl
    }
}

/// Bounded, expiring map from session id to cursor
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
    idle_ttl: Duration,
    capacity: usize,
}

impl SessionStore {
    pub fn new(idle_ttl: Duration, capacity: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_ttl,
            capacity: capacity.max(1),
        }
    }

    /// Stores `cursor` under `id`, returning true when it replaced a live session
    pub async fn insert(&self, id: Uuid, cursor: RecommendationCursor) -> bool {
        self.insert_at(id, cursor, Instant::now()).await
    }

    async fn insert_at(&self, id: Uuid, cursor: RecommendationCursor, now: Instant) -> bool {
        let mut sessions = self.sessions.write().await;

        if !sessions.contains_key(&id) && sessions.len() >= self.capacity {
            let idle_ttl = self.idle_ttl;
            sessions.retain(|_, session| !session.is_expired(now, idle_ttl));

            if sessions.len() >= self.capacity {
                let oldest = sessions
                    .iter()
                    .min_by_key(|(_, session)| session.last_used)
                    .map(|(&oldest, _)| oldest);
                if let Some(oldest) = oldest {
                    sessions.remove(&oldest);
                    tracing::info!(session_id = %oldest, "Evicted least recently used session");
                }
            }
        }

        let previous = sessions.insert(
            id,
            Session {
                cursor,
                last_used: now,
            },
        );
        previous.is_some_and(|session| !session.is_expired(now, self.idle_ttl))
    }

    /// Runs `f` against the session's cursor and marks the session as used
    pub async fn with_cursor<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut RecommendationCursor) -> AppResult<T>,
    ) -> AppResult<T> {
        self.with_cursor_at(id, Instant::now(), f).await
    }

    async fn with_cursor_at<T>(
        &self,
        id: Uuid,
        now: Instant,
        f: impl FnOnce(&mut RecommendationCursor) -> AppResult<T>,
    ) -> AppResult<T> {
        let mut sessions = self.sessions.write().await;

        let expired = match sessions.get(&id) {
            Some(session) => session.is_expired(now, self.idle_ttl),
            None => return Err(AppError::SessionNotFound(id)),
        };
        if expired {
            sessions.remove(&id);
            return Err(AppError::SessionNotFound(id));
        }

        let session = sessions
            .get_mut(&id)
            .ok_or(AppError::SessionNotFound(id))?;
        session.last_used = now;
        f(&mut session.cursor)
    }

    /// Drops a session, returning false when it did not exist or had expired
    pub async fn remove(&self, id: Uuid) -> bool {
        let now = Instant::now();
        self.sessions
            .write()
            .await
            .remove(&id)
            .is_some_and(|session| !session.is_expired(now, self.idle_ttl))
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Removes every expired session, returning how many were dropped
    pub async fn sweep(&self) -> usize {
        self.sweep_at(Instant::now()).await
    }

    async fn sweep_at(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        let idle_ttl = self.idle_ttl;
        sessions.retain(|_, session| !session.is_expired(now, idle_ttl));
        before - sessions.len()
    }

    /// Spawns the periodic sweep; it runs until the runtime shuts down
    pub fn spawn_sweeper(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let dropped = self.sweep().await;
                if dropped > 0 {
                    tracing::info!(dropped, "Swept idle sessions");
                }
            }
        })
    }
}
