//! Server-side session registry.
//!
//! A session is a `jti -> user_id` pair with a time-to-live. A token is only
//! honoured while its `jti` resolves here, so deleting the key revokes the
//! token immediately even though its signature stays valid until expiry.
//!
//! Two backends are provided: [`RedisSessionStore`] for deployments and
//! [`MemorySessionStore`], an in-process map with the same semantics for a
//! single node and for tests. Neither caches lookups; every call reaches the
//! backend.

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use redis::aio::ConnectionManager;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session not found")]
    NotFound,
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Records `session_id -> user_id`, replacing any previous value, expiring after `ttl`.
    async fn put(&self, session_id: &str, user_id: i64, ttl: Duration) -> Result<(), SessionError>;

    /// Resolves a live session to its user id.
    async fn get(&self, session_id: &str) -> Result<i64, SessionError>;

    /// Removes a session and returns how many keys were deleted. Zero means
    /// the session had already expired or been removed.
    async fn delete(&self, session_id: &str) -> Result<u64, SessionError>;
}

const KEY_PREFIX: &str = "session:";

/// Redis-backed sessions. Keys are `session:<id>`; values are user ids
/// stored as integers with a millisecond expiry.
#[derive(Clone)]
pub struct RedisSessionStore {
    connection: ConnectionManager,
    op_timeout: Duration,
}

impl RedisSessionStore {
    /// Connects and verifies the server answers `PING`.
    pub async fn connect(url: &str, op_timeout: Duration) -> Result<Self, SessionError> {
        let client =
            redis::Client::open(url).map_err(|e| SessionError::Unavailable(e.to_string()))?;
        let connect = async {
            ConnectionManager::new(client)
                .await
                .map_err(|e| SessionError::Unavailable(e.to_string()))
        };
        let connection = with_deadline(op_timeout, connect).await?;

        let store = Self {
            connection,
            op_timeout,
        };
        let mut conn = store.connection.clone();
        with_deadline(op_timeout, async move {
            redis::cmd("PING")
                .query_async::<_, String>(&mut conn)
                .await
                .map_err(unavailable)
        })
        .await?;

        Ok(store)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(&self, session_id: &str, user_id: i64, ttl: Duration) -> Result<(), SessionError> {
        let mut conn = self.connection.clone();
        let ttl_ms = u64::try_from(ttl.as_millis().max(1))
            .map_err(|_| SessionError::Unavailable(format!("ttl {:?} is out of range", ttl)))?;
        let key = session_key(session_id);
        with_deadline(self.op_timeout, async move {
            redis::cmd("SET")
                .arg(&key)
                .arg(user_id)
                .arg("PX")
                .arg(ttl_ms)
                .query_async::<_, ()>(&mut conn)
                .await
                .map_err(unavailable)
        })
        .await
    }

    async fn get(&self, session_id: &str) -> Result<i64, SessionError> {
        let mut conn = self.connection.clone();
        let key = session_key(session_id);
        let value = with_deadline(self.op_timeout, async move {
            redis::cmd("GET")
                .arg(&key)
                .query_async::<_, Option<i64>>(&mut conn)
                .await
                .map_err(unavailable)
        })
        .await?;
        value.ok_or(SessionError::NotFound)
    }

    async fn delete(&self, session_id: &str) -> Result<u64, SessionError> {
        let mut conn = self.connection.clone();
        let key = session_key(session_id);
        with_deadline(self.op_timeout, async move {
            redis::cmd("DEL")
                .arg(&key)
                .query_async::<_, u64>(&mut conn)
                .await
                .map_err(unavailable)
        })
        .await
    }
}

fn session_key(session_id: &str) -> String {
    format!("{}{}", KEY_PREFIX, session_id)
}

fn unavailable(error: redis::RedisError) -> SessionError {
    SessionError::Unavailable(error.to_string())
}

async fn with_deadline<T, F>(limit: Duration, operation: F) -> Result<T, SessionError>
where
    F: Future<Output = Result<T, SessionError>>,
{
    tokio::time::timeout(limit, operation)
        .await
        .map_err(|_| SessionError::Unavailable(format!("timed out after {:?}", limit)))?
}

/// In-process sessions keyed by session id. Expired entries are treated as
/// absent and dropped when touched.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: DashMap<String, (i64, Instant)>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions currently held, including expired ones not yet touched.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drops every expired session.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.sessions.retain(|_, (_, expires_at)| *expires_at > now);
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(&self, session_id: &str, user_id: i64, ttl: Duration) -> Result<(), SessionError> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| SessionError::Unavailable(format!("ttl {:?} is out of range", ttl)))?;
        self.sessions
            .insert(session_id.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<i64, SessionError> {
        let now = Instant::now();
        if let Some(entry) = self.sessions.get(session_id) {
            let (user_id, expires_at) = *entry.value();
            if expires_at > now {
                return Ok(user_id);
            }
        }
        self.sessions
            .remove_if(session_id, |_, (_, expires_at)| *expires_at <= now);
        Err(SessionError::NotFound)
    }

    async fn delete(&self, session_id: &str) -> Result<u64, SessionError> {
        let now = Instant::now();
        match self.sessions.remove(session_id) {
            Some((_, (_, expires_at))) if expires_at > now => Ok(1),
            _ => Ok(0),
        }
    }
}
