use std::sync::Arc;
use std::time::Duration;

use crate::auth::{
    AuthService, Authenticator, MemorySessionStore, PasswordHasher, SessionStore, TokenCodec,
};
use crate::repository::{MemoryTaskRepository, MemoryUserRepository, TaskRepository, UserRepository};

/// Handles shared by every worker. Built once by the binary (or a test) and
/// handed to actix as `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub tasks: Arc<dyn TaskRepository>,
    pub authenticator: Authenticator,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tasks: Arc<dyn TaskRepository>,
        sessions: Arc<dyn SessionStore>,
        hasher: PasswordHasher,
        codec: TokenCodec,
        session_ttl: Duration,
    ) -> Self {
        let codec = Arc::new(codec);
        Self {
            auth: AuthService::new(users, sessions.clone(), hasher, codec.clone(), session_ttl),
            tasks,
            authenticator: Authenticator::new(codec, sessions),
        }
    }

    /// Everything in process memory: no database or cache required.
    pub fn in_memory(codec: TokenCodec, hasher: PasswordHasher, session_ttl: Duration) -> Self {
        Self::new(
            Arc::new(MemoryUserRepository::new()),
            Arc::new(MemoryTaskRepository::new()),
            Arc::new(MemorySessionStore::new()),
            hasher,
            codec,
            session_ttl,
        )
    }
}
