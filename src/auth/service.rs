use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use super::extractors::AuthenticatedUser;
use super::password::{PasswordError, PasswordHasher};
use super::session::SessionStore;
use super::token::{IssuedToken, TokenCodec, TokenIdentity};
use super::{AuthResponse, LoginRequest, RegisterRequest};
use crate::error::AppError;
use crate::models::{NewUser, User};
use crate::repository::{StoreError, UserRepository};

/// Register, login and logout.
///
/// Each successful authentication opens a new session: a random id is signed
/// into the token as `jti` and recorded in the [`SessionStore`] with the same
/// lifetime as the token.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionStore>,
    hasher: PasswordHasher,
    codec: Arc<TokenCodec>,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionStore>,
        hasher: PasswordHasher,
        codec: Arc<TokenCodec>,
        session_ttl: Duration,
    ) -> Self {
        Self {
            users,
            sessions,
            hasher,
            codec,
            session_ttl,
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AppError> {
        let hasher = self.hasher;
        let password = request.password;
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::InternalServerError(format!("hasher task failed: {}", e)))?
            .map_err(|e| {
                log::error!("[AuthService::register] error when hashing password: {}", e);
                match e {
                    PasswordError::TooLong => AppError::UnprocessableEntity(e.to_string()),
                    _ => AppError::UnprocessableEntity("hasher error".into()),
                }
            })?;

        match self.users.find_by_email(&request.email).await {
            Ok(_) => {
                return Err(AppError::UnprocessableEntity("email already exists".into()));
            }
            Err(StoreError::NotFound) => {}
            Err(e) => {
                log::error!("[AuthService::register] error when looking up email: {}", e);
                return Err(AppError::InternalServerError(e.to_string()));
            }
        }

        let user = self
            .users
            .create(NewUser {
                name: request.name,
                email: request.email,
                password_hash,
            })
            .await
            .map_err(|e| {
                log::error!("[AuthService::register] error when creating user: {}", e);
                AppError::from(e)
            })?;

        let session_id = new_session_id();
        let issued = self
            .codec
            .issue(&identity(&user), &session_id, self.session_ttl)
            .map_err(|e| {
                log::error!("[AuthService::register] error when issuing token: {}", e);
                AppError::InternalServerError(e.to_string())
            })?;
        self.open_session("register", &session_id, user.id).await?;

        Ok(AuthResponse::new(issued, user))
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AppError> {
        let user = match self.users.find_by_email(&request.email).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => {
                return Err(AppError::Unauthorized("unauthorized".into()));
            }
            Err(e) => {
                log::error!("[AuthService::login] error when looking up user: {}", e);
                return Err(AppError::InternalServerError(e.to_string()));
            }
        };

        let hasher = self.hasher;
        let hashed = user.password_hash.clone();
        let password = request.password;
        tokio::task::spawn_blocking(move || hasher.verify(&hashed, &password))
            .await
            .map_err(|e| AppError::InternalServerError(format!("hasher task failed: {}", e)))?
            .map_err(|e| match e {
                PasswordError::MalformedHash(detail) => {
                    log::error!("[AuthService::login] stored hash for user {} is unusable: {}", user.id, detail);
                    AppError::InternalServerError(detail)
                }
                _ => AppError::Unauthorized("invalid credentials".into()),
            })?;

        let session_id = new_session_id();
        let issued = self
            .codec
            .issue(&identity(&user), &session_id, self.session_ttl)
            .map_err(|e| {
                log::error!("[AuthService::login] error when issuing token: {}", e);
                AppError::Unauthorized("invalid credentials".into())
            })?;
        self.open_session("login", &session_id, user.id).await?;

        Ok(AuthResponse::new(issued, user))
    }

    /// Ends the caller's session. A session that is already gone counts as
    /// an invalid access, not as a successful no-op.
    pub async fn logout(&self, caller: &AuthenticatedUser) -> Result<(), AppError> {
        let deleted = self.sessions.delete(&caller.session_id).await.map_err(|e| {
            log::error!("[AuthService::logout] error when deleting session: {}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        if deleted < 1 {
            log::warn!("[AuthService::logout] session for user {} was already gone", caller.user_id);
            return Err(AppError::Forbidden("forbidden access".into()));
        }
        Ok(())
    }

    async fn open_session(&self, flow: &str, session_id: &str, user_id: i64) -> Result<(), AppError> {
        self.sessions
            .put(session_id, user_id, self.session_ttl)
            .await
            .map_err(|e| {
                log::error!("[AuthService::{}] error when storing session: {}", flow, e);
                AppError::InternalServerError(e.to_string())
            })
    }
}

fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

fn identity(user: &User) -> TokenIdentity {
    TokenIdentity {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
    }
}

impl AuthResponse {
    fn new(issued: IssuedToken, user: User) -> Self {
        Self {
            token: issued.access_token,
            token_type: issued.token_type.to_string(),
            expires_in: issued.expires_in,
            user,
        }
    }
}
