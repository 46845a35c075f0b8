//! Request-time authentication.
//!
//! Each request moves through
//! `Unauthenticated -> SignatureChecked -> SessionChecked -> Authorized`,
//! and may drop out to a [`Rejection`] at any step:
//!
//! 1. the `Authorization` header must be exactly `Bearer <credential>`;
//! 2. the credential must verify with the [`TokenCodec`];
//! 3. the token's `jti` must resolve in the [`SessionStore`];
//! 4. the stored user id must equal the id embedded in the token.
//!
//! Nothing is cached between requests, so a logout is visible to every
//! request that reaches step 3 afterwards.

use std::sync::Arc;

use thiserror::Error;

use super::extractors::AuthenticatedUser;
use super::session::{SessionError, SessionStore};
use super::token::{TokenCodec, TokenError, TOKEN_TYPE};

/// Why a request was not authenticated. Only used for logging; clients see a
/// uniform `unauthorized`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Rejection {
    #[error("missing authorization header")]
    MissingHeader,
    #[error("malformed authorization header")]
    MalformedHeader,
    #[error("unsupported authorization scheme")]
    WrongScheme,
    #[error("missing bearer token")]
    EmptyCredential,
    #[error("token rejected: {0}")]
    Token(#[from] TokenError),
    #[error("session lookup failed: {0}")]
    Session(#[from] SessionError),
    #[error("session belongs to user {stored}, token names user {claimed}")]
    IdentityMismatch { claimed: i64, stored: i64 },
}

/// Splits an `Authorization` header value into its bearer credential.
pub fn bearer_credential(header: Option<&str>) -> Result<&str, Rejection> {
    let header = header.ok_or(Rejection::MissingHeader)?;
    let parts: Vec<&str> = header.split(' ').collect();
    let [scheme, credential] = parts.as_slice() else {
        return Err(Rejection::MalformedHeader);
    };
    if *scheme != TOKEN_TYPE {
        return Err(Rejection::WrongScheme);
    }
    if credential.is_empty() {
        return Err(Rejection::EmptyCredential);
    }
    Ok(*credential)
}

/// Combines token verification with the session lookup.
#[derive(Clone)]
pub struct Authenticator {
    codec: Arc<TokenCodec>,
    sessions: Arc<dyn SessionStore>,
}

impl Authenticator {
    pub fn new(codec: Arc<TokenCodec>, sessions: Arc<dyn SessionStore>) -> Self {
        Self { codec, sessions }
    }

    /// Runs every check against the raw `Authorization` header value.
    pub async fn authenticate(&self, header: Option<&str>) -> Result<AuthenticatedUser, Rejection> {
        let credential = bearer_credential(header)?;
        let claims = self.codec.verify(credential)?;
        let stored = self.sessions.get(&claims.jti).await?;

        if stored != claims.id {
            return Err(Rejection::IdentityMismatch {
                claimed: claims.id,
                stored,
            });
        }

        Ok(AuthenticatedUser {
            user_id: stored,
            session_id: claims.jti,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::MemorySessionStore;
    use crate::auth::token::TokenIdentity;
    use std::time::Duration;

    const TTL: Duration = Duration::from_secs(300);

    fn setup() -> (Authenticator, Arc<TokenCodec>, Arc<MemorySessionStore>) {
        let codec = Arc::new(TokenCodec::new(b"gate-secret", "tasklane"));
        let sessions = Arc::new(MemorySessionStore::new());
        let authenticator = Authenticator::new(codec.clone(), sessions.clone());
        (authenticator, codec, sessions)
    }

    fn token_for(codec: &TokenCodec, user_id: i64, jti: &str) -> String {
        let identity = TokenIdentity {
            id: user_id,
            name: "John".into(),
            email: "john@mail.com".into(),
        };
        codec.issue(&identity, jti, TTL).unwrap().access_token
    }

    #[test]
    fn test_bearer_credential_parsing() {
        assert_eq!(bearer_credential(Some("Bearer abc")), Ok("abc"));
        assert_eq!(bearer_credential(None), Err(Rejection::MissingHeader));
        assert_eq!(bearer_credential(Some("Bearer")), Err(Rejection::MalformedHeader));
        assert_eq!(bearer_credential(Some("")), Err(Rejection::MalformedHeader));
        assert_eq!(
            bearer_credential(Some("Bearer abc def")),
            Err(Rejection::MalformedHeader)
        );
        assert_eq!(bearer_credential(Some("Basic abc")), Err(Rejection::WrongScheme));
        assert_eq!(bearer_credential(Some("bearer abc")), Err(Rejection::WrongScheme));
        assert_eq!(bearer_credential(Some("Bearer ")), Err(Rejection::EmptyCredential));
    }

    #[actix_rt::test]
    async fn test_valid_session_is_authorized() {
        let (authenticator, codec, sessions) = setup();
        sessions.put("jti-1", 5, TTL).await.unwrap();
        let header = format!("Bearer {}", token_for(&codec, 5, "jti-1"));

        let user = authenticator.authenticate(Some(&header)).await.unwrap();
        assert_eq!(user.user_id, 5);
        assert_eq!(user.session_id, "jti-1");
    }

    #[actix_rt::test]
    async fn test_revoked_session_is_rejected() {
        let (authenticator, codec, sessions) = setup();
        sessions.put("jti-1", 5, TTL).await.unwrap();
        let header = format!("Bearer {}", token_for(&codec, 5, "jti-1"));
        assert!(authenticator.authenticate(Some(&header)).await.is_ok());

        sessions.delete("jti-1").await.unwrap();
        assert_eq!(
            authenticator.authenticate(Some(&header)).await,
            Err(Rejection::Session(SessionError::NotFound))
        );
    }

    #[actix_rt::test]
    async fn test_session_owned_by_someone_else_is_rejected() {
        let (authenticator, codec, sessions) = setup();
        sessions.put("jti-1", 6, TTL).await.unwrap();
        let header = format!("Bearer {}", token_for(&codec, 5, "jti-1"));

        assert_eq!(
            authenticator.authenticate(Some(&header)).await,
            Err(Rejection::IdentityMismatch {
                claimed: 5,
                stored: 6
            })
        );
    }

    #[actix_rt::test]
    async fn test_forged_token_never_reaches_the_store() {
        let (authenticator, _, sessions) = setup();
        sessions.put("jti-1", 5, TTL).await.unwrap();
        let forger = TokenCodec::new(b"attacker-secret", "tasklane");
        let header = format!("Bearer {}", token_for(&forger, 5, "jti-1"));

        assert_eq!(
            authenticator.authenticate(Some(&header)).await,
            Err(Rejection::Token(TokenError::BadSignature))
        );
    }
}
