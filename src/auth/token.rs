use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The only algorithm accepted at verification time.
const ALGORITHM: Algorithm = Algorithm::HS256;

pub const TOKEN_TYPE: &str = "Bearer";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token has expired")]
    Expired,
    #[error("token is not valid yet")]
    NotYetValid,
    #[error("token signature is invalid")]
    BadSignature,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        match error.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::ImmatureSignature => TokenError::NotYetValid,
            // A token signed with another algorithm is treated exactly like a
            // forged signature.
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::BadSignature,
            _ => TokenError::Malformed,
        }
    }
}

/// Who a token is issued to.
#[derive(Debug, Clone)]
pub struct TokenIdentity {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User id the token was issued to.
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Session id. The token is only honoured while this id is present in the
    /// session store.
    pub jti: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub iss: String,
    /// The user's name.
    pub sub: String,
}

/// A freshly signed token together with its lifetime.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

/// Signs and verifies HS256 tokens with a single shared secret.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &[u8], issuer: impl Into<String>) -> Self {
        let issuer = issuer.into();

        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_issuer(&[issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer,
            validation,
        }
    }

    /// Signs a token for `identity` bound to `session_id`, valid from now for `ttl`.
    pub fn issue(
        &self,
        identity: &TokenIdentity,
        session_id: &str,
        ttl: Duration,
    ) -> Result<IssuedToken, TokenError> {
        let now = Utc::now().timestamp();
        let exp = i64::try_from(ttl.as_secs())
            .ok()
            .and_then(|secs| now.checked_add(secs))
            .ok_or_else(|| TokenError::Signing(format!("lifetime {:?} is out of range", ttl)))?;
        let claims = Claims {
            id: identity.id,
            name: identity.name.clone(),
            email: identity.email.clone(),
            jti: session_id.to_string(),
            iat: now,
            nbf: now,
            exp,
            iss: self.issuer.clone(),
            sub: identity.name.clone(),
        };

        let access_token = encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            access_token,
            token_type: TOKEN_TYPE,
            expires_in: ttl.as_secs(),
        })
    }

    /// Checks signature, algorithm, issuer and the validity window.
    ///
    /// This does not consult the session store; a token that passes here may
    /// still belong to a session that has been logged out.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SECRET: &[u8] = b"test_secret_for_gen_verify";

    fn identity() -> TokenIdentity {
        TokenIdentity {
            id: 1,
            name: "John".to_string(),
            email: "john@mail.com".to_string(),
        }
    }

    fn claims_at(offset_iat: i64, offset_exp: i64) -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            id: 1,
            name: "John".into(),
            email: "john@mail.com".into(),
            jti: "session".into(),
            iat: now + offset_iat,
            nbf: now + offset_iat,
            exp: now + offset_exp,
            iss: "tasklane".into(),
            sub: "John".into(),
        }
    }

    #[test]
    fn test_token_generation_and_verification() {
        let codec = TokenCodec::new(SECRET, "tasklane");
        let issued = codec
            .issue(&identity(), "3f0c1e4e-session", Duration::from_secs(300))
            .unwrap();
        assert_eq!(issued.token_type, "Bearer");
        assert_eq!(issued.expires_in, 300);

        let claims = codec.verify(&issued.access_token).unwrap();
        assert_eq!(claims.id, 1);
        assert_eq!(claims.name, "John");
        assert_eq!(claims.email, "john@mail.com");
        assert_eq!(claims.jti, "3f0c1e4e-session");
        assert_eq!(claims.iss, "tasklane");
        assert_eq!(claims.sub, "John");
        assert_eq!(claims.nbf, claims.iat);
        assert_eq!(claims.exp - claims.iat, 300);
    }

    #[test]
    fn test_round_trip_preserves_claims() {
        let codec = TokenCodec::new(SECRET, "tasklane");
        let claims = claims_at(0, 600);
        let token = encode(&Header::new(ALGORITHM), &claims, &EncodingKey::from_secret(SECRET)).unwrap();

        assert_eq!(codec.verify(&token).unwrap(), claims);
    }

    #[test]
    fn test_token_expiration() {
        let codec = TokenCodec::new(SECRET, "tasklane");
        let expired = encode(
            &Header::new(ALGORITHM),
            &claims_at(-7200, -3600),
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert_eq!(codec.verify(&expired), Err(TokenError::Expired));
    }

    #[test]
    fn test_token_not_yet_valid() {
        let codec = TokenCodec::new(SECRET, "tasklane");
        let early = encode(
            &Header::new(ALGORITHM),
            &claims_at(3600, 7200),
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert_eq!(codec.verify(&early), Err(TokenError::NotYetValid));
    }

    #[test]
    fn test_invalid_token_signature() {
        let issuer = TokenCodec::new(b"a_completely_different_secret", "tasklane");
        let verifier = TokenCodec::new(SECRET, "tasklane");
        let issued = issuer
            .issue(&identity(), "session", Duration::from_secs(60))
            .unwrap();

        assert_eq!(verifier.verify(&issued.access_token), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_other_algorithms_are_rejected() {
        let codec = TokenCodec::new(SECRET, "tasklane");
        let hs512 = encode(
            &Header::new(Algorithm::HS512),
            &claims_at(0, 600),
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert_eq!(codec.verify(&hs512), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_foreign_issuer_is_rejected() {
        let foreign = TokenCodec::new(SECRET, "someone-else");
        let codec = TokenCodec::new(SECRET, "tasklane");
        let issued = foreign
            .issue(&identity(), "session", Duration::from_secs(60))
            .unwrap();

        assert_eq!(codec.verify(&issued.access_token), Err(TokenError::Malformed));
    }

    #[test]
    fn test_out_of_range_lifetime_is_refused() {
        let codec = TokenCodec::new(SECRET, "tasklane");
        let result = codec.issue(&identity(), "session", Duration::from_secs(u64::MAX));
        assert!(matches!(result, Err(TokenError::Signing(_))));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let codec = TokenCodec::new(SECRET, "tasklane");
        assert_eq!(codec.verify("not-a-token"), Err(TokenError::Malformed));
        assert_eq!(codec.verify(""), Err(TokenError::Malformed));
    }
}
