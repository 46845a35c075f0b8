use bcrypt::{hash, verify, DEFAULT_COST};
use thiserror::Error;

/// bcrypt only looks at the first 72 bytes of its input; longer passwords
/// are refused instead of being silently truncated.
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password length exceeds {} bytes", MAX_PASSWORD_BYTES)]
    TooLong,
    #[error("failed to hash password: {0}")]
    HashingFailed(String),
    #[error("hashed password is not the hash of the given password")]
    Mismatch,
    #[error("malformed password hash: {0}")]
    MalformedHash(String),
}

/// Salted bcrypt hashing with a fixed cost factor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(PasswordError::TooLong);
        }
        hash(password, self.cost).map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Checks `password` against a stored hash. bcrypt compares the digests
    /// in constant time.
    ///
    /// bcrypt would truncate anything past 72 bytes, so such input can never
    /// match a hash produced by [`PasswordHasher::hash`].
    pub fn verify(&self, hashed: &str, password: &str) -> Result<(), PasswordError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(PasswordError::Mismatch);
        }
        match verify(password, hashed) {
            Ok(true) => Ok(()),
            Ok(false) => Err(PasswordError::Mismatch),
            Err(e) => Err(PasswordError::MalformedHash(e.to_string())),
        }
    }
}
