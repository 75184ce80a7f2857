//! One-way credential hashing.
//!
//! # Responsibility
//! - Turn plaintext secrets into salted, slow hashes for storage.
//! - Verify a plaintext secret against a stored hash.
//!
//! # Invariants
//! - Every hash carries its own random salt (PHC string format).
//! - Plaintext secrets are never logged or stored.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// No secret was supplied.
    MissingSecret,
    /// Hashing backend rejected the input or parameters.
    Hashing(String),
    /// Stored hash is not a parseable PHC string.
    MalformedHash(String),
}

impl Display for CredentialError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingSecret => write!(f, "credential secret is missing"),
            Self::Hashing(message) => write!(f, "credential hashing failed: {message}"),
            Self::MalformedHash(message) => {
                write!(f, "stored credential hash is malformed: {message}")
            }
        }
    }
}

impl Error for CredentialError {}

/// Hashing collaborator used at registration and bootstrap time.
pub trait CredentialHasher {
    fn hash_credential(&self, plaintext: &str) -> Result<String, CredentialError>;
    fn verify_credential(&self, plaintext: &str, hash: &str) -> Result<bool, CredentialError>;
}

impl<H: CredentialHasher + ?Sized> CredentialHasher for &H {
    fn hash_credential(&self, plaintext: &str) -> Result<String, CredentialError> {
        (**self).hash_credential(plaintext)
    }

    fn verify_credential(&self, plaintext: &str, hash: &str) -> Result<bool, CredentialError> {
        (**self).verify_credential(plaintext, hash)
    }
}

/// Argon2id hasher with the crate's default cost parameters.
#[derive(Default, Clone)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash_credential(&self, plaintext: &str) -> Result<String, CredentialError> {
        if plaintext.is_empty() {
            return Err(CredentialError::MissingSecret);
        }
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| CredentialError::Hashing(err.to_string()))
    }

    fn verify_credential(&self, plaintext: &str, hash: &str) -> Result<bool, CredentialError> {
        let parsed =
            PasswordHash::new(hash).map_err(|err| CredentialError::MalformedHash(err.to_string()))?;
        match self.argon2.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(err) => Err(CredentialError::Hashing(err.to_string())),
        }
    }
}
