use anyhow::{Context, Result};

/// Password hashing seam.
///
/// The ledger only ever stores and compares opaque hash strings; the
/// concrete scheme lives behind this trait so tests can substitute a
/// cheap fake.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String>;
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Production hasher backed by bcrypt.
pub struct BcryptHasher;

impl PasswordHasher for BcryptHasher {
    fn hash(&self, password: &str) -> Result<String> {
        bcrypt::hash(password, bcrypt::DEFAULT_COST).context("Failed to hash password")
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        // A malformed stored hash is treated as a mismatch.
        bcrypt::verify(password, hash).unwrap_or(false)
    }
}
