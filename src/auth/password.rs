//! Argon2id password storage. Hashes are PHC strings, so the salt and
//! parameters travel with the hash.

use anyhow::anyhow;
use argon2::{
    password_hash::{Error as HashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("hash password: {e}"))
}

/// `Ok(false)` for a wrong password, `Err` only when the stored hash is unreadable.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| anyhow!("stored password hash: {e}"))?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(HashError::Password) => Ok(false),
        Err(e) => Err(anyhow!("verify password: {e}")),
    }
}
