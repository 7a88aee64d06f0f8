use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};

use crate::error::ForgeError;

/// Hash a password with argon2id and a random salt. The salt is embedded in
/// the PHC string.
pub fn hash_password(password: &str) -> Result<String, ForgeError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ForgeError::PasswordHash(e.to_string()))
}

/// Verify a password against a stored PHC hash. Malformed hashes verify as
/// false rather than erroring.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
