use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::error::ApiError;

fn hasher(config: &SecurityConfig) -> Result<Argon2<'static>, ApiError> {
    let params = Params::new(
        config.password_memory_kib,
        config.password_work_factor,
        1,
        None,
    )
    .map_err(|e| ApiError::internal_with_detail("Invalid password hashing parameters", e))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password with Argon2id using the configured cost.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = hasher(config)?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::internal_with_detail("Failed to hash password", e))?;

    Ok(hash.to_string())
}

/// Check `password` against a stored PHC hash string. Parameters are read
/// from the hash itself, so older hashes keep verifying after a cost change.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, ApiError> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| ApiError::internal_with_detail("Invalid password hash format", e))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Hashing is CPU-bound; keep it off the async workers
pub async fn hash_password_blocking(password: String) -> Result<String, ApiError> {
    let config = crate::config::config().security.clone();
    task::spawn_blocking(move || hash_password(&password, &config))
        .await
        .map_err(|e| ApiError::internal_with_detail("Password hashing task panicked", e))?
}

pub async fn verify_password_blocking(password: String, password_hash: String) -> Result<bool, ApiError> {
    task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .map_err(|e| ApiError::internal_with_detail("Password verification task panicked", e))?
}
