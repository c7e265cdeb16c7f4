use crate::error::{AppError, AppResult};

/// Hash a password with the configured bcrypt work factor.
pub fn hash(password: &str, cost: u32) -> AppResult<String> {
    bcrypt::hash(password, cost).map_err(|e| AppError::Internal(format!("bcrypt failure: {e}")))
}

/// Verify a plaintext password against a stored hash - constant-time via bcrypt.
pub fn verify(password: &str, hashed: &str) -> bool {
    bcrypt::verify(password, hashed).unwrap_or(false)
}
