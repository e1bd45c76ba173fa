use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use thiserror::Error;

pub const PIN_LENGTH: usize = 4;

#[derive(Debug, Error)]
pub enum PinError {
    #[error("PIN must be exactly {} digits", PIN_LENGTH)]
    InvalidFormat,

    #[error("PIN hashing failed: {0}")]
    Hashing(String),
}

/// True for exactly four ASCII digits.
pub fn is_valid_pin(pin: &str) -> bool {
    pin.len() == PIN_LENGTH && pin.bytes().all(|b| b.is_ascii_digit())
}

/// Hash a PIN with Argon2id into a PHC string (salt and params embedded).
pub fn hash_pin(pin: &str) -> Result<String, PinError> {
    if !is_valid_pin(pin) {
        return Err(PinError::InvalidFormat);
    }

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(pin.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PinError::Hashing(e.to_string()))
}

/// Check a PIN against a stored hash. Fails closed: any malformed input is `false`.
pub fn verify_pin(pin: &str, hash: &str) -> bool {
    if !is_valid_pin(pin) {
        return false;
    }

    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(pin.as_bytes(), &parsed)
        .is_ok()
}
