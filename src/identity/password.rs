//! Password hashing and policy checks.
//!
//! Hashes are Argon2id PHC strings.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use rand_core::OsRng;
use thiserror::Error;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Password-related errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    TooShort,

    #[error("password must be at most {MAX_PASSWORD_LENGTH} characters")]
    TooLong,

    #[error("password must contain a lowercase letter, an uppercase letter and a digit")]
    TooWeak,

    #[error("password hashing failed: {0}")]
    HashError(String),

    #[error("invalid password hash format")]
    InvalidHash,

    #[error("password verification failed")]
    VerificationFailed,
}

/// Argon2id with 19 MiB memory, 2 iterations, 1 lane.
fn create_argon2() -> Result<Argon2<'static>, PasswordError> {
    let params =
        Params::new(19 * 1024, 2, 1, None).map_err(|e| PasswordError::HashError(e.to_string()))?;
    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

/// Hash a password after checking it against the policy.
///
/// # Examples
///
/// ```
/// use skratime::identity::hash_password;
///
/// let hash = hash_password("Sup3rSecret").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    validate_password(password)?;

    let salt = SaltString::generate(&mut OsRng);
    let hash = create_argon2()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verify a password against a stored hash.
///
/// Parameters are read from the stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHash)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| PasswordError::VerificationFailed)
}

/// Check the password policy: 8 to 128 characters containing at least one
/// lowercase letter, one uppercase letter and one digit.
pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort);
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(PasswordError::TooLong);
    }

    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_lower && has_upper && has_digit) {
        return Err(PasswordError::TooWeak);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("Correct1Horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Correct1Horse", &hash).is_ok());
        assert_eq!(
            verify_password("Wrong1Horse", &hash),
            Err(PasswordError::VerificationFailed)
        );
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("Same1Password").unwrap();
        let b = hash_password("Same1Password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_hash() {
        assert_eq!(
            verify_password("Anything1", "not-a-hash"),
            Err(PasswordError::InvalidHash)
        );
    }

    #[test]
    fn test_policy() {
        assert_eq!(validate_password("Ab1"), Err(PasswordError::TooShort));
        assert_eq!(
            validate_password(&format!("Ab1{}", "x".repeat(200))),
            Err(PasswordError::TooLong)
        );
        assert_eq!(validate_password("alllowercase1"), Err(PasswordError::TooWeak));
        assert_eq!(validate_password("ALLUPPERCASE1"), Err(PasswordError::TooWeak));
        assert_eq!(validate_password("NoDigitsHere"), Err(PasswordError::TooWeak));
        assert!(validate_password("Valid1Password").is_ok());
    }
}
