//! Argon2 password hashing, used for both account passwords and ticket
//! share passwords.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Exact, case-sensitive comparison against the stored hash. Malformed
/// hashes verify as false instead of erroring.
pub fn verify_password(hash: &str, supplied: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(supplied.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_is_exact_and_case_sensitive() {
        let hash = hash_password("Segredo123").unwrap();
        assert!(verify_password(&hash, "Segredo123"));
        assert!(!verify_password(&hash, "segredo123"));
        assert!(!verify_password(&hash, "Segredo123 "));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("plaintext-leftover", "plaintext-leftover"));
    }
}
