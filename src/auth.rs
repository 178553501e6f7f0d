// src/auth.rs
//! Password hashing, temporary passwords and session tokens.
//!
//! Passwords are stored as bcrypt hashes (`$2b$...`), so `$2a$` hashes from
//! older exports still verify. Session tokens are random; only their SHA-256
//! digest is persisted.

use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::errors::Result;

#[cfg(not(test))]
const BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;
#[cfg(test)]
const BCRYPT_COST: u32 = 4;
const TOKEN_LEN: usize = 32;

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

pub fn hash_password(password: &str) -> Result<String> {
    Ok(bcrypt::hash(password, BCRYPT_COST)?)
}

/// Returns false for malformed hashes instead of failing.
pub fn verify_password(password: &str, stored: &str) -> bool {
    bcrypt::verify(password, stored).unwrap_or(false)
}

/// First two letters of the name, upper-cased, followed by the last four
/// characters of the mobile number.
pub fn temporary_password(name: &str, mobile: &str) -> String {
    let name_part: String = name.trim().chars().take(2).collect::<String>().to_uppercase();
    let mobile = mobile.trim();
    let skip = mobile.chars().count().saturating_sub(4);
    let mobile_part: String = mobile.chars().skip(skip).collect();
    format!("{}{}", name_part, mobile_part)
}

pub fn new_session_token() -> String {
    let mut bytes = [0u8; TOKEN_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    to_hex(&bytes)
}

pub fn token_digest(token: &str) -> String {
    to_hex(&Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let stored = hash_password("AS3210").unwrap();
        assert!(stored.starts_with("$2b$"));
        assert!(verify_password("AS3210", &stored));
        assert!(!verify_password("as3210", &stored));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn test_verifies_2a_hashes() {
        let stored = bcrypt::hash_with_result("legacy-pass", 4)
            .unwrap()
            .format_for_version(bcrypt::Version::TwoA);
        assert!(stored.starts_with("$2a$04$"));
        assert!(verify_password("legacy-pass", &stored));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "sha256$10000$00$00"));
        assert!(!verify_password("x", "$2b$04$tooshort"));
    }

    #[test]
    fn test_temporary_password() {
        assert_eq!(temporary_password("asha", "9876543210"), "AS3210");
        assert_eq!(temporary_password("R", "12"), "R12");
    }

    #[test]
    fn test_session_tokens() {
        let a = new_session_token();
        let b = new_session_token();
        assert_eq!(a.len(), TOKEN_LEN * 2);
        assert_ne!(a, b);
        assert_eq!(token_digest(&a), token_digest(&a));
        assert_ne!(token_digest(&a), a);
    }
}
