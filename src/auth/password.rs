use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64ct::{Base64, Encoding};
use rand::rngs::OsRng;
use tracing::{error, warn};

/// Result of checking a plaintext password against a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Match,
    /// Matched a reversible base64 value written by older clients; the caller
    /// should replace it with a fresh hash.
    LegacyMatch,
    Mismatch,
}

impl Verification {
    pub fn is_match(self) -> bool {
        !matches!(self, Verification::Mismatch)
    }
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, stored: &str) -> Verification {
    match PasswordHash::new(stored) {
        Ok(parsed) => {
            if Argon2::default()
                .verify_password(plain.as_bytes(), &parsed)
                .is_ok()
            {
                Verification::Match
            } else {
                Verification::Mismatch
            }
        }
        Err(_) => verify_legacy(plain, stored),
    }
}

/// `btoa` only takes Latin-1 text, so a password with any other character
/// can never have been stored this way.
fn latin1(plain: &str) -> Option<Vec<u8>> {
    plain.chars().map(|c| u8::try_from(u32::from(c)).ok()).collect()
}

fn verify_legacy(plain: &str, stored: &str) -> Verification {
    match Base64::decode_vec(stored) {
        Ok(decoded) if latin1(plain).as_deref() == Some(decoded.as_slice()) => Verification::LegacyMatch,
        Ok(_) => Verification::Mismatch,
        Err(e) => {
            warn!(error = %e, "stored password is neither a hash nor legacy encoding");
            Verification::Mismatch
        }
    }
}
