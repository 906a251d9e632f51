use hex::encode;
use pbkdf2::pbkdf2_hmac;
use rand::{distributions::Alphanumeric, Rng};
use sha2::Sha256;

use crate::error::MemberDbError;

const METHOD: &str = "pbkdf2:sha256";
const SALT_LENGTH: usize = 16;
const KEY_LENGTH: usize = 32;

/// Salted password hashes in the `pbkdf2:sha256:<iterations>$<salt>$<hex>`
/// layout the host application verifies logins against.
pub struct PasswordHash;

impl PasswordHash {
    pub fn generate(password: &str, iterations: u32) -> String {
        let salt: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SALT_LENGTH)
            .map(char::from)
            .collect();

        let digest = Self::derive(password, &salt, iterations);
        format!("{}:{}${}${}", METHOD, iterations, salt, digest)
    }

    pub fn verify(stored: &str, password: &str) -> Result<bool, MemberDbError> {
        let mut parts = stored.splitn(3, '$');
        let (method, salt, digest) = match (parts.next(), parts.next(), parts.next()) {
            (Some(method), Some(salt), Some(digest)) => (method, salt, digest),
            _ => {
                return Err(MemberDbError::PasswordHashError(
                    "expected '<method>$<salt>$<hash>'".to_owned(),
                ))
            }
        };

        let iterations = method
            .strip_prefix(METHOD)
            .and_then(|rest| rest.strip_prefix(':'))
            .ok_or_else(|| {
                MemberDbError::PasswordHashError(format!("unsupported method '{}'", method))
            })?
            .parse::<u32>()
            .map_err(|e| MemberDbError::PasswordHashError(format!("bad iteration count: {}", e)))?;

        Ok(Self::derive(password, salt, iterations) == digest)
    }

    fn derive(password: &str, salt: &str, iterations: u32) -> String {
        let mut key = [0u8; KEY_LENGTH];
        pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut key);
        encode(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_layout() {
        let hash = PasswordHash::generate("#admin1004", 1000);
        let parts: Vec<&str> = hash.split('$').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "pbkdf2:sha256:1000");
        assert_eq!(parts[1].len(), SALT_LENGTH);
        assert!(parts[1].chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(parts[2].len(), KEY_LENGTH * 2);
    }

    #[test]
    fn test_salts_differ() {
        let first = PasswordHash::generate("secret", 10);
        let second = PasswordHash::generate("secret", 10);
        assert_ne!(first, second);
    }

    #[test]
    fn test_verify() {
        let hash = PasswordHash::generate("#wecarm1004", 1000);
        assert!(PasswordHash::verify(&hash, "#wecarm1004").unwrap());
        assert!(!PasswordHash::verify(&hash, "#wecarm1005").unwrap());
    }

    #[test]
    fn test_known_vector() {
        // Published PBKDF2-HMAC-SHA256 vector: "password", "salt", 1 round, 32 bytes
        let stored = "pbkdf2:sha256:1$salt$120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b";
        assert!(PasswordHash::verify(stored, "password").unwrap());
    }

    #[test]
    fn test_verify_rejects_malformed() {
        assert!(PasswordHash::verify("plaintext", "x").is_err());
        assert!(PasswordHash::verify("scrypt:32768:8:1$salt$abcd", "x").is_err());
        assert!(PasswordHash::verify("pbkdf2:sha256:many$salt$abcd", "x").is_err());
    }
}
