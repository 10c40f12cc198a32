use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::Rng;
use sha2::{Digest, Sha256};

const SALT_SIZE: usize = 16;

/// Hash a password with a random salt.
/// Returns a base64 encoded string: "salt:digest"
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_SIZE];
    rand::thread_rng().fill(&mut salt);

    let digest = digest_with_salt(password, &salt);

    format!("{}:{}", BASE64.encode(salt), BASE64.encode(digest))
}

/// Verify a password against a stored "salt:digest" string.
/// Malformed stored values verify as false rather than erroring.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let parts: Vec<&str> = stored.split(':').collect();
    if parts.len() != 2 {
        return false;
    }

    let Ok(salt) = BASE64.decode(parts[0]) else {
        return false;
    };
    let Ok(expected) = BASE64.decode(parts[1]) else {
        return false;
    };

    digest_with_salt(password, &salt) == expected
}

fn digest_with_salt(password: &str, salt: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}
