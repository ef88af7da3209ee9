use ring::{digest, hmac};

/// Signs a payload with HMAC-SHA256 and returns the lowercase hex tag
pub fn sign(payload: &str, key: &[u8]) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, key);
    let tag = hmac::sign(&key, payload.as_bytes());
    hex::encode(tag.as_ref())
}

/// Verifies a hex HMAC-SHA256 tag in constant time
pub fn verify(payload: &str, signature: &str, key: &[u8]) -> bool {
    let Ok(tag) = hex::decode(signature) else {
        return false;
    };

    let key = hmac::Key::new(hmac::HMAC_SHA256, key);
    hmac::verify(&key, payload.as_bytes(), &tag).is_ok()
}

/// Helper to derive a 32-byte key from a string (e.g., from environment variable).
/// Uses SHA-256 to ensure we always get exactly 32 bytes.
pub fn derive_key(key_string: &str) -> [u8; 32] {
    let hash = digest::digest(&digest::SHA256, key_string.as_bytes());
    let mut key = [0u8; 32];
    key.copy_from_slice(hash.as_ref());
    key
}

/// 64-byte key for signing session cookies
pub fn derive_cookie_key(key_string: &str) -> [u8; 64] {
    let hash = digest::digest(&digest::SHA512, key_string.as_bytes());
    let mut key = [0u8; 64];
    key.copy_from_slice(hash.as_ref());
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_produces_hex() {
        let key = derive_key("ticket-signing-key");
        let signature = sign("payload", &key);

        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_verify_accepts_own_signature() {
        let key = derive_key("ticket-signing-key");
        let signature = sign("payload", &key);

        assert!(verify("payload", &signature, &key));
    }

    #[test]
    fn test_verify_rejects_wrong_key_and_tampering() {
        let key = derive_key("key-one");
        let other = derive_key("key-two");
        let signature = sign("payload", &key);

        assert!(!verify("payload", &signature, &other));
        assert!(!verify("payload2", &signature, &key));
        assert!(!verify("payload", "not-hex", &key));
    }

    #[test]
    fn test_cookie_key_is_stable_per_secret() {
        let key = derive_cookie_key("session-secret");

        assert_eq!(key.len(), 64);
        assert_eq!(key, derive_cookie_key("session-secret"));
        assert_ne!(key, derive_cookie_key("session-secret-2"));
        assert_ne!(&key[..32], &derive_key("session-secret")[..]);
    }
}
