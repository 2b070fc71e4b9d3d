//! HMAC-SHA256 signatures for values the server hands to the client and expects back intact.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Sign `payload` and return the tag as lowercase hex.
pub fn sign(secret: &str, payload: &str) -> String {
    hex::encode(tag(secret, payload).finalize().into_bytes())
}

/// Check a hex tag produced by [`sign`]. Comparison is constant time.
pub fn verify(secret: &str, payload: &str, signature_hex: &str) -> bool {
    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };
    tag(secret, payload).verify_slice(&signature).is_ok()
}

/// Join a payload and its signature as `<payload>.<signature>`.
pub fn seal(secret: &str, payload: &str) -> String {
    format!("{payload}.{}", sign(secret, payload))
}

/// Split a sealed value and return its payload if the signature matches.
pub fn unseal<'a>(secret: &str, sealed: &'a str) -> Option<&'a str> {
    let (payload, signature) = sealed.rsplit_once('.')?;
    verify(secret, payload, signature).then_some(payload)
}

fn tag(secret: &str, payload: &str) -> HmacSha256 {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("hmac accepts any key length"),
    };
    mac.update(payload.as_bytes());
    mac
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sealed_values_unseal_with_the_same_secret_only() {
        let sealed = seal("secret", "1700000000000");
        assert_eq!(unseal("secret", &sealed), Some("1700000000000"));
        assert_eq!(unseal("other", &sealed), None);
    }

    #[test]
    fn tampered_payload_or_signature_is_rejected() {
        let sealed = seal("secret", "payload");
        let (_, sig) = sealed.rsplit_once('.').unwrap();
        assert_eq!(unseal("secret", &format!("payloaf.{sig}")), None);
        assert_eq!(unseal("secret", "payload.zz"), None);
        assert_eq!(unseal("secret", "payload"), None);
    }

    #[test]
    fn signatures_are_hex_sha256_length() {
        assert_eq!(sign("k", "v").len(), 64);
    }
}
