use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 over `data`, base64-encoded. Used for webhook payload
/// signatures (`X-Responder-Signature`).
pub fn sign_payload(secret: &[u8], data: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(data);
    STANDARD.encode(mac.finalize().into_bytes())
}

pub fn verify_payload(secret: &[u8], data: &[u8], signature_b64: &str) -> bool {
    let Ok(sig_bytes) = STANDARD.decode(signature_b64) else {
        return false;
    };
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(data);
    mac.verify_slice(&sig_bytes).is_ok()
}

/// URL-safe HMAC tag without padding. Used for scoped control-plane tokens,
/// which travel in an Authorization header.
pub fn sign_token_claims(secret: &[u8], claims: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(claims);
    URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}

pub fn verify_token_claims(secret: &[u8], claims: &[u8], tag: &str) -> bool {
    let Ok(tag_bytes) = URL_SAFE_NO_PAD.decode(tag) else {
        return false;
    };
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(claims);
    mac.verify_slice(&tag_bytes).is_ok()
}
