use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use responder_common::crypto::sign_token_claims;
use responder_common::time::now_ms;

/// Short-lived credential scoped to a single target resource. Obtained per
/// executor invocation, never cached process-wide.
#[derive(Debug, Clone)]
pub struct ScopedToken {
    pub token: String,
    pub scope: String,
    pub expires_at_ms: i64,
}

impl ScopedToken {
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

#[derive(Debug)]
pub struct TokenError(pub String);

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "token: {}", self.0)
    }
}

impl std::error::Error for TokenError {}

#[async_trait]
pub trait ScopedTokenProvider: Send + Sync {
    async fn issue(&self, scope: &str) -> Result<ScopedToken, TokenError>;
}

/// Mints `rsp-v1.` bearer tokens by HMAC-signing the scope and expiry.
/// Stands in for a real credential exchange (STS-style presigned identity)
/// while keeping the same shape: per-call issuance, single-resource scope,
/// explicit expiry.
pub struct SignedTokenProvider {
    secret: Vec<u8>,
    ttl_ms: i64,
}

impl SignedTokenProvider {
    pub fn new(secret: Vec<u8>, ttl_ms: i64) -> Self {
        Self { secret, ttl_ms }
    }
}

#[async_trait]
impl ScopedTokenProvider for SignedTokenProvider {
    async fn issue(&self, scope: &str) -> Result<ScopedToken, TokenError> {
        if scope.is_empty() {
            return Err(TokenError("scope must not be empty".into()));
        }
        let expires_at_ms = now_ms() + self.ttl_ms;
        let claims = format!("{scope}|{expires_at_ms}");
        let tag = sign_token_claims(&self.secret, claims.as_bytes());
        let token = format!("rsp-v1.{}.{tag}", URL_SAFE_NO_PAD.encode(claims.as_bytes()));
        Ok(ScopedToken {
            token,
            scope: scope.to_string(),
            expires_at_ms,
        })
    }
}
