use async_trait::async_trait;
use serde::Serialize;

use super::token::ScopedToken;

/// Workload a remediation targets, resolved from incident labels plus
/// configuration defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceRef {
    pub namespace: String,
    pub name: String,
}

impl ResourceRef {
    pub fn scope(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

/// Operations the engine needs from the control plane. All are phrased as
/// "ensure" so re-applying under the same idempotency key is safe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ControlPlaneOp {
    EnsureEnv {
        target: ResourceRef,
        name: String,
        value: String,
    },
    EnsureReplicas {
        target: ResourceRef,
        replicas: u32,
    },
    /// Stamp a restart annotation; a recent marker means "restarted".
    RestartMarker {
        target: ResourceRef,
        restarted_at: String,
    },
    Drain {
        target: ResourceRef,
    },
}

impl ControlPlaneOp {
    pub fn target(&self) -> &ResourceRef {
        match self {
            Self::EnsureEnv { target, .. }
            | Self::EnsureReplicas { target, .. }
            | Self::RestartMarker { target, .. }
            | Self::Drain { target } => target,
        }
    }
}

/// Handle returned by the control plane for a completed operation.
#[derive(Debug, Clone)]
pub struct OpReceipt {
    pub reference: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPlaneErrorKind {
    Unavailable,
    Timeout,
    RateLimited,
    Unauthorized,
    NotFound,
    Invalid,
}

#[derive(Debug)]
pub struct ControlPlaneError {
    pub kind: ControlPlaneErrorKind,
    pub message: String,
}

impl ControlPlaneError {
    pub fn new(kind: ControlPlaneErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Transient failures feed the remediation retry loop; everything else
    /// forces escalation.
    pub fn retryable(&self) -> bool {
        matches!(
            self.kind,
            ControlPlaneErrorKind::Unavailable
                | ControlPlaneErrorKind::Timeout
                | ControlPlaneErrorKind::RateLimited
        )
    }
}

impl std::fmt::Display for ControlPlaneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            ControlPlaneErrorKind::Unavailable => "unavailable",
            ControlPlaneErrorKind::Timeout => "timeout",
            ControlPlaneErrorKind::RateLimited => "rate_limited",
            ControlPlaneErrorKind::Unauthorized => "unauthorized",
            ControlPlaneErrorKind::NotFound => "not_found",
            ControlPlaneErrorKind::Invalid => "invalid",
        };
        write!(f, "control plane {kind}: {}", self.message)
    }
}

impl std::error::Error for ControlPlaneError {}

#[async_trait]
pub trait ControlPlane: Send + Sync {
    async fn apply(
        &self,
        op: &ControlPlaneOp,
        token: &ScopedToken,
    ) -> Result<OpReceipt, ControlPlaneError>;
}

/// HTTP client against a workload-orchestrator-style API. The concrete
/// control plane is an external collaborator; this client only assumes
/// bearer-token JSON endpoints whose operations are safely re-appliable.
pub struct HttpControlPlane {
    base_url: String,
    client: reqwest::Client,
}

impl HttpControlPlane {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn url_for(&self, op: &ControlPlaneOp) -> String {
        let t = op.target();
        let tail = match op {
            ControlPlaneOp::EnsureEnv { .. } => "env",
            ControlPlaneOp::EnsureReplicas { .. } => "replicas",
            ControlPlaneOp::RestartMarker { .. } => "restart",
            ControlPlaneOp::Drain { .. } => "drain",
        };
        format!(
            "{}/namespaces/{}/workloads/{}/{tail}",
            self.base_url, t.namespace, t.name
        )
    }
}

#[async_trait]
impl ControlPlane for HttpControlPlane {
    async fn apply(
        &self,
        op: &ControlPlaneOp,
        token: &ScopedToken,
    ) -> Result<OpReceipt, ControlPlaneError> {
        let resp = self
            .client
            .post(self.url_for(op))
            .bearer_auth(&token.token)
            .json(op)
            .send()
            .await
            .map_err(|e| {
                let kind = if e.is_timeout() {
                    ControlPlaneErrorKind::Timeout
                } else {
                    ControlPlaneErrorKind::Unavailable
                };
                ControlPlaneError::new(kind, e.to_string())
            })?;

        let status = resp.status();
        if status.is_success() {
            let reference = resp
                .headers()
                .get("x-operation-ref")
                .and_then(|v| v.to_str().ok())
                .map(String::from)
                .unwrap_or_else(|| format!("op-{}", uuid::Uuid::new_v4()));
            return Ok(OpReceipt { reference });
        }

        let kind = match status.as_u16() {
            401 | 403 => ControlPlaneErrorKind::Unauthorized,
            404 => ControlPlaneErrorKind::NotFound,
            408 => ControlPlaneErrorKind::Timeout,
            429 => ControlPlaneErrorKind::RateLimited,
            400..=499 => ControlPlaneErrorKind::Invalid,
            _ => ControlPlaneErrorKind::Unavailable,
        };
        let body = resp.text().await.unwrap_or_default();
        Err(ControlPlaneError::new(
            kind,
            format!("HTTP {status}: {}", body.chars().take(200).collect::<String>()),
        ))
    }
}
