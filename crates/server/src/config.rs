use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub engine_config_path: Option<String>,
    pub control_plane_url: String,
    pub token_secret: Vec<u8>,
    pub token_ttl_ms: i64,
    pub webhook_url: Option<String>,
    pub webhook_secret: Vec<u8>,
    pub maintenance_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".parse().unwrap(),
            engine_config_path: None,
            control_plane_url: "http://127.0.0.1:8001".into(),
            token_secret: b"change-me-in-production".to_vec(),
            token_ttl_ms: 60_000,
            webhook_url: None,
            webhook_secret: b"change-me-in-production".to_vec(),
            maintenance_interval_secs: 60,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(addr) = std::env::var("RESPONDER_LISTEN_ADDR") {
            match addr.parse() {
                Ok(parsed) => cfg.listen_addr = parsed,
                Err(e) => tracing::warn!(%addr, error = %e, "bad RESPONDER_LISTEN_ADDR, using default"),
            }
        }
        if let Ok(path) = std::env::var("RESPONDER_ENGINE_CONFIG") {
            cfg.engine_config_path = Some(path);
        }
        if let Ok(url) = std::env::var("RESPONDER_CONTROL_PLANE_URL") {
            cfg.control_plane_url = url;
        }
        if let Ok(secret) = std::env::var("RESPONDER_TOKEN_SECRET") {
            cfg.token_secret = secret.into_bytes();
        }
        if let Ok(url) = std::env::var("RESPONDER_WEBHOOK_URL") {
            cfg.webhook_url = Some(url);
        }
        if let Ok(secret) = std::env::var("RESPONDER_WEBHOOK_SECRET") {
            cfg.webhook_secret = secret.into_bytes();
        }
        if let Ok(secs) = std::env::var("RESPONDER_MAINTENANCE_INTERVAL_SECS") {
            if let Ok(parsed) = secs.parse() {
                cfg.maintenance_interval_secs = parsed;
            }
        }
        cfg
    }
}
