use anyhow::{Context, Result};

const DEFAULT_SERVER: &str = "http://127.0.0.1:8080";

/// Server base URL: `--server` flag, then `RESPONDER_SERVER`, then the
/// local default.
pub fn resolve_server_url(flag: Option<&str>) -> String {
    if let Some(url) = flag {
        return url.trim_end_matches('/').to_string();
    }
    if let Ok(url) = std::env::var("RESPONDER_SERVER") {
        if !url.is_empty() {
            return url.trim_end_matches('/').to_string();
        }
    }
    DEFAULT_SERVER.to_string()
}

pub async fn get_json(url: &str) -> Result<serde_json::Value> {
    let resp = reqwest::get(url).await.context("connection failed")?;
    let status = resp.status();
    if !status.is_success() {
        anyhow::bail!("HTTP {status}");
    }
    resp.json().await.context("invalid JSON response")
}

pub async fn post_json(url: &str, body: serde_json::Value) -> Result<(u16, serde_json::Value)> {
    let client = reqwest::Client::new();
    let resp = client
        .post(url)
        .json(&body)
        .send()
        .await
        .context("connection failed")?;
    let status = resp.status().as_u16();
    let value = resp.json().await.unwrap_or(serde_json::Value::Null);
    Ok((status, value))
}
