pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn ready() -> &'static str {
    "ready"
}
