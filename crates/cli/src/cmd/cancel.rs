use anyhow::Result;
use clap::Args;

use super::helpers;
use crate::output::{print_error, print_json, print_success, OutputMode};

#[derive(Args)]
pub struct CancelArgs {
    /// Incident id (inc-…)
    pub incident_id: String,

    #[arg(long, default_value = "operator cancel", help = "Reason recorded in the audit trail")]
    pub reason: String,
}

pub async fn execute(args: CancelArgs, mode: OutputMode, server: Option<String>) -> Result<()> {
    let base = helpers::resolve_server_url(server.as_deref());
    let url = format!("{base}/api/v1/incidents/{}/cancel", args.incident_id);
    let (status, body) =
        helpers::post_json(&url, serde_json::json!({ "reason": args.reason })).await?;

    match mode {
        OutputMode::Json => print_json(&serde_json::json!({"status": status, "body": body}))?,
        OutputMode::Human => match status {
            202 => print_success(&format!("cancelling workflow for {}", args.incident_id)),
            409 => print_error("no active workflow for that incident"),
            other => print_error(&format!("unexpected HTTP {other}")),
        },
    }
    Ok(())
}
