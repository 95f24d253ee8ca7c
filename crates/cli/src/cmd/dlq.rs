use anyhow::Result;
use clap::{Args, Subcommand};

use super::helpers;
use crate::output::format::format_age_ms;
use crate::output::table::Table;
use crate::output::{print_error, print_json, print_success, OutputMode};

#[derive(Subcommand)]
pub enum DlqCmd {
    /// List dead-lettered deliveries
    List(ListArgs),
    /// Re-enqueue a held delivery to its original target
    Replay(ReplayArgs),
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(long, help = "Only entries for this target")]
    pub target: Option<String>,
}

#[derive(Args)]
pub struct ReplayArgs {
    /// Dead-letter entry id
    pub id: String,
}

pub async fn execute(cmd: DlqCmd, mode: OutputMode, server: Option<String>) -> Result<()> {
    let base = helpers::resolve_server_url(server.as_deref());
    match cmd {
        DlqCmd::List(args) => list(&base, mode, args.target.as_deref()).await,
        DlqCmd::Replay(args) => replay(&base, mode, &args.id).await,
    }
}

async fn list(base: &str, mode: OutputMode, target: Option<&str>) -> Result<()> {
    let url = match target {
        Some(t) => format!("{base}/api/v1/dlq?target={t}"),
        None => format!("{base}/api/v1/dlq"),
    };
    let entries = helpers::get_json(&url).await?;

    match mode {
        OutputMode::Json => print_json(&entries)?,
        OutputMode::Human => {
            let rows = entries.as_array().cloned().unwrap_or_default();
            if rows.is_empty() {
                println!("dead-letter holding is empty");
                return Ok(());
            }
            let mut table = Table::new(vec!["ID", "TARGET", "INCIDENT", "ATTEMPTS", "AGE", "ERROR"]);
            for row in rows {
                table.add_row(vec![
                    row["id"].as_str().unwrap_or("-").to_string(),
                    row["target"].as_str().unwrap_or("-").to_string(),
                    row["incident_id"].as_str().unwrap_or("-").to_string(),
                    row["attempts"].to_string(),
                    format_age_ms(row["created_at_ms"].as_i64().unwrap_or(0)),
                    row["error"].as_str().unwrap_or("-").chars().take(60).collect(),
                ]);
            }
            table.print();
        }
    }
    Ok(())
}

async fn replay(base: &str, mode: OutputMode, id: &str) -> Result<()> {
    let url = format!("{base}/api/v1/dlq/{id}/replay");
    let (status, body) = helpers::post_json(&url, serde_json::json!({})).await?;

    match mode {
        OutputMode::Json => print_json(&serde_json::json!({"status": status, "body": body}))?,
        OutputMode::Human => match status {
            202 => print_success(&format!("replaying {id}")),
            404 => print_error("dead letter not found"),
            other => print_error(&format!("unexpected HTTP {other}")),
        },
    }
    Ok(())
}
