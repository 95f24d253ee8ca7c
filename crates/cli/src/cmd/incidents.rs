use anyhow::Result;
use clap::{Args, Subcommand};

use super::helpers;
use crate::output::format::format_state;
use crate::output::table::Table;
use crate::output::{print_json, OutputMode};

#[derive(Subcommand)]
pub enum IncidentsCmd {
    /// List known incidents
    List(ListArgs),
    /// Show one incident's execution and full audit trail
    Get(GetArgs),
}

#[derive(Args)]
pub struct ListArgs;

#[derive(Args)]
pub struct GetArgs {
    /// Incident id (inc-…)
    pub incident_id: String,
}

pub async fn execute(cmd: IncidentsCmd, mode: OutputMode, server: Option<String>) -> Result<()> {
    let base = helpers::resolve_server_url(server.as_deref());
    match cmd {
        IncidentsCmd::List(_) => list(&base, mode).await,
        IncidentsCmd::Get(args) => get(&base, mode, &args.incident_id).await,
    }
}

async fn list(base: &str, mode: OutputMode) -> Result<()> {
    let incidents = helpers::get_json(&format!("{base}/api/v1/incidents")).await?;

    match mode {
        OutputMode::Json => print_json(&incidents)?,
        OutputMode::Human => {
            let rows = incidents.as_array().cloned().unwrap_or_default();
            if rows.is_empty() {
                println!("no incidents");
                return Ok(());
            }
            let mut table = Table::new(vec!["INCIDENT", "ALERT", "SEVERITY", "STATE", "RECORDS"]);
            for row in rows {
                table.add_row(vec![
                    row["incident_id"].as_str().unwrap_or("-").to_string(),
                    row["alert_name"].as_str().unwrap_or("-").to_string(),
                    row["severity"].as_str().unwrap_or("-").to_string(),
                    format_state(row["state"].as_str().unwrap_or("-")),
                    row["record_count"].to_string(),
                ]);
            }
            table.print();
        }
    }
    Ok(())
}

async fn get(base: &str, mode: OutputMode, incident_id: &str) -> Result<()> {
    let projection = helpers::get_json(&format!("{base}/api/v1/incidents/{incident_id}")).await?;

    match mode {
        OutputMode::Json => print_json(&projection)?,
        OutputMode::Human => {
            let exec = &projection["execution"];
            println!("incident:  {incident_id}");
            println!(
                "alert:     {}",
                projection["incident"]["labels"]["alertname"]
                    .as_str()
                    .unwrap_or("-")
            );
            println!("state:     {}", format_state(exec["state"].as_str().unwrap_or("-")));
            println!("attempts:  {}", exec["attempt_count"]);
            if let Some(err) = exec["last_error"].as_str() {
                println!("last err:  {err}");
            }

            let mut table = Table::new(vec!["SEQ", "EVENT", "DETAIL"]);
            for rec in projection["records"].as_array().cloned().unwrap_or_default() {
                let detail = rec["payload"]
                    .get("to")
                    .or_else(|| rec["payload"].get("action_kind"))
                    .and_then(|v| v.as_str())
                    .unwrap_or("");
                table.add_row(vec![
                    rec["sequence_number"].to_string(),
                    rec["event_kind"].as_str().unwrap_or("-").to_string(),
                    detail.to_string(),
                ]);
            }
            table.print();
        }
    }
    Ok(())
}
