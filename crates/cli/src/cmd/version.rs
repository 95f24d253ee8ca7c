use anyhow::Result;
use clap::Args;

use crate::output::{print_json, OutputMode};

#[derive(Args)]
pub struct VersionArgs;

pub async fn execute(_args: VersionArgs, mode: OutputMode) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    match mode {
        OutputMode::Json => print_json(&serde_json::json!({ "version": version }))?,
        OutputMode::Human => println!("responder {version}"),
    }
    Ok(())
}
