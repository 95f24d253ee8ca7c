pub mod cancel;
pub mod dlq;
pub mod health;
pub mod helpers;
pub mod incidents;
pub mod version;

use anyhow::Result;
use clap::Subcommand;

use crate::Opts;

#[derive(Subcommand)]
pub enum Commands {
    /// Check server health and readiness
    Health(health::HealthArgs),
    /// Inspect incidents and their audit trails
    #[clap(subcommand)]
    Incidents(incidents::IncidentsCmd),
    /// Cancel an active remediation workflow (escalates to a human)
    Cancel(cancel::CancelArgs),
    /// Inspect and replay dead-lettered deliveries
    #[clap(subcommand)]
    Dlq(dlq::DlqCmd),
    /// Print version information
    Version(version::VersionArgs),
}

pub async fn run(opts: Opts) -> Result<()> {
    let mode = opts.output_mode();
    let server = opts.server.clone();

    match opts.cmd {
        Commands::Health(args) => health::execute(args, mode, server).await,
        Commands::Incidents(cmd) => incidents::execute(cmd, mode, server).await,
        Commands::Cancel(args) => cancel::execute(args, mode, server).await,
        Commands::Dlq(cmd) => dlq::execute(cmd, mode, server).await,
        Commands::Version(args) => version::execute(args, mode).await,
    }
}
