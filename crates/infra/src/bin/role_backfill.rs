//! `role-backfill`: bind legacy membership tags to catalog roles in a JSON
//! snapshot, preview the bindings, or roll them back.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use bizauth_auth::RoleBackfill;
use bizauth_infra::config::BackfillConfig;
use bizauth_infra::snapshot::Snapshot;

/// Role-binding backfill over a roles + memberships snapshot
#[derive(Parser, Debug)]
#[command(name = "role-backfill")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bind every unbound membership and write the snapshot back
    Run { snapshot: PathBuf },
    /// Print what `run` would bind without writing
    Plan { snapshot: PathBuf },
    /// Clear every binding and write the snapshot back
    Reverse { snapshot: PathBuf },
}

fn main() -> anyhow::Result<()> {
    bizauth_observability::init();

    let args = Args::parse();
    let config = BackfillConfig::from_env().context("invalid configuration")?;

    let path = match &args.command {
        Command::Run { snapshot } | Command::Plan { snapshot } | Command::Reverse { snapshot } => {
            snapshot.clone()
        }
    };
    let snapshot = Snapshot::load(&path)?;
    let (catalog, memberships) = snapshot.into_stores();
    let (catalog, memberships) = (Arc::new(catalog), Arc::new(memberships));
    let backfill = RoleBackfill::new(catalog.clone(), memberships.clone(), config.mapping);

    let report = match args.command {
        Command::Run { .. } => {
            let report = if config.workers.get() > 1 {
                backfill.run_parallel(config.workers.get())
            } else {
                backfill.run()
            };
            serde_json::to_value(report.context("backfill failed")?)?
        }
        Command::Plan { .. } => serde_json::to_value(backfill.plan().context("plan failed")?)?,
        Command::Reverse { .. } => {
            serde_json::to_value(backfill.reverse().context("reversal failed")?)?
        }
    };

    if !matches!(args.command, Command::Plan { .. }) {
        Snapshot::from_stores(&catalog, &memberships)?
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
