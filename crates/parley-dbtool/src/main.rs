//! # parley-dbtool
//!
//! Developer tool for poking at a local Parley database: seed it with
//! pending data, inspect it, drain it against a simulated backend, or wipe
//! it.
//!
//! The database location comes from `--database` or the usual
//! `PARLEY_*` environment settings.

mod backend;
mod fixture;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use parley_offline::{ChatContext, SyncConfig};
use parley_shared::SyncStatus;
use tracing::info;

use crate::backend::SimulatedBackend;

#[derive(Parser)]
#[command(name = "parley-dbtool")]
#[command(about = "Inspect and exercise a local Parley database", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// SQLite file to use instead of the configured one
    #[arg(short, long)]
    database: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert channels, members and messages waiting to be synced
    Generate {
        /// Number of channels
        #[arg(long, default_value_t = 10)]
        count: usize,
        /// Members (and messages) per channel
        #[arg(long, default_value_t = 3)]
        members: usize,
    },
    /// Print the newest messages of every stored channel
    Read {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Print stored channel ids grouped by sync status
    ReadCids,
    /// Run one sync pass against a simulated backend
    Retry {
        /// Reject every K-th submission permanently
        #[arg(long)]
        fail_every: Option<usize>,
    },
    /// Remove every row from the local database
    DeleteAll,
}

const ALL_STATUSES: [SyncStatus; 5] = [
    SyncStatus::SyncNeeded,
    SyncStatus::InProgress,
    SyncStatus::AwaitingAttachments,
    SyncStatus::Completed,
    SyncStatus::FailedPermanently,
];

#[tokio::main]
async fn main() -> Result<()> {
    parley_offline::logging::init();
    let cli = Cli::parse();

    let mut config = SyncConfig::from_env();
    if cli.database.is_some() {
        config.database_path = cli.database;
    }
    info!(?config, "Loaded configuration");

    let fail_every = match &cli.command {
        Commands::Retry { fail_every } => *fail_every,
        _ => None,
    };
    let backend = Arc::new(SimulatedBackend::new(fail_every));
    let ctx = ChatContext::open(config, backend.clone(), None)?;

    match cli.command {
        Commands::Generate { count, members } => generate(&ctx, count, members).await?,
        Commands::Read { limit } => read(&ctx, limit).await?,
        Commands::ReadCids => read_cids(&ctx).await?,
        Commands::Retry { .. } => retry(&ctx, &backend).await?,
        Commands::DeleteAll => {
            let removed = ctx.clear_local_data().await?;
            println!("removed {removed} rows");
        }
    }

    Ok(())
}

async fn generate(ctx: &ChatContext, count: usize, members: usize) -> Result<()> {
    let fixture = fixture::build(count, members);
    let (users, channels, messages) = (
        fixture.users.len(),
        fixture.channels.len(),
        fixture.messages.len(),
    );

    ctx.users().insert(fixture.users).await?;
    ctx.channels().insert(fixture.channels).await?;
    ctx.messages().insert(fixture.messages, false).await?;

    println!("generated {channels} channels, {users} users, {messages} messages");
    Ok(())
}

async fn read(ctx: &ChatContext, limit: usize) -> Result<()> {
    for status in ALL_STATUSES {
        for cid in ctx.channels().select_cids_by_sync_status(status).await? {
            println!("{cid} [{status}]");
            for message in ctx.messages().select_for_channel(&cid, limit).await? {
                let author = message.user.name.as_deref().unwrap_or(&message.user.id);
                println!(
                    "  {} {:<24} {author}: {}",
                    message.sync_status, message.id, message.text
                );
                if let Some(reason) = &message.sync_description {
                    println!("      ! {reason}");
                }
            }
        }
    }
    Ok(())
}

async fn read_cids(ctx: &ChatContext) -> Result<()> {
    for status in ALL_STATUSES {
        let cids = ctx.channels().select_cids_by_sync_status(status).await?;
        if cids.is_empty() {
            continue;
        }
        println!("{status} ({})", cids.len());
        for cid in cids {
            println!("  {cid}");
        }
    }
    Ok(())
}

async fn retry(ctx: &ChatContext, backend: &SimulatedBackend) -> Result<()> {
    match ctx.sync().sync_now().await? {
        Some(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            info!(submissions = backend.submissions(), "retry finished");
        }
        None => println!("a sync pass is already running"),
    }
    Ok(())
}
