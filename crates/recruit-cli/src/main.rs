use anyhow::{Context, Result};
use clap::Parser;
use recruit_cli::{execute, render_tree, summary, LocalIdentityProvider, TreeCommand};
use recruit_sync::{JsonFileStore, SessionPhase, SyncConfig, SyncController};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for recruit-tree
#[derive(Parser, Debug)]
#[command(name = "recruit-tree")]
#[command(about = "Edit a ternary recruitment tree")]
#[command(version)]
struct Args {
    /// Directory holding stored trees and the anonymous identity
    #[arg(long, default_value = ".recruit-tree", env = "RECRUIT_DATA_DIR")]
    data_dir: PathBuf,

    /// TOML file with sync settings
    #[arg(long, env = "RECRUIT_CONFIG")]
    config: Option<PathBuf>,

    /// Identity to sign in as; anonymous if omitted
    #[arg(long, env = "RECRUIT_IDENTITY")]
    identity: Option<String>,

    /// Application namespace, overriding the config file
    #[arg(long, env = "RECRUIT_NAMESPACE")]
    namespace: Option<String>,

    #[command(subcommand)]
    command: Option<TreeCommand>,
}

fn load_config(args: &Args) -> Result<SyncConfig> {
    let mut config = match &args.config {
        Some(path) => SyncConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SyncConfig::default(),
    };
    if let Some(namespace) = &args.namespace {
        config = config.with_namespace(namespace.clone());
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let command = args.command.clone().unwrap_or(TreeCommand::Show);

    let store = Arc::new(JsonFileStore::new(args.data_dir.clone()));
    let provider = LocalIdentityProvider::new(&args.data_dir, args.identity.clone());
    let sync = SyncController::new(config, store);

    let identity = sync.connect(&provider).await;
    let phase = sync.wait_until_settled().await;
    match (&identity, phase) {
        (Some(identity), SessionPhase::Ready) => {
            tracing::debug!(identity = %identity, "tree loaded");
        }
        _ => tracing::warn!(phase = %phase, "working without persistence"),
    }

    let tree = execute(&sync, &command).await?;
    // Hydration may still owe the store a first write
    sync.flush().await;
    if command.is_edit() && sync.has_unpushed_edits() {
        tracing::warn!("changes were not saved");
    }

    print!("{}", render_tree(&tree));
    println!();
    println!("{}", summary(&tree));
    if let Some(identity) = identity {
        println!("identity: {identity}");
    }
    Ok(())
}
