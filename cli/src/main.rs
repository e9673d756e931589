mod cli;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fantasy_realm_core::{GameBuilder, RealmConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "ファンタジー王国経営シミュレーション", long_about = None)]
struct Args {
    /// Realm settings override (YAML or JSON).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for a reproducible world.
    #[arg(long)]
    seed: Option<u64>,
    /// Name of the player's kingdom.
    #[arg(long)]
    player_name: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    let mut builder = GameBuilder::new(config);
    if let Some(seed) = args.seed {
        builder = builder.with_seed(seed);
    }
    if let Some(name) = args.player_name {
        builder = builder.with_player_name(name);
    }
    let mut game = builder.build().context("ゲームの初期化に失敗しました")?;
    info!(countries = game.countries().len(), "ゲームを開始します");

    cli::run(&mut game)
}

fn load_config(args: &Args) -> Result<RealmConfig> {
    if let Some(path) = &args.config {
        return RealmConfig::load_from_path(path);
    }
    match resolve_config_path()? {
        Some(path) => RealmConfig::load_from_path(&path),
        None => RealmConfig::from_embedded(),
    }
}

/// A `config/realm.yaml` beside the working directory overrides the embedded defaults.
fn resolve_config_path() -> Result<Option<PathBuf>> {
    let cwd = std::env::current_dir().context("カレントディレクトリの取得に失敗しました")?;
    let candidate = cwd.join("config").join("realm.yaml");
    Ok(candidate.exists().then_some(candidate))
}
