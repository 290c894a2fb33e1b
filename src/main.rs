use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tokio_util::sync::CancellationToken;

use pulsetag::telemetry;
use pulsetag::ScraperConfig;

mod commands;

#[derive(Parser)]
#[command(name = "pulsetag", about = "Extract social-media post text and suggest hashtags")]
struct Cli {
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the text of a post
    Extract(commands::ExtractCmd),
    /// Extract a post and suggest categorized hashtags
    Analyze(commands::AnalyzeCmd),
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // stderr only; respects RUST_LOG and PULSETAG_LOG_FORMAT
    telemetry::config::init_tracing();
    let cfg = ScraperConfig::from_env();

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            on_signal.cancel();
        }
    });

    let ok = match cli.command {
        Commands::Extract(args) => commands::extract(&cfg, args, &cancel).await?,
        Commands::Analyze(args) => commands::analyze(&cfg, args, &cancel).await?,
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
