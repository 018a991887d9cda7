//! Compliance Risk Server
//!
//! Accepts document uploads and produces lexical compliance-risk
//! assessments. Provides REST API endpoints for:
//!
//! - Document upload (multipart)
//! - Analysis of an uploaded document
//! - Retrieval of the latest analysis
//! - Lexicon listing
//!
//! The same pipeline is available offline through the `analyze` command.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod config;
mod error;
mod state;
mod store;
#[cfg(test)]
mod tests;

use api::AnalysisResponse;
use config::{AnalyzeArgs, ServeArgs};
use shared_types::DocumentId;
use state::AppState;

/// Command-line arguments for the compliance server
#[derive(Parser, Debug)]
#[command(name = "compliance-server")]
#[command(about = "Document compliance-risk assessment server", version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default)
    Serve(ServeArgs),
    /// Analyze a local file and print the assessment as JSON
    Analyze(AnalyzeArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command.unwrap_or_else(|| Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => serve(args).await,
        Command::Analyze(args) => analyze_file(args),
    }
}

fn init_logging(verbose: bool) {
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // stderr keeps `analyze` output on stdout clean
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let addr = args.socket_addr()?;
    let engine = args.engine.build_engine();

    info!(
        "Starting compliance server on {} (strategy={}, pdf={})",
        addr,
        engine.strategy(),
        engine.pdf_backend()
    );

    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(args.rate_limit.into())
            .burst_size(args.rate_limit * 2)
            .finish()
            .context("Invalid rate limit; must be at least 1 request per second")?,
    );

    let state = AppState::in_memory(engine);
    let app = api::router(state, args.max_upload_bytes).layer(GovernorLayer {
        config: governor_conf,
    });

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server listening on http://{}", addr);
    info!("Rate limit: {} requests/second per IP", args.rate_limit);
    info!("Upload limit: {} bytes", args.max_upload_bytes);

    // The rate limiter keys on the peer address
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn analyze_file(args: AnalyzeArgs) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.path)
        .with_context(|| format!("Failed to read {}", args.path.display()))?;
    if bytes.is_empty() {
        bail!("{} is empty", args.path.display());
    }

    let document_id = args
        .path
        .file_name()
        .map(|name| DocumentId::new(name.to_string_lossy()))
        .unwrap_or_else(|| DocumentId::new(args.path.display().to_string()));

    let engine = args.engine.build_engine();
    let result = engine.analyze(document_id, &bytes);
    info!(
        "Analyzed {}: risk_score={:.2}",
        args.path.display(),
        result.risk_score
    );

    let response = AnalysisResponse::from(result);
    let json = if args.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{}", json);

    Ok(())
}
