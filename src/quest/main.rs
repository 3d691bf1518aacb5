use anyhow::{Context, Result};
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

#[path = "../quest/mod.rs"]
mod quest;

use hq4l_agents::shared::config::Hq4lConfig;
use hq4l_agents::shared::gemini::GeminiClient;
use hq4l_agents::shared::logging;

#[derive(Parser)]
#[command(name = "hq4l-quest")]
#[command(about = "HQ4L Quest Agent - generates daily quests with Gemini")]
struct Args {
    /// Address to bind the HTTP API to
    #[arg(long, env = "HQ4L_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port for the HTTP API
    #[arg(long, env = "PORT", default_value_t = 8000)]
    port: u16,

    /// Gemini model name
    #[arg(long, env = "GEMINI_MODEL")]
    model: Option<String>,

    /// Directory for log files
    #[arg(long, env = "HQ4L_LOG_DIR", default_value = "logs")]
    log_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _logging = logging::init_service_logging(&args.log_dir, "hq4l_quest")?;

    let (mut config, path) = Hq4lConfig::load_default()?;
    tracing::info!("Using config: {}", path.display());
    if let Some(model) = args.model {
        config.gemini.model = model;
    }

    let api_key =
        std::env::var("GEMINI_API_KEY").context("GEMINI_API_KEY environment variable is required")?;
    let client = GeminiClient::new(&config.gemini, &api_key)?;

    quest::run(Arc::new(client), SocketAddr::new(args.host, args.port)).await
}
