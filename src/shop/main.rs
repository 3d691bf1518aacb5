use anyhow::Result;
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

#[path = "../shop/mod.rs"]
mod shop;

use hq4l_agents::shared::config::Hq4lConfig;
use hq4l_agents::shared::logging;

#[derive(Parser)]
#[command(name = "hq4l-shop")]
#[command(about = "HQ4L Shop Agent - lists the canister shop over chat")]
struct Args {
    /// Address to bind the chat endpoint to
    #[arg(long, env = "HQ4L_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port for the chat endpoint
    #[arg(long, env = "PORT", default_value_t = 8002)]
    port: u16,

    /// Path to the dfx binary
    #[arg(long, env = "DFX_PATH")]
    dfx_path: Option<String>,

    /// Canister id or name serving getShop
    #[arg(long, env = "CANISTER_ID")]
    canister_id: Option<String>,

    /// dfx network (e.g. `local`, `ic`)
    #[arg(long, env = "DFX_NETWORK")]
    network: Option<String>,

    /// Run dfx through `wsl`
    #[arg(long, env = "DFX_USE_WSL")]
    use_wsl: bool,

    /// Directory for log files
    #[arg(long, env = "HQ4L_LOG_DIR", default_value = "logs")]
    log_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _logging = logging::init_service_logging(&args.log_dir, "hq4l_shop")?;

    let (mut config, path) = Hq4lConfig::load_default()?;
    tracing::info!("Using config: {}", path.display());

    let canister = &mut config.canister;
    if let Some(dfx_path) = args.dfx_path {
        canister.dfx_path = dfx_path;
    }
    if let Some(canister_id) = args.canister_id {
        canister.canister_id = canister_id;
    }
    if args.network.is_some() {
        canister.network = args.network;
    }
    canister.use_wsl |= args.use_wsl;

    shop::run(config.canister, SocketAddr::new(args.host, args.port)).await
}
