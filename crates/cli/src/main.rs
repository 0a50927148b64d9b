use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "lull")]
#[command(about = "Debounced auto-responder: one reply per burst of inbound messages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Run the responder daemon (webhook gateway + message bridge transport).
    Run {
        /// Config file path (default: LULL_CONFIG_PATH or ~/.lull/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port for health and webhook routes (default from config or 3000)
        #[arg(long, short)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("lull {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Run { config, port }) => {
            if let Err(e) = run(config, port).await {
                log::error!("run failed: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

async fn run(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, path) = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    config.validate()?;
    let base_url = config.bridge.base_url.clone().ok_or_else(|| {
        anyhow::anyhow!(
            "bridge.baseUrl is required (set it in {})",
            path.display()
        )
    })?;
    let api_token = lib::config::resolve_bridge_token(&config);
    let transport = Arc::new(lib::channels::BridgeTransport::new(base_url, api_token));
    log::info!(
        "starting gateway on {}:{}",
        config.gateway.bind,
        config.gateway.port
    );
    lib::gateway::run_gateway(config, transport).await
}
