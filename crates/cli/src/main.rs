use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "deskrelay")]
#[command(about = "Telegram → assistant → Chat2Desk relay gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file.
    Init {
        /// Config file path (default: DESKRELAY_CONFIG_PATH or ~/.deskrelay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Run the webhook gateway. Tokens come from config or the environment
    /// (TELEGRAM_BOT_TOKEN, CHAT2DESK_TOKEN, OPENAI_API_KEY, ASSISTANT_ID).
    Gateway {
        /// Config file path (default: DESKRELAY_CONFIG_PATH or ~/.deskrelay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Webhook HTTP port (default from config or 8000)
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
            println!("deskrelay {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Gateway { config, port }) => {
            if let Err(e) = run_gateway(config, port).await {
                log::error!("gateway failed: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config.unwrap_or_else(lib::config::default_config_path);
    let dir = lib::init::init_config_dir(&path)?;
    println!("initialized config directory at {}", dir.display());
    Ok(())
}

async fn run_gateway(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, path) = lib::config::load_config(config_path)?;
    log::debug!("config loaded from {}", path.display());
    if let Some(p) = port {
        config.gateway.port = p;
    }
    lib::gateway::run_gateway(config).await
}
