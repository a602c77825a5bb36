mod cmd_codec;
mod cmd_config;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mlmd_mock::{client, config, server};

use crate::cmd_codec::{EnvelopeSource, PayloadSource};

#[derive(Parser)]
#[command(
    name = "mlmd-mock",
    about = "gRPC-Web mock of the ML Metadata store",
    version
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve canned MetadataStoreService responses in the foreground
    Serve {
        /// Listen port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Wrap a protobuf payload in a gRPC-Web envelope
    Encode {
        #[command(flatten)]
        source: PayloadSource,
        /// grpc-status trailer value
        #[arg(long, default_value_t = 0)]
        status: u32,
        /// grpc-message trailer value
        #[arg(long, default_value = "")]
        message: String,
        /// Emit application/grpc-web-text (base64)
        #[arg(long)]
        text: bool,
        /// Write the body here instead of printing hex
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Decode a gRPC-Web response body
    Decode {
        #[command(flatten)]
        source: EnvelopeSource,
        /// Input is application/grpc-web-text (base64)
        #[arg(long)]
        text: bool,
    },
    /// Send an empty unary request to a gRPC-Web endpoint and decode the reply
    Call {
        /// Full method URL
        #[arg(long)]
        url: String,
        /// Use application/grpc-web-text
        #[arg(long)]
        text: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Create default settings.json
    Init,
    /// Show current configuration
    Show,
    /// Set a config value (dot notation: routes.GetArtifacts.status)
    Set {
        /// Config key path
        key: String,
        /// Value to set
        value: String,
    },
    /// Print config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(config::default_config_path);

    let is_serve = matches!(cli.command, Commands::Serve { .. });

    // Init logging: serve → stdout (info), everything else → stderr (warn)
    if is_serve {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_writer(std::io::stdout)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Serve { port } => {
            let mut config = config::AppConfig::load_or_default(&config_path)?;
            if let Some(port) = port {
                config.port = port;
            }
            if config_path.exists() {
                info!("Config loaded from {}", config_path.display());
            } else {
                info!("No config at {}, using built-in routes", config_path.display());
            }
            server::start_server(&config).await
        }
        Commands::Encode {
            source,
            status,
            message,
            text,
            output,
        } => cmd_codec::run_encode(&source, status, &message, text, output.as_deref()),
        Commands::Decode { source, text } => cmd_codec::run_decode(&source, text),
        Commands::Call { url, text } => {
            let envelope = client::call(&url, text).await?;
            print!("{}", cmd_codec::render(&envelope));
            Ok(())
        }
        Commands::Config { action } => cmd_config::run(&action, &config_path),
    }
}
