use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use token_watch::config::Config;
use token_watch::query::commands::{cmd_list, cmd_refresh, cmd_show};
use token_watch::query::formatters::OutputFormat;
use token_watch::reconciler::TokenRegistry;
use token_watch::repository::Database;
use token_watch::rpc::RpcClient;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "query")]
#[command(about = "Inspect and refresh cached ERC20 token metadata", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "table")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all cached tokens ordered by symbol
    List,
    /// Show one cached token
    Show { address: String },
    /// Fetch every configured token from the chain and store it
    Refresh {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::from(cli.format.as_str());

    let config = Config::from_env()?;
    let db = Database::new(&config.database_url)?;
    let client = RpcClient::new(&config.rpc_url, config.rpc_timeout)?;
    let registry = TokenRegistry::new(Arc::new(client), db).with_retries(config.refresh_retries);

    match cli.command {
        Commands::List => cmd_list(&registry, &format).await?,
        Commands::Show { address } => cmd_show(&registry, &address, &format).await?,
        Commands::Refresh { config: path } => {
            let path = path.unwrap_or_else(|| PathBuf::from(&config.token_config_path));
            cmd_refresh(&registry, &path, &format).await?;
        }
    }

    Ok(())
}
