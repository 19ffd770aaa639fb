use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use gatekeeper::config::Config;
use gatekeeper::unsealer::METHODS;
use gatekeeper::utils;

#[derive(Parser)]
#[command(name = "gatekeeper", version, about = "Vault credential broker")]
struct AppCli {
    /// Config file path
    #[arg(short, long, default_value = "config.json", global = true)]
    config: String,

    /// Subcommands
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with the configured unsealer and print the issued token
    Unseal,
    /// Load policies from Vault and print the one that applies to KEY
    Policy {
        key: String,
        /// Admin token used to read the policy document
        #[arg(long, env = "VAULT_TOKEN", hide_env_values = true)]
        token: String,
    },
    /// List supported unsealer methods
    Methods,
}

#[tokio::main]
async fn main() -> Result<()> {
    utils::logging::init();

    let args = AppCli::parse();

    match args.command {
        Commands::Unseal => {
            let config = Config::from_file(&args.config)?;
            let unsealer = config
                .unsealer
                .as_ref()
                .context("no unsealer configured")?;
            let vault = config.vault_client()?;

            info!(method = unsealer.name(), "Unsealing token from {}", vault.base_url());
            let token = unsealer
                .token(&vault)
                .await
                .with_context(|| format!("{} unseal failed", unsealer.name()))?;
            println!("{}", token);
        }
        Commands::Policy { key, token } => {
            let config = Config::from_file(&args.config)?;
            let store = config.policy_store()?;
            store.load(&token).await?;

            let policy = store.get(&key).await;
            println!("{}", serde_json::to_string_pretty(policy.as_ref())?);
        }
        Commands::Methods => {
            for method in METHODS {
                println!("{}", method);
            }
        }
    }

    Ok(())
}
