use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use likebot::config::{BotConfig, DEFAULT_CONFIG_PATH};
use likebot::engine::orchestrator::LikeOrchestrator;
use likebot::engine::outcome::LikeRequest;
use likebot::store::config_store::ConfigStore;

#[derive(Parser)]
#[command(name = "likebot", version, about = "Send likes to a player through the like service")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, env = "LIKEBOT_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one like request as the given user.
    Like {
        /// Player UID (6+ digits).
        uid: String,
        #[arg(long)]
        user: String,
        /// Server the request comes from. Omit for a direct message.
        #[arg(long)]
        server: Option<String>,
        #[arg(long, default_value = "direct")]
        channel: String,
    },
    /// Authorize a server for all channels.
    AllowServer { server: String },
    /// Allow the command in one channel of a server.
    AllowChannel { server: String, channel: String },
    /// Remove a channel from a server's allowed list.
    RevokeChannel { server: String, channel: String },
    /// Remove a server's authorization.
    RevokeServer { server: String },
    /// Print the access configuration.
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = BotConfig::load(&cli.config)?;

    match cli.command {
        Command::Like {
            uid,
            user,
            server,
            channel,
        } => {
            let orchestrator = LikeOrchestrator::from_config(&config)?;
            info!(base_url = %config.like_service.base_url, "handling like request");

            let outcome = orchestrator
                .handle(LikeRequest::new(server, channel, user, uid))
                .await;
            println!("{outcome}");

            orchestrator.shutdown();
        }
        Command::AllowServer { server } => {
            let store = ConfigStore::open(&config.storage.access_file)?;
            store.authorize_server(&server)?;
            println!("Server {server} authorized");
        }
        Command::AllowChannel { server, channel } => {
            let store = ConfigStore::open(&config.storage.access_file)?;
            store.allow_channel(&server, &channel)?;
            println!("Channel {channel} allowed on server {server}");
        }
        Command::RevokeChannel { server, channel } => {
            let store = ConfigStore::open(&config.storage.access_file)?;
            if store.revoke_channel(&server, &channel)? {
                println!("Channel {channel} removed from server {server}");
            } else {
                println!("Channel {channel} was not listed for server {server}");
            }
        }
        Command::RevokeServer { server } => {
            let store = ConfigStore::open(&config.storage.access_file)?;
            if store.revoke_server(&server)? {
                println!("Server {server} revoked");
            } else {
                println!("Server {server} was not authorized");
            }
        }
        Command::List => {
            let store = ConfigStore::open(&config.storage.access_file)?;
            let doc = store.snapshot();
            if doc.servers.is_empty() {
                println!("No servers authorized");
            }
            for (server, rule) in &doc.servers {
                if rule.like_channels.is_empty() {
                    println!("{server}: all channels");
                } else {
                    let channels: Vec<&str> =
                        rule.like_channels.iter().map(String::as_str).collect();
                    println!("{server}: {}", channels.join(", "));
                }
            }
        }
    }

    Ok(())
}
