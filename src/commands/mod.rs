//! CLI subcommands

mod account;
mod devices;
mod filter_args;
mod query;
mod upload;

use anyhow::Result;
use clap::Subcommand;

pub use filter_args::{resolve_filters, FilterArg};

use crate::config::RuntimeConfig;
use crate::init;

#[derive(Subcommand)]
pub enum Command {
    /// List attribute keys available for filtering
    Keys,
    /// Show the values of one key under the given filters
    Values(query::ValuesArgs),
    /// Count pulses matching the given filters
    Count(query::FilterArgs),
    /// Rank keys by how many matching pulses they can narrow down to
    Recommend(query::FilterArgs),
    /// Download matching pulses as JSON
    Download(query::DownloadArgs),
    /// Validate and upload pulse files
    Upload(upload::UploadArgs),
    /// Manage measurement devices
    #[command(subcommand)]
    Devices(devices::DevicesCommand),
    /// Log in and print the access token
    Login(account::LoginArgs),
    /// Create an account
    Signup(account::SignupArgs),
    /// End the current session
    Logout,
    /// Administer users (admin only)
    #[command(subcommand)]
    Users(account::UsersCommand),
    /// Check that the backend is reachable
    Health,
}

impl Command {
    pub async fn run(self, config: &RuntimeConfig) -> Result<()> {
        let backend = init::connect(config)?;

        match self {
            Command::Keys => query::keys(&backend).await,
            Command::Values(args) => query::values(&backend, args).await,
            Command::Count(args) => query::count(&backend, args).await,
            Command::Recommend(args) => query::recommend(&backend, args).await,
            Command::Download(args) => query::download(&backend, args).await,
            Command::Upload(args) => upload::run(&backend, args, config.upload.max_file_bytes).await,
            Command::Devices(command) => command.run(&backend).await,
            Command::Login(args) => account::login(&backend, config, args).await,
            Command::Signup(args) => account::signup(&backend, args).await,
            Command::Logout => account::logout(&backend).await,
            Command::Users(command) => command.run(&backend).await,
            Command::Health => {
                let body = backend.client.health().await?;
                println!("{}", if body.trim().is_empty() { "ok" } else { body.trim() });
                Ok(())
            }
        }
    }
}
