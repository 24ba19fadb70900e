//! Login, signup and user administration

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use dialoguer::{Input, Password};
use terastore_core::AuthLevel;
use tracing::{info, warn};

use crate::config::RuntimeConfig;
use crate::init::Backend;

#[derive(Args)]
pub struct LoginArgs {
    /// Account email (defaults to auth.username, otherwise prompted)
    #[arg(short, long)]
    pub username: Option<String>,

    /// Password (prompted when omitted)
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Args)]
pub struct SignupArgs {
    /// Account email
    pub email: String,

    /// Password (prompted with confirmation when omitted)
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Subcommand)]
pub enum UsersCommand {
    /// List all users
    List,
    /// Change a user's auth level
    Update {
        email: String,
        /// unauthorized, user or admin (or 1-3)
        #[arg(long)]
        level: AuthLevel,
    },
    /// Delete a user
    Delete { email: String },
}

/// Log in and print the access token.
///
/// The token can be reused through TERASTORE_TOKEN or `auth.token`.
pub async fn login(backend: &Backend, config: &RuntimeConfig, args: LoginArgs) -> Result<()> {
    let username = match args.username.or_else(|| config.username().map(str::to_string)) {
        Some(username) => username,
        None => Input::<String>::new().with_prompt("Email").interact_text()?,
    };
    let password = match args.password {
        Some(password) => password,
        None => Password::new().with_prompt("Password").interact()?,
    };

    let claims = backend.client.login(&username, &password).await?;
    if let Some(expires_at) = claims.as_ref().and_then(|c| c.expires_at()) {
        info!(%expires_at, "Token issued");
    }

    match backend.session.token() {
        Some(token) => println!("{}", token),
        None => bail!("Login succeeded but no token was stored"),
    }
    Ok(())
}

pub async fn signup(backend: &Backend, args: SignupArgs) -> Result<()> {
    let password = match args.password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Repeat password", "Passwords do not match")
            .interact()?,
    };

    backend.client.signup(&args.email, &password).await?;
    println!("Created account {}", args.email);
    Ok(())
}

pub async fn logout(backend: &Backend) -> Result<()> {
    backend.client.logout().await?;
    println!("Logged out");
    Ok(())
}

impl UsersCommand {
    pub async fn run(self, backend: &Backend) -> Result<()> {
        if backend.session.auth_level() < AuthLevel::Admin {
            warn!(
                level = %backend.session.auth_level(),
                "Current token is not an admin token; the backend may refuse this"
            );
        }

        match self {
            UsersCommand::List => {
                for user in backend.client.list_users().await? {
                    println!("{}\t{}", user.email, user.auth_level);
                }
            }
            UsersCommand::Update { email, level } => {
                backend.client.update_user(&email, level).await?;
                println!("Set {} to {}", email, level);
            }
            UsersCommand::Delete { email } => {
                backend.client.delete_user(&email).await?;
                println!("Deleted {}", email);
            }
        }
        Ok(())
    }
}
