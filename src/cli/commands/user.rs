use clap::Subcommand;
use serde_json::json;

use crate::auth::hash_password;
use crate::cli::utils::{output_details, output_success};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Print an Argon2 hash for the users.password_hash column")]
    HashPassword {
        #[arg(help = "Plain-text password")]
        password: String,
    },
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::HashPassword { password } => {
            let hash = hash_password(&password)?;
            output_success(&output_format, "Password hashed", Some(json!({ "hash": hash })))?;
            output_details(&output_format, &[("hash", hash)]);
            Ok(())
        }
    }
}
