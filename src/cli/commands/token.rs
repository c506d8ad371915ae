use anyhow::Context;
use chrono::Utc;
use clap::Subcommand;
use serde_json::json;

use crate::auth::{Principal, TokenService, Verification};
use crate::cli::utils::{output_details, output_error, output_success};
use crate::cli::OutputFormat;
use crate::config::AppConfig;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Issue a session token for a subject using the configured secret")]
    Issue {
        #[arg(help = "Subject identifier (user id)")]
        subject: String,
    },

    #[command(about = "Verify a session token against the configured secret")]
    Verify {
        #[arg(help = "Token to verify")]
        token: String,
    },
}

fn token_service() -> anyhow::Result<TokenService> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    TokenService::new(config.security.token).context("invalid token settings")
}

/// Stable name of a verification outcome for CLI output.
pub fn outcome_name(outcome: &Verification) -> &'static str {
    match outcome {
        Verification::Valid(_) => "valid",
        Verification::Expired => "expired",
        Verification::Malformed => "malformed",
        Verification::SignatureMismatch => "signature_mismatch",
        Verification::WrongAudience => "wrong_audience",
        Verification::WrongIssuer => "wrong_issuer",
    }
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Issue { subject } => {
            let service = token_service()?;
            let issued = service.issue(&Principal::new(subject), Utc::now())?;

            output_success(
                &output_format,
                "Token issued",
                Some(json!({
                    "token": issued.token,
                    "expires_in": issued.expires_in(),
                    "expires_at": issued.expires_at(),
                })),
            )?;
            output_details(
                &output_format,
                &[
                    ("token", issued.token.clone()),
                    ("expires_in", issued.expires_in().to_string()),
                ],
            );
            Ok(())
        }
        TokenCommands::Verify { token } => {
            let service = token_service()?;
            let outcome = service.verify(&token, Utc::now());
            let name = outcome_name(&outcome);

            match outcome {
                Verification::Valid(principal) => {
                    output_success(
                        &output_format,
                        "Token is valid",
                        Some(json!({ "outcome": name, "subject": principal.subject })),
                    )?;
                    output_details(&output_format, &[("subject", principal.subject)]);
                    Ok(())
                }
                _ => {
                    output_error(&output_format, &format!("Token rejected: {}", name), Some(name))?;
                    anyhow::bail!("token rejected: {}", name)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_names_are_distinct() {
        let names = [
            outcome_name(&Verification::Valid(Principal::new("u1"))),
            outcome_name(&Verification::Expired),
            outcome_name(&Verification::Malformed),
            outcome_name(&Verification::SignatureMismatch),
            outcome_name(&Verification::WrongAudience),
            outcome_name(&Verification::WrongIssuer),
        ];
        let unique: std::collections::HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }
}
