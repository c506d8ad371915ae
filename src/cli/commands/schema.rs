use anyhow::Context;
use clap::Subcommand;
use serde_json::json;

use crate::bootstrap::{FailurePolicy, ReadinessOrchestrator, ReadinessPolicy, SchemaProvider};
use crate::cli::utils::{output_details, output_error, output_success};
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::{self, PgSchemaProvider};

#[derive(Subcommand)]
pub enum SchemaCommands {
    #[command(about = "Show connectivity and pending schema changes")]
    Status,

    #[command(about = "Run the readiness check once, applying pending changes")]
    Apply {
        #[arg(long, help = "Create the database when it cannot be reached")]
        create: bool,
    },
}

fn provider() -> anyhow::Result<PgSchemaProvider> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    let pool = database::connect_lazy(&config.database)?;
    let url = config.database.url.unwrap_or_default();
    Ok(PgSchemaProvider::new(pool, url))
}

pub async fn handle(cmd: SchemaCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        SchemaCommands::Status => {
            let provider = provider()?;
            if !provider.can_connect().await {
                output_error(&output_format, "Database unreachable", Some("UNREACHABLE"))?;
                anyhow::bail!("database unreachable");
            }

            let pending = provider.pending_changes().await?;
            let names: Vec<String> = pending.iter().map(ToString::to_string).collect();
            output_success(
                &output_format,
                &format!("{} pending schema changes", pending.len()),
                Some(json!({ "connected": true, "pending": names })),
            )?;
            let details: Vec<(&str, String)> = names.into_iter().map(|n| ("pending", n)).collect();
            output_details(&output_format, &details);
            Ok(())
        }
        SchemaCommands::Apply { create } => {
            let provider = provider()?;
            // An explicit operator run always applies and always fails loudly.
            let policy = ReadinessPolicy {
                auto_apply: true,
                create_if_absent: create,
                failure: FailurePolicy::Strict,
            };
            let report = ReadinessOrchestrator::new(&provider, policy).run().await;
            let applied: Vec<String> = report.applied.iter().map(ToString::to_string).collect();

            match report.into_result() {
                Ok(report) => {
                    output_success(
                        &output_format,
                        &format!("Schema {}", report.state.as_str()),
                        Some(json!({ "state": report.state, "applied": applied })),
                    )?;
                    let details: Vec<(&str, String)> = applied.into_iter().map(|n| ("applied", n)).collect();
                    output_details(&output_format, &details);
                    Ok(())
                }
                Err(e) => {
                    output_error(&output_format, &e.to_string(), Some("SCHEMA_FAILED"))?;
                    Err(e.into())
                }
            }
        }
    }
}
