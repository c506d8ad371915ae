use anyhow::Context;
use clap::Subcommand;
use serde_json::Value;

use crate::cli::utils::{output_details, output_error, output_success};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Check server health status from the /health endpoint")]
    Health {
        #[arg(long, default_value = "http://localhost:3000", help = "Server base URL")]
        url: String,
    },
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Health { url } => {
            let endpoint = format!("{}/health", url.trim_end_matches('/'));
            let response = reqwest::get(&endpoint)
                .await
                .with_context(|| format!("failed to reach {}", endpoint))?;
            let status = response.status();
            let body: Value = response.json().await.context("health response was not JSON")?;

            let data = body.get("data").cloned().unwrap_or(Value::Null);
            let field = |name: &str| {
                data.get(name)
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string()
            };

            if status.is_success() {
                output_success(&output_format, &format!("{} is up", url), Some(body.clone()))?;
                output_details(
                    &output_format,
                    &[("status", field("status")), ("schema", field("schema")), ("database", field("database"))],
                );
                Ok(())
            } else {
                output_error(&output_format, &format!("{} answered {}", url, status), Some("UNHEALTHY"))?;
                anyhow::bail!("server unhealthy: {}", status)
            }
        }
    }
}
