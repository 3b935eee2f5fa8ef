use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::{utils, OutputFormat};
use crate::client::QueryOptions;
use crate::config;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Log in and print a session token")]
    Login {
        #[arg(help = "Admin email")]
        email: String,
        #[arg(help = "Admin password")]
        password: String,
    },

    #[command(about = "Show the current session")]
    Session,
}

pub async fn handle(
    cmd: AuthCommands,
    output_format: OutputFormat,
    server: &str,
    token: Option<String>,
) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { email, password } => {
            let client = utils::api_client(&config::config().client, server, None)?;
            let body = json!({ "email": email, "password": password });

            match client.post_json("/auth/login", &body).await {
                Ok(response) => utils::output_success(
                    &output_format,
                    "Logged in",
                    Some(json!({
                        "token": response.get("token").cloned().unwrap_or(Value::Null),
                        "user": response.get("user").cloned().unwrap_or(Value::Null),
                    })),
                ),
                Err(e) => {
                    utils::output_error(&output_format, &e.to_string())?;
                    Err(anyhow::anyhow!("login failed"))
                }
            }
        }
        AuthCommands::Session => {
            let client = utils::api_client(&config::config().client, server, token)?;

            match client.get_json("/auth/session", &QueryOptions::new()).await {
                Ok(session) => utils::output_value(&output_format, &session),
                Err(e) => {
                    utils::output_error(&output_format, &e.to_string())?;
                    Err(anyhow::anyhow!("no active session"))
                }
            }
        }
    }
}
