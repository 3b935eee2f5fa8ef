use crate::cli::OutputFormat;
use crate::client::ApiClient;
use crate::config::ClientConfig;
use serde_json::{json, Value};
use std::time::Duration;

/// Build the CLI's `ApiClient` from the configured client section: dedup
/// window, request timeout, and the session token when one is set.
pub fn api_client(
    cfg: &ClientConfig,
    server: &str,
    token: Option<String>,
) -> anyhow::Result<ApiClient> {
    let mut client = ApiClient::new(server)
        .with_dedup_window(Duration::from_millis(cfg.dedup_window_ms))
        .with_timeout(Duration::from_secs(cfg.timeout_secs))?;
    if let Some(token) = token {
        client = client.with_token(token);
    }
    Ok(client)
}

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let Some(Value::Object(map)) = data {
                if let Some(obj) = response.as_object_mut() {
                    obj.extend(map);
                }
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "success": false,
                    "error": message
                }))?
            );
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Output a fetched payload in the appropriate format
pub fn output_value(output_format: &OutputFormat, value: &Value) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        OutputFormat::Text => match value {
            Value::Array(items) => {
                for item in items {
                    println!("{}", serde_json::to_string(item)?);
                }
            }
            other => println!("{}", serde_json::to_string_pretty(other)?),
        },
    }
    Ok(())
}
