use clap::Subcommand;
use serde_json::Value;
use std::io::Read;

use crate::cli::{utils, OutputFormat};
use crate::client::QueryOptions;
use crate::config;

#[derive(Subcommand)]
pub enum ResourceCommands {
    #[command(about = "Select item(s) from a resource")]
    Select {
        #[arg(help = "Resource endpoint, e.g. products")]
        endpoint: String,
        #[arg(help = "Item ID to retrieve (optional)")]
        id: Option<String>,
        #[arg(long, help = "JSON object of query parameters")]
        query: Option<String>,
    },

    #[command(about = "Create an item from stdin")]
    Create {
        #[arg(help = "Resource endpoint")]
        endpoint: String,
    },

    #[command(about = "Update an item from stdin")]
    Update {
        #[arg(help = "Resource endpoint")]
        endpoint: String,
        #[arg(help = "Item ID to update")]
        id: String,
    },

    #[command(about = "Delete an item")]
    Delete {
        #[arg(help = "Resource endpoint")]
        endpoint: String,
        #[arg(help = "Item ID to delete")]
        id: String,
    },
}

pub async fn handle(
    cmd: ResourceCommands,
    output_format: OutputFormat,
    server: &str,
    token: Option<String>,
) -> anyhow::Result<()> {
    let client = utils::api_client(&config::config().client, server, token)?;

    match cmd {
        ResourceCommands::Select { endpoint, id, query } => {
            let options = parse_query(query.as_deref())?;
            let path = match &id {
                Some(id) => format!("/resource/{}/{}", endpoint, id),
                None => format!("/resource/{}", endpoint),
            };

            let data = client.get_json(&path, &options).await?;
            utils::output_value(&output_format, &data)
        }
        ResourceCommands::Create { endpoint } => {
            let body = read_stdin_json()?;
            let created = client
                .post_json(&format!("/resource/{}", endpoint), &body)
                .await?;
            utils::output_success(
                &output_format,
                &format!("Created item in '{}'", endpoint),
                Some(serde_json::json!({ "item": created })),
            )
        }
        ResourceCommands::Update { endpoint, id } => {
            let body = read_stdin_json()?;
            let updated = client
                .put_json(&format!("/resource/{}/{}", endpoint, id), &body)
                .await?;
            utils::output_success(
                &output_format,
                &format!("Updated item {} in '{}'", id, endpoint),
                Some(serde_json::json!({ "item": updated })),
            )
        }
        ResourceCommands::Delete { endpoint, id } => {
            client
                .delete_json(&format!("/resource/{}/{}", endpoint, id))
                .await?;
            utils::output_success(
                &output_format,
                &format!("Deleted item {} from '{}'", id, endpoint),
                None,
            )
        }
    }
}

fn parse_query(query: Option<&str>) -> anyhow::Result<QueryOptions> {
    let mut options = QueryOptions::new();
    let Some(raw) = query else {
        return Ok(options);
    };

    let parsed: Value = serde_json::from_str(raw)
        .map_err(|e| anyhow::anyhow!("--query must be a JSON object: {}", e))?;
    let Value::Object(map) = parsed else {
        anyhow::bail!("--query must be a JSON object");
    };

    for (key, value) in map {
        options = match key.as_str() {
            "fields" => options.with_fields_value(value),
            "populate" => options.with_populate(value),
            "filters" => options.with_filters(value),
            "sort" => options.with_sort(value),
            "pagination" => options.with_pagination(value),
            _ => options.with_param(key, value),
        };
    }
    Ok(options)
}

fn read_stdin_json() -> anyhow::Result<Value> {
    let mut raw = String::new();
    std::io::stdin().read_to_string(&mut raw)?;
    serde_json::from_str(&raw).map_err(|e| anyhow::anyhow!("stdin is not valid JSON: {}", e))
}
