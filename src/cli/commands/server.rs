use clap::Subcommand;

use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Start the gateway server")]
    Start {
        #[arg(long, help = "Port to listen on (overrides config)")]
        port: Option<u16>,
    },
}

pub async fn handle(cmd: ServerCommands, _output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Start { port } => crate::handlers::serve(port).await,
    }
}
