pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "uni")]
#[command(about = "Administration CLI for the University API - directory and university schemas")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Create the directory database and its tables")]
    Init,

    #[command(about = "University provisioning and inspection")]
    University {
        #[command(subcommand)]
        cmd: commands::university::UniversityCommands,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    let result = match cli.command {
        Commands::Init => commands::init::handle(output_format).await,
        Commands::University { cmd } => commands::university::handle(cmd, output_format).await,
    };

    crate::database::DatabaseManager::close_all().await;
    result
}
