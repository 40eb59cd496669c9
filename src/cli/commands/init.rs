use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config;
use crate::services::university::init_directory;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    init_directory().await?;

    let global_db = &config::config().database.global_db_name;
    output_success(
        &output_format,
        &format!("Directory database '{}' is ready", global_db),
        Some(json!({ "global_db": global_db })),
    )
}
