use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_empty_collection, output_success};
use crate::cli::OutputFormat;
use crate::services::university::{
    check_university_tables, drop_university, get_university, list_universities, register_university,
    AdminAccount,
};

#[derive(Subcommand)]
pub enum UniversityCommands {
    #[command(about = "Provision a new university schema with its first administrator")]
    Register {
        #[arg(long, help = "Display name of the university")]
        name: String,

        #[arg(long, help = "MySQL schema that will hold the university data")]
        schema: String,

        #[arg(long, help = "Administrator display name")]
        admin_name: String,

        #[arg(long, help = "Administrator email")]
        admin_email: String,

        #[arg(long, env = "UNI_ADMIN_PASSWORD", hide_env_values = true, help = "Administrator password")]
        admin_password: String,
    },

    #[command(about = "List registered universities")]
    List,

    #[command(about = "Show one university from the directory")]
    Show {
        #[arg(help = "University schema name")]
        schema: String,
    },

    #[command(about = "Check that a university schema has every expected table")]
    Check {
        #[arg(help = "University schema name")]
        schema: String,
    },

    #[command(about = "Drop a university schema and its directory record")]
    Drop {
        #[arg(help = "University schema name")]
        schema: String,

        #[arg(long, help = "Confirm the irreversible drop")]
        yes: bool,
    },
}

pub async fn handle(cmd: UniversityCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UniversityCommands::Register {
            name,
            schema,
            admin_name,
            admin_email,
            admin_password,
        } => {
            let admin = AdminAccount {
                name: admin_name,
                email: admin_email,
                password: admin_password,
            };
            let registration = register_university(&name, &schema, &admin).await?;

            output_success(
                &output_format,
                &format!(
                    "University '{}' registered in schema '{}' (admin {})",
                    registration.university.name, registration.university.schema_name, registration.admin.email
                ),
                Some(serde_json::to_value(&registration)?),
            )
        }

        UniversityCommands::List => {
            let universities = list_universities().await?;

            if universities.is_empty() {
                return output_empty_collection(&output_format, "universities", "No universities registered");
            }

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "universities": universities }))?);
                }
                OutputFormat::Text => {
                    println!("{:<6} {:<32} {:<24} {}", "ID", "NAME", "SCHEMA", "CREATED");
                    for university in &universities {
                        println!(
                            "{:<6} {:<32} {:<24} {}",
                            university.id,
                            university.name,
                            university.schema_name,
                            university.created_at.format("%Y-%m-%d %H:%M")
                        );
                    }
                }
            }
            Ok(())
        }

        UniversityCommands::Show { schema } => {
            let university = get_university(&schema).await?;

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&university)?);
                }
                OutputFormat::Text => {
                    println!("Name: {}", university.name);
                    println!("Schema: {}", university.schema_name);
                    println!("Created: {}", university.created_at.to_rfc3339());
                    println!("Updated: {}", university.updated_at.to_rfc3339());
                }
            }
            Ok(())
        }

        UniversityCommands::Check { schema } => {
            let missing = check_university_tables(&schema).await?;

            if missing.is_empty() {
                return output_success(
                    &output_format,
                    &format!("University schema '{}' is complete", schema),
                    Some(json!({ "schema": schema, "missing_tables": [] })),
                );
            }

            match output_format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&json!({
                            "success": false,
                            "schema": schema,
                            "missing_tables": missing,
                        }))?
                    );
                }
                OutputFormat::Text => {
                    println!("University schema '{}' is missing tables:", schema);
                    for table in &missing {
                        println!("  - {}", table);
                    }
                }
            }
            Err(anyhow::anyhow!("{} table(s) missing in '{}'", missing.len(), schema))
        }

        UniversityCommands::Drop { schema, yes } => {
            if !yes {
                return Err(anyhow::anyhow!(
                    "Refusing to drop '{}' without --yes; this deletes every record of the university",
                    schema
                ));
            }

            drop_university(&schema).await?;
            output_success(
                &output_format,
                &format!("University schema '{}' dropped", schema),
                Some(json!({ "schema": schema })),
            )
        }
    }
}
