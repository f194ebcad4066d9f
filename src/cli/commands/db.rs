use clap::Subcommand;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::{PgConnector, PgTenantDirectory};

#[derive(Subcommand)]
pub enum DbCommands {
    #[command(about = "Create the master tenant registry table if missing")]
    Bootstrap,
}

pub async fn handle(cmd: DbCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        DbCommands::Bootstrap => {
            let master = PgConnector::from_config(&config.database).master(&config.database)?;
            PgTenantDirectory::new(master).bootstrap().await?;
            output_success(&output_format, "Master tenant registry ready", None)
        }
    }
}
