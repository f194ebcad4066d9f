use clap::Subcommand;
use serde_json::json;

use crate::app::AppState;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::services::SignupRequest;
use crate::tenancy::{ResolverPolicy, StoreNaming, TenantSlug};

#[derive(Subcommand)]
pub enum TenantCommands {
    #[command(about = "Show which tenant a Host header resolves to")]
    Resolve {
        #[arg(help = "Host header value, e.g. acme.localhost:3000")]
        host: String,
    },

    #[command(about = "Show the database name and connection target for a tenant")]
    StoreName {
        #[arg(help = "Tenant slug")]
        slug: String,
    },

    #[command(about = "Provision a tenant database and register it")]
    Provision {
        #[arg(help = "Tenant slug")]
        slug: String,
        #[arg(long, help = "Display name (defaults to the slug)")]
        name: Option<String>,
    },

    #[command(about = "List tenants in the master registry")]
    List,

    #[command(about = "Mark a tenant active")]
    Activate {
        #[arg(help = "Tenant slug")]
        slug: String,
    },

    #[command(about = "Mark a tenant inactive; its requests are rejected")]
    Deactivate {
        #[arg(help = "Tenant slug")]
        slug: String,
    },
}

pub async fn handle(cmd: TenantCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TenantCommands::Resolve { host } => {
            let policy = ResolverPolicy::from_config(&config.tenancy)?;
            let slug = policy.resolve(Some(&host));
            output_value(&output_format, "tenant", slug.as_str())
        }
        TenantCommands::StoreName { slug } => {
            let slug = TenantSlug::parse(&slug)?;
            let naming = StoreNaming::from_config(&config.database, &config.tenancy)?;
            let store = naming.store_name(&slug)?;

            match output_format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&json!({
                            "tenant": slug,
                            "store": store,
                            "default_store": naming.is_default_alias(&slug),
                        }))?
                    );
                }
                OutputFormat::Text => println!("{}", store),
            }
            Ok(())
        }
        TenantCommands::Provision { slug, name } => {
            let state = AppState::from_config(config)?;
            let result = state
                .tenants
                .sign_up(SignupRequest {
                    tenant_slug: slug,
                    display_name: name,
                })
                .await?;

            output_success(
                &output_format,
                &format!("Provisioned tenant '{}' in database {}", result.tenant.slug, result.store),
                Some(serde_json::to_value(&result)?),
            )
        }
        TenantCommands::List => {
            let state = AppState::from_config(config)?;
            let tenants = state.tenants.list().await?;

            if tenants.is_empty() {
                return output_empty_collection(&output_format, "tenants", "No tenants registered");
            }

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "tenants": tenants }))?);
                }
                OutputFormat::Text => {
                    println!("{:<20} {:<30} {:<8} {}", "SLUG", "DISPLAY NAME", "ACTIVE", "CREATED");
                    println!("{}", "-".repeat(80));

                    for tenant in &tenants {
                        println!(
                            "{:<20} {:<30} {:<8} {}",
                            tenant.slug,
                            tenant.display_name,
                            if tenant.is_active { "yes" } else { "no" },
                            tenant.created_at.format("%Y-%m-%d %H:%M")
                        );
                    }
                }
            }
            Ok(())
        }
        TenantCommands::Activate { slug } => set_active(config, &slug, true, &output_format).await,
        TenantCommands::Deactivate { slug } => set_active(config, &slug, false, &output_format).await,
    }
}

async fn set_active(config: &AppConfig, slug: &str, active: bool, output_format: &OutputFormat) -> anyhow::Result<()> {
    let slug = TenantSlug::parse(slug)?;
    let state = AppState::from_config(config)?;
    let entry = state.tenants.set_active(&slug, active).await?;

    let verb = if active { "Activated" } else { "Deactivated" };
    output_success(
        output_format,
        &format!("{} tenant '{}'", verb, entry.slug),
        Some(serde_json::to_value(&entry)?),
    )
}
