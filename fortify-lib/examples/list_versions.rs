//! Lists application versions with their owning application.
//!
//! Run with: cargo run --example list_versions -- [application]
//!
//! Requires .env file with:
//! - FORTIFY_URL
//! - FORTIFY_USERNAME and FORTIFY_PASSWORD (optionally FORTIFY_TENANT), or
//!   FORTIFY_CLIENT_ID and FORTIFY_CLIENT_SECRET

use fortify_lib::FortifyClient;
use fortify_lib::api::query::OrderBy;
use fortify_lib::config::ConnectionConfig;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::SimpleLogger;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    SimpleLogger::init(LevelFilter::Debug, Config::default())?;

    let config = ConnectionConfig::from_env()?;
    let client = FortifyClient::from_config(&config)?;

    let mut query = client
        .application_versions()
        .fields(["id", "name", "project"])
        .order_by(OrderBy::asc("name"))
        .max_results(20)
        .on_demand_application();
    if let Some(application) = std::env::args().nth(1) {
        query = query.application_name(application);
    }

    let versions = query.get_all().await?;
    println!("Found {} application versions\n", versions.len());

    for version in &versions {
        let application = version.on_demand("application").await?;
        let created = application
            .as_ref()
            .and_then(|a| a.get("creationDate"))
            .and_then(|d| d.as_str())
            .unwrap_or("-");
        println!(
            "{:>8}  {} / {}  (application created {})",
            version.get_text("id").unwrap_or_default(),
            version.get_str("project.name").unwrap_or("?"),
            version.get_str("name").unwrap_or("?"),
            created
        );
    }

    Ok(())
}
