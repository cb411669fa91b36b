use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::Executor;

use crate::config;
use crate::database::store::EntityStore;
use crate::database::PgStore;
use crate::permissions;
use crate::rpc::build_registry;

#[derive(Parser)]
#[command(name = "beeno")]
#[command(about = "Beeno CLI - operational tooling for the card platform API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply db/schema.sql and seed the role catalog")]
    Init,

    #[command(about = "Seed the role catalog (idempotent)")]
    Seed,

    #[command(about = "List every registered RPC procedure")]
    Procedures,

    #[command(about = "Check a running server's /health endpoint")]
    Health {
        #[arg(long, help = "Base URL of the server, e.g. http://localhost:3000")]
        url: Option<String>,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Init => init().await,
        Commands::Seed => seed().await,
        Commands::Procedures => procedures(),
        Commands::Health { url } => health(url).await,
    }
}

/// Applies the schema (idempotent DDL) and seeds the role catalog.
async fn init() -> anyhow::Result<()> {
    let store = connect()?;

    store
        .pool()
        .execute(include_str!("../../db/schema.sql"))
        .await
        .context("failed to apply db/schema.sql")?;
    println!("schema applied");

    seed_catalog(&store).await
}

async fn seed() -> anyhow::Result<()> {
    let store = connect()?;
    seed_catalog(&store).await
}

async fn seed_catalog(store: &PgStore) -> anyhow::Result<()> {
    let catalog = permissions::role_catalog();
    store
        .seed_roles(&catalog)
        .await
        .context("failed to seed the role catalog")?;

    for record in &catalog {
        println!("role {:<14} {}", record.title, record.description);
    }
    Ok(())
}

fn procedures() -> anyhow::Result<()> {
    let registry = build_registry();
    for (name, kind) in registry.names() {
        println!("{:<9} {}", kind.as_str(), name);
    }
    Ok(())
}

async fn health(url: Option<String>) -> anyhow::Result<()> {
    let base =
        url.unwrap_or_else(|| format!("http://localhost:{}", config::config().server.port));

    let response = reqwest::get(format!("{}/health", base))
        .await
        .with_context(|| format!("could not reach {}", base))?;
    let status = response.status();
    let body: serde_json::Value = response
        .json()
        .await
        .context("health endpoint did not return JSON")?;

    println!(
        "{} -> {} (database: {})",
        base,
        body["data"]["status"].as_str().unwrap_or("unknown"),
        body["data"]["database"].as_str().unwrap_or("unreachable")
    );

    if !status.is_success() {
        anyhow::bail!("server reported {}", status);
    }
    Ok(())
}

fn connect() -> anyhow::Result<PgStore> {
    let db = &config::config().database;
    PgStore::connect(db).map_err(|e| anyhow::anyhow!("failed to create database pool: {}", e))
}
