mod db;
mod errors;
mod models;
mod monitor;
mod notify;
mod period;
mod progress;
mod run;
mod util;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    init_tracing();
    let mut args: Vec<String> = std::env::args().collect();
    if args.len() == 1 {
        args.push("status".into());
    }
    let db_path = get_db_path()?;
    let mut db = db::Database::open(&db_path)?;
    run::as_cli(&args, &mut db)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("budgetwatch=info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn get_db_path() -> Result<std::path::PathBuf> {
    if let Some(path) = std::env::var_os("BUDGETWATCH_DB") {
        return Ok(path.into());
    }
    let proj_dirs = directories::ProjectDirs::from("com", "budgetwatch", "budgetwatch")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    Ok(data_dir.join("budgetwatch.db"))
}
