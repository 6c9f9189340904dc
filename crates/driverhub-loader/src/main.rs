use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use driverhub_loader::{DriverLoader, DriverSummary, LibraryResolver};
use driverhub_sdk::HostApp;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "driverhub-loader")]
struct Args {
    /// Directories whose subdirectories are loaded as drivers
    #[arg(value_name = "PATH", required = true)]
    paths: Vec<PathBuf>,

    /// Root directory for persisted driver configuration
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Print the loaded drivers as JSON
    #[arg(long)]
    json: bool,
}

fn default_config_dir() -> Result<PathBuf> {
    let mut dir = dirs::config_dir().context("no config directory")?;
    dir.push("driverhub");
    dir.push("drivers");
    Ok(dir)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init()
        .ok();

    let args = Args::parse();
    let config_dir = match args.config_dir {
        Some(dir) => dir,
        None => default_config_dir()?,
    };

    let loader = DriverLoader::new(
        Arc::new(HostApp::default()),
        config_dir,
        LibraryResolver::new(),
        args.paths,
    );

    let mut summaries: Vec<DriverSummary> = loader
        .drivers()
        .values()
        .map(|driver| driver.summary())
        .collect();
    summaries.sort_by(|a, b| a.name.cmp(&b.name));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else if summaries.is_empty() {
        println!("No drivers loaded.");
    } else {
        for driver in summaries {
            match driver.version {
                Some(version) => println!("{} {version} ({})", driver.name, driver.path.display()),
                None => println!("{} ({})", driver.name, driver.path.display()),
            }
        }
    }
    Ok(())
}
