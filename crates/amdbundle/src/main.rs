//! amdbundle CLI entry point
//!
//! Loads a module manifest and a bundle configuration, resolves the requested
//! bundles and prints the resolved sections as TOML.

use std::{
    io::{self, Write},
    path::PathBuf,
};

use amdbundle::{
    BundleResolver, ResolvedBundleDefinition,
    config::{Config, ModuleManifest},
};
use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{info, warn};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "amdbundle", version, about = "Resolve the module content of bundle definitions")]
struct Cli {
    /// Module manifest describing the pool
    #[arg(short, long)]
    modules: PathBuf,

    /// Bundle configuration
    #[arg(short, long)]
    config: PathBuf,

    /// Only resolve the bundle with this name (repeatable)
    #[arg(short, long = "bundle")]
    bundles: Vec<String>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct Report<'a> {
    bundle: Vec<ResolvedBundleDefinition<'a>>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let pool = ModuleManifest::load(&cli.modules)?.into_registry();
    if pool.is_empty() {
        warn!("Module manifest {} lists no modules", cli.modules.display());
    } else {
        info!("Module pool has {} module(s)", pool.len());
    }
    let config = Config::load(&cli.config)?;

    let mut selected = Vec::new();
    if cli.bundles.is_empty() {
        selected.extend(config.bundles.iter());
    } else {
        for name in &cli.bundles {
            match config.bundle(name) {
                Some(bundle) => selected.push(bundle),
                None => bail!("Bundle '{name}' is not defined in {}", cli.config.display()),
            }
        }
    }

    let resolver = BundleResolver::new(&pool);
    let mut report = Report {
        bundle: Vec::with_capacity(selected.len()),
    };
    for bundle in selected {
        info!("Resolving bundle {}", bundle.name);
        let resolved = resolver
            .resolve(bundle, None)
            .with_context(|| format!("Failed to resolve bundle {}", bundle.name))?;
        info!(
            "Resolved bundle {} into {} section(s)",
            resolved.name(),
            resolved.sections().len()
        );
        report.bundle.push(resolved);
    }

    let rendered = toml::to_string(&report).context("Failed to render resolution report")?;
    io::stdout().lock().write_all(rendered.as_bytes())?;
    Ok(())
}
