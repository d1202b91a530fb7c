/// OTA Sentry CLI - operator front-end for the lockdown engine.
///
/// Provides status, enforce and cloud-control commands over the core.
use anyhow::Result;
use clap::{Parser, Subcommand};
use otasentry_core::cache::{assess_cache, CacheValidity, SnapshotCache};
use otasentry_core::catalog::{self, Catalog, CloudCatalog};
use otasentry_core::enforce;
use otasentry_core::events::LogSink;
use otasentry_core::executor::SuRunner;
use otasentry_core::interception::{Detached, InterceptionLayer};
use otasentry_core::types::{CloudSnapshot, EnforcementOutcome, StatusSnapshot};
use otasentry_core::verdict;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "otasentry")]
#[command(about = "Audit and enforce the device OTA/cloud lockdown policy", long_about = None)]
struct Cli {
    /// Path to an OTA catalog YAML file (defaults to the built-in catalog)
    #[arg(long, global = true)]
    catalog: Option<String>,

    /// Path to a cloud-component catalog YAML file
    #[arg(long, global = true)]
    cloud_catalog: Option<String>,

    /// Privileged command timeout in seconds
    #[arg(long, global = true, default_value_t = 15)]
    timeout_secs: u64,

    /// Output machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current protection status (cache-aware)
    Status {
        /// Force a fresh probe even when the cached snapshot is trusted
        #[arg(long)]
        fresh: bool,
    },
    /// Disable every monitored package and pin every monitored setting
    Enforce,
    /// Cloud-component scanning and control
    Cloud {
        #[command(subcommand)]
        command: CloudCommands,
    },
}

#[derive(Subcommand)]
enum CloudCommands {
    /// Scan installed cloud components against the catalog
    Scan,
    /// Disable every component marked safe to disable (uses the last scan)
    DisableSafe,
    /// Uninstall every component marked safe to disable (uses the last scan)
    UninstallSafe,
    /// Disable one component for the current user
    Disable { package: String },
    /// Re-enable one component
    Enable { package: String },
    /// Uninstall one component for the current user (restorable)
    Uninstall { package: String },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let runner = SuRunner::with_timeout(Duration::from_secs(cli.timeout_secs));
    let cache = SnapshotCache::open_default()?;
    let events = LogSink;

    match &cli.command {
        Commands::Status { fresh } => {
            let catalog = load_ota_catalog(cli.catalog.as_deref())?;
            let interception = Detached;
            let snapshot = if *fresh {
                let snapshot = verdict::evaluate(&catalog, &runner, &interception, &events);
                cache.save_status(&snapshot)?;
                snapshot
            } else {
                let cached = cache.load_status();
                match (assess_cache(cached.as_ref(), interception.is_active()), cached) {
                    (CacheValidity::Trusted, Some(snapshot)) => snapshot,
                    (validity, _) => {
                        log::info!("[CLI] cache not usable ({:?}), probing", validity);
                        let snapshot =
                            verdict::evaluate(&catalog, &runner, &interception, &events);
                        cache.save_status(&snapshot)?;
                        snapshot
                    }
                }
            };
            print_status(&snapshot, cli.json)?;
        }
        Commands::Enforce => {
            let catalog = load_ota_catalog(cli.catalog.as_deref())?;
            let outcomes = enforce::enforce(&catalog, &runner, &events);
            print_outcomes(&outcomes, cli.json)?;
            // Refresh the cached snapshot so the next status reflects reality.
            let snapshot = verdict::evaluate(&catalog, &runner, &Detached, &events);
            cache.save_status(&snapshot)?;
        }
        Commands::Cloud { command } => {
            let catalog = load_cloud_catalog(cli.cloud_catalog.as_deref())?;
            run_cloud(command, &catalog, &runner, &cache, cli.json)?;
        }
    }

    Ok(())
}

fn run_cloud(
    command: &CloudCommands,
    catalog: &CloudCatalog,
    runner: &SuRunner,
    cache: &SnapshotCache,
    json: bool,
) -> Result<()> {
    let events = LogSink;

    match command {
        CloudCommands::Scan => {
            let snapshot = verdict::scan_cloud(catalog, runner, &events);
            cache.save_cloud(&snapshot)?;
            print_cloud(&snapshot, json)?;
        }
        CloudCommands::DisableSafe => {
            let outcomes = enforce::disable_all_safe(cache, runner, &events);
            if outcomes.is_empty() && !json {
                println!("Nothing to do (run `cloud scan` first).");
            }
            print_outcomes(&outcomes, json)?;
        }
        CloudCommands::UninstallSafe => {
            let outcomes = enforce::uninstall_all_safe(cache, runner, &events);
            if outcomes.is_empty() && !json {
                println!("Nothing to do (run `cloud scan` first).");
            }
            print_outcomes(&outcomes, json)?;
        }
        CloudCommands::Disable { package } => {
            report_single(enforce::disable_package(runner, &events, package), package)?;
        }
        CloudCommands::Enable { package } => {
            report_single(enforce::enable_package(runner, &events, package), package)?;
        }
        CloudCommands::Uninstall { package } => {
            report_single(
                enforce::uninstall_package(runner, &events, package),
                package,
            )?;
        }
    }
    Ok(())
}

fn load_ota_catalog(path: Option<&str>) -> Result<Catalog> {
    match path {
        Some(path) => Ok(catalog::load_catalog(path)?),
        None => Ok(Catalog::builtin_ota()),
    }
}

fn load_cloud_catalog(path: Option<&str>) -> Result<CloudCatalog> {
    match path {
        Some(path) => Ok(catalog::load_cloud_catalog(path)?),
        None => Ok(CloudCatalog::builtin()),
    }
}

fn print_status(snapshot: &StatusSnapshot, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        return Ok(());
    }

    println!(
        "Root: {}   Interception layer: {}",
        yes_no(snapshot.has_root),
        if snapshot.interception_active { "active" } else { "inactive" }
    );
    println!("\nPackages:");
    for pkg in &snapshot.packages {
        println!(
            "  [{}] {} ({}) - {}",
            pass_fail(pkg.compliant),
            pkg.label,
            pkg.id,
            pkg.raw_state
        );
    }
    println!("\nSettings:");
    for setting in &snapshot.settings {
        println!(
            "  [{}] {} = {} (expected {})",
            pass_fail(setting.compliant),
            setting.key,
            setting.current_value,
            setting.expected_value
        );
    }
    println!(
        "\nOverall: {}",
        if snapshot.overall_compliant {
            "all protections in place"
        } else {
            "UNPROTECTED update channels remain"
        }
    );
    Ok(())
}

fn print_cloud(snapshot: &CloudSnapshot, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        return Ok(());
    }

    if !snapshot.has_root {
        println!("No root access; cloud scan unavailable.");
        return Ok(());
    }
    for pkg in &snapshot.packages {
        println!(
            "  [{}] {} ({}) - {}{}",
            pass_fail(pkg.compliant),
            pkg.label,
            pkg.id,
            pkg.category.label(),
            if pkg.safe_to_disable { ", safe to disable" } else { "" }
        );
    }
    println!(
        "\n{} components, {} disabled, {} safe to disable",
        snapshot.packages.len(),
        snapshot.disabled_count(),
        snapshot.safe_count()
    );
    Ok(())
}

fn print_outcomes(outcomes: &[EnforcementOutcome], json: bool) -> Result<()> {
    if json {
        let rows: Vec<serde_json::Value> = outcomes
            .iter()
            .map(|o| {
                serde_json::json!({
                    "target": o.target,
                    "success": o.success,
                    "detail": o.detail,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    for outcome in outcomes {
        println!("  [{}] {}", pass_fail(outcome.success), outcome);
    }
    Ok(())
}

fn report_single(success: bool, package: &str) -> Result<()> {
    if success {
        println!("{}: ok", package);
        Ok(())
    } else {
        Err(anyhow::anyhow!("operation failed for {}", package))
    }
}

fn yes_no(v: bool) -> &'static str {
    if v {
        "yes"
    } else {
        "no"
    }
}

fn pass_fail(v: bool) -> &'static str {
    if v {
        "OK"
    } else {
        "FAIL"
    }
}
