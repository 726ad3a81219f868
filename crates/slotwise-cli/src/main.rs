//! slotwise CLI - inspect and convert product configuration documents
//!
//! `info` and `upgrade` work on the document alone. `normalize` and `view`
//! resolve object references against a catalog file, the same way the editor
//! and viewer do.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use slotwise_catalog::MemoryCatalog;
use slotwise_ir::ConfigDocument;
use slotwise_state::{ConfiguratorState, ImportReport, ViewerState};

mod logging;

use logging::{init_logging, LogConfig, LogFormat};

#[derive(Parser)]
#[command(name = "slotwise", version)]
#[command(about = "Inspect, upgrade and preview product configuration documents", long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    /// Write logs to a file instead of stderr
    #[arg(long, value_name = "PATH", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the shape and size of a configuration document
    Info {
        /// Configuration JSON file
        file: PathBuf,
    },
    /// Rewrite a legacy single-variant document in the current format
    Upgrade {
        /// Configuration JSON file
        file: PathBuf,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import through the catalog and write the canonical export
    Normalize {
        /// Configuration JSON file
        file: PathBuf,
        /// Catalog JSON file
        #[arg(short, long, env = "SLOTWISE_CATALOG")]
        catalog: PathBuf,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Play a configuration back the way the viewer shows it
    View {
        /// Configuration JSON file
        file: PathBuf,
        /// Catalog JSON file
        #[arg(short, long, env = "SLOTWISE_CATALOG")]
        catalog: PathBuf,
        /// Variant to show (0-based)
        #[arg(long, default_value_t = 0)]
        variant: usize,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig {
        format: cli.log_format,
        log_file: cli.log_file.clone(),
        ..LogConfig::from_flags(cli.verbose, cli.quiet)
    };
    init_logging(&log_config).context("failed to initialize logging")?;

    match cli.command {
        Commands::Info { file } => show_info(&file).await?,
        Commands::Upgrade { file, output } => upgrade(&file, output.as_deref()).await?,
        Commands::Normalize {
            file,
            catalog,
            output,
        } => normalize(&file, &catalog, output.as_deref()).await?,
        Commands::View {
            file,
            catalog,
            variant,
        } => view(&file, &catalog, variant).await?,
    }

    Ok(())
}

async fn read_document(path: &Path) -> Result<ConfigDocument> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    ConfigDocument::from_json(&json).with_context(|| format!("{} is not a configuration document", path.display()))
}

fn load_catalog(path: &Path) -> Result<MemoryCatalog> {
    let catalog = MemoryCatalog::load(path).with_context(|| format!("failed to load catalog {}", path.display()))?;
    tracing::info!(objects = catalog.len(), path = %path.display(), "catalog loaded");
    Ok(catalog)
}

async fn write_output(output: Option<&Path>, json: &str) -> Result<()> {
    match output {
        Some(path) => {
            tokio::fs::write(path, format!("{json}\n"))
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

async fn show_info(file: &Path) -> Result<()> {
    let doc = read_document(file).await?;
    let summary = doc.summary();

    println!("slotwise document: {}", file.display());
    println!(
        "  Format: {}",
        if summary.legacy { "legacy (single variant)" } else { "versioned" }
    );
    println!("  Version: {}", summary.version);
    println!("  Environment: {}", if summary.has_environment { "yes" } else { "no" });
    println!("  Variants: {}", summary.variants.len());

    for (i, variant) in summary.variants.iter().enumerate() {
        println!(
            "  {}: {} ({} steps, {} slots, {} objects)",
            i, variant.name, variant.steps, variant.slots, variant.objects
        );
    }

    Ok(())
}

async fn upgrade(file: &Path, output: Option<&Path>) -> Result<()> {
    let doc = read_document(file).await?;
    if !doc.is_legacy() {
        tracing::info!(version = doc.version(), "document is already versioned");
    }
    let json = doc.into_versioned().to_json()?;
    write_output(output, &json).await
}

async fn normalize(file: &Path, catalog: &Path, output: Option<&Path>) -> Result<()> {
    let doc = read_document(file).await?;
    let catalog = load_catalog(catalog)?;

    let mut state = ConfiguratorState::new();
    let report = state.import_document(doc, &catalog).await;
    print_report(&report);

    let json = state.export_json()?;
    write_output(output, &json).await
}

fn print_report(report: &ImportReport) {
    eprintln!(
        "Imported {} variants, {} steps, {} slots, {} objects",
        report.variants, report.steps, report.slots, report.objects
    );
    if report.dropped > 0 {
        eprintln!("  Dropped {} unresolvable object references", report.dropped);
    }
    if report.environment_dropped {
        eprintln!("  Dropped the unresolvable environment");
    }
}

async fn view(file: &Path, catalog: &Path, variant: usize) -> Result<()> {
    let doc = read_document(file).await?;
    let catalog = load_catalog(catalog)?;

    let mut viewer = ViewerState::new();
    let report = viewer.load_config(doc, &catalog).await;
    print_report(&report);

    if !viewer.set_variant(variant) {
        anyhow::bail!(
            "variant {} out of range (document has {})",
            variant,
            viewer.variants().len()
        );
    }

    let shown = &viewer.variants()[variant];
    println!("Variant {}: {}", variant, shown.name);
    if let Some(env) = viewer.environment() {
        println!("  Environment: {} ({})", env.name, env.uuid);
    }

    for step in 0..viewer.steps().len() {
        viewer.set_step(step);
        let Some(current) = viewer.current_step() else {
            continue;
        };
        println!("\nStep {}: {}", step + 1, current.name);
        for (_, slot) in viewer.slots_in_current_step() {
            match slot.selected_object() {
                Some(obj) => {
                    let material = obj.color_name(obj.selected_material).unwrap_or("-");
                    let mesh = obj.render_request().glb_url().unwrap_or("no mesh").to_string();
                    println!("  {}: {} [{}] {}", slot.name, obj.name, material, mesh);
                }
                None => println!("  {}: (empty)", slot.name),
            }
        }
    }

    Ok(())
}
