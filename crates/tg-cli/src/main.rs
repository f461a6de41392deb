//! trustgap audit CLI

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tg_core::report::{self, ReportFormat};
use tg_core::verify::checks;
use tg_core::{ClaimSource, Engine, FsArtifactStore, RunConfig};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "tg-audit")]
#[command(about = "Claim verification and trust gap analysis")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full audit pipeline
    Run {
        /// Upstream claim document (JSON); repeatable
        #[arg(short, long = "source")]
        sources: Vec<PathBuf>,

        /// Audit manifest: artifact list, groups, backend policy
        #[arg(short, long)]
        manifest: PathBuf,

        /// Restrict the run to specific artifacts from the manifest
        #[arg(short, long = "artifact")]
        artifacts: Vec<String>,

        /// Artifact content root
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// Output format (json, markdown)
        #[arg(short, long, default_value = "markdown")]
        output: String,

        /// Write reports into this directory instead of stdout
        #[arg(short = 'O', long)]
        output_dir: Option<PathBuf>,

        /// Run extraction and verification but skip writing reports
        #[arg(long)]
        validate_only: bool,

        /// Worker threads for the per-artifact fan-out
        #[arg(long)]
        jobs: Option<usize>,
    },

    /// Show extracted claims without verifying
    Extract {
        /// Upstream claim document (JSON); repeatable
        #[arg(short, long = "source")]
        sources: Vec<PathBuf>,

        /// Audit manifest
        #[arg(short, long)]
        manifest: PathBuf,
    },

    /// List the registered checks
    Checks,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    match cli.command {
        Commands::Run {
            sources,
            manifest,
            artifacts,
            root,
            output,
            output_dir,
            validate_only,
            jobs,
        } => {
            cmd_run(sources, manifest, artifacts, root, output, output_dir, validate_only, jobs);
        }
        Commands::Extract { sources, manifest } => {
            cmd_extract(sources, manifest);
        }
        Commands::Checks => {
            cmd_checks();
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_run(
    source_paths: Vec<PathBuf>,
    manifest: PathBuf,
    scope: Vec<String>,
    root: PathBuf,
    output: String,
    output_dir: Option<PathBuf>,
    validate_only: bool,
    jobs: Option<usize>,
) {
    let config = load_config(&manifest, &scope, jobs);
    let sources = read_sources(&source_paths);

    let store = FsArtifactStore::with_timeout(
        root,
        Duration::from_millis(config.load_timeout_ms),
    );
    let engine = Engine::new(config, Box::new(store));

    let result = match engine.run(&sources) {
        Ok(result) => result,
        Err(e) => {
            error!("audit failed: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "audited {} artifacts: mean credibility {:.2}, {} gaps",
        result.aggregate.artifact_count,
        result.aggregate.mean_credibility,
        result.aggregate.gap_totals.total()
    );

    if validate_only {
        println!(
            "validate-only: {} artifacts, {} gaps, {} not found, {} claims dropped",
            result.aggregate.artifact_count,
            result.aggregate.gap_totals.total(),
            result.aggregate.not_found,
            result.aggregate.dropped_claims
        );
    } else {
        let format = parse_format(&output);
        if let Err(e) = emit_reports(&result, format, output_dir.as_deref()) {
            error!("failed to write reports: {}", e);
            std::process::exit(1);
        }
    }

    if result.aggregate.not_found > 0 {
        error!("{} artifacts could not be located", result.aggregate.not_found);
        std::process::exit(1);
    }
}

fn cmd_extract(source_paths: Vec<PathBuf>, manifest: PathBuf) {
    let config = load_config(&manifest, &[], None);
    let sources = read_sources(&source_paths);

    // The store is never queried during extraction.
    let engine = Engine::new(config, Box::new(FsArtifactStore::new(".")));
    let extraction = match engine.extract(&sources) {
        Ok(extraction) => extraction,
        Err(e) => {
            error!("extraction failed: {}", e);
            std::process::exit(1);
        }
    };

    println!("\nExtracted Claims\n{}", "=".repeat(50));
    for (artifact, claims) in &extraction.by_artifact {
        println!("\n{}: {} claims", artifact, claims.len());
        for (category, count) in claims.counts() {
            println!("  {}: {}", category, count);
        }
    }
    println!("\n{}", "=".repeat(50));
    println!(
        "{} claims dropped (unresolvable target), {} sources skipped (unparseable)",
        extraction.dropped_claims, extraction.skipped_sources
    );
}

fn cmd_checks() {
    println!("\nRegistered Checks\n{}", "=".repeat(50));

    println!("\nUniversal (run against every artifact):");
    for check in checks::universal_checks() {
        println!("  {} - {}", check.name(), check.description());
    }

    println!("\nClaim-bound (run when a matching claim exists):");
    println!("  routine_exists - a routine named by a resolution claim exists");

    println!("\nSynthetic:");
    println!("  artifact_present - artifact can be located and read");
}

/// Load the manifest into a run config, narrowing to the requested scope.
fn load_config(manifest: &Path, scope: &[String], jobs: Option<usize>) -> RunConfig {
    let raw = match std::fs::read_to_string(manifest) {
        Ok(raw) => raw,
        Err(e) => {
            error!("cannot read manifest {}: {}", manifest.display(), e);
            std::process::exit(1);
        }
    };

    let mut config: RunConfig = match serde_json::from_str(&raw) {
        Ok(config) => config,
        Err(e) => {
            error!("cannot parse manifest {}: {}", manifest.display(), e);
            std::process::exit(1);
        }
    };

    if !scope.is_empty() {
        for requested in scope {
            if !config.artifacts.iter().any(|a| a == requested) {
                error!("artifact {} is not in the manifest", requested);
                std::process::exit(1);
            }
        }
        config.artifacts.retain(|a| scope.iter().any(|s| s == a));
    }

    if let Some(jobs) = jobs {
        config.jobs = jobs;
    }

    config
}

/// Read claim sources; an unreadable file is skipped with a warning, the
/// engine handles unparseable content itself.
fn read_sources(paths: &[PathBuf]) -> Vec<ClaimSource> {
    let mut sources = Vec::new();
    for path in paths {
        match std::fs::read_to_string(path) {
            Ok(raw) => sources.push(ClaimSource::new(path.display().to_string(), raw)),
            Err(e) => warn!("skipping unreadable claim source {}: {}", path.display(), e),
        }
    }
    sources
}

fn parse_format(output: &str) -> ReportFormat {
    match output.to_lowercase().as_str() {
        "json" => ReportFormat::Json,
        _ => ReportFormat::Markdown,
    }
}

fn emit_reports(
    result: &tg_core::RunResult,
    format: ReportFormat,
    output_dir: Option<&Path>,
) -> std::io::Result<()> {
    let extension = match format {
        ReportFormat::Json => "json",
        ReportFormat::Markdown => "md",
    };

    match output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            for report in &result.reports {
                let name = format!(
                    "{}.{}",
                    report.artifact.replace(['/', '\\'], "_"),
                    extension
                );
                let rendered = report::generate_artifact(report, format)
                    .map_err(|e| std::io::Error::other(e.to_string()))?;
                std::fs::write(dir.join(name), rendered)?;
            }
            let aggregate = report::generate_aggregate(&result.aggregate, format)
                .map_err(|e| std::io::Error::other(e.to_string()))?;
            std::fs::write(dir.join(format!("aggregate.{}", extension)), aggregate)?;
            info!("reports written to {}", dir.display());
        }
        None => {
            for report in &result.reports {
                let rendered = report::generate_artifact(report, format)
                    .map_err(|e| std::io::Error::other(e.to_string()))?;
                println!("{}", rendered);
            }
            let aggregate = report::generate_aggregate(&result.aggregate, format)
                .map_err(|e| std::io::Error::other(e.to_string()))?;
            println!("{}", aggregate);
        }
    }

    Ok(())
}
