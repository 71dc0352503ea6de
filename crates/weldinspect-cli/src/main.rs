//! weldinspect CLI — command-line interface for weld-part inspection.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use weldinspect::{
    inspect_frame, ImageFileSource, InspectionConfig, InspectionResult, InspectionSession,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "weldinspect")]
#[command(about = "Inspect welded parts: mounting holes, weld seams and spatter (OK/NOK)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect frames and save annotated images plus the order record.
    Inspect(CliInspectArgs),

    /// Run feature extraction and classification on one image, without saving.
    Extract(CliExtractArgs),

    /// Print the default configuration or validate a configuration file.
    Config(CliConfigArgs),
}

#[derive(Debug, Clone, Args)]
struct CliInspectArgs {
    /// Input images, processed in order as one frame each.
    #[arg(long, required = true, num_args = 1..)]
    image: Vec<PathBuf>,

    /// Order number; selects the output sub-directory and record file.
    #[arg(long)]
    order: String,

    /// Operator name written to every record row.
    #[arg(long)]
    user: String,

    /// Part number used for every frame (default: image file stem).
    #[arg(long, conflicts_with = "first_part")]
    part: Option<String>,

    /// Number parts sequentially starting here.
    #[arg(long)]
    first_part: Option<u64>,

    /// Camera identifier used in image names.
    #[arg(long, default_value = "1")]
    cam: String,

    /// Output root directory (overrides config and INSPECTION_OUTPUT_DIR).
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Inspection configuration (JSON).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to write all results and session statistics (JSON).
    #[arg(long)]
    summary: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct CliExtractArgs {
    /// Path to the input image.
    #[arg(long)]
    image: PathBuf,

    /// Inspection configuration (JSON).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to write the inspection (JSON). Printed to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct CliConfigArgs {
    /// Write the default configuration to this path.
    #[arg(long)]
    write_default: Option<PathBuf>,

    /// Validate a configuration file.
    #[arg(long, conflicts_with = "write_default")]
    check: Option<PathBuf>,
}

fn load_config(path: Option<&Path>) -> CliResult<InspectionConfig> {
    let mut config = match path {
        Some(p) => {
            tracing::info!("Loading config: {}", p.display());
            InspectionConfig::from_json_file(p)?
        }
        None => InspectionConfig::default(),
    };
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

fn part_number_for(args: &CliInspectArgs, index: usize, image: &Path) -> String {
    if let Some(p) = &args.part {
        return p.clone();
    }
    if let Some(first) = args.first_part {
        return (first + index as u64).to_string();
    }
    image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{}", index + 1))
}

fn run_inspect(args: &CliInspectArgs) -> CliResult<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(dir) = &args.out_dir {
        config.output_dir = dir.clone();
    }

    let mut session = InspectionSession::open(&args.user, &args.order, config)?;
    tracing::info!("Order directory: {}", session.order_dir().display());

    let mut source = ImageFileSource::new(args.image.iter());
    let mut results: Vec<InspectionResult> = Vec::with_capacity(args.image.len());
    let mut failures = 0usize;

    for (i, image) in args.image.iter().enumerate() {
        let part = part_number_for(args, i, image);
        match session.capture_and_process(&mut source, &part, &args.cam) {
            Ok(r) => {
                let messages: Vec<String> = r.defects.iter().map(ToString::to_string).collect();
                if messages.is_empty() {
                    println!("{}: {}", part, r.status);
                } else {
                    println!("{}: {} ({})", part, r.status, messages.join("; "));
                }
                results.push(r);
            }
            Err(e) => {
                failures += 1;
                tracing::error!("{}: {}", image.display(), e);
            }
        }
    }

    let stats = session.stats();
    println!(
        "Total: {}  OK: {} ({:.1}%)  NOK: {} ({:.1}%)",
        stats.total_parts, stats.ok_parts, stats.ok_rate, stats.nok_parts, stats.nok_rate
    );

    if let Some(path) = &args.summary {
        let summary = serde_json::json!({
            "order_number": args.order,
            "user": args.user,
            "stats": stats,
            "results": results,
        });
        std::fs::write(path, serde_json::to_string_pretty(&summary)?)?;
        tracing::info!("Summary written to {}", path.display());
    }

    if failures > 0 {
        return Err(format!("{failures} frame(s) could not be processed").into());
    }
    Ok(())
}

fn run_extract(args: &CliExtractArgs) -> CliResult<()> {
    let config = load_config(args.config.as_deref())?;
    tracing::info!("Loading image: {}", args.image.display());
    let img = image::open(&args.image).map_err(|e| -> CliError {
        format!("Failed to open image {}: {}", args.image.display(), e).into()
    })?;
    let gray = img.to_luma8();
    let (w, h) = gray.dimensions();
    tracing::info!("Image size: {}x{}", w, h);

    let inspection = inspect_frame(&gray, &config);
    tracing::info!(
        "{}: {} holes, {} spatter",
        inspection.verdict.status,
        inspection.features.holes.len(),
        inspection.features.spatter_count
    );

    let json = serde_json::to_string_pretty(&inspection)?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, &json)?;
            tracing::info!("Results written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run_config(args: &CliConfigArgs) -> CliResult<()> {
    if let Some(path) = &args.check {
        let config = InspectionConfig::from_json_file(path)?;
        println!("{}: valid", path.display());
        tracing::debug!("{:?}", config);
        return Ok(());
    }

    let json = serde_json::to_string_pretty(&InspectionConfig::default())?;
    match &args.write_default {
        Some(path) => {
            std::fs::write(path, &json)?;
            tracing::info!("Default config written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect(args) => run_inspect(&args),
        Commands::Extract(args) => run_extract(&args),
        Commands::Config(args) => run_config(&args),
    }
}
