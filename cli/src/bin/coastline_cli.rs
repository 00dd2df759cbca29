use clap::{Parser, Subcommand};
use cli::ExtractionJob;
use coastline::{
    CoastlineResult, Pipeline, PipelineBuilder,
    config::SourceConfig,
    io::{load_features_from_file, polygons_from_features},
};
use color_eyre::eyre::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an extraction job file (.toml or .json)
    Process {
        /// Path to the job file
        #[arg(short, long)]
        job: PathBuf,
    },
    /// Extract coastlines from a GeoJSON chart file with command-line options
    Extract {
        /// GeoJSON file of chart features
        #[arg(short, long)]
        input: PathBuf,
        /// Where to write the coastline GeoJSON
        #[arg(short, long)]
        output: PathBuf,
        /// Endpoint stitching tolerance in meters
        #[arg(long, default_value = "50.0")]
        tolerance: f64,
        /// Bridge gaps up to this many meters
        #[arg(long)]
        fill_gaps: Option<f64>,
        /// Douglas-Peucker tolerance in meters
        #[arg(long)]
        simplify: Option<f64>,
        /// Number of smoothing passes
        #[arg(long)]
        smooth: Option<usize>,
        /// Only use explicit coastline and shoreline-construction features
        #[arg(long)]
        explicit_only: bool,
    },
    /// Print gaps left after stitching as JSON
    Gaps {
        /// GeoJSON file of chart features
        #[arg(short, long)]
        input: PathBuf,
        /// Endpoint stitching tolerance in meters
        #[arg(long, default_value = "50.0")]
        tolerance: f64,
    },
    /// Write a job file with default settings
    InitJob {
        /// GeoJSON file of chart features
        #[arg(short, long)]
        input: PathBuf,
        /// Where the job should write coastlines
        #[arg(short, long)]
        output: PathBuf,
        /// Path of the job file to create (.toml or .json)
        #[arg(short, long)]
        job: PathBuf,
    },
    /// Print the JSON schema of job files
    Schema,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Process { job } => run_job(&job)?,
        Commands::Extract {
            input,
            output,
            tolerance,
            fill_gaps,
            simplify,
            smooth,
            explicit_only,
        } => {
            let mut builder = PipelineBuilder::new().with_tolerance(tolerance);
            if explicit_only {
                builder = builder.with_sources(SourceConfig::explicit_only());
            }
            if let Some(max_gap) = fill_gaps {
                builder = builder.with_gap_filling(max_gap);
            }
            if let Some(tolerance_m) = simplify {
                builder = builder.with_simplification(tolerance_m);
            }
            if let Some(iterations) = smooth {
                builder = builder.with_smoothing(iterations);
            }
            extract(&builder.build(), &input, &output)?;
        }
        Commands::Gaps { input, tolerance } => {
            let features = load_features_from_file(&input)?;
            let gaps = PipelineBuilder::new().with_tolerance(tolerance).build().detect_gaps(&features)?;
            info!("Found {} gaps", gaps.len());
            println!("{}", serde_json::to_string_pretty(&gaps)?);
        }
        Commands::InitJob { input, output, job } => {
            let skeleton = ExtractionJob::skeleton(
                input.to_string_lossy().to_string(),
                output.to_string_lossy().to_string(),
            );
            skeleton.to_file(&job)?;
            info!("Job file written to {:?}", job);
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&ExtractionJob::schema())?);
        }
    }

    Ok(())
}

fn run_job(job_path: &Path) -> Result<()> {
    let job = ExtractionJob::from_file(job_path)?;
    job.validate()?;
    info!("Running job {}", job.name.as_deref().unwrap_or("(unnamed)"));

    let mut builder = PipelineBuilder::from_config(job.config.clone());
    if let Some(path) = &job.water_polygons_path {
        let water = polygons_from_features(&load_features_from_file(path)?);
        info!("Loaded {} water polygons from {}", water.len(), path);
        builder = builder.with_water_polygons(water);
    }
    if let Some(path) = &job.land_polygons_path {
        let land = polygons_from_features(&load_features_from_file(path)?);
        info!("Loaded {} land polygons from {}", land.len(), path);
        builder = builder.with_land_polygons(land);
    }

    extract(&builder.build(), Path::new(&job.input_path), Path::new(&job.output_path))?;
    Ok(())
}

fn extract(pipeline: &Pipeline, input: &Path, output: &Path) -> Result<CoastlineResult> {
    info!("{}", pipeline.info());
    let features = load_features_from_file(input)?;
    info!("Loaded {} features from {:?}", features.len(), input);

    let result = pipeline.process(&features)?;
    if result.is_empty() {
        warn!("No coastlines found in {:?}", input);
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    result.save_geojson(output)?;

    let stats = &result.stats;
    info!(
        "Extracted {} segments, {} after dedup, {} coastlines after stitching",
        stats.segments_extracted, stats.segments_after_dedup, stats.segments_after_stitching
    );
    info!(
        "Filled {} gaps, {} still open, {} closed coastlines",
        stats.gaps_filled, stats.gaps_detected, stats.continuous_count
    );
    info!("Total length {:.1} m ({:.2} nm)", stats.total_length_m, stats.total_length_nm);
    for (class, source) in &stats.by_source {
        info!("  {}: {} coastlines, {:.1} m", class, source.count, source.length_m);
    }
    info!("Coastlines saved to {:?}", output);

    Ok(result)
}
