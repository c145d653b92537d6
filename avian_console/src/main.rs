//! `avian_console` - rank the colors of an aerial image and estimate habitat
//! size and bird count for a species.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use avian_raster::image_loader::{is_supported_path, save_image};
use avian_raster::{
    AggregatorConfig, Category, Color, ColorPercentage, HabitatRequest, Survey, SurveyConfig,
};

/// Rank the exact colors of an aerial image and estimate habitat and bird count.
#[derive(Parser, Debug)]
#[command(name = "avian_console")]
#[command(version, about, long_about = None)]
struct Args {
    /// Aerial image to survey.
    #[arg(value_name = "IMAGE", required_unless_present = "categories")]
    image: Option<PathBuf>,

    /// JSON configuration file. Flags below override its values.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Downscale images whose longest side exceeds this many pixels.
    #[arg(long, value_name = "INT")]
    max_dimension: Option<u32>,

    /// Keep the image at full size.
    #[arg(long, conflicts_with = "max_dimension")]
    no_resize: bool,

    /// Number of horizontal bands the image is split into.
    #[arg(long, value_name = "INT")]
    bands: Option<usize>,

    /// Number of worker threads.
    #[arg(long, value_name = "INT")]
    workers: Option<usize>,

    /// One band and one worker per logical CPU.
    #[arg(long, conflicts_with_all = ["bands", "workers"])]
    auto_parallelism: bool,

    /// Show at most this many colors (0 shows all).
    #[arg(short, long, default_value = "20", value_name = "INT")]
    limit: usize,

    /// Print the ranking as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Tag a color with a category. KEY is a position in the ranking
    /// (0 = most common) or a color such as "120,200,80".
    #[arg(short, long, value_name = "KEY=CATEGORY")]
    assign: Vec<String>,

    /// Species (category) to estimate habitat for.
    #[arg(short, long, value_name = "CATEGORY")]
    species: Option<String>,

    /// Surveyed area in hectares.
    #[arg(long, value_name = "FLOAT")]
    area_size: Option<String>,

    /// Birds per hectare of habitat.
    #[arg(short, long, value_name = "INT")]
    number: Option<String>,

    /// Write the image that was surveyed (after downscaling) to this path.
    #[arg(long, value_name = "FILE")]
    preview: Option<PathBuf>,

    /// List the available categories and exit.
    #[arg(long)]
    categories: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("avian_raster={log_level},avian_console={log_level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    if let Err(err) = run(&args) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(args: &Args) -> Result<()> {
    if args.categories {
        for category in Category::ALL {
            println!("{category}");
        }
        return Ok(());
    }

    let Some(image) = args.image.as_ref() else {
        anyhow::bail!("No image given");
    };
    if !image.exists() {
        anyhow::bail!("Input file does not exist: {}", image.display());
    }
    if !is_supported_path(image) {
        tracing::warn!("Unrecognised image extension: {}", image.display());
    }

    let config = build_config(args)?;
    let mut survey = Survey::new(config).context("Failed to initialize survey")?;

    survey
        .load(image)
        .with_context(|| format!("Failed to survey {}", image.display()))?;

    if let Some(preview) = &args.preview {
        if let Some(raster) = survey.image() {
            save_image(raster, preview).context("Failed to write preview")?;
            tracing::info!("Preview written to {}", preview.display());
        }
    }

    for assignment in &args.assign {
        if let Err(err) = apply_assignment(&mut survey, assignment) {
            tracing::warn!("Skipping assignment '{assignment}': {err:#}");
        }
    }

    let colors = survey.colors().cloned().unwrap_or_default();
    if args.json {
        print_json(&colors, args.limit)?;
    } else {
        print_ranking(&survey, &colors, args.limit);
    }

    if args.species.is_some() || args.area_size.is_some() || args.number.is_some() {
        calculate(&mut survey, args);
    }

    Ok(())
}

/// The configuration file (or defaults) with command-line overrides applied.
fn build_config(args: &Args) -> Result<SurveyConfig> {
    let mut config = match &args.config {
        Some(path) => SurveyConfig::from_json_file(path)?,
        None => SurveyConfig::default(),
    };

    if args.no_resize {
        config.max_dimension = None;
    } else if let Some(max) = args.max_dimension {
        config.max_dimension = Some(max);
    }

    if args.auto_parallelism {
        config.auto_parallelism = true;
    }
    if args.bands.is_some() || args.workers.is_some() {
        config.auto_parallelism = false;
        config.aggregation = AggregatorConfig::new(
            args.bands.unwrap_or(config.aggregation.band_count),
            args.workers.unwrap_or(config.aggregation.workers),
        );
    }

    config.validate()?;
    tracing::debug!(?config, "effective configuration");
    Ok(config)
}

/// Applies one `KEY=CATEGORY` argument.
fn apply_assignment(survey: &mut Survey, assignment: &str) -> Result<()> {
    let (key, label) = assignment
        .split_once('=')
        .context("expected KEY=CATEGORY")?;

    let Some(category) = Category::parse_selection(label)? else {
        let color = resolve_color(survey, key)?;
        if let Some(previous) = survey.unassign(&color) {
            tracing::info!("Color {color} is no longer {previous}");
        }
        return Ok(());
    };

    let color = resolve_color(survey, key)?;
    survey.assign(color, category)?;
    tracing::info!("Color {color} assigned to {category}");
    Ok(())
}

fn resolve_color(survey: &Survey, key: &str) -> Result<Color> {
    let key = key.trim();
    if let Ok(rank) = key.parse::<usize>() {
        return survey
            .colors()
            .and_then(|colors| colors.get(rank))
            .map(|share| share.color)
            .with_context(|| format!("There is no color at position {rank}"));
    }
    Ok(key.parse::<Color>()?)
}

fn print_ranking(survey: &Survey, colors: &ColorPercentage, limit: usize) {
    let shown = if limit == 0 { colors.as_slice() } else { colors.top(limit) };

    for (rank, share) in shown.iter().enumerate() {
        match survey.assignments().category_of(&share.color) {
            Some(category) => println!(
                "{rank:>4}  Percentage: {:.2}% RGB: {} [{category}]",
                share.percentage, share.color
            ),
            None => println!("{rank:>4}  Percentage: {:.2}% RGB: {}", share.percentage, share.color),
        }
    }

    if shown.len() < colors.len() {
        println!("... {} more colors", colors.len() - shown.len());
    }
}

fn print_json(colors: &ColorPercentage, limit: usize) -> Result<()> {
    let shown = if limit == 0 { colors.as_slice() } else { colors.top(limit) };
    let json = serde_json::to_string_pretty(shown).context("Failed to serialize ranking")?;
    println!("{json}");
    Ok(())
}

/// Runs the calculator. Invalid input is reported but does not fail the run.
fn calculate(survey: &mut Survey, args: &Args) {
    let species = match args.species.as_deref().map(Category::parse_selection).transpose() {
        Ok(species) => species.flatten(),
        Err(err) => {
            tracing::error!("Error calculating habitat and birdcount: {err}");
            return;
        }
    };

    let request = HabitatRequest::new(
        args.area_size.clone().unwrap_or_default(),
        args.number.clone().unwrap_or_default(),
        species,
    );

    match survey.calculate(&request) {
        Ok(estimate) => println!("{estimate}"),
        Err(err) => tracing::error!("Error calculating habitat and birdcount: {err}"),
    }
}
