//! Gallery Optimizer CLI - shrink and recompress a directory of images in place
//!
//! One invocation runs one batch pass over the directory and exits 0, no
//! matter how many individual files failed. Only fatal problems (bad
//! arguments, unreadable config, a directory that cannot be listed) exit 1.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use tracing::info;

use gallery_optimizer::{
    init_logging, optimize_all, optimize_all_with, Config, FilterType, OptimizeConfig,
};

/// Gallery Optimizer - shrink and recompress images in place
#[derive(Parser)]
#[command(
    name = "gallery-optimizer",
    version,
    about = "Shrink and recompress the images of a directory in place",
    long_about = "Scales every .jpg, .jpeg and .png file directly inside DIR down to a maximum \
                  width (keeping its aspect ratio) and re-encodes it over the original. Other \
                  files are left untouched and a broken image never stops the batch.",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory containing the images (overrides the config file)
    #[arg(value_name = "DIR")]
    directory: Option<PathBuf>,

    /// Maximum width in pixels [default: 1920]
    #[arg(short = 'w', long, value_name = "PIXELS", value_parser = clap::value_parser!(u32).range(1..))]
    max_width: Option<u32>,

    /// Encoder quality (0-100) [default: 80]
    #[arg(short, long, value_name = "QUALITY", value_parser = clap::value_parser!(u8).range(0..=100))]
    quality: Option<u8>,

    /// Resampling filter [default: lanczos3]
    #[arg(short, long, value_enum, value_name = "FILTER")]
    filter: Option<CliFilter>,

    /// Leave images that are already narrow enough untouched
    #[arg(long)]
    skip_unchanged: bool,

    /// Show what would be done without writing any file
    #[arg(long)]
    dry_run: bool,

    /// Print the batch report as JSON instead of per-file lines
    #[arg(long)]
    json: bool,

    /// Configuration file path (.toml or .yaml)
    #[arg(short, long, value_name = "FILE", env = "GALLERY_OPTIMIZER_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short = 'Q', long, conflicts_with = "verbose")]
    quiet: bool,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// Validate configuration file
    Config {
        /// Configuration file to validate
        file: PathBuf,
    },
    /// Generate example configuration file
    ExampleConfig {
        /// Output file path
        #[arg(short, long, default_value = "gallery-optimizer.toml")]
        output: PathBuf,
        /// Use YAML format instead of TOML
        #[arg(long)]
        yaml: bool,
    },
}

/// CLI-compatible filter enum
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<CliFilter> for FilterType {
    fn from(filter: CliFilter) -> Self {
        match filter {
            CliFilter::Nearest => FilterType::Nearest,
            CliFilter::Triangle => FilterType::Triangle,
            CliFilter::CatmullRom => FilterType::CatmullRom,
            CliFilter::Gaussian => FilterType::Gaussian,
            CliFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Some(command) = cli.command {
        if let Err(e) = handle_subcommand(command) {
            eprintln!("{}: {:#}", style("Error").red().bold(), e);
            process::exit(1);
        }
        return;
    }

    if let Err(e) = run(&cli) {
        eprintln!("{}: {:#}", style("Error").red().bold(), e);
        process::exit(1);
    }
}

/// Run one batch pass
fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => {
            let config = Config::from_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            config.validate()?;
            Some(config)
        }
        None => None,
    };

    let log_level = if cli.quiet {
        "error".to_string()
    } else if cli.verbose {
        "debug".to_string()
    } else if let Ok(level) = std::env::var("RUST_LOG") {
        level
    } else {
        config
            .as_ref()
            .map_or_else(|| "info".to_string(), |c| c.logging.level.clone())
    };
    init_logging(&log_level)?;

    if let Some(path) = &cli.config {
        info!("Loaded configuration from: {:?}", path);
    }

    let (directory, optimize) = resolve_settings(cli, config)?;

    if cli.json {
        let report = optimize_all(&directory, &optimize)?;
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        optimize_all_with(&directory, &optimize, |file| {
            for line in file.log_lines() {
                println!("{}", line);
            }
        })?;
    }

    Ok(())
}

/// Merge CLI flags over the config file over the defaults
fn resolve_settings(cli: &Cli, config: Option<Config>) -> anyhow::Result<(PathBuf, OptimizeConfig)> {
    let (file_directory, mut optimize) = match config {
        Some(config) => (config.directory, config.optimize),
        None => (None, OptimizeConfig::default()),
    };

    let directory = cli
        .directory
        .clone()
        .or(file_directory)
        .ok_or_else(|| anyhow!("No directory given. Pass DIR or set `directory` in the config file"))?;

    if let Some(max_width) = cli.max_width {
        optimize.max_width = max_width;
    }
    if let Some(quality) = cli.quality {
        optimize.quality = quality;
    }
    if let Some(filter) = cli.filter {
        optimize.filter = filter.into();
    }
    if cli.skip_unchanged {
        optimize.reencode_unresized = false;
    }
    if cli.dry_run {
        optimize.dry_run = true;
    }

    optimize.validate()?;
    Ok((directory, optimize))
}

/// Handle subcommands
fn handle_subcommand(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Config { file } => validate_config_file(&file),
        Commands::ExampleConfig { output, yaml } => generate_example_config(&output, yaml),
    }
}

/// Validate configuration file
fn validate_config_file(file_path: &Path) -> anyhow::Result<()> {
    let config = Config::from_file(file_path)?;
    config.validate()?;

    println!("{}: Configuration file is valid", style("Success").green().bold());
    match &config.directory {
        Some(dir) => println!("Directory: {}", dir.display()),
        None => println!("Directory: (not set)"),
    }
    println!("Max width: {}px", config.optimize.max_width);
    println!("Quality: {}", config.optimize.quality);
    println!("Filter: {:?}", config.optimize.filter);

    Ok(())
}

/// Generate example configuration file
fn generate_example_config(output_path: &Path, use_yaml: bool) -> anyhow::Result<()> {
    let output_path = if use_yaml {
        output_path.with_extension("yaml")
    } else {
        output_path.to_path_buf()
    };

    let config = Config {
        directory: Some(PathBuf::from("public/Gallery")),
        ..Config::default()
    };
    config.to_file(&output_path)?;

    let format = if use_yaml { "YAML" } else { "TOML" };
    println!(
        "{}: Generated example {} configuration: {}",
        style("Success").green().bold(),
        format,
        output_path.display()
    );

    Ok(())
}
