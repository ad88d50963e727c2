use clap::{Parser, Subcommand};
use photo_reducer::{config, output, process, scan};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "photo-reducer")]
#[command(about = "Shrink a directory of photos to fit a per-file size limit")]
#[command(long_about = "\
Shrink a directory of photos to fit a per-file size limit

Every JPEG and PNG directly inside the source directory is re-encoded as JPEG
at the highest quality (1-96) whose output fits the limit. Photos are turned
upright according to their EXIF orientation first. Results are written to
reduced_photos/ inside the source directory, under the original file names.

  photos/
  ├── photo-reducer.toml       # Optional config (see gen-config)
  ├── IMG_0001.jpg
  ├── scan.PNG
  └── reduced_photos/          # Created by `reduce`
      ├── IMG_0001.jpg
      └── scan.PNG             # JPEG data, original name kept

Photos that cannot fit even at quality 1 are skipped and listed at the end.

Run 'photo-reducer gen-config' to generate a documented config file.")]
#[command(version)]
struct Cli {
    /// Config file (default: <SOURCE>/photo-reducer.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show debug logs (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct ReduceArgs {
    /// Directory containing the photos
    source: PathBuf,

    /// Maximum size of each reduced photo, in MiB
    #[arg(long, value_name = "MIB")]
    max_size: Option<f64>,

    /// Name of the output directory created inside SOURCE
    #[arg(long, value_name = "NAME")]
    output: Option<String>,

    /// Photos reduced at once (clamped to the CPU core count)
    #[arg(long)]
    workers: Option<usize>,

    /// Write a JSON report of every file's outcome
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Reduce every eligible photo in a directory
    Reduce(ReduceArgs),
    /// List the photos a reduce would process
    Scan {
        /// Directory containing the photos
        source: PathBuf,
    },
    /// Print a stock photo-reducer.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Reduce(args) => {
            let mut cfg = load_config(cli.config.as_deref(), &args.source)?;
            if let Some(mib) = args.max_size {
                cfg.max_size_mib = Some(mib);
            }
            if let Some(name) = args.output {
                cfg.output.dir_name = name;
            }
            if let Some(n) = args.workers {
                cfg.processing.max_processes = Some(n);
            }
            cfg.validate()?;

            let target = cfg
                .target_max_bytes()?
                .ok_or("no size limit: pass --max-size or set max_size_mib in the config")?;
            let job = process::BatchJob::new(&args.source, target, cfg.extensions.clone())?
                .with_output_dir_name(&cfg.output.dir_name);
            let options = process::RunOptions {
                workers: config::effective_threads(&cfg.processing),
                ..process::RunOptions::default()
            };

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_progress_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = process::run(&job, &tx, &options);
            drop(tx);
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            let summary = result?;

            output::print_summary(&summary);
            if let Some(report) = args.report {
                let json = serde_json::to_string_pretty(&summary)?;
                std::fs::write(&report, json)?;
                println!("Report: {}", report.display());
            }
        }
        Command::Scan { source } => {
            let cfg = load_config(cli.config.as_deref(), &source)?;
            let photos = scan::scan_directory(&source, &cfg.extensions)?;
            output::print_scan_output(&source, &photos);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log lines go to stderr so they never interleave with progress on stdout.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(env_filter)
        .init();
}

/// Explicit `--config` wins; otherwise look in the source directory.
fn load_config(
    explicit: Option<&Path>,
    source: &Path,
) -> Result<config::ReducerConfig, config::ConfigError> {
    match explicit {
        Some(path) if !path.exists() => Err(config::ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("config file not found: {}", path.display()),
        ))),
        Some(path) => config::load_config_file(path),
        None => config::load_config(source),
    }
}
