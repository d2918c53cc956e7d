use clap::Parser;
use image_mirror::cancel::{self, CancelToken};
use image_mirror::config::{self, MirrorConfig};
use image_mirror::output::ProgressPrinter;
use image_mirror::sync::{self, SyncOptions, SyncStats};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: image-mirror <SOURCE> <DEST>";

#[derive(Parser)]
#[command(name = "image-mirror")]
#[command(about = "Mirror an image tree as downscaled JPEG copies")]
#[command(long_about = "\
Mirror an image tree as downscaled JPEG copies

Every .jpg, .jpeg, .png and .bmp file under SOURCE gets a JPEG counterpart at
the same relative path under DEST. Images larger than --max-pixels on their
longer edge are downscaled, keeping the aspect ratio. Files whose copy is
already at least as new as the source are skipped, so re-running is cheap.

Nothing under DEST is ever deleted except a copy that just failed to convert.
Directories are only created in DEST when a file actually needs writing.

Press Enter while a pass is running to abort after the current file.

Run 'image-mirror --gen-config' to print a documented config file.")]
#[command(version)]
struct Cli {
    /// Directory tree to read images from
    #[arg(required_unless_present = "gen_config")]
    source: Option<PathBuf>,

    /// Existing directory to write the JPEG mirror into
    #[arg(required_unless_present = "gen_config")]
    dest: Option<PathBuf>,

    /// TOML config file (see --gen-config)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Longer-edge limit in pixels [default: 1920]
    #[arg(long, value_name = "PIXELS")]
    max_pixels: Option<u32>,

    /// JPEG quality, 1-100 [default: 80]
    #[arg(long)]
    quality: Option<u32>,

    /// Repeat the pass every SECS seconds until aborted
    #[arg(long, value_name = "SECS")]
    interval: Option<u64>,

    /// List what would be converted without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Print a stock config file with all options documented
    #[arg(long)]
    gen_config: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        print!("{}", config::stock_config_toml());
        return Ok(ExitCode::SUCCESS);
    }

    init_tracing(cli.verbose);

    let (Some(source), Some(dest)) = (cli.source.as_deref(), cli.dest.as_deref()) else {
        eprintln!("{USAGE}");
        return Ok(ExitCode::FAILURE);
    };
    if let Some(missing) = [source, dest].into_iter().find(|p| !p.is_dir()) {
        eprintln!("Not a directory: {}", missing.display());
        eprintln!("{USAGE}");
        return Ok(ExitCode::FAILURE);
    }

    let config = resolve_config(&cli)?;
    let mut options = SyncOptions::from_config(&config);
    options.dry_run = cli.dry_run;

    let interactive = std::io::stdin().is_terminal();
    let cancel = CancelToken::new();
    if interactive {
        cancel::cancel_on_enter(&cancel)?;
    }

    let interval = if cli.dry_run {
        None
    } else {
        config.watch.interval()
    };
    let mut any_failures = false;
    loop {
        let stats = run_pass(source, dest, &options, &cancel, interactive)?;
        any_failures |= stats.has_failures();
        let Some(interval) = interval else { break };
        if stats.cancelled || cancel.wait_timeout(interval) {
            break;
        }
    }

    Ok(if any_failures {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Layer CLI flags over the config file over stock defaults.
fn resolve_config(cli: &Cli) -> Result<MirrorConfig, config::ConfigError> {
    let mut config = config::load_config(cli.config.as_deref())?;
    if let Some(max_pixels) = cli.max_pixels {
        config.images.max_pixels = max_pixels;
    }
    if let Some(quality) = cli.quality {
        config.images.quality = quality;
    }
    if let Some(interval) = cli.interval {
        config.watch.interval_secs = Some(interval);
    }
    config.validate()?;
    Ok(config)
}

/// Run one pass, streaming progress to stdout from a printer thread.
fn run_pass(
    source: &Path,
    dest: &Path,
    options: &SyncOptions,
    cancel: &CancelToken,
    interactive: bool,
) -> Result<SyncStats, Box<dyn std::error::Error>> {
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        let mut printer = ProgressPrinter::new(interactive);
        for event in rx {
            printer.print(&event);
        }
        printer
    });
    let result = sync::sync(source, dest, options, cancel, Some(tx));
    let mut printer = printer
        .join()
        .map_err(|_| "progress printer thread panicked")?;
    let stats = result?;
    printer.print_summary(&stats);
    Ok(stats)
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
