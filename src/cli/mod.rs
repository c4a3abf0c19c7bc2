//! Command-line front end: analyze a mounted device and mirror its media.

mod progress;

use std::path::PathBuf;
use std::sync::Arc;

use crate::{AppConfig, MediaFilter, MediaSession, MountedService, StopToken};

use progress::{BarSink, make_progress_bar, print_analysis, print_file_list, print_summary};

/// Parsed command-line options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    /// Local directory where the device filesystem is mounted.
    pub mount: PathBuf,
    /// Overrides the configured output directory.
    pub output: Option<PathBuf>,
    /// Which media to download.
    pub only: MediaFilter,
    /// Overrides the configured scan depth.
    pub depth: Option<usize>,
    /// Configuration file to load instead of the default one.
    pub config: Option<PathBuf>,
    /// Print the analysis and stop.
    pub list: bool,
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Run(CliArgs),
}

fn value_for(flag: &str, value: Option<String>) -> Result<String, String> {
    value.ok_or_else(|| format!("{flag} requires a value"))
}

/// Parses arguments, excluding the program name.
///
/// # Errors
///
/// Returns a message describing the first unusable argument.
pub fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Command, String> {
    let mut args = args.into_iter();
    let mut parsed = CliArgs::default();
    let mut mount = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-m" | "--mount" => mount = Some(PathBuf::from(value_for(&arg, args.next())?)),
            "-o" | "--output" => parsed.output = Some(PathBuf::from(value_for(&arg, args.next())?)),
            "--only" => parsed.only = value_for(&arg, args.next())?.parse()?,
            "-d" | "--depth" => {
                let value = value_for(&arg, args.next())?;
                parsed.depth = Some(
                    value
                        .parse()
                        .map_err(|_| format!("invalid depth: {value}"))?,
                );
            }
            "-c" | "--config" => parsed.config = Some(PathBuf::from(value_for(&arg, args.next())?)),
            "-l" | "--list" => parsed.list = true,
            "-h" | "--help" => return Ok(Command::Help),
            other => return Err(format!("unknown option: {other}")),
        }
    }

    parsed.mount = mount.ok_or_else(|| "--mount is required".to_string())?;
    Ok(Command::Run(parsed))
}

/// Prints usage to stderr.
pub fn print_usage() {
    eprintln!("Usage: afc-dl --mount <DIR> [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -m, --mount <DIR>    Directory where the device filesystem is mounted");
    eprintln!("  -o, --output <DIR>   Where to mirror the media (default: ./iphone_photos)");
    eprintln!("      --only <KIND>    all, images or videos (default: all)");
    eprintln!("  -d, --depth <N>      Maximum scan depth below each root (default: 3)");
    eprintln!("  -c, --config <FILE>  Configuration file (default: {})", AppConfig::default_path().display());
    eprintln!("  -l, --list           Print what was found and exit");
    eprintln!("  -h, --help           Show this help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  RUST_LOG             Log filter (default: info)");
}

/// Analyzes the mounted device and downloads the selected media.
///
/// Ctrl-C stops the current stage; the summary is printed either way.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the device
/// filesystem cannot be listed.
pub async fn run(args: CliArgs) -> crate::Result<()> {
    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(depth) = args.depth {
        config.engine = config.engine.with_max_depth(depth);
    }
    let output = args.output.unwrap_or(config.paths.output_dir);

    let bar = make_progress_bar();
    let stop = StopToken::with_sink(Arc::new(BarSink::new(bar.clone())));
    let interrupt = stop.clone();
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if result.is_ok() {
                    interrupt.signal_stop();
                }
            }
            () = interrupt.stopped() => {}
        }
    });

    println!("Connecting to {}...", args.mount.display());
    let service = MountedService::new(args.mount.clone());
    let session = MediaSession::connect(service, config.engine, stop.clone()).await?;
    println!("Capabilities: {}", session.capabilities());

    let analysis = session.analyze().await;
    bar.finish_and_clear();
    print_analysis(&analysis);

    if stop.is_stopped() {
        println!("Analysis interrupted.");
        return Ok(());
    }
    if args.list {
        print_file_list(&analysis);
        return Ok(());
    }
    if analysis.select(args.only).is_empty() {
        println!("Nothing to download.");
        return Ok(());
    }

    bar.reset();
    let summary = session.download(&analysis, args.only, &output).await;
    bar.finish_and_clear();
    print_summary(&summary, stop.is_stopped());
    println!("Files saved to {}", output.display());
    Ok(())
}
