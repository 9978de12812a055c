//! gnss-reader - command-line front end
//!
//! Reads a u-blox receiver over a serial port (or a capture file) and prints
//! classified frames, decoded messages and fix reports.

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use gnss_reader::cli::{
    format_fix, format_message, format_unit, print_exit_codes, CliResult, ExitCodes, OutputFormat,
};
use gnss_reader::config::{self, AppConfig, LoggingConfig};
use gnss_reader::core::protocol::{Message, MessageId, PollSelector};
use gnss_reader::core::reader::{Classified, Event, Reader, ReaderError};
use gnss_reader::core::transport::{list_ports, ReplaySource, DEFAULT_REPLAY_CHUNK};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// gnss-reader CLI
#[derive(Parser, Debug)]
#[command(
    name = "gnss-reader",
    version,
    about = "u-blox GNSS receiver protocol reader",
    long_about = None
)]
struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file (default: per-user config.toml)
    #[arg(short, long, env = "GNSS_READER_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Device overrides
#[derive(Args, Debug, Clone)]
struct DeviceArgs {
    /// Serial device (e.g., /dev/ttyACM0, COM3)
    #[arg(short, long, env = "GNSS_READER_DEVICE")]
    device: Option<String>,

    /// Baud rate
    #[arg(short, long)]
    baud: Option<u32>,

    /// Blocking read timeout (milliseconds)
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available serial ports
    ListPorts {
        /// Show detailed info
        #[arg(long)]
        detailed: bool,
    },

    /// Print every classified unit from the device
    Read {
        #[command(flatten)]
        device: DeviceArgs,

        /// Stop after this many units
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Do not print rejected bytes
        #[arg(long)]
        skip_invalid: bool,
    },

    /// Print fix reports (NAV-PVT with the latest NAV-DOP, ESF-STATUS, MON-VER)
    Fix {
        #[command(flatten)]
        device: DeviceArgs,

        /// Stop after this many fixes
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },

    /// Poll MON-VER and print the reply
    Version {
        #[command(flatten)]
        device: DeviceArgs,

        /// Seconds to wait for the reply
        #[arg(long, default_value_t = 5)]
        wait: u64,
    },

    /// Scan a captured byte stream
    Replay {
        /// Capture file
        file: PathBuf,

        /// Bytes per read
        #[arg(long, default_value_t = DEFAULT_REPLAY_CHUNK)]
        chunk: usize,

        /// Print fix reports instead of every unit
        #[arg(long)]
        fixes: bool,

        /// Print scanner counters at the end
        #[arg(long)]
        stats: bool,
    },

    /// Show exit codes
    ExitCodes,

    /// Configuration file management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Write the effective configuration to the configuration file
    Save,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = run(&cli).unwrap_or_else(|err| CliResult::from_error(&err));
    if let Some(msg) = result.message() {
        if !result.is_success() {
            eprintln!("error: {}", msg);
        } else if !cli.quiet {
            eprintln!("{}", msg);
        }
    }
    result.to_exit_code()
}

fn run(cli: &Cli) -> anyhow::Result<CliResult> {
    let config = load_config(cli)?;
    let _guard = init_logging(&config.logging, cli.verbose, cli.quiet)?;

    match &cli.command {
        Commands::ListPorts { detailed } => show_ports(cli, *detailed),
        Commands::Read { device, count, skip_invalid } => {
            let mut reader = open_device(&config, device)?;
            let stop = stop_flag()?;
            stream_units(cli, &mut reader, *count, *skip_invalid, &stop)
        }
        Commands::Fix { device, count } => {
            let mut reader = open_device(&config, device)?;
            let stop = stop_flag()?;
            stream_fixes(cli, &mut reader, *count, &stop)
        }
        Commands::Version { device, wait } => {
            let mut reader = open_device(&config, device)?;
            let stop = stop_flag()?;
            poll_version(cli, &mut reader, Duration::from_secs(*wait), &stop)
        }
        Commands::Replay { file, chunk, fixes, stats } => {
            replay(cli, &config, file, *chunk, *fixes, *stats)
        }
        Commands::ExitCodes => {
            print_exit_codes();
            Ok(CliResult::success())
        }
        Commands::Config { action } => handle_config(cli, &config, action),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("loading {}", path.display())),
        None => Ok(AppConfig::load().unwrap_or_else(|err| {
            eprintln!("warning: {}, using defaults", err);
            AppConfig::default()
        })),
    }
}

fn init_logging(
    logging: &LoggingConfig,
    verbose: u8,
    quiet: bool,
) -> anyhow::Result<Option<WorkerGuard>> {
    let level = match (quiet, verbose) {
        (true, _) => "error".to_string(),
        (false, 0) => logging.level.clone(),
        (false, 1) => "debug".to_string(),
        (false, _) => "trace".to_string(),
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&level))
        .with_context(|| format!("invalid log filter '{}'", level))?;

    let stderr_layer = fmt::layer().with_writer(std::io::stderr);
    let stderr_layer = if logging.json {
        stderr_layer.json().boxed()
    } else {
        stderr_layer.boxed()
    };

    let (file_layer, guard) = match &logging.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "gnss-reader.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            let layer = if logging.json { layer.json().boxed() } else { layer.boxed() };
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("installing log subscriber")?;

    tracing::debug!("gnss-reader v{}", gnss_reader::VERSION);
    Ok(guard)
}

fn stop_flag() -> anyhow::Result<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("installing Ctrl-C handler")?;
    Ok(running)
}

fn open_device(config: &AppConfig, args: &DeviceArgs) -> anyhow::Result<Reader> {
    let mut config = config.clone();
    if let Some(device) = &args.device {
        config.device.port = device.clone();
    }
    if let Some(baud) = args.baud {
        config.device.baud_rate = baud;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.device.timeout_ms = timeout_ms;
    }

    let mut reader = Reader::new(config.reader_config());
    reader.init(&config.device.port)?;
    Ok(reader)
}

fn stream_units(
    cli: &Cli,
    reader: &mut Reader,
    count: Option<usize>,
    skip_invalid: bool,
    running: &AtomicBool,
) -> anyhow::Result<CliResult> {
    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) && count.map_or(true, |n| printed < n) {
        match reader.pull(true) {
            Classified::Closed => break,
            Classified::NoData => continue,
            Classified::TransportError(err) => return Err(err.into()),
            Classified::InvalidFrame(_) if skip_invalid => continue,
            unit => {
                if let Some(line) = format_unit(&unit, cli.format) {
                    println!("{}", line);
                    printed += 1;
                }
            }
        }
    }
    reader.close();
    Ok(CliResult::success())
}

fn stream_fixes(
    cli: &Cli,
    reader: &mut Reader,
    count: Option<usize>,
    running: &AtomicBool,
) -> anyhow::Result<CliResult> {
    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) && count.map_or(true, |n| printed < n) {
        match reader.next_fix(true) {
            Ok(Some(report)) => {
                println!("{}", format_fix(&report, cli.format));
                printed += 1;
            }
            Ok(None) => {}
            Err(ReaderError::Closed) => break,
            Err(err) => return Err(err.into()),
        }
    }
    reader.close();
    Ok(CliResult::success())
}

fn poll_version(
    cli: &Cli,
    reader: &mut Reader,
    wait: Duration,
    running: &AtomicBool,
) -> anyhow::Result<CliResult> {
    reader.poll(MessageId::MON_VER, PollSelector::Default)?;
    let deadline = Instant::now() + wait;

    while running.load(Ordering::SeqCst) && Instant::now() < deadline {
        match reader.next_message(true).context("waiting for MON-VER")? {
            Event::Message(message @ Message::MonVer(_)) => {
                match cli.format {
                    OutputFormat::Text => println!("{}", format_message(&message)),
                    OutputFormat::Json => println!("{}", serde_json::to_string(&message)?),
                }
                reader.close();
                return Ok(CliResult::success());
            }
            Event::Closed => {
                return Err(ReaderError::Closed).context("waiting for MON-VER");
            }
            _ => {}
        }
    }

    reader.close();
    if running.load(Ordering::SeqCst) {
        Ok(CliResult::error(ExitCodes::TIMEOUT, format!("no MON-VER reply within {:?}", wait)))
    } else {
        Ok(CliResult::error(ExitCodes::CANCELLED, "cancelled"))
    }
}

fn replay(
    cli: &Cli,
    config: &AppConfig,
    file: &Path,
    chunk: usize,
    fixes: bool,
    stats: bool,
) -> anyhow::Result<CliResult> {
    let source = ReplaySource::open(file, chunk)
        .with_context(|| format!("opening capture {}", file.display()))?;
    let mut reader = Reader::new(config.reader_config());
    reader.attach(source)?;

    let running = AtomicBool::new(true);
    let result = if fixes {
        stream_fixes(cli, &mut reader, None, &running)?
    } else {
        stream_units(cli, &mut reader, None, false, &running)?
    };

    if stats {
        let counters = reader.stats();
        match cli.format {
            OutputFormat::Text => println!(
                "bytes={} frames={} sentences={} invalid={} garbage_bytes={}",
                counters.bytes_fed,
                counters.binary_frames,
                counters.text_sentences,
                counters.invalid_frames,
                counters.garbage_bytes
            ),
            OutputFormat::Json => println!("{}", serde_json::to_string(counters)?),
        }
    }
    Ok(result)
}

fn show_ports(cli: &Cli, detailed: bool) -> anyhow::Result<CliResult> {
    let ports = list_ports()?;

    if ports.is_empty() {
        if !cli.quiet {
            println!("No serial ports found.");
        }
        return Ok(CliResult::success());
    }

    match cli.format {
        OutputFormat::Json => {
            let json: Vec<serde_json::Value> = ports
                .iter()
                .map(|p| {
                    serde_json::json!({
                        "name": p.port_name,
                        "type": format!("{:?}", p.port_type)
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            if detailed {
                println!("Available Serial Ports:");
                println!("{:-<60}", "");
                for port in &ports {
                    println!("  {} [{:?}]", port.port_name, port.port_type);
                }
            } else {
                for port in &ports {
                    println!("{}", port.port_name);
                }
            }
        }
    }

    Ok(CliResult::success())
}

fn handle_config(
    cli: &Cli,
    config: &AppConfig,
    action: &ConfigAction,
) -> anyhow::Result<CliResult> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => config::config_path().context("could not determine config directory")?,
    };

    match action {
        ConfigAction::Show => match cli.format {
            OutputFormat::Text => print!("{}", config.to_toml()?),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
        },
        ConfigAction::Path => println!("{}", path.display()),
        ConfigAction::Save => {
            config.save_to(&path)?;
            if !cli.quiet {
                println!("Saved {}", path.display());
            }
        }
    }
    Ok(CliResult::success())
}
