use std::fs::File;
use std::path::PathBuf;

use clap::Parser;
use fetchlog::core::config::{self, CliOverrides};
use fetchlog::tui;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

#[derive(Parser)]
#[command(name = "fetchlog", about = "Fetch URLs and browse the responses in a terminal log")]
struct Args {
    /// Config file to read instead of ~/.fetchlog/config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to write the debug log
    #[arg(long, default_value = "fetchlog.log")]
    log_file: PathBuf,

    /// Maximum number of responses kept for the session
    #[arg(long)]
    capacity: Option<usize>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // The terminal belongs to the UI, so logs go to a file.
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Ok(log_file) = File::create(&args.log_file) {
        let _ = WriteLogger::init(level, log_config, log_file);
    }

    log::info!("fetchlog {} starting up", env!("CARGO_PKG_VERSION"));

    let resolved = config::load_config(args.config.as_deref()).and_then(|file_config| {
        config::resolve(
            &file_config,
            CliOverrides {
                capacity: args.capacity,
            },
        )
    });
    let resolved = match resolved {
        Ok(resolved) => resolved,
        Err(e) => {
            log::error!("Configuration error: {}", e);
            eprintln!("fetchlog: {e}");
            std::process::exit(1);
        }
    };

    match tui::run(resolved).await {
        Ok(report) => log::info!("Exiting cleanly: {:?}", report),
        Err(e) => {
            log::error!("Fatal: {}", e);
            eprintln!("fetchlog: {e}");
            std::process::exit(1);
        }
    }
}
