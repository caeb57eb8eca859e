use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tracing::Level;

use license_counter::{LicenseEngine, DEFAULT_APPLICATION_ID};

#[derive(Debug, Parser)]
#[command(about = "Count the licenses an application needs from an asset inventory CSV")]
struct Args {
    #[arg(long, help = "Path to CSV file containing the asset inventory")]
    file: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_APPLICATION_ID, help = "Application id to count licenses for")]
    application_id: String,

    #[arg(long, help = "Skip the first row of the file")]
    skip_header: bool,

    #[arg(short, long, action = ArgAction::Count, help = "Increase log verbosity (-v, -vv, -vvv)")]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    // Logs go to stderr, stdout only carries the total
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let Some(path) = args.file else {
        println!("please provide filepath to a CSV");
        return;
    };

    let mut engine = LicenseEngine::new(args.application_id).skip_header(args.skip_header);
    if let Err(err) = engine.run_file(&path) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
    println!("{}", engine.total_applications());
}
