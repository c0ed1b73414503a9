use clap::Parser;
use crossterm::{execute, terminal::SetTitle};
use std::io::{self, IsTerminal, Write};
use tracing::{debug, Level};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Print the snapshot as JSON instead of the Yes/No report
    #[arg(short, long)]
    json: bool,

    /// Pretty-print JSON output
    #[arg(short, long, requires = "json")]
    pretty: bool,

    /// Leave the terminal title alone
    #[arg(long)]
    no_title: bool,

    /// Log detection details to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let mut stdout = io::stdout().lock();
    if !args.no_title && stdout.is_terminal() {
        execute!(stdout, SetTitle("FeatureDetector"))?;
    }

    let cpu = feature_detector::init();
    debug!(?cpu, "Snapshot");

    if args.json {
        feature_detector::report::write_json(cpu, &mut stdout, args.pretty)?;
    } else {
        feature_detector::report::write_text(cpu, &mut stdout)?;
    }
    stdout.flush()?;
    Ok(())
}

