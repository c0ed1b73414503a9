use clap::Parser;
use serde::Serialize;
use std::io::{self, Write};
use feature_detector::core::dump::RawDump;
use feature_detector::cpuid::HostCpuid;

/// Dumps the raw CPUID leaves and XCR0 value the detector decodes.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long)]
    pretty: bool,
}

#[derive(Serialize)]
struct DumpExport {
    #[serde(flatten)]
    dump: RawDump,
    xcr0_raw: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let dump = RawDump::collect(&HostCpuid);
    let export = DumpExport {
        xcr0_raw: dump.xcr0_raw().map(|x| format!("{:#x}", x)),
        dump,
    };

    let json = if args.pretty {
        serde_json::to_string_pretty(&export)?
    } else {
        serde_json::to_string(&export)?
    };
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", json)?;
    Ok(())
}
