// rssi-locate - replay recorded RSSI sample cycles through the localizer

use clap::{Parser, ValueEnum};
use rssi_locate::hardware::{SampleCycle, ScriptedSource};
use rssi_locate::{JsonFormatter, Localizer, SystemConfig, TextFormatter};
use serde::Deserialize;
use std::io::Read;
use std::path::PathBuf;
use tracing::{info, warn};

/// Estimate device positions from recorded anchor RSSI readings
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file (reference four-tower deployment if omitted)
    #[arg(long, short, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Replay file with recorded cycles; read from stdin if omitted
    #[arg(long, short, value_name = "FILE")]
    samples: Option<PathBuf>,

    /// Output format for each estimate
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, default_value_t = false)]
    pretty: bool,

    /// Print only the coordinates in text output
    #[arg(long, default_value_t = false)]
    compact: bool,

    /// Print the default configuration as JSON and exit
    #[arg(long, default_value_t = false)]
    print_default_config: bool,

    /// Verbose logging (DEBUG level)
    #[arg(long, short, default_value_t = false)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Recorded acquisition session: one map of anchor key to readings per cycle
#[derive(Debug, Deserialize)]
struct Replay {
    cycles: Vec<SampleCycle>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.print_default_config {
        println!("{}", SystemConfig::default().to_json()?);
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => SystemConfig::from_file(path)?,
        None => SystemConfig::default(),
    };
    let mut localizer = Localizer::new(config)?;

    let replay: Replay = match &args.samples {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            serde_json::from_str(&input)?
        }
    };
    if replay.cycles.is_empty() {
        warn!("Replay contains no cycles");
    }

    let mut source = ScriptedSource::from_cycles("replay", replay.cycles);
    let text = if args.compact { TextFormatter::compact() } else { TextFormatter::new() };
    let json = JsonFormatter { pretty: args.pretty };

    while source.remaining() > 0 {
        if localizer.poll(&mut source)?.is_none() {
            continue;
        }
        let report = localizer.report();
        match args.format {
            OutputFormat::Text => println!("{}\n", text.format_text(&report)),
            OutputFormat::Json => println!("{}", json.format_json(&report)?),
        }
    }

    info!("Replayed {} cycles, {} estimates", source.delivered(), localizer.solve_count());
    Ok(())
}

/// Initialize logging subsystem
fn init_logging(verbose: bool) {
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr);

    if verbose {
        subscriber.with_max_level(tracing::Level::DEBUG).init();
        info!("Verbose logging enabled (DEBUG level)");
    } else {
        subscriber.with_max_level(tracing::Level::INFO).init();
    }
}
