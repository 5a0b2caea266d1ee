//! Demonstration of replaying scanner cycles through the localizer

use rssi_locate::hardware::{AcquisitionError, SampleCycle, ScriptedSource};
use rssi_locate::{Localizer, Point2, SystemConfig, TextFormatter};
use serde::Deserialize;

#[derive(Deserialize)]
struct Replay {
    cycles: Vec<SampleCycle>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== RSSI Multilateration - Replay Demo ===\n");

    let mut localizer = Localizer::new(SystemConfig::default())?;
    let formatter = TextFormatter::new();

    // Recorded session shipped next to this demo
    let replay: Replay = serde_json::from_str(include_str!("replay.json"))?;
    let mut source = ScriptedSource::from_cycles("replay.json", replay.cycles);

    // Scripted extras: a noiseless cycle and a dropped window
    let truth = Point2::new(220.0, 60.0);
    source.push_cycle(ScriptedSource::exact_cycle(localizer.anchors(), localizer.model(), truth, 5));
    source.push_error(AcquisitionError::Timeout { timeout_ms: 5000 });

    while source.remaining() > 0 {
        match localizer.poll(&mut source)? {
            Some(_) => println!("{}\n", formatter.format_text(&localizer.report())),
            None => println!("(cycle skipped)\n"),
        }
    }

    println!("Noiseless cycle was generated at {}", truth);
    println!("{} estimates from {} cycles", localizer.solve_count(), source.delivered());
    Ok(())
}
