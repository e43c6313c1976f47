//! Report timing anomalies in an event file.

use std::path::PathBuf;

use subfeed_common::config::DEFAULT_IMPLAUSIBLE_DURATION_MS;
use subfeed_common::time::format_timestamp_ms;
use subfeed_model::parse_events;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
    let events = parse_events(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {e}", path.display()))?;

    println!("Event file: {}", path.display());
    println!("  Events: {}", events.len());

    if events.is_empty() {
        return Ok(());
    }

    let first = events.first().map(|e| e.start_ms).unwrap_or(0);
    let last = events.last().map(|e| e.start_ms).unwrap_or(0);
    println!(
        "  Span: {} .. {}",
        format_timestamp_ms(first),
        format_timestamp_ms(last)
    );

    let unknown = events
        .iter()
        .filter(|e| e.duration.is_implausible(DEFAULT_IMPLAUSIBLE_DURATION_MS))
        .count();

    let mut non_monotonic = 0usize;
    let mut overlapping = 0usize;
    for pair in events.windows(2) {
        let gap = pair[1].start_ms - pair[0].start_ms;
        if gap <= 0 {
            non_monotonic += 1;
        } else if let Some(duration) = pair[0].duration.known() {
            if duration > gap {
                overlapping += 1;
            }
        }
    }

    println!();
    println!("Timing:");
    println!("  Unknown/implausible durations: {unknown}");
    println!("  Non-monotonic arrivals: {non_monotonic}");
    println!("  Overlapping neighbors: {overlapping}");

    if unknown > 0 {
        println!();
        println!("Hint: run with --mode repeat (default) to infer durations,");
        println!("or --fix-overlap to drop stale out-of-order events.");
    }

    Ok(())
}
