//! Feed an event file through the delivery engine.

use std::path::PathBuf;

use subfeed_common::config::FeedConfig;
use subfeed_common::time::format_timestamp_ms;
use subfeed_engine::{FeedEngine, FeedStats, VecSource};
use subfeed_model::{parse_events, DeliveryFrame, PayloadBody};

pub fn run(
    path: PathBuf,
    mode: String,
    cadence_ms: i64,
    fix_durations: bool,
    fix_overlap: bool,
    threshold_ms: i64,
    json: bool,
) -> anyhow::Result<()> {
    let mode = mode
        .parse()
        .map_err(|e: String| anyhow::anyhow!("Invalid mode: {e}"))?;

    let content = std::fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
    let events = parse_events(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {e}", path.display()))?;

    tracing::info!(
        count = events.len(),
        %mode,
        cadence_ms,
        "feeding events through engine"
    );

    let config = FeedConfig {
        mode,
        cadence_interval_ms: cadence_ms,
        fix_durations,
        fix_overlap,
        implausible_duration_threshold_ms: threshold_ms,
    };
    let mut engine = FeedEngine::new(config, VecSource::new(events));

    while let Some(frame) = engine.next_frame()? {
        if json {
            println!("{}", serde_json::to_string(&frame)?);
        } else {
            println!("{}", format_frame(&frame));
        }
    }

    if !json {
        print_stats(&engine.stats());
    }

    Ok(())
}

fn format_frame(frame: &DeliveryFrame) -> String {
    let kind = if frame.is_filler() {
        "filler"
    } else if frame.is_fresh {
        "fresh "
    } else {
        "repeat"
    };
    format!(
        "[{}] {} start={} dur={:>6}ms {}",
        format_timestamp_ms(frame.pts_ms),
        kind,
        format_timestamp_ms(frame.source_start_ms),
        frame.source_duration_ms,
        describe_payload(frame),
    )
}

fn describe_payload(frame: &DeliveryFrame) -> String {
    match frame.payload.body() {
        PayloadBody::Empty => "-".to_string(),
        PayloadBody::Markup { text } => {
            let mut summary: String = text.chars().take(40).collect();
            if text.chars().count() > 40 {
                summary.push('…');
            }
            format!("\"{summary}\"")
        }
        PayloadBody::Bitmap { regions } => format!("bitmap ({} regions)", regions.len()),
    }
}

fn print_stats(stats: &FeedStats) {
    println!();
    println!("Run summary:");
    println!("  Events in: {}", stats.events_in);
    println!(
        "  Frames out: {} ({} fresh, {} repeat, {} filler)",
        stats.frames_out, stats.fresh_frames, stats.repeat_frames, stats.filler_frames
    );
    println!(
        "  Dropped: {} ({} expired, {} superseded, {} stale)",
        stats.total_dropped(),
        stats.dropped_expired,
        stats.dropped_superseded,
        stats.dropped_stale
    );
    println!("  Durations resolved: {}", stats.durations_resolved);
    println!("  Overlaps trimmed: {}", stats.overlaps_trimmed);
}
