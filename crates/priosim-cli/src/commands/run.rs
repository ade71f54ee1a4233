//! # priosim-cli::commands::run
//!
//! Implements the `run` subcommand.

use anyhow::Result;

use crate::args::RunOpts;
use crate::wiring::{build_network, load_scenario};

pub fn exec(opts: RunOpts) -> Result<()> {
    let scenario = load_scenario(&opts.scenario)?;
    let mut net = build_network(&scenario)?;

    println!(
        "Running scenario '{}' (sim_duration={}s)",
        opts.scenario.display(),
        scenario.sim_duration
    );
    net.run();

    let global = net.global_statistics();
    println!("=== Global statistics ===");
    println!("delivered:        {}", global.total_messages_delivered);
    println!("dropped:          {}", global.total_messages_dropped);
    println!("streams:          {}", global.total_streams);
    match global.mean_delay_ms {
        Some(mean) => println!(
            "delay (ms):       mean={:.3} min={:.3} max={:.3}",
            mean,
            global.min_delay_ms.unwrap_or(0.0),
            global.max_delay_ms.unwrap_or(0.0)
        ),
        None => println!("delay (ms):       n/a (no messages delivered)"),
    }

    println!("=== Per-stream statistics ===");
    for stream_id in net.stream_ids() {
        let stats = net.stream_statistics(stream_id);
        match stats.mean_delay_ms {
            Some(mean) => println!(
                "stream {:>4} (p{}): delivered={} dropped={} mean_delay_ms={:.3} jitter_ms={:.3} throughput_mbps={:.3}",
                stats.stream_id,
                stats.priority.unwrap_or(0),
                stats.total_messages,
                stats.dropped_messages,
                mean,
                stats.mean_jitter_ms.unwrap_or(0.0),
                stats.throughput_mbps.unwrap_or(0.0)
            ),
            None => println!(
                "stream {:>4}: delivered=0 dropped={} (no messages delivered)",
                stats.stream_id, stats.dropped_messages
            ),
        }
    }

    if let Some(csv_path) = &opts.csv {
        net.export_csv(csv_path)?;
        println!("wrote results csv to {}", csv_path.display());
    }

    Ok(())
}
