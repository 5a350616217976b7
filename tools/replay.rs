// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Spike trace replay.
//!
//! Loads a binary descriptor (and optionally a core-parameter region and a
//! TOML options file), feeds a text spike trace through one core tick by
//! tick, and prints what the neuron side or the network would have seen,
//! followed by the core's provenance counters.
//!
//! Trace format, one event per line (`#` starts a comment):
//!
//! ```text
//! <timestep> <key> [payload]
//! 0 0x00010004
//! 0 0x00020005 0x00050000
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};

use spikecore::burst_engine::{ConvolutionCore, Provenance, SpikeReceiver, TickReport, WtaCore};
use spikecore::config::{load_options, CoreOptions};
use spikecore::observability::{init_logging, parse_debug_flags, LogFormat, LoggingConfig};
use spikecore::runtime::{RecordingTransmitter, VecRingBuffers};

/// Replay a spike trace through one spikecore core
#[derive(Parser, Debug)]
#[command(name = "spikecore-replay", version, long_about = None)]
struct Args {
    /// Binary connectivity descriptor
    #[arg(short, long)]
    descriptor: PathBuf,

    /// Core-parameter region (required with --wta)
    #[arg(short, long)]
    params: Option<PathBuf>,

    /// Runtime options TOML (defaults and SPIKECORE_* overrides otherwise)
    #[arg(short, long)]
    options: Option<PathBuf>,

    /// Spike trace to replay
    #[arg(short, long)]
    trace: PathBuf,

    /// Run a winner-take-all core instead of a convolution core
    #[arg(long, default_value_t = false)]
    wta: bool,

    /// Number of ticks to run (default: up to the last traced timestep)
    #[arg(long)]
    ticks: Option<u32>,

    /// Raise these crates to debug level (comma-separated)
    #[arg(long, value_delimiter = ',')]
    debug: Vec<String>,

    /// Emit logs as JSON
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

/// One traced event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TracedSpike {
    key: u32,
    payload: u32,
}

type Trace = BTreeMap<u32, Vec<TracedSpike>>;

fn main() -> Result<()> {
    let args = Args::parse();

    let mut flags = parse_debug_flags();
    for crate_name in &args.debug {
        flags.enable(crate_name);
    }
    let logging = LoggingConfig {
        format: if args.json_logs { LogFormat::Json } else { LogFormat::Text },
        ..LoggingConfig::default()
    };
    let _guard = init_logging(&logging, &flags)?;

    let options = load_options(args.options.as_deref(), None)
        .context("Failed to load runtime options")?;

    let descriptor = read(&args.descriptor)?;
    let params = args.params.as_deref().map(read).transpose()?;
    let trace_text = fs::read_to_string(&args.trace)
        .with_context(|| format!("Failed to read trace {}", args.trace.display()))?;
    let trace = parse_trace(&trace_text)?;

    let ticks = match args.ticks {
        Some(ticks) => ticks,
        None => trace.keys().next_back().map_or(0, |last| last.saturating_add(1)),
    };
    info!(
        target: "spikecore-replay",
        "Replaying {} events over {} ticks",
        trace.values().map(Vec::len).sum::<usize>(),
        ticks
    );

    let provenance = if args.wta {
        replay_wta(&descriptor, params.as_deref(), &options, &trace, ticks)?
    } else {
        replay_convolution(&descriptor, params.as_deref(), &options, &trace, ticks)?
    };

    println!("{:#?}", provenance);
    Ok(())
}

fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn replay_convolution(
    descriptor: &[u8],
    params: Option<&[u8]>,
    options: &CoreOptions,
    trace: &Trace,
    ticks: u32,
) -> Result<Provenance> {
    let (mut core, mut rx) = ConvolutionCore::initialize(descriptor, params, options)?;
    let layout = core.layout();
    let mut ring_buffers = VecRingBuffers::new(layout);
    let neuron_mask = layout.n_neurons() - 1;

    for timestep in 0..ticks {
        feed(&mut rx, trace, timestep);
        let report = core.on_timestep_tick(timestep, &mut ring_buffers)?;
        log_report(&report);

        // Neuron side: consume this timestep's inputs
        for (slot, value) in ring_buffers.take_timestep(timestep).into_iter().enumerate() {
            if value == 0 {
                continue;
            }
            let slot = slot as u32;
            println!(
                "t={} type={} neuron={} value={}",
                timestep,
                slot >> layout.neuron_bits,
                slot & neuron_mask,
                value
            );
        }
    }
    Ok(core.provenance())
}

fn replay_wta(
    descriptor: &[u8],
    params: Option<&[u8]>,
    options: &CoreOptions,
    trace: &Trace,
    ticks: u32,
) -> Result<Provenance> {
    let (mut core, mut rx) = WtaCore::initialize(descriptor, params, options)?;
    let mut transmitter = RecordingTransmitter::new();

    for timestep in 0..ticks {
        feed(&mut rx, trace, timestep);
        let report = core.on_timestep_tick(timestep, &mut transmitter);
        log_report(&report);

        for key in transmitter.take() {
            println!("t={} key=0x{:08x}", timestep, key);
        }
    }
    Ok(core.provenance())
}

fn feed(rx: &mut SpikeReceiver, trace: &Trace, timestep: u32) {
    let Some(spikes) = trace.get(&timestep) else {
        return;
    };
    let refused = spikes
        .iter()
        .filter(|spike| !rx.on_event_received(spike.key, spike.payload))
        .count();
    if refused > 0 {
        warn!(
            target: "spikecore-replay",
            "Input queue full at timestep {}: {} events lost",
            timestep,
            refused
        );
    }
}

fn log_report(report: &TickReport) {
    debug!(
        target: "spikecore-replay",
        "t={} processed={} unmatched={} dropped={} carried={} weights={} emitted={}",
        report.timestep,
        report.processed,
        report.unmatched,
        report.dropped,
        report.carried,
        report.accumulation.weights_added,
        report.emitted
    );
}

fn parse_trace(text: &str) -> Result<Trace> {
    let mut trace = Trace::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if !(2..=3).contains(&fields.len()) {
            bail!(
                "trace line {}: expected `<timestep> <key> [payload]`, got {:?}",
                line_no + 1,
                line
            );
        }
        let number = |field: &str| {
            parse_u32(field).with_context(|| format!("trace line {}: bad number {:?}", line_no + 1, field))
        };
        let timestep = number(fields[0])?;
        let key = number(fields[1])?;
        let payload = match fields.get(2) {
            Some(field) => number(field)?,
            None => 0,
        };
        trace.entry(timestep).or_default().push(TracedSpike { key, payload });
    }
    Ok(trace)
}

fn parse_u32(field: &str) -> Result<u32> {
    let value = match field.strip_prefix("0x").or_else(|| field.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16)?,
        None => field.parse()?,
    };
    Ok(value)
}
