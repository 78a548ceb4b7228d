// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Run a frame through the loopback pixel pipeline and save the result.
//!
//! Usage:
//!   cargo run -r --bin axis_tb -- [--config <testbench.json>] [--output out.ppm]
//!     [--trace out.vcd | --no-trace] [--max-cycles N]

use axis_harness::ppm;
use axis_harness::sim::config::RegisterWrite;
use axis_harness::sim::trace::{NullTrace, Trace, VcdTrace};
use axis_harness::testbench::{run_testbench, TestbenchConfig};
use std::path::PathBuf;

#[derive(clap::Parser, Debug)]
#[command(name = "axis_tb")]
#[command(about = "Cycle-driven AXI4-Stream testbench for pixel pipelines")]
struct Args {
    /// Testbench configuration JSON file.
    #[clap(long)]
    config: Option<PathBuf>,

    /// Output image path (overrides the config).
    #[clap(long)]
    output: Option<PathBuf>,

    /// VCD trace path (overrides the config).
    #[clap(long)]
    trace: Option<PathBuf>,

    /// Disable waveform tracing.
    #[clap(long, conflicts_with = "trace")]
    no_trace: bool,

    /// Maximum half-cycles to simulate after reset.
    #[clap(long)]
    max_cycles: Option<u64>,
}

fn main() {
    clilog::init_stderr_color_debug();
    clilog::enable_timer("axis_tb");

    let args = <Args as clap::Parser>::parse();
    clilog::info!("axis_tb args:\n{:#?}", args);

    let mut config = match &args.config {
        Some(path) => match TestbenchConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                clilog::error!("{}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => TestbenchConfig::default(),
    };
    if let Some(output) = args.output {
        config.output_ppm = output;
    }
    if let Some(trace) = args.trace {
        config.trace_vcd = Some(trace);
    }
    if args.no_trace {
        config.trace_vcd = None;
    }
    if let Some(max_cycles) = args.max_cycles {
        config.max_cycles = max_cycles;
    }
    clilog::debug!("testbench config: {:?}", config);

    let mut trace: Box<dyn Trace> = match &config.trace_vcd {
        Some(path) => match VcdTrace::open(path) {
            Ok(vcd) => Box::new(vcd),
            Err(e) => {
                clilog::error!("cannot open trace {}: {}; continuing without waveforms", path.display(), e);
                Box::new(NullTrace)
            }
        },
        None => Box::new(NullTrace),
    };

    let timer_sim = clilog::stimer!("simulation");
    let report = run_testbench(&config, trace.as_mut());
    clilog::finish!(timer_sim);

    if let RegisterWrite::TimedOut { addr, polls } = report.register_write {
        clilog::warn!("kernel register 0x{:02x} never acknowledged ({} polls)", addr, polls);
    }

    let outcome = &report.outcome;
    match ppm::save_ppm(&config.output_ppm, &outcome.image) {
        Ok(()) => clilog::info!("Output image saved to {}", config.output_ppm.display()),
        Err(e) => clilog::error!("cannot write {}: {}", config.output_ppm.display(), e),
    }
    trace.close();

    clilog::info!(
        "{:?} after {} cycles: sent {}, received {} ({} distinct), dropped {}",
        outcome.stop,
        outcome.cycles,
        outcome.pixels_sent,
        outcome.pixels_received,
        outcome.pixels_filled,
        outcome.pixels_dropped
    );
    for (port, stats) in [("s_axis", &outcome.input_port), ("m_axis", &outcome.output_port)] {
        clilog::info!(
            "{}: {} transfers, {} stalls, {} violations",
            port,
            stats.transfers,
            stats.stalls,
            stats.violations
        );
    }
}
