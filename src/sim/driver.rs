// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! The simulation loop.
//!
//! Each iteration is one half clock period, in a fixed order:
//! toggle clocks, producer step, consumer step, DUT eval, trace dump.
//! Producer and consumer both act on pin values settled by the previous
//! eval, so the order must not change.

use crate::dut::Dut;
use crate::image::ImageBuffer;
use crate::sim::checker::{CheckerConfig, CheckerStats, SimControl, StreamChecker};
use crate::sim::config::{self, Kernel, RegisterWrite};
use crate::sim::consumer::StreamConsumer;
use crate::sim::producer::StreamProducer;
use crate::sim::trace::Trace;

/// Loop parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Liveness bound on main-loop iterations.
    pub max_cycles: u64,
    /// Half-cycles spent in reset before streaming.
    pub reset_cycles: u32,
    /// Iterations between progress log lines (0 = silent).
    pub progress_interval: u64,
    /// Evaluations a register write may wait for its handshake.
    pub register_poll_budget: u64,
    pub checker: CheckerConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            max_cycles: 1_000_000,
            reset_cycles: 10,
            progress_interval: 10_000,
            register_poll_budget: 1_000,
            checker: CheckerConfig::default(),
        }
    }
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every output position was written at least once.
    Completed,
    /// `max_cycles` ran out first.
    CycleBudget,
    /// A protocol checker asked to terminate.
    ProtocolViolation,
}

/// Everything a run produced, complete or not.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Reconstructed output; pixels never received stay zero.
    pub image: ImageBuffer,
    pub cycles: u64,
    pub pixels_sent: usize,
    /// Beats stored into the image, repeats included.
    pub pixels_received: usize,
    /// Distinct positions covered by the stored beats.
    pub pixels_filled: usize,
    pub pixels_dropped: usize,
    pub stop: StopReason,
    /// Protocol statistics of the harness-driven input port.
    pub input_port: CheckerStats,
    /// Protocol statistics of the DUT-driven output port.
    pub output_port: CheckerStats,
}

impl RunOutcome {
    pub fn completed(&self) -> bool {
        self.stop == StopReason::Completed
    }
}

/// Owns the clock and the trace time base.
pub struct CycleDriver {
    config: DriverConfig,
    /// Trace timestamp, one tick per eval in reset and main loop alike.
    time: u64,
    input_port: StreamChecker,
    output_port: StreamChecker,
    /// Latched once a checker asks to terminate.
    stop_requested: bool,
}

impl CycleDriver {
    pub fn new(config: DriverConfig) -> Self {
        let input_port = StreamChecker::new("s_axis", config.checker.clone());
        let output_port = StreamChecker::new("m_axis", config.checker.clone());
        CycleDriver {
            config,
            time: 0,
            input_port,
            output_port,
            stop_requested: false,
        }
    }

    /// Next trace timestamp.
    pub fn timestamp(&self) -> u64 {
        self.time
    }

    /// Hold both resets low for `reset_cycles` clock toggles, then release.
    pub fn reset<D: Dut + ?Sized>(&mut self, dut: &mut D, trace: &mut dyn Trace) {
        let pins = dut.inputs_mut();
        pins.clk = false;
        pins.s_axi_aclk = false;
        pins.rst_n = false;
        pins.s_axi_aresetn = false;
        pins.s_axis_tvalid = false;
        pins.s_axis_tlast = false;
        pins.s_axis_tuser = 0;

        for _ in 0..self.config.reset_cycles {
            toggle_clocks(dut);
            dut.eval();
            let in_control = self.input_port.observe_reset(self.time, dut.inputs().s_axis_tvalid);
            let out_control = self.output_port.observe_reset(self.time, dut.outputs().m_axis_tvalid);
            if in_control == SimControl::Terminate || out_control == SimControl::Terminate {
                self.stop_requested = true;
            }
            trace.dump(self.time, dut.inputs(), dut.outputs());
            self.time += 1;
        }

        let pins = dut.inputs_mut();
        pins.rst_n = true;
        pins.s_axi_aresetn = true;
        clilog::debug!("reset released after {} half-cycles", self.config.reset_cycles);
    }

    /// Write the kernel registers (k00 only) with the configured poll budget.
    pub fn configure<D: Dut + ?Sized>(&mut self, dut: &mut D, kernel: &Kernel) -> RegisterWrite {
        config::configure(dut, kernel, self.config.register_poll_budget)
    }

    /// Stream `input` through the DUT until all pixels come back or a bound
    /// is hit. Never fails: an incomplete run returns the partial image.
    pub fn run<D: Dut + ?Sized>(&mut self, dut: &mut D, input: &ImageBuffer, trace: &mut dyn Trace) -> RunOutcome {
        let total = input.num_pixels();
        let mut output = ImageBuffer::new(input.width(), input.height());
        let mut producer = StreamProducer::new();
        let mut consumer = StreamConsumer::new();

        let pins = dut.inputs_mut();
        pins.s_axis_tvalid = false;
        pins.s_axis_tlast = false;
        pins.s_axis_tuser = 0;
        pins.m_axis_tready = true;

        clilog::info!("Starting simulation: {}x{} frame, {} pixels", input.width(), input.height(), total);
        let mut cycles = 0u64;
        let stop = loop {
            if self.stop_requested {
                break StopReason::ProtocolViolation;
            }
            if consumer.filled() >= total {
                break StopReason::Completed;
            }
            if cycles >= self.config.max_cycles {
                break StopReason::CycleBudget;
            }

            toggle_clocks(dut);
            producer.step(dut, input);
            consumer.step(dut, &mut output);
            let out_control = self.output_port.observe(
                self.time,
                dut.outputs().m_axis_tvalid,
                dut.inputs().m_axis_tready,
                dut.outputs().m_axis_beat(),
            );
            dut.eval();
            let in_control = self.input_port.observe(
                self.time,
                dut.inputs().s_axis_tvalid,
                dut.outputs().s_axis_tready,
                dut.inputs().s_axis_beat(),
            );
            trace.dump(self.time, dut.inputs(), dut.outputs());
            self.time += 1;
            cycles += 1;

            if self.config.progress_interval > 0 && cycles % self.config.progress_interval == 0 {
                clilog::info!(
                    "Cycle: {}, pixels sent: {}, pixels received: {}",
                    cycles,
                    producer.pixels_sent(),
                    consumer.received()
                );
            }
            if out_control == SimControl::Terminate || in_control == SimControl::Terminate {
                self.stop_requested = true;
            }
        };

        match stop {
            StopReason::Completed => clilog::info!("Simulation completed in {} cycles", cycles),
            StopReason::CycleBudget => clilog::warn!(
                "Cycle budget of {} exhausted: {}/{} pixels filled, input {}",
                self.config.max_cycles,
                consumer.filled(),
                total,
                if producer.is_done(input) { "fully accepted" } else { "still pending" }
            ),
            StopReason::ProtocolViolation => clilog::warn!(
                "Simulation stopped by protocol checker after {} cycles: {}/{} pixels filled",
                cycles,
                consumer.filled(),
                total
            ),
        }
        if consumer.dropped() > 0 {
            clilog::warn!("{} output beats carried out-of-range positions", consumer.dropped());
        }

        RunOutcome {
            image: output,
            cycles,
            pixels_sent: producer.pixels_sent(),
            pixels_received: consumer.received(),
            pixels_filled: consumer.filled(),
            pixels_dropped: consumer.dropped(),
            stop,
            input_port: self.input_port.stats().clone(),
            output_port: self.output_port.stats().clone(),
        }
    }
}

/// Advance both clock aliases together.
fn toggle_clocks<D: Dut + ?Sized>(dut: &mut D) {
    let pins = dut.inputs_mut();
    pins.clk = !pins.clk;
    pins.s_axi_aclk = pins.clk;
}
