// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Testbench configuration and the end-to-end run built from it.
//!
//! A configuration is a JSON object; every field is optional and falls back
//! to the stock run: a 640x480 gradient through the loopback pipeline,
//! at most 1,000,000 cycles, written to `rtl_out.ppm` with a trace in
//! `rtl_trace.vcd`.

use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::frame::Pattern;
use crate::models::{LoopbackConfig, LoopbackDut};
use crate::sim::checker::CheckerConfig;
use crate::sim::config::{Kernel, RegisterWrite, EDGE_KERNEL};
use crate::sim::driver::{CycleDriver, DriverConfig, RunOutcome};
use crate::sim::trace::Trace;

// ── Testbench configuration (loaded from JSON) ──────────────────────────────

/// Testbench configuration loaded from JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TestbenchConfig {
    pub width: usize,
    pub height: usize,
    pub pattern: Pattern,
    /// Liveness bound on main-loop iterations.
    pub max_cycles: u64,
    pub reset_cycles: u32,
    /// Iterations between progress lines (0 = silent).
    pub progress_interval: u64,
    pub register_poll_budget: u64,
    /// Convolution kernel; only `kernel[0][0]` reaches the DUT.
    pub kernel: Kernel,
    pub output_ppm: PathBuf,
    /// VCD destination, `null` disables tracing.
    pub trace_vcd: Option<PathBuf>,
    pub dut: LoopbackConfig,
    pub checker: CheckerConfig,
}

impl Default for TestbenchConfig {
    fn default() -> Self {
        let driver = DriverConfig::default();
        TestbenchConfig {
            width: 640,
            height: 480,
            pattern: Pattern::Gradient,
            max_cycles: driver.max_cycles,
            reset_cycles: driver.reset_cycles,
            progress_interval: driver.progress_interval,
            register_poll_budget: driver.register_poll_budget,
            kernel: EDGE_KERNEL,
            output_ppm: PathBuf::from("rtl_out.ppm"),
            trace_vcd: Some(PathBuf::from("rtl_trace.vcd")),
            dut: LoopbackConfig::default(),
            checker: driver.checker,
        }
    }
}

/// Failure to load a [`TestbenchConfig`].
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    /// Parsed, but describes a run that cannot happen.
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "cannot read config: {}", e),
            ConfigError::Parse(e) => write!(f, "malformed config JSON: {}", e),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl TestbenchConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let reader = BufReader::new(File::open(path)?);
        let config: TestbenchConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: TestbenchConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject frames the stream cannot describe.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "frame size {}x{} is empty",
                self.width, self.height
            )));
        }
        // tuser carries the column in 16 bits
        if self.width > 1 << 16 {
            return Err(ConfigError::Invalid(format!(
                "width {} does not fit the 16-bit column field",
                self.width
            )));
        }
        if let Pattern::Checkerboard { square: 0 } = self.pattern {
            return Err(ConfigError::Invalid("checkerboard square must be non-zero".into()));
        }
        if let Pattern::Bars { pitch: 0, .. } = self.pattern {
            return Err(ConfigError::Invalid("bar pitch must be non-zero".into()));
        }
        if self.dut.fifo_depth == 0 {
            return Err(ConfigError::Invalid("loopback FIFO depth must be non-zero".into()));
        }
        Ok(())
    }

    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            max_cycles: self.max_cycles,
            reset_cycles: self.reset_cycles,
            progress_interval: self.progress_interval,
            register_poll_budget: self.register_poll_budget,
            checker: self.checker.clone(),
        }
    }
}

/// Result of [`run_testbench`].
#[derive(Debug, Clone)]
pub struct TestbenchReport {
    pub register_write: RegisterWrite,
    pub outcome: RunOutcome,
}

/// Generate the input frame, reset and configure a [`LoopbackDut`], then
/// stream the frame through it.
pub fn run_testbench(config: &TestbenchConfig, trace: &mut dyn Trace) -> TestbenchReport {
    let input = config.pattern.generate(config.width, config.height);
    let mut dut = LoopbackDut::new(config.dut.clone());
    let mut driver = CycleDriver::new(config.driver_config());

    driver.reset(&mut dut, trace);
    let register_write = driver.configure(&mut dut, &config.kernel);
    let outcome = driver.run(&mut dut, &input, trace);
    TestbenchReport { register_write, outcome }
}
