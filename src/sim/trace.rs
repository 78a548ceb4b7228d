// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Waveform capture of the DUT pins.
//!
//! Tracing is observational only: a failing trace writer is logged and
//! switched off, it never changes the simulation.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use vcd_ng::{IdCode, SimulationCommand, TimescaleUnit, Value, VecValue};

use crate::dut::{DutInputs, DutOutputs};

/// Sink for per-evaluation pin snapshots.
pub trait Trace {
    /// Record pin values at `timestamp`. Timestamps must increase monotonically.
    fn dump(&mut self, timestamp: u64, inputs: &DutInputs, outputs: &DutOutputs);

    /// Finish the trace. Further dumps are ignored.
    fn close(&mut self);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTrace;

impl Trace for NullTrace {
    fn dump(&mut self, _timestamp: u64, _inputs: &DutInputs, _outputs: &DutOutputs) {}

    fn close(&mut self) {}
}

/// One traced signal: name, bit width and how to read it from the pins.
struct Probe {
    name: &'static str,
    width: u32,
    read: fn(&DutInputs, &DutOutputs) -> u64,
}

macro_rules! probe {
    ($name:ident, $width:expr, input) => {
        Probe {
            name: stringify!($name),
            width: $width,
            read: |i, _| i.$name as u64,
        }
    };
    ($name:ident, $width:expr, output) => {
        Probe {
            name: stringify!($name),
            width: $width,
            read: |_, o| o.$name as u64,
        }
    };
}

const PROBES: &[Probe] = &[
    probe!(clk, 1, input),
    probe!(rst_n, 1, input),
    probe!(s_axi_aclk, 1, input),
    probe!(s_axi_aresetn, 1, input),
    probe!(s_axis_tdata, 24, input),
    probe!(s_axis_tvalid, 1, input),
    probe!(s_axis_tready, 1, output),
    probe!(s_axis_tlast, 1, input),
    probe!(s_axis_tuser, 16, input),
    probe!(m_axis_tdata, 24, output),
    probe!(m_axis_tvalid, 1, output),
    probe!(m_axis_tready, 1, input),
    probe!(m_axis_tlast, 1, output),
    probe!(m_axis_tuser, 16, output),
    probe!(s_axi_awaddr, 32, input),
    probe!(s_axi_awvalid, 1, input),
    probe!(s_axi_awready, 1, output),
    probe!(s_axi_wdata, 32, input),
    probe!(s_axi_wvalid, 1, input),
    probe!(s_axi_wready, 1, output),
    probe!(s_axi_wstrb, 4, input),
];

/// Name of the VCD scope holding the DUT pins.
pub const VCD_SCOPE: &str = "axis_tb";

/// VCD writer over every DUT pin. Only changed values are emitted.
pub struct VcdTrace {
    writer: Option<vcd_ng::Writer<BufWriter<File>>>,
    ids: Vec<IdCode>,
    last: Vec<Option<u64>>,
    last_timestamp: Option<u64>,
}

impl VcdTrace {
    /// Create `path` and write the VCD header (1ns timescale).
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = File::create(path)?;
        let mut writer = vcd_ng::Writer::new(BufWriter::new(file));
        writer.timescale(1, TimescaleUnit::NS)?;
        writer.add_module(VCD_SCOPE)?;
        let mut ids = Vec::with_capacity(PROBES.len());
        for probe in PROBES {
            ids.push(writer.add_wire(probe.width, probe.name)?);
        }
        writer.upscope()?;
        writer.enddefinitions()?;
        writer.begin(SimulationCommand::Dumpvars)?;
        clilog::info!("tracing {} signals to {}", PROBES.len(), path.display());

        Ok(VcdTrace {
            writer: Some(writer),
            ids,
            last: vec![None; PROBES.len()],
            last_timestamp: None,
        })
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    fn write_changes(&mut self, timestamp: u64, inputs: &DutInputs, outputs: &DutOutputs) -> std::io::Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        let mut stamped = false;
        for (i, probe) in PROBES.iter().enumerate() {
            let mask = if probe.width >= 64 { u64::MAX } else { (1u64 << probe.width) - 1 };
            let value = (probe.read)(inputs, outputs) & mask;
            if self.last[i] == Some(value) {
                continue;
            }
            if !stamped {
                writer.timestamp(timestamp)?;
                stamped = true;
            }
            self.last[i] = Some(value);
            if probe.width == 1 {
                writer.change_scalar(self.ids[i], if value != 0 { Value::V1 } else { Value::V0 })?;
            } else {
                let bits = (0..probe.width)
                    .rev()
                    .map(|b| if value >> b & 1 != 0 { Value::V1 } else { Value::V0 })
                    .collect::<Vec<_>>();
                writer.change_vector(self.ids[i], &VecValue::from(bits))?;
            }
        }
        Ok(())
    }
}

impl Trace for VcdTrace {
    fn dump(&mut self, timestamp: u64, inputs: &DutInputs, outputs: &DutOutputs) {
        if self.last_timestamp.is_some_and(|t| timestamp <= t) {
            clilog::warn!("non-monotonic trace timestamp {} ignored", timestamp);
            return;
        }
        self.last_timestamp = Some(timestamp);
        if let Err(e) = self.write_changes(timestamp, inputs, outputs) {
            clilog::error!("VCD write failed at {}: {}; tracing disabled", timestamp, e);
            self.writer = None;
        }
    }

    fn close(&mut self) {
        // dropping the writer flushes the buffered file
        if self.writer.take().is_some() {
            clilog::info!("trace closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("axis_harness_{}_{}.vcd", name, std::process::id()))
    }

    #[test]
    fn test_vcd_contains_header_and_changes() {
        let path = temp_path("header");
        let mut trace = VcdTrace::open(&path).unwrap();
        let mut inputs = DutInputs::default();
        let outputs = DutOutputs::default();
        trace.dump(0, &inputs, &outputs);
        inputs.clk = true;
        inputs.s_axis_tdata = 0x0A0B0C;
        trace.dump(1, &inputs, &outputs);
        // unchanged pins produce no timestamp
        trace.dump(2, &inputs, &outputs);
        trace.close();
        assert!(!trace.is_open());

        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(text.contains(VCD_SCOPE));
        assert!(text.contains("s_axis_tdata"));
        assert!(text.lines().any(|l| l.trim() == "#1"));
        assert!(!text.lines().any(|l| l.trim() == "#2"));
        assert!(text.contains("b000010100000101100001100"));
    }

    #[test]
    fn test_non_monotonic_dump_ignored() {
        let path = temp_path("mono");
        let mut trace = VcdTrace::open(&path).unwrap();
        let inputs = DutInputs::default();
        let outputs = DutOutputs::default();
        trace.dump(5, &inputs, &outputs);
        let mut changed = inputs.clone();
        changed.rst_n = true;
        trace.dump(3, &changed, &outputs);
        trace.close();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(text.lines().any(|l| l.trim() == "#5"));
        assert!(!text.lines().any(|l| l.trim() == "#3"));
    }
}
