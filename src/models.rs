// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Behavioral stand-ins for the pixel pipeline RTL.
//!
//! [`LoopbackDut`] passes every beat through a small FIFO unchanged, which
//! lets the harness run end-to-end without an HDL simulator. Stream-side
//! state only advances on rising `clk` edges; the configuration port is
//! combinational so it answers the register driver's clockless polling.

use std::collections::VecDeque;

use serde::Deserialize;

use crate::dut::{Dut, DutInputs, DutOutputs, StreamBeat};

/// Words in the configuration register file (byte addresses `0..0x40`).
pub const NUM_REGS: usize = 16;

/// Timing knobs of [`LoopbackDut`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoopbackConfig {
    /// Rising edges between capturing a beat and presenting it.
    pub latency: u64,
    /// Beats buffered before input ready drops.
    pub fifo_depth: usize,
    /// Drop input ready on every n-th rising edge (0 = never).
    pub input_stall_every: u64,
    /// Hold back output valid on every n-th rising edge (0 = never).
    pub output_stall_every: u64,
    /// Evaluations a register write waits before `awready`/`wready` rise.
    pub lite_ready_delay: u32,
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        LoopbackConfig {
            latency: 2,
            fifo_depth: 4,
            input_stall_every: 0,
            output_stall_every: 0,
            lite_ready_delay: 1,
        }
    }
}

fn stalled(every: u64, edge: u64) -> bool {
    every > 0 && edge % every == 0
}

/// Identity pixel pipeline with an AXI4-Lite register file.
pub struct LoopbackDut {
    config: LoopbackConfig,
    inputs: DutInputs,
    outputs: DutOutputs,
    prev_clk: bool,
    /// Rising edges seen since reset was released.
    edge: u64,
    fifo: VecDeque<(u64, StreamBeat)>,
    regs: [u32; NUM_REGS],
    lite_wait: u32,
    reg_writes: usize,
}

impl LoopbackDut {
    pub fn new(config: LoopbackConfig) -> Self {
        LoopbackDut {
            config,
            inputs: DutInputs::default(),
            outputs: DutOutputs::default(),
            prev_clk: false,
            edge: 0,
            fifo: VecDeque::new(),
            regs: [0; NUM_REGS],
            lite_wait: 0,
            reg_writes: 0,
        }
    }

    /// Register value at word index, `None` past the register file.
    pub fn register(&self, index: usize) -> Option<u32> {
        self.regs.get(index).copied()
    }

    /// Number of completed register writes since the last config reset.
    pub fn reg_writes(&self) -> usize {
        self.reg_writes
    }

    /// Beats currently held inside the pipeline.
    pub fn occupancy(&self) -> usize {
        self.fifo.len()
    }

    fn eval_stream(&mut self, rising: bool) {
        if !self.inputs.rst_n {
            self.edge = 0;
            self.fifo.clear();
            self.outputs.s_axis_tready = false;
            self.outputs.m_axis_tvalid = false;
            self.outputs.m_axis_tdata = 0;
            self.outputs.m_axis_tlast = false;
            self.outputs.m_axis_tuser = 0;
            return;
        }

        // the beat presented by the previous eval was taken if ready is high
        // now; otherwise it stays on the wires untouched
        if self.outputs.m_axis_tvalid && self.inputs.m_axis_tready {
            self.fifo.pop_front();
            self.outputs.m_axis_tvalid = false;
        }
        self.outputs.s_axis_tready = false;
        if !rising {
            return;
        }
        self.edge += 1;

        let ready = self.fifo.len() < self.config.fifo_depth
            && !stalled(self.config.input_stall_every, self.edge);
        self.outputs.s_axis_tready = ready;
        if ready && self.inputs.s_axis_tvalid {
            self.fifo.push_back((self.edge, self.inputs.s_axis_beat()));
        }

        if self.outputs.m_axis_tvalid {
            return;
        }
        if let Some(&(captured, beat)) = self.fifo.front() {
            if self.edge - captured >= self.config.latency
                && !stalled(self.config.output_stall_every, self.edge)
            {
                self.outputs.m_axis_tvalid = true;
                self.outputs.m_axis_tdata = beat.tdata;
                self.outputs.m_axis_tlast = beat.tlast;
                self.outputs.m_axis_tuser = beat.tuser;
            }
        }
    }

    fn eval_lite(&mut self) {
        if !self.inputs.s_axi_aresetn {
            self.regs = [0; NUM_REGS];
            self.lite_wait = 0;
            self.reg_writes = 0;
            self.outputs.s_axi_awready = false;
            self.outputs.s_axi_wready = false;
            return;
        }

        let request = self.inputs.s_axi_awvalid && self.inputs.s_axi_wvalid;
        if !request || self.lite_wait < self.config.lite_ready_delay {
            self.lite_wait = if request { self.lite_wait + 1 } else { 0 };
            self.outputs.s_axi_awready = false;
            self.outputs.s_axi_wready = false;
            return;
        }

        let index = (self.inputs.s_axi_awaddr >> 2) as usize;
        if let Some(reg) = self.regs.get_mut(index) {
            let mut value = *reg;
            for byte in 0..4 {
                if self.inputs.s_axi_wstrb >> byte & 1 != 0 {
                    let mask = 0xFFu32 << (byte * 8);
                    value = (value & !mask) | (self.inputs.s_axi_wdata & mask);
                }
            }
            *reg = value;
        } else {
            clilog::debug!("register write to 0x{:x} outside register file", self.inputs.s_axi_awaddr);
        }
        self.reg_writes += 1;
        self.lite_wait = 0;
        self.outputs.s_axi_awready = true;
        self.outputs.s_axi_wready = true;
    }
}

impl Default for LoopbackDut {
    fn default() -> Self {
        Self::new(LoopbackConfig::default())
    }
}

impl Dut for LoopbackDut {
    fn inputs(&self) -> &DutInputs {
        &self.inputs
    }

    fn inputs_mut(&mut self) -> &mut DutInputs {
        &mut self.inputs
    }

    fn outputs(&self) -> &DutOutputs {
        &self.outputs
    }

    fn eval(&mut self) {
        let rising = self.inputs.clk && !self.prev_clk;
        self.prev_clk = self.inputs.clk;
        self.eval_stream(rising);
        self.eval_lite();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn released(config: LoopbackConfig) -> LoopbackDut {
        let mut dut = LoopbackDut::new(config);
        dut.inputs_mut().rst_n = true;
        dut.inputs_mut().s_axi_aresetn = true;
        dut.inputs_mut().m_axis_tready = true;
        dut
    }

    fn edge(dut: &mut LoopbackDut) {
        dut.inputs_mut().clk = true;
        dut.eval();
    }

    fn fall(dut: &mut LoopbackDut) {
        dut.inputs_mut().clk = false;
        dut.eval();
    }

    #[test]
    fn test_ready_only_on_rising_edge() {
        let mut dut = released(LoopbackConfig::default());
        fall(&mut dut);
        assert!(!dut.outputs().s_axis_tready);
        edge(&mut dut);
        assert!(dut.outputs().s_axis_tready);
        fall(&mut dut);
        assert!(!dut.outputs().s_axis_tready);
    }

    #[test]
    fn test_beat_passes_through_with_latency() {
        let mut dut = released(LoopbackConfig {
            latency: 1,
            ..Default::default()
        });
        dut.inputs_mut().s_axis_tvalid = true;
        dut.inputs_mut().s_axis_tdata = 0x00AB_CDEF;
        dut.inputs_mut().s_axis_tlast = true;
        dut.inputs_mut().s_axis_tuser = 7;
        edge(&mut dut);
        assert!(dut.outputs().s_axis_tready);
        assert_eq!(dut.occupancy(), 1);
        assert!(!dut.outputs().m_axis_tvalid);

        dut.inputs_mut().s_axis_tvalid = false;
        fall(&mut dut);
        edge(&mut dut);
        assert!(dut.outputs().m_axis_tvalid);
        assert_eq!(
            dut.outputs().m_axis_beat(),
            StreamBeat {
                tdata: 0x00AB_CDEF,
                tlast: true,
                tuser: 7
            }
        );
        fall(&mut dut);
        assert_eq!(dut.occupancy(), 0);
        assert!(!dut.outputs().m_axis_tvalid);
    }

    #[test]
    fn test_output_held_without_ready() {
        let mut dut = released(LoopbackConfig {
            latency: 0,
            ..Default::default()
        });
        dut.inputs_mut().m_axis_tready = false;
        dut.inputs_mut().s_axis_tvalid = true;
        edge(&mut dut);
        dut.inputs_mut().s_axis_tvalid = false;
        assert!(dut.outputs().m_axis_tvalid);
        fall(&mut dut);
        assert!(dut.outputs().m_axis_tvalid);
        edge(&mut dut);
        assert!(dut.outputs().m_axis_tvalid);
        assert_eq!(dut.occupancy(), 1);

        dut.inputs_mut().m_axis_tready = true;
        fall(&mut dut);
        assert!(!dut.outputs().m_axis_tvalid);
        assert_eq!(dut.occupancy(), 0);
    }

    #[test]
    fn test_full_fifo_drops_ready() {
        let mut dut = released(LoopbackConfig {
            latency: 100,
            fifo_depth: 2,
            ..Default::default()
        });
        dut.inputs_mut().s_axis_tvalid = true;
        edge(&mut dut);
        fall(&mut dut);
        edge(&mut dut);
        fall(&mut dut);
        edge(&mut dut);
        assert!(!dut.outputs().s_axis_tready);
        assert_eq!(dut.occupancy(), 2);
    }

    #[test]
    fn test_register_write_strobes() {
        let mut dut = released(LoopbackConfig {
            lite_ready_delay: 2,
            ..Default::default()
        });
        dut.inputs_mut().s_axi_awaddr = 0x8;
        dut.inputs_mut().s_axi_wdata = 0x1122_3344;
        dut.inputs_mut().s_axi_wstrb = 0b0101;
        dut.inputs_mut().s_axi_awvalid = true;
        dut.inputs_mut().s_axi_wvalid = true;
        dut.eval();
        assert!(!dut.outputs().s_axi_awready);
        dut.eval();
        assert!(!dut.outputs().s_axi_awready);
        dut.eval();
        assert!(dut.outputs().s_axi_awready && dut.outputs().s_axi_wready);
        assert_eq!(dut.register(2), Some(0x0022_0044));
        assert_eq!(dut.reg_writes(), 1);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut dut = released(LoopbackConfig::default());
        dut.inputs_mut().s_axis_tvalid = true;
        edge(&mut dut);
        assert_eq!(dut.occupancy(), 1);
        dut.inputs_mut().rst_n = false;
        fall(&mut dut);
        assert_eq!(dut.occupancy(), 0);
        assert_eq!(dut.outputs(), &DutOutputs::default());
    }
}
