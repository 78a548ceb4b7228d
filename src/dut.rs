// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Pin-level contract of the pixel pipeline top.
//!
//! The harness only ever writes [`DutInputs`] and reads [`DutOutputs`]; how
//! a design turns one into the other is hidden behind [`Dut::eval`]. A
//! Verilator model, a behavioral stub from [`crate::models`] or a scripted
//! test double all fit behind the same trait.

/// One AXI4-Stream beat as seen on the wires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamBeat {
    /// Packed pixel word, see [`crate::image::Rgb::pack`].
    pub tdata: u32,
    /// End of row.
    pub tlast: bool,
    /// Column index side channel.
    pub tuser: u32,
}

/// Signals driven by the harness.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DutInputs {
    pub clk: bool,
    pub rst_n: bool,
    /// Configuration-port clock, toggled in lockstep with `clk`.
    pub s_axi_aclk: bool,
    pub s_axi_aresetn: bool,

    pub s_axis_tdata: u32,
    pub s_axis_tvalid: bool,
    pub s_axis_tlast: bool,
    pub s_axis_tuser: u32,

    pub m_axis_tready: bool,

    pub s_axi_awaddr: u32,
    pub s_axi_awvalid: bool,
    pub s_axi_wdata: u32,
    pub s_axi_wvalid: bool,
    pub s_axi_wstrb: u8,
}

impl DutInputs {
    /// Payload currently presented on the input stream.
    pub fn s_axis_beat(&self) -> StreamBeat {
        StreamBeat {
            tdata: self.s_axis_tdata,
            tlast: self.s_axis_tlast,
            tuser: self.s_axis_tuser,
        }
    }
}

/// Signals driven by the design.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DutOutputs {
    pub s_axis_tready: bool,

    pub m_axis_tdata: u32,
    pub m_axis_tvalid: bool,
    pub m_axis_tlast: bool,
    pub m_axis_tuser: u32,

    pub s_axi_awready: bool,
    pub s_axi_wready: bool,
}

impl DutOutputs {
    /// Payload currently presented on the output stream.
    pub fn m_axis_beat(&self) -> StreamBeat {
        StreamBeat {
            tdata: self.m_axis_tdata,
            tlast: self.m_axis_tlast,
            tuser: self.m_axis_tuser,
        }
    }
}

/// Opaque device under test.
///
/// A stream beat is transferred when the harness observes `valid && ready`
/// between two [`Dut::eval`] calls. On the input port that means the design
/// must take the beat in the same `eval` that reports `s_axis_tready`; on the
/// output port it must retire the presented beat in the next `eval` that
/// sees `m_axis_tready` high.
pub trait Dut {
    fn inputs(&self) -> &DutInputs;

    fn inputs_mut(&mut self) -> &mut DutInputs;

    fn outputs(&self) -> &DutOutputs;

    /// Settle the design for the current input values (one evaluation step).
    fn eval(&mut self);
}

impl<D: Dut + ?Sized> Dut for Box<D> {
    fn inputs(&self) -> &DutInputs {
        (**self).inputs()
    }

    fn inputs_mut(&mut self) -> &mut DutInputs {
        (**self).inputs_mut()
    }

    fn outputs(&self) -> &DutOutputs {
        (**self).outputs()
    }

    fn eval(&mut self) {
        (**self).eval()
    }
}
