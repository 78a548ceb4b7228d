// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Kernel register configuration over the AXI4-Lite write channel.
//!
//! Only coefficient k00 is transferred. The addressing and completion
//! signalling for the other eight registers are not defined by the design
//! this harness targets, so they are left untouched.

use crate::dut::Dut;

/// 3x3 convolution kernel, row-major.
pub type Kernel = [[i8; 3]; 3];

/// Laplacian edge-detection kernel driven by the default testbench.
pub const EDGE_KERNEL: Kernel = [[0, -1, 0], [-1, 4, -1], [0, -1, 0]];

/// Write strobe covering all four bytes of the data word.
pub const FULL_STROBE: u8 = 0xF;

/// Byte address of coefficient `(row, col)`.
pub fn kernel_register(row: usize, col: usize) -> u32 {
    (4 * (3 * row + col)) as u32
}

/// Register value for a coefficient: its two's-complement byte, zero-extended.
pub fn coefficient_word(k: i8) -> u32 {
    k as u8 as u32
}

/// Result of one register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterWrite {
    /// `awready` and `wready` were seen together after `polls` evaluations.
    Acked { addr: u32, data: u32, polls: u64 },
    /// The poll budget ran out before the slave answered.
    TimedOut { addr: u32, polls: u64 },
}

/// Drive a single write and poll `eval()` (without clocking) until the
/// slave raises both ready signals or `poll_budget` evaluations have passed.
/// Valid signals are dropped in either case.
pub fn write_register<D: Dut + ?Sized>(dut: &mut D, addr: u32, data: u32, poll_budget: u64) -> RegisterWrite {
    let pins = dut.inputs_mut();
    pins.s_axi_awaddr = addr;
    pins.s_axi_awvalid = true;
    pins.s_axi_wdata = data;
    pins.s_axi_wvalid = true;
    pins.s_axi_wstrb = FULL_STROBE;

    let mut polls = 0u64;
    let acked = loop {
        let out = dut.outputs();
        if out.s_axi_awready && out.s_axi_wready {
            break true;
        }
        if polls >= poll_budget {
            break false;
        }
        dut.eval();
        polls += 1;
    };

    let pins = dut.inputs_mut();
    pins.s_axi_awvalid = false;
    pins.s_axi_wvalid = false;

    if acked {
        RegisterWrite::Acked { addr, data, polls }
    } else {
        clilog::warn!(
            "register write to 0x{:02x} not acknowledged after {} evaluations",
            addr,
            polls
        );
        RegisterWrite::TimedOut { addr, polls }
    }
}

/// Configure the convolution kernel. Transfers coefficient k00 only.
pub fn configure<D: Dut + ?Sized>(dut: &mut D, kernel: &Kernel, poll_budget: u64) -> RegisterWrite {
    let result = write_register(dut, kernel_register(0, 0), coefficient_word(kernel[0][0]), poll_budget);
    clilog::debug!("kernel k00 write: {:?}; remaining 8 coefficients not transmitted", result);
    result
}
