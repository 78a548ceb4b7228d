// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Cycle-driven testbench harness for streaming pixel pipelines.
//!
//! The harness feeds a synthetic frame into a device under test over an
//! AXI4-Stream input, programs its kernel over AXI4-Lite, collects the
//! processed stream back into a frame and writes it out as a PPM image.
//!
//! # Flow
//!
//! ```text
//! Pattern           (frame, synthetic RGB frame)
//!   → reset         (sim::driver, both resets held low while clocking)
//!   → configure     (sim::config, AXI4-Lite write of k00)
//!   → stream loop   (sim::producer → DUT → sim::consumer, per half cycle)
//!   → ImageBuffer   (image, rebuilt from tlast/tuser metadata)
//!   → rtl_out.ppm   (ppm, binary P6)
//! ```
//!
//! # Key modules
//!
//! - [`dut`]: pin records and the [`dut::Dut`] evaluation boundary
//! - [`models`]: behavioral loopback pipeline standing in for the RTL
//! - [`sim`]: producer, consumer, checker, trace and the cycle driver
//! - [`testbench`]: JSON configuration and the end-to-end run

pub mod image;

pub mod frame;

pub mod ppm;

pub mod dut;

pub mod models;

pub mod sim;

pub mod testbench;
