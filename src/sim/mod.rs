// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Cycle-level testbench machinery around a [`Dut`](crate::dut::Dut).
//!
//! - [`config`]: kernel register writes over AXI4-Lite
//! - [`producer`]: input stream master
//! - [`consumer`]: output stream slave and frame reconstruction
//! - [`checker`]: runtime AXI4-Stream protocol checks
//! - [`trace`]: VCD waveform capture
//! - [`driver`]: the clocked simulation loop tying them together

pub mod checker;
pub mod config;
pub mod consumer;
pub mod driver;
pub mod producer;
pub mod trace;
