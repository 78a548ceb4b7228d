// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Input-side stream master: feeds a frame into `s_axis` one pixel per beat.

use crate::dut::Dut;
use crate::image::ImageBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerState {
    /// No beat on the wires; the next pixel may be offered.
    Idle,
    /// A beat is held valid until the DUT reports ready.
    Awaiting,
}

/// Handshake state machine for the input stream.
///
/// Column and end-of-row markers are derived from the running pixel count:
/// `tuser = n % W`, `tlast = (n + 1) % W == 0`.
#[derive(Debug, Clone)]
pub struct StreamProducer {
    state: ProducerState,
    pixel_count: usize,
    accepted: usize,
}

impl Default for StreamProducer {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamProducer {
    pub fn new() -> Self {
        StreamProducer {
            state: ProducerState::Idle,
            pixel_count: 0,
            accepted: 0,
        }
    }

    pub fn state(&self) -> ProducerState {
        self.state
    }

    /// Pixels offered so far (including one still awaiting its handshake).
    pub fn pixels_sent(&self) -> usize {
        self.pixel_count
    }

    /// Pixels whose handshake completed.
    pub fn pixels_accepted(&self) -> usize {
        self.accepted
    }

    /// Every pixel of `input` has been offered and accepted.
    pub fn is_done(&self, input: &ImageBuffer) -> bool {
        self.state == ProducerState::Idle && self.pixel_count >= input.num_pixels()
    }

    /// Advance one evaluation step. Reads pin state left by the previous
    /// `eval`, so it must run before this step's `eval`.
    pub fn step<D: Dut + ?Sized>(&mut self, dut: &mut D, input: &ImageBuffer) {
        match self.state {
            ProducerState::Idle => {
                let Some(px) = input.pixel(self.pixel_count) else {
                    return;
                };
                let width = input.width();
                let pins = dut.inputs_mut();
                pins.s_axis_tdata = px.pack();
                pins.s_axis_tvalid = true;
                pins.s_axis_tlast = (self.pixel_count + 1) % width == 0;
                pins.s_axis_tuser = (self.pixel_count % width) as u32;
                self.pixel_count += 1;
                self.state = ProducerState::Awaiting;
            }
            ProducerState::Awaiting => {
                if dut.inputs().s_axis_tvalid && dut.outputs().s_axis_tready {
                    let pins = dut.inputs_mut();
                    pins.s_axis_tvalid = false;
                    pins.s_axis_tlast = false;
                    self.accepted += 1;
                    self.state = ProducerState::Idle;
                }
            }
        }
    }
}
