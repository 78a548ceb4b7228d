// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Synthetic input frames.
//!
//! Every pattern is a pure function of its parameters and the frame size.

use serde::Deserialize;

use crate::image::{ImageBuffer, Rgb};

/// First row/column of the bar grid in [`Pattern::Bars`].
const BARS_ORIGIN: usize = 100;

/// Test pattern selection (from JSON, e.g. `{"kind": "checkerboard", "square": 32}`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Pattern {
    /// Red ramps along x, green along y, blue along the diagonal.
    #[default]
    Gradient,
    /// Alternating white/black squares.
    Checkerboard {
        #[serde(default = "default_square")]
        square: usize,
    },
    /// White horizontal bars crossed by black vertical bars on grey.
    Bars {
        #[serde(default = "default_pitch")]
        pitch: usize,
        #[serde(default = "default_thickness")]
        thickness: usize,
    },
}

fn default_square() -> usize {
    32
}

fn default_pitch() -> usize {
    80
}

fn default_thickness() -> usize {
    10
}

impl Pattern {
    pub fn generate(self, width: usize, height: usize) -> ImageBuffer {
        match self {
            Pattern::Gradient => generate(width, height),
            Pattern::Checkerboard { square } => checkerboard(width, height, square),
            Pattern::Bars { pitch, thickness } => bars(width, height, pitch, thickness),
        }
    }
}

/// Gradient frame used as the harness dataset.
///
/// `R = x*255/W`, `G = y*255/H`, `B = (x+y)*255/(W+H)`, truncating division.
pub fn generate(width: usize, height: usize) -> ImageBuffer {
    let mut img = ImageBuffer::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let px = Rgb::new(
                (x * 255 / width) as u8,
                (y * 255 / height) as u8,
                ((x + y) * 255 / (width + height)) as u8,
            );
            img.set_pixel(y * width + x, px);
        }
    }
    img
}

pub fn checkerboard(width: usize, height: usize, square: usize) -> ImageBuffer {
    let square = square.max(1);
    let mut img = ImageBuffer::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let v = if (x / square + y / square) % 2 == 0 { 255 } else { 0 };
            img.set_pixel(y * width + x, Rgb::new(v, v, v));
        }
    }
    img
}

pub fn bars(width: usize, height: usize, pitch: usize, thickness: usize) -> ImageBuffer {
    let pitch = pitch.max(1);
    let on_bar = |p: usize| p >= BARS_ORIGIN && (p - BARS_ORIGIN) % pitch < thickness;
    let mut img = ImageBuffer::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let v = if on_bar(x) {
                0
            } else if on_bar(y) {
                255
            } else {
                128
            };
            img.set_pixel(y * width + x, Rgb::new(v, v, v));
        }
    }
    img
}
