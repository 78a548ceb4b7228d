// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Row-major RGB888 image buffer and the packed stream word format.

/// Bytes per pixel (R, G, B).
pub const CHANNELS: usize = 3;

/// One RGB pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Pack into a stream word: byte0 = R, byte1 = G, byte2 = B.
    #[inline]
    pub fn pack(self) -> u32 {
        (self.b as u32) << 16 | (self.g as u32) << 8 | self.r as u32
    }

    /// Inverse of [`Rgb::pack`]. Bits above byte 2 are ignored.
    #[inline]
    pub fn unpack(word: u32) -> Self {
        Rgb {
            r: (word & 0xFF) as u8,
            g: (word >> 8 & 0xFF) as u8,
            b: (word >> 16 & 0xFF) as u8,
        }
    }
}

/// Fixed-size image, `width * height * 3` bytes in row-major R,G,B order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl ImageBuffer {
    /// Zero-initialized (black) image.
    pub fn new(width: usize, height: usize) -> Self {
        ImageBuffer {
            width,
            height,
            data: vec![0u8; width * height * CHANNELS],
        }
    }

    /// Wrap existing bytes. Returns `None` when the length does not match.
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Option<Self> {
        if data.len() != width * height * CHANNELS {
            return None;
        }
        Some(ImageBuffer { width, height, data })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of pixels (`width * height`).
    #[inline]
    pub fn num_pixels(&self) -> usize {
        self.width * self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Pixel at linear index, or `None` past the end.
    pub fn pixel(&self, index: usize) -> Option<Rgb> {
        let base = index.checked_mul(CHANNELS)?;
        let px = self.data.get(base..base + CHANNELS)?;
        Some(Rgb::new(px[0], px[1], px[2]))
    }

    /// Pixel at `(x, y)`.
    pub fn pixel_at(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixel(y * self.width + x)
    }

    /// Store a pixel at linear index. Returns `false` (and writes nothing)
    /// when the index is outside the image.
    pub fn set_pixel(&mut self, index: usize, px: Rgb) -> bool {
        if index >= self.num_pixels() {
            return false;
        }
        let base = index * CHANNELS;
        self.data[base] = px.r;
        self.data[base + 1] = px.g;
        self.data[base + 2] = px.b;
        true
    }

    /// Store a pixel at `(x, y)`; out-of-range coordinates are ignored.
    pub fn set_pixel_at(&mut self, x: usize, y: usize, px: Rgb) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.set_pixel(y * self.width + x, px)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_channel_order() {
        let px = Rgb::new(0x11, 0x22, 0x33);
        assert_eq!(px.pack(), 0x0033_2211);
        assert_eq!(Rgb::unpack(0xAB33_2211), px);
    }

    #[test]
    fn test_buffer_length_invariant() {
        let img = ImageBuffer::new(7, 5);
        assert_eq!(img.as_bytes().len(), 7 * 5 * 3);
        assert!(img.as_bytes().iter().all(|&b| b == 0));
        assert!(ImageBuffer::from_raw(2, 2, vec![0; 11]).is_none());
        assert!(ImageBuffer::from_raw(2, 2, vec![0; 12]).is_some());
    }

    #[test]
    fn test_set_pixel_bounds() {
        let mut img = ImageBuffer::new(3, 2);
        assert!(img.set_pixel(5, Rgb::new(1, 2, 3)));
        assert!(!img.set_pixel(6, Rgb::new(9, 9, 9)));
        assert!(!img.set_pixel_at(3, 0, Rgb::new(9, 9, 9)));
        assert_eq!(img.pixel_at(2, 1), Some(Rgb::new(1, 2, 3)));
        assert_eq!(img.pixel(6), None);
        assert_eq!(&img.as_bytes()[15..], &[1, 2, 3]);
    }
}
