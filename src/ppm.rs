// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Binary PPM (P6) reader and writer.
//!
//! The writer emits exactly `P6\n<w> <h>\n255\n` followed by the raw
//! row-major RGB bytes. The reader accepts any whitespace and `#` comments
//! in the header but only a maxval of 255.

use std::io::{Read, Write};
use std::path::Path;

use crate::image::ImageBuffer;

#[derive(Debug)]
pub enum PpmError {
    Io(std::io::Error),
    BadMagic,
    BadHeader(String),
    UnsupportedMaxval(u32),
    Truncated { expected: usize, found: usize },
}

impl std::fmt::Display for PpmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PpmError::Io(e) => write!(f, "PPM I/O error: {}", e),
            PpmError::BadMagic => write!(f, "PPM magic number is not P6"),
            PpmError::BadHeader(msg) => write!(f, "PPM header error: {}", msg),
            PpmError::UnsupportedMaxval(v) => write!(f, "PPM maxval {} unsupported, expected 255", v),
            PpmError::Truncated { expected, found } => {
                write!(f, "PPM pixel data truncated: expected {} bytes, found {}", expected, found)
            }
        }
    }
}

impl std::error::Error for PpmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PpmError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PpmError {
    fn from(e: std::io::Error) -> Self {
        PpmError::Io(e)
    }
}

/// Serialize an image as P6.
pub fn write_ppm<W: Write>(out: &mut W, image: &ImageBuffer) -> Result<(), PpmError> {
    write!(out, "P6\n{} {}\n255\n", image.width(), image.height())?;
    out.write_all(image.as_bytes())?;
    Ok(())
}

/// Write an image to `path`, creating or truncating the file.
pub fn save_ppm(path: &Path, image: &ImageBuffer) -> Result<(), PpmError> {
    let file = std::fs::File::create(path)?;
    let mut out = std::io::BufWriter::new(file);
    write_ppm(&mut out, image)?;
    out.flush()?;
    Ok(())
}

/// Parse a P6 image from bytes.
pub fn parse_ppm(bytes: &[u8]) -> Result<ImageBuffer, PpmError> {
    let mut pos = 0usize;
    if bytes.len() < 2 || &bytes[..2] != b"P6" {
        return Err(PpmError::BadMagic);
    }
    pos += 2;

    let width = read_header_number(bytes, &mut pos, "width")? as usize;
    let height = read_header_number(bytes, &mut pos, "height")? as usize;
    let maxval = read_header_number(bytes, &mut pos, "maxval")?;
    if maxval != 255 {
        return Err(PpmError::UnsupportedMaxval(maxval));
    }
    // exactly one whitespace byte separates the header from the raster
    match bytes.get(pos) {
        Some(b) if b.is_ascii_whitespace() => pos += 1,
        _ => return Err(PpmError::BadHeader("missing separator after maxval".to_string())),
    }

    let expected = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(3))
        .ok_or_else(|| PpmError::BadHeader("image too large".to_string()))?;
    let raster = &bytes[pos..];
    if raster.len() < expected {
        return Err(PpmError::Truncated {
            expected,
            found: raster.len(),
        });
    }
    ImageBuffer::from_raw(width, height, raster[..expected].to_vec())
        .ok_or_else(|| PpmError::BadHeader("size mismatch".to_string()))
}

/// Read a P6 image from any reader.
pub fn read_ppm<R: Read>(input: &mut R) -> Result<ImageBuffer, PpmError> {
    let mut bytes = Vec::new();
    input.read_to_end(&mut bytes)?;
    parse_ppm(&bytes)
}

pub fn load_ppm(path: &Path) -> Result<ImageBuffer, PpmError> {
    let bytes = std::fs::read(path)?;
    parse_ppm(&bytes)
}

fn read_header_number(bytes: &[u8], pos: &mut usize, what: &str) -> Result<u32, PpmError> {
    // skip whitespace and comments
    loop {
        match bytes.get(*pos) {
            Some(b) if b.is_ascii_whitespace() => *pos += 1,
            Some(b'#') => {
                while let Some(&b) = bytes.get(*pos) {
                    *pos += 1;
                    if b == b'\n' {
                        break;
                    }
                }
            }
            _ => break,
        }
    }
    let start = *pos;
    while bytes.get(*pos).is_some_and(|b| b.is_ascii_digit()) {
        *pos += 1;
    }
    if start == *pos {
        return Err(PpmError::BadHeader(format!("expected {} at byte {}", what, start)));
    }
    std::str::from_utf8(&bytes[start..*pos])
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .ok_or_else(|| PpmError::BadHeader(format!("{} out of range", what)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame;

    #[test]
    fn test_header_layout() {
        let img = ImageBuffer::new(2, 1);
        let mut buf = Vec::new();
        write_ppm(&mut buf, &img).unwrap();
        assert_eq!(&buf[..11], b"P6\n2 1\n255\n");
        assert_eq!(buf.len(), 11 + 6);
    }

    #[test]
    fn test_roundtrip() {
        let img = frame::generate(13, 7);
        let mut buf = Vec::new();
        write_ppm(&mut buf, &img).unwrap();
        let back = read_ppm(&mut buf.as_slice()).unwrap();
        assert_eq!(back.width(), 13);
        assert_eq!(back.height(), 7);
        assert_eq!(back, img);
    }

    #[test]
    fn test_header_with_comment() {
        let mut bytes = b"P6\n# made by hand\n1 1\n255\n".to_vec();
        bytes.extend_from_slice(&[10, 20, 30]);
        let img = parse_ppm(&bytes).unwrap();
        assert_eq!(img.as_bytes(), &[10, 20, 30]);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(parse_ppm(b"P3\n1 1\n255\n"), Err(PpmError::BadMagic)));
        assert!(matches!(
            parse_ppm(b"P6\n1 1\n65535\n\0\0\0\0\0\0"),
            Err(PpmError::UnsupportedMaxval(65535))
        ));
        assert!(matches!(
            parse_ppm(b"P6\n2 2\n255\n\0\0\0"),
            Err(PpmError::Truncated { expected: 12, found: 3 })
        ));
        assert!(matches!(parse_ppm(b"P6\nx 2\n255\n"), Err(PpmError::BadHeader(_))));
        assert!(matches!(
            parse_ppm(b"P6\n4294967295 4294967295\n255\n\0\0\0"),
            Err(PpmError::BadHeader(_))
        ));
    }
}
