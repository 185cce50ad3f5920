//! PNG encoder for canvas snapshots.
//!
//! Writes an 8-bit RGBA image with no filtering and no interlacing:
//! signature, `IHDR`, a single `IDAT` holding the zlib-compressed scanlines, and `IEND`.
//! The output depends only on the inputs, so repeated calls yield identical bytes.

use std::{collections::HashMap, io::Write};

use flate2::{Compression, write::ZlibEncoder};

use super::error::EncodeError;

/// PNG file signature
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

const BIT_DEPTH: u8 = 8;
const COLOR_TYPE_RGBA: u8 = 6;
const BYTES_PER_PIXEL: usize = 4;
const FILTER_NONE: u8 = 0;

/// Sparse pixel map keyed by `(x, y)`
pub type PixelMap = HashMap<(u32, u32), String>;

static CRC_TABLE: [u32; 256] = build_crc_table();

const fn build_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 {
                0xEDB8_8320 ^ (c >> 1)
            } else {
                c >> 1
            };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

/// CRC-32 (reflected polynomial 0xEDB88320) over the concatenation of `parts`
pub fn crc32(parts: &[&[u8]]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for part in parts {
        for &byte in part.iter() {
            crc = CRC_TABLE[((crc ^ u32::from(byte)) & 0xFF) as usize] ^ (crc >> 8);
        }
    }
    crc ^ 0xFFFF_FFFF
}

/// RGBA color with 8 bits per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const OPAQUE_BLACK: Rgba = Rgba {
        r: 0,
        g: 0,
        b: 0,
        a: 0xFF,
    };

    /// Parse `#RGB`, `#RGBA`, `#RRGGBB` or `#RRGGBBAA` (the `#` is optional).
    ///
    /// Anything else resolves to opaque black.
    pub fn from_hex(color: &str) -> Rgba {
        let hex = color.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Rgba::OPAQUE_BLACK;
        }

        let expanded: String = match hex.len() {
            3 | 4 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 | 8 => hex.to_string(),
            _ => return Rgba::OPAQUE_BLACK,
        };

        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).unwrap_or(0);
        Rgba {
            r: channel(0),
            g: channel(2),
            b: channel(4),
            a: if expanded.len() == 8 { channel(6) } else { 0xFF },
        }
    }

    fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Rasterize `pixels` onto a `width` x `height` board and encode it as PNG.
///
/// Coordinates outside the board are ignored; unset coordinates use `background`.
pub fn encode_png(
    width: u32,
    height: u32,
    pixels: &PixelMap,
    background: &str,
) -> Result<Vec<u8>, EncodeError> {
    let invalid = EncodeError::InvalidDimensions { width, height };
    if width == 0 || height == 0 {
        return Err(invalid);
    }
    let row_length = (width as usize)
        .checked_mul(BYTES_PER_PIXEL)
        .and_then(|n| n.checked_add(1))
        .ok_or_else(|| invalid.clone())?;
    let raw_length = row_length
        .checked_mul(height as usize)
        .ok_or_else(|| invalid.clone())?;

    let background = Rgba::from_hex(background).to_bytes();
    let mut raw = Vec::with_capacity(raw_length);
    for y in 0..height {
        raw.push(FILTER_NONE);
        for x in 0..width {
            let rgba = match pixels.get(&(x, y)) {
                Some(color) => Rgba::from_hex(color).to_bytes(),
                None => background,
            };
            raw.extend_from_slice(&rgba);
        }
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(&raw)
        .map_err(|e| EncodeError::Compression(e.to_string()))?;
    let compressed = encoder
        .finish()
        .map_err(|e| EncodeError::Compression(e.to_string()))?;

    let mut png = Vec::with_capacity(PNG_SIGNATURE.len() + compressed.len() + 64);
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr_payload(width, height));
    write_chunk(&mut png, b"IDAT", &compressed);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

fn ihdr_payload(width: u32, height: u32) -> [u8; 13] {
    let mut data = [0u8; 13];
    data[0..4].copy_from_slice(&width.to_be_bytes());
    data[4..8].copy_from_slice(&height.to_be_bytes());
    data[8] = BIT_DEPTH;
    data[9] = COLOR_TYPE_RGBA;
    // compression, filter and interlace methods stay 0
    data
}

fn write_chunk(out: &mut Vec<u8>, chunk_type: &[u8; 4], payload: &[u8]) {
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(chunk_type);
    out.extend_from_slice(payload);
    out.extend_from_slice(&crc32(&[chunk_type.as_slice(), payload]).to_be_bytes());
}
