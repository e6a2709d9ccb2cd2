//! Binary run-length area table ("Beco") reader and point-to-region resolver.
//!
//! Layout (little-endian): a 16-byte header (magic `0x00112233`, row count,
//! divisor, padding), one u32 offset per row expressed in 2-byte units
//! relative to the start of the segment region, then the concatenated row
//! segment lists. Each segment is a u16 value followed by a u16 run length;
//! a row's list ends where the next row's begins (the last row ends at
//! end-of-file).

use std::path::Path;

/// Sentinel returned when a coordinate falls outside every segment run.
pub const AREA_NONE: u32 = 0xFFFF_FFFF;

const MAGIC: u32 = 0x0011_2233;
const HEADER_LEN: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum BecoError {
    #[error("expected magic 0x00112233, found {found:#010x}")]
    BadMagic { found: u32 },
    #[error("area table truncated: need {need} bytes, have {have}")]
    Truncated { need: usize, have: usize },
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    value: u16,
    run: u16,
}

/// An immutable area table: loaded once, queried read-only.
#[derive(Debug)]
pub struct Beco {
    divisor: u32,
    rows: Vec<Vec<Segment>>,
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes(data[at..at + 4].try_into().expect("4-byte slice"))
}

fn read_u16(data: &[u8], at: usize) -> u16 {
    u16::from_le_bytes(data[at..at + 2].try_into().expect("2-byte slice"))
}

impl Beco {
    /// Reads and parses an area table file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BecoError> {
        Self::parse(&std::fs::read(path)?)
    }

    /// Parses an area table from raw bytes.
    pub fn parse(data: &[u8]) -> Result<Self, BecoError> {
        if data.len() < HEADER_LEN {
            return Err(BecoError::Truncated {
                need: HEADER_LEN,
                have: data.len(),
            });
        }
        let magic = read_u32(data, 0);
        if magic != MAGIC {
            return Err(BecoError::BadMagic { found: magic });
        }
        let num_rows = read_u32(data, 4) as usize;
        let divisor = read_u32(data, 8);
        // bytes 12..16 are padding

        let segments_base = HEADER_LEN + num_rows * 4;
        if data.len() < segments_base {
            return Err(BecoError::Truncated {
                need: segments_base,
                have: data.len(),
            });
        }

        // Row offsets are stored in 2-byte units relative to the segment
        // region; translate to absolute byte offsets and append the file end
        // as the terminator of the last row.
        let mut offsets = Vec::with_capacity(num_rows + 1);
        for row in 0..num_rows {
            let raw = read_u32(data, HEADER_LEN + row * 4) as usize;
            let absolute = segments_base + raw * 2;
            if absolute > data.len() {
                return Err(BecoError::Truncated {
                    need: absolute,
                    have: data.len(),
                });
            }
            offsets.push(absolute);
        }
        offsets.push(data.len());

        let mut rows = Vec::with_capacity(num_rows);
        for row in 0..num_rows {
            let mut off = offsets[row];
            let end = offsets[row + 1];
            let mut segments = Vec::new();
            while off + 4 <= end {
                segments.push(Segment {
                    value: read_u16(data, off),
                    run: read_u16(data, off + 2),
                });
                off += 4;
            }
            rows.push(segments);
        }

        Ok(Beco { divisor, rows })
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn divisor(&self) -> u32 {
        self.divisor
    }

    /// Resolves the region value at planar coordinates (x, z).
    ///
    /// Must stay bit-exact with the engine's quantization: clamp to the map
    /// bounds, apply a directional half-unit epsilon before truncation, scale
    /// the row by the divisor, and (for divisor-10 tables only) re-quantize
    /// the column by 10. Returns [`AREA_NONE`] for empty rows and
    /// coordinates past the last run.
    pub fn area_number(&self, x: f32, z: f32) -> u32 {
        if self.rows.is_empty() {
            return AREA_NONE;
        }
        let x = f64::from(x).clamp(-5000.0, 4999.0);
        let z = f64::from(z).clamp(-4000.0, 4000.0);
        let eps_x = if x + 5000.0 < 0.0 { -0.5 } else { 0.5 };
        let eps_z = if z + 4000.0 < 0.0 { -0.5 } else { 0.5 };
        let mut column = (x + 5000.0 + eps_x).trunc() as i64;
        let row = ((z + 4000.0 + eps_z) / f64::from(self.divisor)).trunc() as i64;
        let row = row.clamp(0, self.rows.len() as i64 - 1) as usize;

        if self.divisor == 10 {
            column /= 10;
        }

        let mut total = 0i64;
        for segment in &self.rows[row] {
            total += i64::from(segment.run);
            if column < total {
                return u32::from(segment.value);
            }
        }
        AREA_NONE
    }
}
