//! Decoded tile grids.
//!
//! A tile's raw contents are `square_size × square_size` samples stored
//! row-major, 2 bytes each, big-endian. Row 0 is the **north** edge and
//! column 0 the **west** edge.
//!
//! Samples are read as *unsigned* 16-bit values, and anything at or above
//! [`VOID_THRESHOLD`] counts as void. The SRTM void marker is `-32768` as a
//! signed value, which lands in that bucket, but so does any genuinely
//! negative elevation (Dead Sea shore, Caspian depression). Below-sea-level
//! terrain therefore reads as void.

use crate::error::{ElevationError, Result};

/// Decoded samples at or above this value are void (no data).
pub const VOID_THRESHOLD: u16 = 9000;

/// A validated square grid of elevation samples.
#[derive(Debug, Clone)]
pub struct Grid {
    data: Vec<u8>,
    square_size: usize,
}

impl Grid {
    /// Validate raw tile contents and wrap them as a grid.
    ///
    /// `name` is only used for error reporting.
    ///
    /// # Errors
    ///
    /// [`ElevationError::InvalidTileSize`] if the byte count is not `2 × k²`
    /// for some `k > 0`.
    pub fn from_bytes(name: &str, data: Vec<u8>) -> Result<Self> {
        let square_size = square_size_for(data.len()).ok_or_else(|| {
            ElevationError::InvalidTileSize {
                name: name.to_string(),
                len: data.len(),
            }
        })?;

        Ok(Self { data, square_size })
    }

    /// Number of samples per row/column.
    pub fn square_size(&self) -> usize {
        self.square_size
    }

    /// Raw sample at `(row, col)`, decoded as unsigned big-endian.
    ///
    /// # Panics
    ///
    /// Panics if `row` or `col` is not below [`Self::square_size`].
    pub fn sample(&self, row: usize, col: usize) -> u16 {
        let offset = (row * self.square_size + col) * 2;
        u16::from_be_bytes([self.data[offset], self.data[offset + 1]])
    }

    /// Whether the sample at `(row, col)` is void.
    pub fn is_void(&self, row: usize, col: usize) -> bool {
        is_void(self.sample(row, col))
    }

    /// Iterate over all samples in row-major order.
    pub fn samples(&self) -> impl Iterator<Item = u16> + '_ {
        self.data
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
    }
}

/// Whether a decoded sample is void.
pub fn is_void(sample: u16) -> bool {
    sample >= VOID_THRESHOLD
}

/// Side length of the grid stored in `len` bytes, or `None` if `len` is not
/// `2 × k²` for some `k > 0`.
pub fn square_size_for(len: usize) -> Option<usize> {
    let square_size = ((len as f64) / 2.0).sqrt().floor() as usize;
    if square_size == 0 || square_size * square_size * 2 != len {
        return None;
    }
    Some(square_size)
}
