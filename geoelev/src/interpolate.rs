//! Void filling for single sample lookups.
//!
//! When the requested sample is void, the nearest valid sample is searched in
//! each of the four axis directions (up and down the column, left and right
//! along the row). Complete pairs are linearly interpolated; the estimate is
//! then picked in a fixed order:
//!
//! 1. both the vertical and the horizontal pair → their mean
//! 2. only the vertical pair
//! 3. only the horizontal pair
//! 4. the first lone neighbour found, checked up, down, left, right
//! 5. nothing → `NaN`
//!
//! No extrapolation is done beyond the nearest valid neighbours.

use crate::grid::{is_void, Grid};

/// Nearest valid sample in one scan direction.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Neighbor {
    index: usize,
    value: u16,
}

/// Elevation at `(row, col)`, estimating void samples from their neighbours.
///
/// Never fails; `NaN` means no valid sample was found anywhere on the row or
/// the column.
///
/// # Panics
///
/// Panics if `row` or `col` is outside the grid.
pub fn value_at(grid: &Grid, row: usize, col: usize) -> f64 {
    let value = grid.sample(row, col);
    if !is_void(value) {
        return f64::from(value);
    }

    let size = grid.square_size();
    let up = nearest_valid((0..row).rev(), |r| grid.sample(r, col));
    let down = nearest_valid(row + 1..size, |r| grid.sample(r, col));
    let left = nearest_valid((0..col).rev(), |c| grid.sample(row, c));
    let right = nearest_valid(col + 1..size, |c| grid.sample(row, c));

    let vertical = up.zip(down).map(|(a, b)| lerp(a, b, row));
    let horizontal = left.zip(right).map(|(a, b)| lerp(a, b, col));

    match (vertical, horizontal) {
        (Some(rv), Some(cv)) => (rv + cv) / 2.0,
        (Some(rv), None) => rv,
        (None, Some(cv)) => cv,
        (None, None) => up
            .or(down)
            .or(left)
            .or(right)
            .map(|n| f64::from(n.value))
            .unwrap_or(f64::NAN),
    }
}

fn nearest_valid(
    indices: impl Iterator<Item = usize>,
    sample: impl Fn(usize) -> u16,
) -> Option<Neighbor> {
    indices
        .map(|index| Neighbor {
            index,
            value: sample(index),
        })
        .find(|n| !is_void(n.value))
}

/// Linear interpolation between two neighbours on opposite sides of `at`.
fn lerp(first: Neighbor, second: Neighbor, at: usize) -> f64 {
    let per_step = (f64::from(second.value) - f64::from(first.value))
        / (second.index - first.index) as f64;
    f64::from(first.value) + (at - first.index) as f64 * per_step
}
