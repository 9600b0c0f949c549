//! The pairwise evaluators.
//!
//! Every evaluator walks the Cartesian product in blocks of whole rows (one
//! row per point of `left`). Per-point trigonometry is tabulated once up
//! front, so the work inside a block is one `sin`/`cos` of the longitude
//! difference plus the `atan2` per pair. Each pair is computed by the same
//! code on every backend, so results do not depend on the backend or the
//! chunk size.

use log::{debug, trace};
use rayon::prelude::*;

use crate::distance;
use crate::error::{BlockError, EvaluateError, InvalidInput};
use crate::options::{Backend, Options};
use crate::point::{self, Point, Side};
use crate::real::Real;
use crate::result::{Block, DistanceMatrix, DistanceResult};

/// Sines and cosines of latitudes, and longitudes in radians, per point.
struct Trig<T> {
    sin_lat: Vec<T>,
    cos_lat: Vec<T>,
    lon: Vec<T>,
}

impl<T: Real> Trig<T> {
    fn new(points: &[Point]) -> Self {
        let mut sin_lat = Vec::with_capacity(points.len());
        let mut cos_lat = Vec::with_capacity(points.len());
        let mut lon = Vec::with_capacity(points.len());
        for p in points {
            let lat = T::from_f64(p.latitude).to_radians();
            sin_lat.push(lat.sin());
            cos_lat.push(lat.cos());
            lon.push(T::from_f64(p.longitude).to_radians());
        }
        Trig {
            sin_lat,
            cos_lat,
            lon,
        }
    }
}

/// Everything a block needs, shared read-only between worker threads.
struct Kernel<T> {
    left: Trig<T>,
    right: Trig<T>,
    radius: T,
    backend: Backend,
}

impl<T: Real> Kernel<T> {
    fn new(left: &[Point], right: &[Point], radius: f64, backend: Backend) -> Self {
        Kernel {
            left: Trig::new(left),
            right: Trig::new(right),
            radius: T::from_f64(radius),
            backend,
        }
    }

    fn cols(&self) -> usize {
        self.right.lon.len()
    }

    fn fill_row(&self, row: usize, out: &mut [T]) {
        let sin_lat1 = self.left.sin_lat[row];
        let cos_lat1 = self.left.cos_lat[row];
        let lon1 = self.left.lon[row];

        let right = &self.right;
        for (((d, &sin_lat2), &cos_lat2), &lon2) in out
            .iter_mut()
            .zip(&right.sin_lat)
            .zip(&right.cos_lat)
            .zip(&right.lon)
        {
            let dlon = (lon1 - lon2).abs();
            *d = self.radius
                * distance::angle(
                    sin_lat1,
                    cos_lat1,
                    sin_lat2,
                    cos_lat2,
                    dlon.sin(),
                    dlon.cos(),
                );
        }
    }

    /// Fills `out` with the rows starting at `first_row`; `out` holds a whole
    /// number of rows.
    fn fill_block(&self, first_row: usize, out: &mut [T]) {
        let cols = self.cols();
        if cols == 0 {
            return;
        }
        trace!(
            "block of {} rows from row {first_row} on {}",
            out.len() / cols,
            self.backend
        );
        match self.backend {
            Backend::Parallel => out
                .par_chunks_mut(cols)
                .enumerate()
                .for_each(|(i, row)| self.fill_row(first_row + i, row)),
            Backend::Cpu | Backend::Auto => out
                .chunks_mut(cols)
                .enumerate()
                .for_each(|(i, row)| self.fill_row(first_row + i, row)),
        }
    }
}

fn validate(left: &[Point], right: &[Point], options: &Options) -> Result<(), InvalidInput> {
    if !(options.radius.is_finite() && options.radius > 0.0) {
        return Err(InvalidInput::Radius(options.radius));
    }
    if options.chunk_size == 0 {
        return Err(InvalidInput::ChunkSize);
    }
    if let Some(index) = point::first_non_finite(left) {
        return Err(InvalidInput::NonFinite {
            side: Side::Left,
            index,
        });
    }
    if let Some(index) = point::first_non_finite(right) {
        return Err(InvalidInput::NonFinite {
            side: Side::Right,
            index,
        });
    }
    Ok(())
}

/// Number of `T` values in a `rows x cols` buffer, provided its byte size
/// fits in memory and under `limit`.
fn buffer_len<T>(rows: usize, cols: usize, limit: Option<usize>) -> Result<usize, EvaluateError> {
    let element_bytes = std::mem::size_of::<T>();
    let exhausted = EvaluateError::ResourceExhausted {
        rows,
        cols,
        element_bytes,
        limit,
    };
    let len = rows.checked_mul(cols).ok_or_else(|| exhausted.clone())?;
    let bytes = len
        .checked_mul(element_bytes)
        .filter(|&b| b <= isize::MAX as usize)
        .ok_or_else(|| exhausted.clone())?;
    match limit {
        Some(limit) if bytes > limit => Err(exhausted),
        _ => Ok(len),
    }
}

fn allocate<T: Real>(
    rows: usize,
    cols: usize,
    limit: Option<usize>,
) -> Result<Vec<T>, EvaluateError> {
    let len = buffer_len::<T>(rows, cols, limit)?;
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| EvaluateError::ResourceExhausted {
            rows,
            cols,
            element_bytes: std::mem::size_of::<T>(),
            limit,
        })?;
    buffer.resize(len, T::ZERO);
    Ok(buffer)
}

/// Rows per block: as many as fit in `chunk_size` pairs, but at least one.
fn rows_per_block(rows: usize, cols: usize, chunk_size: usize) -> usize {
    (chunk_size / cols.max(1)).clamp(1, rows.max(1))
}

fn run<T: Real>(left: &[Point], right: &[Point], options: &Options, out: &mut [T]) {
    let (rows, cols) = (left.len(), right.len());
    if out.is_empty() {
        return;
    }
    let backend = options.backend.resolve(out.len());
    let block_rows = rows_per_block(rows, cols, options.chunk_size);
    debug!("evaluating {rows}x{cols} distances on {backend} in blocks of {block_rows} rows");

    let kernel = Kernel::<T>::new(left, right, options.radius, backend);
    for (i, block) in out.chunks_mut(block_rows * cols).enumerate() {
        kernel.fill_block(i * block_rows, block);
    }
}

/// Distances from every point of `left` to every point of `right`.
///
/// Returns a `|left| x |right|` matrix when `options.as_matrix` is set and the
/// same values as a flat row-major vector otherwise. An empty point set gives
/// an empty result of the corresponding shape.
pub fn evaluate<T: Real>(
    left: &[Point],
    right: &[Point],
    options: &Options,
) -> Result<DistanceResult<T>, EvaluateError> {
    validate(left, right, options)?;
    let mut distances = allocate::<T>(left.len(), right.len(), options.memory_limit)?;
    run(left, right, options, &mut distances);

    if options.as_matrix {
        Ok(DistanceResult::Matrix(DistanceMatrix::from_parts(
            left.len(),
            right.len(),
            distances,
        )))
    } else {
        Ok(DistanceResult::Flat(distances))
    }
}

/// Like [`evaluate`], but writes the flat row-major distances into `out`,
/// which must hold exactly `|left| * |right|` values. `options.as_matrix` and
/// `options.memory_limit` play no part.
pub fn evaluate_into<T: Real>(
    left: &[Point],
    right: &[Point],
    options: &Options,
    out: &mut [T],
) -> Result<(), EvaluateError> {
    validate(left, right, options)?;
    let expected = buffer_len::<T>(left.len(), right.len(), None)?;
    if out.len() != expected {
        return Err(InvalidInput::OutputLength {
            expected,
            actual: out.len(),
        }
        .into());
    }
    run(left, right, options, out);
    Ok(())
}

/// Streams the product to `consumer` one block of rows at a time, reusing a
/// single buffer of at most `max(options.chunk_size, |right|)` distances.
///
/// Blocks arrive in row order. The first consumer error stops the evaluation
/// and is returned as [`BlockError::Consumer`].
pub fn for_each_block<T, E, F>(
    left: &[Point],
    right: &[Point],
    options: &Options,
    mut consumer: F,
) -> Result<(), BlockError<E>>
where
    T: Real,
    F: FnMut(Block<'_, T>) -> Result<(), E>,
{
    validate(left, right, options).map_err(EvaluateError::from)?;
    let (rows, cols) = (left.len(), right.len());
    if rows == 0 || cols == 0 {
        return Ok(());
    }

    let block_rows = rows_per_block(rows, cols, options.chunk_size);
    let mut buffer = allocate::<T>(block_rows, cols, options.memory_limit)?;
    let pairs = rows.saturating_mul(cols);
    let backend = options.backend.resolve(pairs);
    debug!("streaming {rows}x{cols} distances on {backend} in blocks of {block_rows} rows");

    let kernel = Kernel::<T>::new(left, right, options.radius, backend);
    let mut first_row = 0;
    while first_row < rows {
        let block_len = block_rows.min(rows - first_row);
        let distances = &mut buffer[..block_len * cols];
        kernel.fill_block(first_row, distances);
        consumer(Block {
            first_row,
            rows: block_len,
            cols,
            distances,
        })
        .map_err(BlockError::Consumer)?;
        first_row += block_len;
    }
    Ok(())
}
