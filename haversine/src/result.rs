use std::ops::Index;

/// Distances laid out row-major: row `i` holds the distances from `left[i]`
/// to every point of `right`, in order.
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceMatrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Copy> DistanceMatrix<T> {
    /// Views a flat row-major buffer as a matrix. Returns `None` when the
    /// buffer length is not `rows * cols`.
    #[must_use]
    pub fn from_flat(rows: usize, cols: usize, data: Vec<T>) -> Option<Self> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return None;
        }
        Some(DistanceMatrix { rows, cols, data })
    }

    /// Caller guarantees `data.len() == rows * cols`.
    pub(crate) fn from_parts(rows: usize, cols: usize, data: Vec<T>) -> Self {
        debug_assert_eq!(rows * cols, data.len());
        DistanceMatrix { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_flat(self) -> Vec<T> {
        self.data
    }

    /// Entries `(i, i)` for `i` up to the shorter side.
    pub fn diagonal(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.rows.min(self.cols)).map(move |i| self.data[i * self.cols + i])
    }

    #[must_use]
    pub fn transpose(&self) -> Self {
        let mut data = Vec::with_capacity(self.data.len());
        for col in 0..self.cols {
            for row in 0..self.rows {
                data.push(self.data[row * self.cols + col]);
            }
        }
        DistanceMatrix {
            rows: self.cols,
            cols: self.rows,
            data,
        }
    }
}

impl<T> Index<(usize, usize)> for DistanceMatrix<T> {
    type Output = T;

    fn index(&self, (row, col): (usize, usize)) -> &T {
        assert!(
            row < self.rows && col < self.cols,
            "index ({row}, {col}) out of bounds for {}x{} matrix",
            self.rows,
            self.cols
        );
        &self.data[row * self.cols + col]
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DistanceResult<T> {
    Matrix(DistanceMatrix<T>),
    Flat(Vec<T>),
}

impl<T: Copy> DistanceResult<T> {
    /// The distances in pairing order, whichever shape was requested.
    pub fn as_slice(&self) -> &[T] {
        match self {
            DistanceResult::Matrix(m) => m.as_slice(),
            DistanceResult::Flat(v) => v,
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn as_matrix(&self) -> Option<&DistanceMatrix<T>> {
        match self {
            DistanceResult::Matrix(m) => Some(m),
            DistanceResult::Flat(_) => None,
        }
    }

    pub fn into_flat(self) -> Vec<T> {
        match self {
            DistanceResult::Matrix(m) => m.into_flat(),
            DistanceResult::Flat(v) => v,
        }
    }
}

/// A run of whole rows handed out by [`crate::for_each_block`].
#[derive(Clone, Copy, Debug)]
pub struct Block<'a, T> {
    /// Index into `left` of the first row in this block.
    pub first_row: usize,
    pub rows: usize,
    pub cols: usize,
    /// `rows * cols` distances, row-major.
    pub distances: &'a [T],
}

impl<'a, T> Block<'a, T> {
    /// Distances from `left[self.first_row + row]`.
    pub fn row(&self, row: usize) -> &'a [T] {
        &self.distances[row * self.cols..(row + 1) * self.cols]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_three() -> DistanceMatrix<u32> {
        DistanceMatrix::from_flat(2, 3, vec![0, 1, 2, 10, 11, 12]).unwrap()
    }

    #[test]
    fn from_flat_checks_length() {
        assert!(DistanceMatrix::from_flat(2, 3, vec![0_u32; 5]).is_none());
        assert!(DistanceMatrix::from_flat(usize::MAX, 2, Vec::<u32>::new()).is_none());
        assert!(DistanceMatrix::from_flat(0, 7, Vec::<u32>::new()).is_some());
    }

    #[test]
    fn indexing_is_row_major() {
        let m = two_by_three();
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m[(1, 0)], 10);
        assert_eq!(m.get(0, 2), Some(2));
        assert_eq!(m.get(2, 0), None);
        assert_eq!(m.row(1), &[10, 11, 12]);
    }

    #[test]
    fn transpose_swaps_axes() {
        let t = two_by_three().transpose();
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t.as_slice(), &[0, 10, 1, 11, 2, 12]);
        assert_eq!(t.transpose(), two_by_three());
    }

    #[test]
    fn diagonal_stops_at_the_short_side() {
        assert_eq!(two_by_three().diagonal().collect::<Vec<_>>(), vec![0, 11]);
    }

    #[test]
    fn result_shapes_share_the_flat_layout() {
        let matrix = DistanceResult::Matrix(two_by_three());
        let flat = DistanceResult::Flat(vec![0, 1, 2, 10, 11, 12]);
        assert_eq!(matrix.as_slice(), flat.as_slice());
        assert_eq!(matrix.len(), 6);
        assert!(flat.as_matrix().is_none());
        assert_eq!(matrix.into_flat(), flat.into_flat());
    }
}
