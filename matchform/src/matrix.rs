//! Dense, row-major feature matrix.

use std::ops::{Index, IndexMut};

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}
impl Matrix {
    pub fn allocate(rows: usize, cols: usize) -> Self {
        let (len, overflow) = rows.overflowing_mul(cols);
        assert!(!overflow, "allocation of a {rows}x{cols} matrix failed due to overflow");
        let data = vec![0.0; len];
        Self { data, rows, cols }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn row_slice(&self, row: usize) -> &[f64] {
        debug_assert!(self.validate_row_index(row));
        let row_start = row * self.cols;
        &self.data[row_start..(row_start + self.cols)]
    }

    pub fn row_slice_mut(&mut self, row: usize) -> &mut [f64] {
        debug_assert!(self.validate_row_index(row));
        let row_start = row * self.cols;
        &mut self.data[row_start..(row_start + self.cols)]
    }

    /// Copies the given rows, in the given order, into a new matrix of the same width.
    pub fn select_rows(&self, rows: &[usize]) -> Matrix {
        let mut selected = Matrix::allocate(rows.len(), self.cols);
        for (target, &source) in rows.iter().enumerate() {
            selected
                .row_slice_mut(target)
                .copy_from_slice(self.row_slice(source));
        }
        selected
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.rows).map(|row| self.row_slice(row))
    }

    fn validate_row_index(&self, row: usize) -> bool {
        assert!(row < self.rows, "invalid row index {row} for a {}x{} matrix", self.rows, self.cols);
        true
    }

    fn validate_col_index(&self, col: usize) -> bool {
        assert!(col < self.cols, "invalid column index {col} for a {}x{} matrix", self.rows, self.cols);
        true
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    #[inline]
    fn index(&self, index: (usize, usize)) -> &Self::Output {
        let (row, col) = index;
        debug_assert!(self.validate_row_index(row));
        debug_assert!(self.validate_col_index(col));
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    #[inline]
    fn index_mut(&mut self, index: (usize, usize)) -> &mut Self::Output {
        let (row, col) = index;
        debug_assert!(self.validate_row_index(row));
        debug_assert!(self.validate_col_index(col));
        &mut self.data[row * self.cols + col]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequential(rows: usize, cols: usize) -> Matrix {
        let mut matrix = Matrix::allocate(rows, cols);
        for row in 0..rows {
            for col in 0..cols {
                matrix[(row, col)] = (row * cols + col) as f64;
            }
        }
        matrix
    }

    #[test]
    fn index() {
        let mut matrix = Matrix::allocate(4, 3);
        assert_eq!(4, matrix.rows());
        assert_eq!(3, matrix.cols());
        assert_eq!(0.0, matrix[(3, 2)]);
        matrix[(3, 2)] = 7.5;
        assert_eq!(7.5, matrix[(3, 2)]);
    }

    #[test]
    #[should_panic = "invalid row index 4 for a 4x3 matrix"]
    fn row_overflow_panics() {
        let matrix = Matrix::allocate(4, 3);
        let _ = matrix[(matrix.rows(), 0)];
    }

    #[test]
    #[should_panic]
    fn allocate_overflow_panics() {
        Matrix::allocate(usize::MAX, 2);
    }

    #[test]
    fn select_rows_preserves_order_and_duplicates() {
        let matrix = sequential(3, 2);
        let selected = matrix.select_rows(&[2, 0, 2]);
        assert_eq!(3, selected.rows());
        assert_eq!(&[4.0, 5.0], selected.row_slice(0));
        assert_eq!(&[0.0, 1.0], selected.row_slice(1));
        assert_eq!(&[4.0, 5.0], selected.row_slice(2));
    }

    #[test]
    fn iter_rows() {
        let matrix = sequential(2, 2);
        let rows: Vec<_> = matrix.iter_rows().collect();
        assert_eq!(vec![&[0.0, 1.0][..], &[2.0, 3.0][..]], rows);
    }
}
