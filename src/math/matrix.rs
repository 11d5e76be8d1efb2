use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::{Serialize, Deserialize};
use std::ops::{Index, IndexMut, Mul};

use crate::error::{NnError, Result};

/// Dense row-major matrix of `f64`.
///
/// Dimensions are fixed at construction and never change; element values
/// are mutable through `set` and `IndexMut`. Every operation that produces a
/// new matrix allocates a fresh backing store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMatrix")]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

/// Unvalidated wire form; deserialization goes through `Matrix::from_vec`.
#[derive(Deserialize)]
struct RawMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl TryFrom<RawMatrix> for Matrix {
    type Error = NnError;

    fn try_from(raw: RawMatrix) -> Result<Matrix> {
        Matrix::from_vec(raw.rows, raw.cols, raw.data)
    }
}

/// `rows * cols`, or `InvalidDimension` when either is zero or the product
/// overflows `usize`.
fn element_count(rows: usize, cols: usize, supplied: usize) -> Result<usize> {
    match rows.checked_mul(cols) {
        Some(n) if n > 0 => Ok(n),
        _ => Err(NnError::InvalidDimension { rows, cols, elements: supplied }),
    }
}

impl Matrix {
    /// Zero-filled `rows x cols` matrix.
    pub fn zeros(rows: usize, cols: usize) -> Result<Matrix> {
        let n = element_count(rows, cols, 0)?;
        Ok(Matrix { rows, cols, data: vec![0.0; n] })
    }

    /// Builds a matrix from elements given in row-major order.
    pub fn from_vec(rows: usize, cols: usize, elements: Vec<f64>) -> Result<Matrix> {
        if element_count(rows, cols, elements.len())? != elements.len() {
            return Err(NnError::InvalidDimension { rows, cols, elements: elements.len() });
        }
        Ok(Matrix { rows, cols, data: elements })
    }

    /// Builds a matrix from literal rows. Ragged or empty input is rejected.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Matrix> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != n_cols) {
            let elements = rows.iter().map(Vec::len).sum();
            return Err(NnError::InvalidDimension { rows: n_rows, cols: n_cols, elements });
        }
        let elements: Vec<f64> = rows.into_iter().flatten().collect();
        Matrix::from_vec(n_rows, n_cols, elements)
    }

    /// `values.len() x 1` column vector.
    pub fn column_vector(values: &[f64]) -> Result<Matrix> {
        Matrix::from_vec(values.len(), 1, values.to_vec())
    }

    /// Square zero matrix.
    pub fn zero(n: usize) -> Result<Matrix> {
        Matrix::zeros(n, n)
    }

    pub fn identity(n: usize) -> Result<Matrix> {
        let mut res = Matrix::zero(n)?;
        for i in 0..n {
            res.data[i * n + i] = 1.0;
        }
        Ok(res)
    }

    /// Random matrix seeded from the thread-local entropy source.
    ///
    /// Each element is `u1 - u2` with `u1, u2` independent uniform draws on
    /// `[0, 1)`. The result lies in `(-1, 1)` but is NOT uniform there: the
    /// difference of two uniforms has a triangular density peaking at 0.
    pub fn random(rows: usize, cols: usize) -> Result<Matrix> {
        Matrix::random_with(rows, cols, &mut rand::thread_rng())
    }

    /// Same distribution as `random`, reproducible for a given `seed`.
    pub fn random_seeded(rows: usize, cols: usize, seed: u64) -> Result<Matrix> {
        Matrix::random_with(rows, cols, &mut StdRng::seed_from_u64(seed))
    }

    /// Same distribution as `random`, drawing from a caller-owned generator.
    pub fn random_with<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Result<Matrix> {
        let mut res = Matrix::zeros(rows, cols)?;
        for x in res.data.iter_mut() {
            *x = rng.gen::<f64>() - rng.gen::<f64>();
        }
        Ok(res)
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

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    fn check_index(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.rows || col >= self.cols {
            return Err(NnError::IndexOutOfRange { row, col, rows: self.rows, cols: self.cols });
        }
        Ok(row * self.cols + col)
    }

    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        let idx = self.check_index(row, col)?;
        Ok(self.data[idx])
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        let idx = self.check_index(row, col)?;
        self.data[idx] = value;
        Ok(())
    }

    /// Row `r` as a `1 x cols` matrix.
    pub fn row(&self, r: usize) -> Result<Matrix> {
        self.check_index(r, 0)?;
        let start = r * self.cols;
        Ok(Matrix { rows: 1, cols: self.cols, data: self.data[start..start + self.cols].to_vec() })
    }

    /// Column `c` as a `rows x 1` matrix.
    pub fn column(&self, c: usize) -> Result<Matrix> {
        self.check_index(0, c)?;
        let data = (0..self.rows).map(|i| self.data[i * self.cols + c]).collect();
        Ok(Matrix { rows: self.rows, cols: 1, data })
    }

    /// Elements in row-major order. The iterator borrows the matrix and can be
    /// recreated as often as needed.
    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.data.iter()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn transpose(&self) -> Matrix {
        let mut data = Vec::with_capacity(self.data.len());
        for j in 0..self.cols {
            for i in 0..self.rows {
                data.push(self.data[i * self.cols + j]);
            }
        }
        Matrix { rows: self.cols, cols: self.rows, data }
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&x| functor(x)).collect(),
        }
    }

    pub fn map_in_place<F>(&mut self, functor: F)
    where
        F: Fn(f64) -> f64,
    {
        for x in self.data.iter_mut() {
            *x = functor(*x);
        }
    }

    fn check_same_shape(&self, rhs: &Matrix, op: &'static str) -> Result<()> {
        if self.shape() != rhs.shape() {
            return Err(NnError::DimensionMismatch { op, lhs: self.shape(), rhs: rhs.shape() });
        }
        Ok(())
    }

    fn zip_with<F>(&self, rhs: &Matrix, op: &'static str, functor: F) -> Result<Matrix>
    where
        F: Fn(f64, f64) -> f64,
    {
        self.check_same_shape(rhs, op)?;
        let data = self.data.iter().zip(rhs.data.iter()).map(|(&a, &b)| functor(a, b)).collect();
        Ok(Matrix { rows: self.rows, cols: self.cols, data })
    }

    pub fn checked_add(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with(rhs, "add", |a, b| a + b)
    }

    pub fn checked_sub(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with(rhs, "subtract", |a, b| a - b)
    }

    /// Element-wise (Hadamard) product of two same-shape matrices.
    pub fn hadamard(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with(rhs, "hadamard", |a, b| a * b)
    }

    pub fn scale(&self, factor: f64) -> Matrix {
        self.map(|x| x * factor)
    }

    /// Divides every element by `divisor`; a divisor whose magnitude is below
    /// machine epsilon is rejected.
    pub fn div_scalar(&self, divisor: f64) -> Result<Matrix> {
        if divisor.abs() < f64::EPSILON {
            return Err(NnError::DivisionByZero { divisor });
        }
        Ok(self.map(|x| x / divisor))
    }

    fn product_shape(&self, rhs: &Matrix) -> Result<Matrix> {
        if self.cols != rhs.rows {
            return Err(NnError::DimensionMismatch {
                op: "multiply",
                lhs: self.shape(),
                rhs: rhs.shape(),
            });
        }
        Matrix::zeros(self.rows, rhs.cols)
    }

    /// Fills `out` (one row of the product) with row `i` of `self * rhs`.
    /// Both multiply variants go through here so the accumulation order is
    /// the same for every element.
    fn product_row(&self, rhs: &Matrix, i: usize, out: &mut [f64]) {
        let lhs_row = &self.data[i * self.cols..(i + 1) * self.cols];
        for (j, cell) in out.iter_mut().enumerate() {
            let mut sum = 0.0;
            for (k, &a) in lhs_row.iter().enumerate() {
                sum += a * rhs.data[k * rhs.cols + j];
            }
            *cell = sum;
        }
    }

    /// Naive triple-loop product.
    pub fn matmul(&self, rhs: &Matrix) -> Result<Matrix> {
        let mut res = self.product_shape(rhs)?;
        let width = res.cols;
        res.data
            .chunks_mut(width)
            .enumerate()
            .for_each(|(i, out)| self.product_row(rhs, i, out));
        Ok(res)
    }

    /// Row-parallel product. Each worker owns a disjoint set of output rows,
    /// and the result is bit-identical to `matmul`.
    pub fn par_matmul(&self, rhs: &Matrix) -> Result<Matrix> {
        let mut res = self.product_shape(rhs)?;
        let width = res.cols;
        res.data
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(i, out)| self.product_row(rhs, i, out));
        Ok(res)
    }

    /// Dispatches to `par_matmul` or `matmul`.
    pub fn matmul_with(&self, rhs: &Matrix, parallel: bool) -> Result<Matrix> {
        if parallel {
            self.par_matmul(rhs)
        } else {
            self.matmul(rhs)
        }
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    /// Panics when out of range; use `get` for a checked read.
    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        assert!(row < self.rows && col < self.cols, "index ({row}, {col}) out of range");
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        assert!(row < self.rows && col < self.cols, "index ({row}, {col}) out of range");
        &mut self.data[row * self.cols + col]
    }
}

impl<'a> IntoIterator for &'a Matrix {
    type Item = &'a f64;
    type IntoIter = std::slice::Iter<'a, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Mul<f64> for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: f64) -> Matrix {
        self.scale(rhs)
    }
}

impl Mul<f64> for Matrix {
    type Output = Matrix;

    fn mul(mut self, rhs: f64) -> Matrix {
        self.map_in_place(|x| x * rhs);
        self
    }
}

impl Mul<&Matrix> for f64 {
    type Output = Matrix;

    fn mul(self, rhs: &Matrix) -> Matrix {
        rhs.scale(self)
    }
}
