use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;

/// Column-wise softmax: each column of the result sums to 1.
pub fn softmax(pre_activation: &Matrix) -> Matrix {
    let mut res = pre_activation.clone();
    softmax_in_place(&mut res);
    res
}

/// In-place variant of `softmax`.
///
/// The per-column shift starts from a running max of `0.0`, not negative
/// infinity. Columns whose values are all negative are therefore not shifted
/// to their true maximum, and a column of very large negative values
/// underflows every exponential to zero and produces NaN. This matches the
/// established behavior of the network and is kept deliberately.
pub fn softmax_in_place(m: &mut Matrix) {
    let (rows, cols) = m.shape();
    for j in 0..cols {
        let mut max = 0.0;
        for i in 0..rows {
            if m[(i, j)] > max {
                max = m[(i, j)];
            }
        }

        let mut sum = 0.0;
        for i in 0..rows {
            let e = (m[(i, j)] - max).exp();
            m[(i, j)] = e;
            sum += e;
        }
        for i in 0..rows {
            m[(i, j)] /= sum;
        }
    }
}

/// Jacobian column of softmax for output `output_index`.
///
/// Unlike the other activations, each softmax output depends on every input
/// in its column, so there is no pointwise derivative. Entry `(i, j)` is the
/// partial derivative of output `output_index` in column `j` with respect to
/// input `i` of that column:
///
/// - `F[i,j] * (1 - F[i,j])` when `i == output_index`
/// - `-F[output_index,j] * F[i,j]` otherwise
pub fn jacobian_column(pre_activation: &Matrix, output_index: usize) -> Result<Matrix> {
    let (rows, cols) = pre_activation.shape();
    if output_index >= rows {
        return Err(NnError::IndexOutOfRange { row: output_index, col: 0, rows, cols });
    }

    let f = softmax(pre_activation);
    let mut ret = Matrix::zeros(rows, cols)?;
    for i in 0..rows {
        for j in 0..cols {
            ret[(i, j)] = if i == output_index {
                f[(i, j)] * (1.0 - f[(i, j)])
            } else {
                -f[(output_index, j)] * f[(i, j)]
            };
        }
    }
    Ok(ret)
}
