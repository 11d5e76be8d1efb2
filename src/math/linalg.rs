use tracing::trace;

use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;

impl Matrix {
    fn require_square(&self, op: &'static str) -> Result<usize> {
        if !self.is_square() {
            return Err(NnError::NotSquare { op, rows: self.rows(), cols: self.cols() });
        }
        Ok(self.rows())
    }

    /// Sum of the diagonal.
    pub fn trace(&self) -> Result<f64> {
        let n = self.require_square("trace")?;
        Ok((0..n).map(|i| self[(i, i)]).sum())
    }

    /// Copy with everything above the diagonal zeroed.
    pub fn lower_triangular(&self) -> Result<Matrix> {
        let n = self.require_square("lower_triangular")?;
        let mut res = Matrix::zero(n)?;
        for i in 0..n {
            for j in 0..=i {
                res[(i, j)] = self[(i, j)];
            }
        }
        Ok(res)
    }

    /// Copy with everything below the diagonal zeroed.
    pub fn upper_triangular(&self) -> Result<Matrix> {
        let n = self.require_square("upper_triangular")?;
        let mut res = Matrix::zero(n)?;
        for i in 0..n {
            for j in i..n {
                res[(i, j)] = self[(i, j)];
            }
        }
        Ok(res)
    }

    /// 2x2 and 3x3 use cofactor expansion; anything else multiplies the
    /// diagonal of `U` from `lu_decomposition`, so it inherits the LU caveat
    /// about zero pivots.
    pub fn determinant(&self) -> Result<f64> {
        let n = self.require_square("determinant")?;
        let a = |i: usize, j: usize| self[(i, j)];
        match n {
            2 => Ok(a(0, 0) * a(1, 1) - a(0, 1) * a(1, 0)),
            3 => Ok(a(0, 0) * a(1, 1) * a(2, 2)
                + a(0, 1) * a(1, 2) * a(2, 0)
                + a(0, 2) * a(1, 0) * a(2, 1)
                - a(0, 2) * a(1, 1) * a(2, 0)
                - a(0, 0) * a(1, 2) * a(2, 1)
                - a(0, 1) * a(1, 0) * a(2, 2)),
            _ => {
                let (_, u) = self.lu_decomposition()?;
                Ok((0..n).map(|i| u[(i, i)]).product())
            }
        }
    }

    /// Inverse, or `Ok(None)` when the matrix is singular.
    ///
    /// 2x2 goes through the adjugate. Larger sizes run Gauss-Jordan
    /// elimination on a working copy, normalizing each pivot row in turn.
    /// There is no row exchange: a pivot whose magnitude drops below machine
    /// epsilon is reported as singular.
    pub fn inverse(&self) -> Result<Option<Matrix>> {
        let n = self.require_square("inverse")?;

        if n == 2 {
            let det = self.determinant()?;
            if det.abs() < f64::EPSILON {
                trace!(det, "2x2 matrix is singular");
                return Ok(None);
            }
            let adjugate = Matrix::from_vec(2, 2, vec![
                self[(1, 1)], -self[(0, 1)],
                -self[(1, 0)], self[(0, 0)],
            ])?;
            return adjugate.div_scalar(det).map(Some);
        }

        let mut work = self.clone();
        let mut inv = Matrix::identity(n)?;

        for i in 0..n {
            let pivot = work[(i, i)];
            if pivot.abs() < f64::EPSILON {
                trace!(row = i, pivot, "singular pivot during Gauss-Jordan");
                return Ok(None);
            }
            let scale = 1.0 / pivot;
            for k in 0..n {
                work[(i, k)] *= scale;
                inv[(i, k)] *= scale;
            }

            for j in 0..n {
                if j == i {
                    continue;
                }
                let factor = work[(j, i)];
                if factor == 0.0 {
                    continue;
                }
                for k in 0..n {
                    work[(j, k)] -= factor * work[(i, k)];
                    inv[(j, k)] -= factor * inv[(i, k)];
                }
            }
        }

        Ok(Some(inv))
    }

    /// Doolittle decomposition into unit lower-triangular `L` and upper
    /// triangular `U` with `L * U == self`.
    ///
    /// No pivoting is done. If a leading pivot `U[j][j]` is zero the entries
    /// below it divide by zero and come out infinite or NaN, so singular
    /// input has no meaningful decomposition.
    pub fn lu_decomposition(&self) -> Result<(Matrix, Matrix)> {
        let n = self.require_square("lu_decomposition")?;
        let mut l = Matrix::identity(n)?;
        let mut u = Matrix::zero(n)?;

        for i in 0..n {
            for j in 0..n {
                if i > j {
                    let sum: f64 = (0..j).map(|k| l[(i, k)] * u[(k, j)]).sum();
                    l[(i, j)] = (self[(i, j)] - sum) / u[(j, j)];
                } else {
                    let sum: f64 = (0..i).map(|k| l[(i, k)] * u[(k, j)]).sum();
                    u[(i, j)] = self[(i, j)] - sum;
                }
            }
        }

        Ok((l, u))
    }

    /// `self^n` by repeated squaring; `n == 0` gives the identity.
    pub fn pow(&self, n: u32) -> Result<Matrix> {
        let size = self.require_square("pow")?;
        let mut result = Matrix::identity(size)?;
        let mut base = self.clone();
        let mut exp = n;
        while exp > 0 {
            if exp & 1 == 1 {
                result = result.matmul(&base)?;
            }
            exp >>= 1;
            if exp > 0 {
                base = base.matmul(&base)?;
            }
        }
        Ok(result)
    }
}

fn check_system(m: &Matrix, b: &Matrix, op: &'static str) -> Result<usize> {
    let n = m.require_square(op)?;
    if b.rows() != n || b.cols() != 1 {
        return Err(NnError::DimensionMismatch { op, lhs: m.shape(), rhs: b.shape() });
    }
    Ok(n)
}

/// Solves `L x = b` for lower-triangular `L` and column vector `b`.
pub fn forward_substitution(l: &Matrix, b: &Matrix) -> Result<Matrix> {
    let n = check_system(l, b, "forward_substitution")?;
    let mut x = Matrix::zeros(n, 1)?;
    for i in 0..n {
        let sum: f64 = (0..i).map(|k| l[(i, k)] * x[(k, 0)]).sum();
        x[(i, 0)] = (b[(i, 0)] - sum) / l[(i, i)];
    }
    Ok(x)
}

/// Solves `U x = y` for upper-triangular `U` and column vector `y`.
pub fn backward_substitution(u: &Matrix, y: &Matrix) -> Result<Matrix> {
    let n = check_system(u, y, "backward_substitution")?;
    let mut x = Matrix::zeros(n, 1)?;
    for i in (0..n).rev() {
        let sum: f64 = (i + 1..n).map(|k| u[(i, k)] * x[(k, 0)]).sum();
        x[(i, 0)] = (y[(i, 0)] - sum) / u[(i, i)];
    }
    Ok(x)
}

/// Solves `A x = b` through `lu_decomposition` and both substitutions.
pub fn solve(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    check_system(a, b, "solve")?;
    let (l, u) = a.lu_decomposition()?;
    let y = forward_substitution(&l, b)?;
    backward_substitution(&u, &y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn m(rows: usize, cols: usize, v: &[f64]) -> Matrix {
        Matrix::from_vec(rows, cols, v.to_vec()).unwrap()
    }

    fn assert_close(a: &Matrix, b: &Matrix, tol: f64) {
        assert_eq!(a.shape(), b.shape());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < tol, "{x} vs {y}\n{a:?}\n{b:?}");
        }
    }

    fn tridiagonal4() -> Matrix {
        m(4, 4, &[
            2.0, 1.0, 0.0, 0.0,
            1.0, 3.0, 1.0, 0.0,
            0.0, 1.0, 4.0, 1.0,
            0.0, 0.0, 1.0, 5.0,
        ])
    }

    #[test]
    fn test_non_square_rejected() {
        let a = Matrix::zeros(2, 3).unwrap();
        assert!(matches!(a.trace(), Err(NnError::NotSquare { op: "trace", .. })));
        assert!(a.lower_triangular().is_err());
        assert!(a.upper_triangular().is_err());
        assert!(matches!(a.determinant(), Err(NnError::NotSquare { .. })));
        assert!(matches!(a.inverse(), Err(NnError::NotSquare { .. })));
        assert!(matches!(a.lu_decomposition(), Err(NnError::NotSquare { .. })));
        assert!(a.pow(2).is_err());
    }

    #[test]
    fn test_trace_and_triangles() {
        let a = m(3, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(a.trace().unwrap(), 15.0);
        assert_eq!(
            a.lower_triangular().unwrap(),
            m(3, 3, &[1.0, 0.0, 0.0, 4.0, 5.0, 0.0, 7.0, 8.0, 9.0])
        );
        assert_eq!(
            a.upper_triangular().unwrap(),
            m(3, 3, &[1.0, 2.0, 3.0, 0.0, 5.0, 6.0, 0.0, 0.0, 9.0])
        );
    }

    #[test]
    fn test_determinant_known_values() {
        assert_eq!(m(2, 2, &[1.0, 2.0, 3.0, 4.0]).determinant().unwrap(), -2.0);
        assert_eq!(Matrix::identity(3).unwrap().determinant().unwrap(), 1.0);
        assert_eq!(
            m(3, 3, &[2.0, 0.0, 1.0, 1.0, 3.0, 2.0, 1.0, 1.0, 2.0]).determinant().unwrap(),
            6.0
        );
        assert!((tridiagonal4().determinant().unwrap() - 85.0).abs() < 1e-9);
        assert_eq!(m(1, 1, &[-4.5]).determinant().unwrap(), -4.5);
    }

    #[test]
    fn test_determinant_paths_agree() {
        for a in [
            m(2, 2, &[1.0, 2.0, 3.0, 4.0]),
            m(3, 3, &[2.0, 0.0, 1.0, 1.0, 3.0, 2.0, 1.0, 1.0, 2.0]),
            m(3, 3, &[4.0, -2.0, 1.0, 3.0, 6.0, -4.0, 2.0, 1.0, 8.0]),
        ] {
            let (_, u) = a.lu_decomposition().unwrap();
            let lu_det: f64 = (0..a.rows()).map(|i| u[(i, i)]).product();
            assert!((a.determinant().unwrap() - lu_det).abs() < 1e-9);
        }
    }

    #[test]
    fn test_inverse_2x2_uses_adjugate() {
        let a = m(2, 2, &[4.0, 7.0, 2.0, 6.0]);
        let inv = a.inverse().unwrap().unwrap();
        assert_close(&inv, &m(2, 2, &[0.6, -0.7, -0.2, 0.4]), 1e-12);
        assert_close(&a.matmul(&inv).unwrap(), &Matrix::identity(2).unwrap(), 1e-12);
    }

    #[test]
    fn test_inverse_singular_is_none() {
        assert!(m(2, 2, &[1.0, 2.0, 2.0, 4.0]).inverse().unwrap().is_none());
        assert!(m(3, 3, &[1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 1.0, 1.0, 1.0]).inverse().unwrap().is_none());
    }

    #[test]
    fn test_inverse_leaves_receiver_untouched() {
        let a = tridiagonal4();
        let before = a.clone();
        let inv = a.inverse().unwrap().unwrap();
        assert_eq!(a, before);
        assert_close(&a.matmul(&inv).unwrap(), &Matrix::identity(4).unwrap(), 1e-9);
    }

    #[test]
    fn test_lu_reconstructs_input() {
        let a = m(3, 3, &[4.0, -2.0, 1.0, 3.0, 6.0, -4.0, 2.0, 1.0, 8.0]);
        let (l, u) = a.lu_decomposition().unwrap();
        for i in 0..3 {
            assert_eq!(l[(i, i)], 1.0);
            for j in i + 1..3 {
                assert_eq!(l[(i, j)], 0.0);
                assert_eq!(u[(j, i)], 0.0);
            }
        }
        assert_close(&l.matmul(&u).unwrap(), &a, 1e-12);
    }

    #[test]
    fn test_substitution_and_solve() {
        let a = tridiagonal4();
        let x = m(4, 1, &[1.0, -2.0, 3.0, 0.5]);
        let b = a.matmul(&x).unwrap();
        assert_close(&solve(&a, &b).unwrap(), &x, 1e-12);

        let l = m(2, 2, &[2.0, 0.0, 1.0, 4.0]);
        assert_close(&forward_substitution(&l, &m(2, 1, &[4.0, 10.0])).unwrap(), &m(2, 1, &[2.0, 2.0]), 1e-12);
        let u = m(2, 2, &[2.0, 1.0, 0.0, 4.0]);
        assert_close(&backward_substitution(&u, &m(2, 1, &[5.0, 8.0])).unwrap(), &m(2, 1, &[1.5, 2.0]), 1e-12);
    }

    #[test]
    fn test_solve_rejects_bad_rhs() {
        let a = tridiagonal4();
        let wide = Matrix::zeros(4, 2).unwrap();
        let short = Matrix::zeros(3, 1).unwrap();
        assert!(matches!(solve(&a, &wide), Err(NnError::DimensionMismatch { op: "solve", .. })));
        assert!(matches!(forward_substitution(&a, &short), Err(NnError::DimensionMismatch { .. })));
        assert!(matches!(backward_substitution(&a, &short), Err(NnError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_pow() {
        let a = m(2, 2, &[1.0, 1.0, 1.0, 0.0]);
        assert_eq!(a.pow(0).unwrap(), Matrix::identity(2).unwrap());
        assert_eq!(a.pow(1).unwrap(), a);
        // Fibonacci: [[F(n+1), F(n)], [F(n), F(n-1)]]
        assert_eq!(a.pow(10).unwrap(), m(2, 2, &[89.0, 55.0, 55.0, 34.0]));
        let cube = a.matmul(&a).unwrap().matmul(&a).unwrap();
        assert_eq!(a.pow(3).unwrap(), cube);
    }

    fn diagonally_dominant(n: usize) -> impl Strategy<Value = Matrix> {
        prop::collection::vec(-1.0f64..1.0, n * n).prop_map(move |v| {
            let mut a = Matrix::from_vec(n, n, v).unwrap();
            for i in 0..n {
                a[(i, i)] += n as f64 + 1.0;
            }
            a
        })
    }

    proptest! {
        #[test]
        fn prop_inverse_is_right_inverse(a in (1usize..7).prop_flat_map(diagonally_dominant)) {
            let n = a.rows();
            let inv = a.inverse().unwrap().unwrap();
            let product = a.matmul(&inv).unwrap();
            let id = Matrix::identity(n).unwrap();
            for (x, y) in product.iter().zip(id.iter()) {
                prop_assert!((x - y).abs() < 1e-9);
            }
        }

        #[test]
        fn prop_closed_form_determinant_matches_lu(a in (2usize..4).prop_flat_map(diagonally_dominant)) {
            let (_, u) = a.lu_decomposition().unwrap();
            let lu_det: f64 = (0..a.rows()).map(|i| u[(i, i)]).product();
            let det = a.determinant().unwrap();
            prop_assert!((det - lu_det).abs() < 1e-9 * det.abs().max(1.0));
        }
    }
}
