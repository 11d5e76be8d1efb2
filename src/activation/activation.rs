use serde::{Serialize, Deserialize};

use crate::activation::softmax;
use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationFunction {
    Sigmoid,
    SoftPlus,
    Tanh,
    ArcTan,
    Identity,
    #[serde(rename = "relu")]
    ReLU,
    /// Column-wise softmax. It has no pointwise form: see `activation::softmax`
    /// for the transform and its Jacobian column.
    Softmax,
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl ActivationFunction {
    /// Pointwise transform, `None` for `Softmax`.
    fn pointwise(self) -> Option<fn(f64) -> f64> {
        match self {
            ActivationFunction::Sigmoid => Some(sigmoid),
            ActivationFunction::SoftPlus => Some(|x: f64| (1.0 + x.exp()).ln()),
            ActivationFunction::Tanh => Some(f64::tanh),
            ActivationFunction::ArcTan => Some(f64::atan),
            ActivationFunction::Identity => Some(|x: f64| x),
            ActivationFunction::ReLU => Some(|x: f64| if x > 0.0 { x } else { 0.0 }),
            ActivationFunction::Softmax => None,
        }
    }

    /// Pointwise derivative as `df(activated, pre_activation)`.
    fn pointwise_derivative(self) -> Option<fn(f64, f64) -> f64> {
        match self {
            ActivationFunction::Sigmoid => Some(|fx: f64, _: f64| fx * (1.0 - fx)),
            // Sigmoid of the pre-activation, not of the activated value.
            ActivationFunction::SoftPlus => Some(|_: f64, x: f64| sigmoid(x)),
            ActivationFunction::Tanh => Some(|fx: f64, _: f64| 1.0 - fx * fx),
            ActivationFunction::ArcTan => Some(|_: f64, x: f64| 1.0 / (1.0 + x * x)),
            ActivationFunction::Identity => Some(|_: f64, _: f64| 1.0),
            ActivationFunction::ReLU => Some(|_: f64, x: f64| if x >= 0.0 { 1.0 } else { 0.0 }),
            ActivationFunction::Softmax => None,
        }
    }

    /// Applies the activation, returning a new matrix.
    pub fn function(&self, pre_activation: &Matrix) -> Matrix {
        match self.pointwise() {
            Some(f) => pre_activation.map(f),
            None => softmax::softmax(pre_activation),
        }
    }

    /// Applies the activation in place.
    pub fn function_in_place(&self, m: &mut Matrix) {
        match self.pointwise() {
            Some(f) => m.map_in_place(f),
            None => softmax::softmax_in_place(m),
        }
    }

    /// Derivative at one element, given both the activated value `fx` and
    /// the pre-activation `x`. Fails with `Unsupported` for `Softmax`.
    pub fn derivative(&self, fx: f64, x: f64) -> Result<f64> {
        self.pointwise_derivative()
            .map(|df| df(fx, x))
            .ok_or(NnError::Unsupported(
                "softmax has no pointwise derivative; use softmax::jacobian_column",
            ))
    }

    /// `derivative` over two same-shape matrices.
    pub fn derivative_matrix(&self, activated: &Matrix, pre_activation: &Matrix) -> Result<Matrix> {
        if activated.shape() != pre_activation.shape() {
            return Err(NnError::DimensionMismatch {
                op: "activation derivative",
                lhs: activated.shape(),
                rhs: pre_activation.shape(),
            });
        }
        let mut res = Matrix::zeros(activated.rows(), activated.cols())?;
        for i in 0..activated.rows() {
            for j in 0..activated.cols() {
                res[(i, j)] = self.derivative(activated[(i, j)], pre_activation[(i, j)])?;
            }
        }
        Ok(res)
    }

    /// Pulls `upstream` (dL/d activated) back through the activation, giving
    /// dL/d pre-activation.
    ///
    /// Pointwise activations multiply element by element. `Softmax` sums over
    /// its Jacobian columns instead, since every output in a column depends
    /// on every input of that column.
    pub fn backpropagate(
        &self,
        activated: &Matrix,
        pre_activation: &Matrix,
        upstream: &Matrix,
    ) -> Result<Matrix> {
        if upstream.shape() != pre_activation.shape() {
            return Err(NnError::DimensionMismatch {
                op: "backpropagate",
                lhs: pre_activation.shape(),
                rhs: upstream.shape(),
            });
        }
        if *self != ActivationFunction::Softmax {
            return self.derivative_matrix(activated, pre_activation)?.hadamard(upstream);
        }

        let (rows, cols) = pre_activation.shape();
        let mut res = Matrix::zeros(rows, cols)?;
        for k in 0..rows {
            let jac = softmax::jacobian_column(pre_activation, k)?;
            for i in 0..rows {
                for j in 0..cols {
                    res[(i, j)] += jac[(i, j)] * upstream[(k, j)];
                }
            }
        }
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POINTWISE: [ActivationFunction; 6] = [
        ActivationFunction::Sigmoid,
        ActivationFunction::SoftPlus,
        ActivationFunction::Tanh,
        ActivationFunction::ArcTan,
        ActivationFunction::Identity,
        ActivationFunction::ReLU,
    ];

    fn apply(act: ActivationFunction, x: f64) -> f64 {
        act.function(&Matrix::from_vec(1, 1, vec![x]).unwrap())[(0, 0)]
    }

    #[test]
    fn test_forward_values() {
        assert_eq!(apply(ActivationFunction::Sigmoid, 0.0), 0.5);
        assert!((apply(ActivationFunction::SoftPlus, 0.0) - 2f64.ln()).abs() < 1e-12);
        assert!((apply(ActivationFunction::Tanh, 1.0) - 1f64.tanh()).abs() < 1e-12);
        assert!((apply(ActivationFunction::ArcTan, 1.0) - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
        assert_eq!(apply(ActivationFunction::Identity, -3.5), -3.5);
        assert_eq!(apply(ActivationFunction::ReLU, -3.5), 0.0);
        assert_eq!(apply(ActivationFunction::ReLU, 2.0), 2.0);
    }

    #[test]
    fn test_derivatives_match_finite_difference() {
        let h = 1e-6;
        for act in POINTWISE {
            for x in [-1.3, -0.4, 0.6, 2.1] {
                let fx = apply(act, x);
                let numeric = (apply(act, x + h) - apply(act, x - h)) / (2.0 * h);
                let analytic = act.derivative(fx, x).unwrap();
                assert!((analytic - numeric).abs() < 1e-6, "{act:?} at {x}");
            }
        }
    }

    #[test]
    fn test_relu_derivative_at_zero() {
        assert_eq!(ActivationFunction::ReLU.derivative(0.0, 0.0).unwrap(), 1.0);
        assert_eq!(ActivationFunction::ReLU.derivative(0.0, -1e-9).unwrap(), 0.0);
    }

    #[test]
    fn test_in_place_matches_value_variant() {
        let m = Matrix::from_vec(2, 2, vec![-2.0, -0.5, 0.5, 3.0]).unwrap();
        for act in POINTWISE.into_iter().chain([ActivationFunction::Softmax]) {
            let mut n = m.clone();
            act.function_in_place(&mut n);
            assert_eq!(n, act.function(&m), "{act:?}");
        }
    }

    #[test]
    fn test_softmax_pointwise_derivative_unsupported() {
        assert!(matches!(
            ActivationFunction::Softmax.derivative(0.5, 0.0),
            Err(NnError::Unsupported(_))
        ));
        let m = Matrix::zeros(2, 1).unwrap();
        assert!(ActivationFunction::Softmax.derivative_matrix(&m, &m).is_err());
    }

    #[test]
    fn test_derivative_matrix_shape_check() {
        let a = Matrix::zeros(2, 1).unwrap();
        let b = Matrix::zeros(3, 1).unwrap();
        assert!(matches!(
            ActivationFunction::Sigmoid.derivative_matrix(&a, &b),
            Err(NnError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_backpropagate_pointwise_is_hadamard() {
        let pre = Matrix::column_vector(&[-0.5, 0.25]).unwrap();
        let act = ActivationFunction::Tanh;
        let activated = act.function(&pre);
        let upstream = Matrix::column_vector(&[2.0, -3.0]).unwrap();
        let got = act.backpropagate(&activated, &pre, &upstream).unwrap();
        for i in 0..2 {
            let expected = (1.0 - activated[(i, 0)].powi(2)) * upstream[(i, 0)];
            assert_eq!(got[(i, 0)], expected);
        }
    }

    #[test]
    fn test_backpropagate_softmax_matches_finite_difference() {
        // L = sum_k w_k * softmax(x)_k, so dL/dx_i = sum_k J[k][i] * w_k.
        let pre = Matrix::column_vector(&[0.1, -0.4, 0.9]).unwrap();
        let w = Matrix::column_vector(&[1.5, -2.0, 0.5]).unwrap();
        let act = ActivationFunction::Softmax;
        let got = act.backpropagate(&act.function(&pre), &pre, &w).unwrap();

        let objective = |x: &Matrix| -> f64 {
            softmax::softmax(x).iter().zip(w.iter()).map(|(a, b)| a * b).sum()
        };
        let h = 1e-6;
        for i in 0..3 {
            let mut plus = pre.clone();
            let mut minus = pre.clone();
            plus[(i, 0)] += h;
            minus[(i, 0)] -= h;
            let numeric = (objective(&plus) - objective(&minus)) / (2.0 * h);
            assert!((got[(i, 0)] - numeric).abs() < 1e-7);
        }
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&ActivationFunction::SoftPlus).unwrap();
        assert_eq!(json, "\"soft_plus\"");
        let act: ActivationFunction = serde_json::from_str("\"relu\"").unwrap();
        assert_eq!(act, ActivationFunction::ReLU);
    }
}
