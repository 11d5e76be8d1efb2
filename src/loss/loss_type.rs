use serde::{Serialize, Deserialize};

use crate::error::{NnError, Result};
use crate::loss::{BceLoss, CrossEntropyLoss, MseLoss};
use crate::math::matrix::Matrix;

/// Selects which loss function the network minimizes.
///
/// - `Mse`: half squared error; canonical with an Identity output.
/// - `BinaryCrossEntropy`: maximum likelihood estimation for 0/1 targets;
///   canonical with a Sigmoid output.
/// - `CrossEntropy`: categorical cross-entropy; canonical with Softmax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
    Mse,
    #[serde(alias = "mle")]
    BinaryCrossEntropy,
    CrossEntropy,
}

impl LossType {
    /// Scalar loss for one `(prediction, target)` pair.
    pub fn function(&self, prediction: f64, target: f64) -> f64 {
        match self {
            LossType::Mse                => MseLoss::loss(prediction, target),
            LossType::BinaryCrossEntropy => BceLoss::loss(prediction, target),
            LossType::CrossEntropy       => CrossEntropyLoss::loss(prediction, target),
        }
    }

    /// dL/dy for one `(prediction, target)` pair.
    pub fn derivative(&self, prediction: f64, target: f64) -> f64 {
        match self {
            LossType::Mse                => MseLoss::derivative(prediction, target),
            LossType::BinaryCrossEntropy => BceLoss::derivative(prediction, target),
            LossType::CrossEntropy       => CrossEntropyLoss::derivative(prediction, target),
        }
    }

    /// Loss summed over every element of two same-shape matrices.
    pub fn total(&self, prediction: &Matrix, target: &Matrix) -> Result<f64> {
        if prediction.shape() != target.shape() {
            return Err(NnError::DimensionMismatch {
                op: "loss",
                lhs: prediction.shape(),
                rhs: target.shape(),
            });
        }
        Ok(prediction.iter()
            .zip(target.iter())
            .map(|(&y, &t)| self.function(y, t))
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [LossType; 3] = [LossType::Mse, LossType::BinaryCrossEntropy, LossType::CrossEntropy];

    #[test]
    fn test_known_values() {
        assert_eq!(LossType::Mse.function(3.0, 1.0), 2.0);
        assert_eq!(LossType::Mse.derivative(3.0, 1.0), 2.0);
        assert!((LossType::BinaryCrossEntropy.function(0.5, 1.0) - 2f64.ln()).abs() < 1e-12);
        assert!((LossType::BinaryCrossEntropy.function(0.25, 0.0) - (4.0f64 / 3.0).ln()).abs() < 1e-12);
        assert_eq!(LossType::BinaryCrossEntropy.derivative(0.5, 1.0), -2.0);
        assert!((LossType::CrossEntropy.function(0.25, 1.0) - 4f64.ln()).abs() < 1e-12);
        assert_eq!(LossType::CrossEntropy.derivative(0.25, 1.0), -4.0);
        assert_eq!(LossType::CrossEntropy.function(0.25, 0.0), 0.0);
    }

    #[test]
    fn test_derivatives_match_finite_difference() {
        let h = 1e-6;
        for loss in ALL {
            for (y, t) in [(0.2, 1.0), (0.7, 0.0), (0.45, 0.3)] {
                let numeric = (loss.function(y + h, t) - loss.function(y - h, t)) / (2.0 * h);
                assert!((loss.derivative(y, t) - numeric).abs() < 1e-5, "{loss:?} at ({y}, {t})");
            }
        }
    }

    #[test]
    fn test_bce_saturates_without_clamping() {
        assert!(LossType::BinaryCrossEntropy.function(0.0, 1.0).is_infinite());
    }

    #[test]
    fn test_total() {
        let y = Matrix::column_vector(&[1.0, 2.0]).unwrap();
        let t = Matrix::column_vector(&[0.0, 0.0]).unwrap();
        assert_eq!(LossType::Mse.total(&y, &t).unwrap(), 2.5);
        let bad = Matrix::column_vector(&[0.0]).unwrap();
        assert!(matches!(LossType::Mse.total(&y, &bad), Err(NnError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_serde_accepts_mle_alias() {
        let loss: LossType = serde_json::from_str("\"mle\"").unwrap();
        assert_eq!(loss, LossType::BinaryCrossEntropy);
        assert_eq!(serde_json::to_string(&LossType::CrossEntropy).unwrap(), "\"cross_entropy\"");
    }
}
