use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;
use crate::network::backprop::BackPropagation;

/// One training example: a column-vector input and its column-vector target.
pub type Sample = (Matrix, Matrix);

/// One online pass over `samples`, in order. Returns the mean per-sample
/// loss, measured on the output each `train` call saw before updating.
pub fn train_epoch(
    network: &mut BackPropagation,
    samples: &[Sample],
    parallel: bool,
) -> Result<f64> {
    if samples.is_empty() {
        return Err(NnError::InvalidConfig("no training samples".into()));
    }

    let loss = network.loss();
    let mut total_loss = 0.0;
    for (input, target) in samples {
        let output = network.train(input, target, parallel)?;
        total_loss += loss.total(&output, target)?;
    }

    Ok(total_loss / samples.len() as f64)
}

/// Mean per-sample loss over `samples` using `forward` only.
///
/// # Errors
/// `InvalidConfig` if `samples` is empty, as for `train_epoch`.
pub fn evaluate(network: &BackPropagation, samples: &[Sample]) -> Result<f64> {
    if samples.is_empty() {
        return Err(NnError::InvalidConfig("no evaluation samples".into()));
    }
    let loss = network.loss();
    let mut total = 0.0;
    for (input, target) in samples {
        total += loss.total(&network.forward(input)?, target)?;
    }
    Ok(total / samples.len() as f64)
}
