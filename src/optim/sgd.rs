use crate::error::Result;
use crate::math::matrix::Matrix;

/// Plain gradient descent with a fixed learning rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }

    /// `param -= gradient * learning_rate`, in place.
    pub fn step(&self, param: &mut Matrix, gradient: &Matrix) -> Result<()> {
        *param = param.checked_sub(&gradient.scale(self.learning_rate))?;
        Ok(())
    }
}
