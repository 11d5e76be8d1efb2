use crate::activation::ActivationFunction;
use crate::error::{NnError, Result};
use crate::loss::{is_canonical, LossType};
use crate::math::matrix::Matrix;
use crate::optim::sgd::Sgd;

/// Three-layer (input, hidden, output) network trained by online
/// backpropagation.
///
/// Shapes: `input_weight` is hidden x input, `output_weight` is
/// output x hidden, and both biases are column vectors. They are only
/// checked when `forward` or `train` runs.
///
/// A single instance is not meant to be trained from several threads at once;
/// `train` takes `&mut self`.
#[derive(Debug, Clone)]
pub struct BackPropagation {
    input_weight: Matrix,
    output_weight: Matrix,
    hidden_bias: Matrix,
    output_bias: Matrix,
    hidden_activation: ActivationFunction,
    output_activation: ActivationFunction,
    loss: LossType,
    optimizer: Sgd,
}

/// Intermediate values of one forward pass, kept for the backward pass.
struct ForwardPass {
    hidden_pre: Matrix,
    hidden_activated: Matrix,
    output_pre: Matrix,
    output_activated: Matrix,
}

/// Output-layer error signal (dL/d pre-activation) for one sample.
///
/// Canonical activation/loss pairs take the closed form
/// `activated - target`; every other pair applies the chain rule through the
/// activation.
pub fn output_gradient(
    activation: ActivationFunction,
    loss: LossType,
    activated: &Matrix,
    pre_activation: &Matrix,
    target: &Matrix,
) -> Result<Matrix> {
    if is_canonical(activation, loss) {
        activated.checked_sub(target)
    } else {
        chain_rule_gradient(activation, loss, activated, pre_activation, target)
    }
}

/// Output-layer error signal computed from the activation and loss
/// derivatives, without the canonical-link shortcut.
pub fn chain_rule_gradient(
    activation: ActivationFunction,
    loss: LossType,
    activated: &Matrix,
    pre_activation: &Matrix,
    target: &Matrix,
) -> Result<Matrix> {
    if activated.shape() != target.shape() {
        return Err(NnError::DimensionMismatch {
            op: "output gradient",
            lhs: activated.shape(),
            rhs: target.shape(),
        });
    }
    let mut loss_grad = activated.clone();
    for i in 0..activated.rows() {
        for j in 0..activated.cols() {
            loss_grad[(i, j)] = loss.derivative(activated[(i, j)], target[(i, j)]);
        }
    }
    activation.backpropagate(activated, pre_activation, &loss_grad)
}

impl BackPropagation {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        input_weight: Matrix,
        output_weight: Matrix,
        hidden_bias: Matrix,
        output_bias: Matrix,
        hidden_activation: ActivationFunction,
        output_activation: ActivationFunction,
        loss: LossType,
        learn_rate: f64,
    ) -> BackPropagation {
        BackPropagation {
            input_weight,
            output_weight,
            hidden_bias,
            output_bias,
            hidden_activation,
            output_activation,
            loss,
            optimizer: Sgd::new(learn_rate),
        }
    }

    pub fn input_weight(&self) -> &Matrix {
        &self.input_weight
    }

    pub fn output_weight(&self) -> &Matrix {
        &self.output_weight
    }

    pub fn hidden_bias(&self) -> &Matrix {
        &self.hidden_bias
    }

    pub fn output_bias(&self) -> &Matrix {
        &self.output_bias
    }

    pub fn hidden_activation(&self) -> ActivationFunction {
        self.hidden_activation
    }

    pub fn output_activation(&self) -> ActivationFunction {
        self.output_activation
    }

    pub fn loss(&self) -> LossType {
        self.loss
    }

    pub fn learn_rate(&self) -> f64 {
        self.optimizer.learning_rate
    }

    pub fn set_learn_rate(&mut self, learn_rate: f64) {
        self.optimizer.learning_rate = learn_rate;
    }

    /// Whether training uses the closed-form output gradient.
    pub fn is_canonical(&self) -> bool {
        is_canonical(self.output_activation, self.loss)
    }

    fn feed(&self, input: &Matrix, parallel: bool) -> Result<ForwardPass> {
        if input.rows() != self.input_weight.cols() || input.cols() != 1 {
            return Err(NnError::DimensionMismatch {
                op: "forward",
                lhs: self.input_weight.shape(),
                rhs: input.shape(),
            });
        }

        let hidden_pre = self.input_weight
            .matmul_with(input, parallel)?
            .checked_add(&self.hidden_bias)?;
        let hidden_activated = self.hidden_activation.function(&hidden_pre);

        let output_pre = self.output_weight
            .matmul_with(&hidden_activated, parallel)?
            .checked_add(&self.output_bias)?;
        let output_activated = self.output_activation.function(&output_pre);

        Ok(ForwardPass { hidden_pre, hidden_activated, output_pre, output_activated })
    }

    /// Network output for a single column-vector input. Stored weights are
    /// left untouched.
    pub fn forward(&self, input: &Matrix) -> Result<Matrix> {
        self.feed(input, false).map(|pass| pass.output_activated)
    }

    /// One online gradient-descent step on a single `(input, target)` pair.
    ///
    /// Returns the output computed before the weights were updated. With
    /// `parallel` set the two forward products use the row-parallel multiply,
    /// which yields the same numbers as the sequential one.
    ///
    /// The hidden error for unit `i` is `Df(hidden_i) * Σ_j out_adj_j * W2[j, i]`,
    /// so the hidden derivative is taken at hidden unit `i`, never at an
    /// output index.
    pub fn train(&mut self, input: &Matrix, target: &Matrix, parallel: bool) -> Result<Matrix> {
        let expected = (self.output_weight.rows(), 1);
        if target.shape() != expected {
            return Err(NnError::DimensionMismatch {
                op: "train",
                lhs: expected,
                rhs: target.shape(),
            });
        }

        let pass = self.feed(input, parallel)?;

        let output_adjustment = output_gradient(
            self.output_activation,
            self.loss,
            &pass.output_activated,
            &pass.output_pre,
            target,
        )?;

        // Error reaching each hidden unit through every output weight.
        let hidden_error = self.output_weight.transpose().matmul(&output_adjustment)?;
        let hidden_adjustment = self.hidden_activation.backpropagate(
            &pass.hidden_activated,
            &pass.hidden_pre,
            &hidden_error,
        )?;

        // All gradients are taken from pre-update values.
        let input_weight_grad = hidden_adjustment.matmul(&input.transpose())?;
        let output_weight_grad = output_adjustment.matmul(&pass.hidden_activated.transpose())?;

        self.optimizer.step(&mut self.input_weight, &input_weight_grad)?;
        self.optimizer.step(&mut self.output_weight, &output_weight_grad)?;
        self.optimizer.step(&mut self.hidden_bias, &hidden_adjustment)?;
        self.optimizer.step(&mut self.output_bias, &output_adjustment)?;

        Ok(pass.output_activated)
    }
}
