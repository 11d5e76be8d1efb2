/// Categorical cross-entropy term for one output unit; pair with a Softmax
/// output layer. The loss of a sample is the sum over its units.
pub struct CrossEntropyLoss;

impl CrossEntropyLoss {
    /// -t·ln(y)
    pub fn loss(prediction: f64, target: f64) -> f64 {
        -target * prediction.ln()
    }

    /// -t / y
    pub fn derivative(prediction: f64, target: f64) -> f64 {
        -target / prediction
    }
}
