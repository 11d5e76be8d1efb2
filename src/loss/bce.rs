/// Binary cross-entropy, i.e. the negative log-likelihood of a Bernoulli
/// target (maximum likelihood estimation).
///
/// No epsilon is added: a prediction of exactly 0 or 1 yields an infinite
/// loss and derivative.
pub struct BceLoss;

impl BceLoss {
    /// -t·ln(y) - (1-t)·ln(1-y)
    pub fn loss(prediction: f64, target: f64) -> f64 {
        -target * prediction.ln() - (1.0 - target) * (1.0 - prediction).ln()
    }

    /// (y - t) / (y·(1 - y))
    pub fn derivative(prediction: f64, target: f64) -> f64 {
        (prediction - target) / (prediction * (1.0 - prediction))
    }
}
