use crate::activation::ActivationFunction;
use crate::loss::LossType;

/// Output activation / loss pairs that form a canonical link. For these the
/// output-layer gradient with respect to the pre-activation reduces exactly
/// to `prediction - target`.
pub const CANONICAL_LINKS: [(ActivationFunction, LossType); 3] = [
    (ActivationFunction::Sigmoid, LossType::BinaryCrossEntropy),
    (ActivationFunction::Identity, LossType::Mse),
    (ActivationFunction::Softmax, LossType::CrossEntropy),
];

pub fn is_canonical(activation: ActivationFunction, loss: LossType) -> bool {
    CANONICAL_LINKS.contains(&(activation, loss))
}
