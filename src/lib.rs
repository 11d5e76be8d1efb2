pub mod error;
pub mod math;
pub mod activation;
pub mod loss;
pub mod network;
pub mod optim;
pub mod train;

// Convenience re-exports
pub use error::{NnError, Result};
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use loss::loss_type::LossType;
pub use network::backprop::BackPropagation;
pub use network::spec::NetworkSpec;
pub use optim::sgd::Sgd;
pub use train::{train_loop, TrainConfig};
