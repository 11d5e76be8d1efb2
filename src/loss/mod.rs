pub mod mse;
pub mod bce;
pub mod cross_entropy;
pub mod loss_type;
pub mod link;

pub use mse::MseLoss;
pub use bce::BceLoss;
pub use cross_entropy::CrossEntropyLoss;
pub use loss_type::LossType;
pub use link::is_canonical;
