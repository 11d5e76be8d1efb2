pub mod matrix;
pub mod linalg;

pub use matrix::Matrix;
pub use linalg::{backward_substitution, forward_substitution, solve};
