pub mod backprop;
pub mod spec;

pub use backprop::{chain_rule_gradient, output_gradient, BackPropagation};
pub use spec::NetworkSpec;
