use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::activation::ActivationFunction;
use crate::error::{NnError, Result};
use crate::loss::LossType;
use crate::math::matrix::Matrix;
use crate::network::backprop::BackPropagation;

fn default_learn_rate() -> f64 {
    0.001
}

/// Serializable description of a three-layer network: layer sizes, the
/// activation and loss choices, the learning rate and an optional seed for
/// the initial weights.
///
/// ```json
/// { "input_size": 2, "hidden_size": 3, "output_size": 1,
///   "hidden_activation": "sigmoid", "output_activation": "sigmoid",
///   "loss": "mse", "learn_rate": 0.5, "seed": 7 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub input_size: usize,
    pub hidden_size: usize,
    pub output_size: usize,
    pub hidden_activation: ActivationFunction,
    pub output_activation: ActivationFunction,
    pub loss: LossType,
    #[serde(default = "default_learn_rate")]
    pub learn_rate: f64,
    /// Seed for the initial weights; entropy is used when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl NetworkSpec {
    /// Sigmoid/Sigmoid/MSE network with the default learning rate.
    pub fn new(input_size: usize, hidden_size: usize, output_size: usize) -> NetworkSpec {
        NetworkSpec {
            input_size,
            hidden_size,
            output_size,
            hidden_activation: ActivationFunction::Sigmoid,
            output_activation: ActivationFunction::Sigmoid,
            loss: LossType::Mse,
            learn_rate: default_learn_rate(),
            seed: None,
        }
    }

    pub fn with_activations(mut self, hidden: ActivationFunction, output: ActivationFunction) -> Self {
        self.hidden_activation = hidden;
        self.output_activation = output;
        self
    }

    pub fn with_loss(mut self, loss: LossType) -> Self {
        self.loss = loss;
        self
    }

    pub fn with_learn_rate(mut self, learn_rate: f64) -> Self {
        self.learn_rate = learn_rate;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (rows, cols) in [(self.hidden_size, self.input_size), (self.output_size, self.hidden_size)] {
            if rows == 0 || cols == 0 {
                return Err(NnError::InvalidDimension { rows, cols, elements: 0 });
            }
        }
        if !self.learn_rate.is_finite() || self.learn_rate <= 0.0 {
            return Err(NnError::InvalidConfig(format!(
                "learn_rate must be finite and positive, got {}",
                self.learn_rate
            )));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<NetworkSpec> {
        let spec: NetworkSpec = serde_json::from_str(json)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Deserializes and validates a `NetworkSpec` from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let spec: NetworkSpec = serde_json::from_reader(reader)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Builds a network whose weights and biases come from
    /// `Matrix::random_with`, drawn in the order input weight, output weight,
    /// hidden bias, output bias.
    pub fn build(&self) -> Result<BackPropagation> {
        self.validate()?;
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        debug!(
            input = self.input_size,
            hidden = self.hidden_size,
            output = self.output_size,
            seed = ?self.seed,
            "building network"
        );

        let input_weight = Matrix::random_with(self.hidden_size, self.input_size, &mut rng)?;
        let output_weight = Matrix::random_with(self.output_size, self.hidden_size, &mut rng)?;
        let hidden_bias = Matrix::random_with(self.hidden_size, 1, &mut rng)?;
        let output_bias = Matrix::random_with(self.output_size, 1, &mut rng)?;

        Ok(BackPropagation::new(
            input_weight,
            output_weight,
            hidden_bias,
            output_bias,
            self.hidden_activation,
            self.output_activation,
            self.loss,
            self.learn_rate,
        ))
    }
}
