//! JSON configuration for building and training a network.
//!
//! ```json
//! {
//!   "input_size": 2,
//!   "hidden_size": 3,
//!   "output_size": 1,
//!   "activation": "sigmoid",
//!   "learning_rate": 0.5,
//!   "seed": 42,
//!   "threshold": 0.05,
//!   "max_epochs": 20000
//! }
//! ```

use crate::prelude::*;
use std::fs;
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NetworkConfig {
    pub input_size: usize,
    pub hidden_size: usize,
    pub output_size: usize,
    #[serde(default = "default_activation")]
    pub activation: String,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default)]
    pub seed: Option<u64>,
    pub threshold: f64,
    #[serde(default)]
    pub max_epochs: Option<usize>,
}

fn default_activation() -> String {
    "sigmoid".to_string()
}

fn default_learning_rate() -> f64 {
    1.0
}

/// Reads and validates a configuration file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<NetworkConfig> {
    let contents = fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(json: &str) -> Result<NetworkConfig> {
    let config: NetworkConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}

impl NetworkConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, size) in [
            ("input_size", self.input_size),
            ("hidden_size", self.hidden_size),
            ("output_size", self.output_size),
        ] {
            if size == 0 {
                return Err(NNError::ConfigError(format!("{} must be positive", name)));
            }
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(NNError::ConfigError(
                "learning_rate must be a positive number".to_string(),
            ));
        }
        if self.threshold.is_nan() || self.threshold < 0.0 {
            return Err(NNError::ConfigError(
                "threshold must be non-negative".to_string(),
            ));
        }
        if self.max_epochs == Some(0) {
            return Err(NNError::ConfigError(
                "max_epochs must be at least 1".to_string(),
            ));
        }
        self.activation()?;
        Ok(())
    }

    pub fn activation(&self) -> Result<Activation> {
        self.activation.parse()
    }

    pub fn build_network(&self) -> Result<Network> {
        let mut builder = Network::builder()
            .input(self.input_size)
            .hidden(self.hidden_size)
            .output(self.output_size)
            .activation(self.activation()?)
            .learning_rate(self.learning_rate);
        if let Some(seed) = self.seed {
            builder = builder.seed(seed);
        }
        builder.build()
    }

    pub fn train_config(&self) -> TrainConfig {
        TrainConfig {
            threshold: self.threshold,
            max_epochs: self.max_epochs,
        }
    }
}
