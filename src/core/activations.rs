use crate::prelude::*;
use std::str::FromStr;

/// Node nonlinearity.
///
/// Derivatives are taken with respect to the node's *output* rather than its
/// raw input, so backpropagation only ever needs the last output of a node.
/// Any new variant must follow the same convention.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    Identity,
    #[default]
    Sigmoid,
    Tanh,
}

impl Activation {
    pub fn evaluate(&self, x: f64) -> f64 {
        match self {
            Self::Identity => x,
            Self::Sigmoid => sigmoid(x),
            Self::Tanh => x.tanh(),
        }
    }

    /// Derivative expressed in terms of `y = evaluate(x)`.
    pub fn derivative_from_output(&self, y: f64) -> f64 {
        match self {
            Self::Identity => 1.0,
            Self::Sigmoid => y * (1.0 - y),
            Self::Tanh => 1.0 - y * y,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Sigmoid => "sigmoid",
            Self::Tanh => "tanh",
        }
    }
}

impl FromStr for Activation {
    type Err = NNError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "identity" | "linear" => Ok(Self::Identity),
            "sigmoid" => Ok(Self::Sigmoid),
            "tanh" => Ok(Self::Tanh),
            other => Err(NNError::InvalidActivation(format!(
                "'{}'. Must be one of: identity, sigmoid, tanh",
                other
            ))),
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
