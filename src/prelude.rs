pub use serde::{Deserialize, Serialize};

pub use ndarray::*;
pub use ndarray_rand::rand_distr::Uniform;
pub use ndarray_rand::RandomExt;

pub use crate::error::*;
pub use crate::network::{ForwardPass, Network, NetworkBuilder, TrainConfig, TrainOutcome, TrainReport};

// Internal re-exports
pub use crate::core::{Activation, Layer, Node, WeightMatrix};
