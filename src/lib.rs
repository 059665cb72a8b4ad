//! Three-layer feed-forward network trained by per-pattern backpropagation.

pub mod config;
pub mod core;
pub mod error;
pub mod memory;
pub mod network;
pub mod output;
pub mod prelude;

// Re-export types
pub use crate::core::{Activation, Layer, Node, WeightMatrix};
pub use error::{NNError, Result};
pub use network::{ForwardPass, Network, NetworkBuilder, TrainConfig, TrainOutcome, TrainReport};

pub mod plot {
    pub mod plot_errors_over_epochs;

    pub use plot_errors_over_epochs::plot_errors_over_epochs;
}
