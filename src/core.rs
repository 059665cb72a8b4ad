// src/core.rs
pub mod activations;
pub mod layers;
pub mod nodes;
pub mod weights;

// Re-export commonly used items
pub use activations::Activation;
pub use layers::Layer;
pub use nodes::Node;
pub use weights::WeightMatrix;
