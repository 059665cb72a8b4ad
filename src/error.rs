use thiserror::Error;

#[derive(Debug, Error)]
pub enum NNError {
    // Network construction
    #[error("Invalid layer configuration: {0}")]
    InvalidLayerConfiguration(String),

    // Propagation
    #[error("Invalid input shape: expected {expected} values, got {actual}")]
    InvalidInputShape { expected: usize, actual: usize },
    #[error("Invalid output shape: expected {expected} values, got {actual}")]
    InvalidOutputShape { expected: usize, actual: usize },
    #[error("Back propagation requested without a preceding forward pass")]
    MissingForwardPass,

    // Weight matrices
    #[error("Invalid index ({row}, {col}) into a {rows}x{cols} weight matrix")]
    InvalidIndex {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    #[error("Invalid weight shape: {0}")]
    InvalidWeightShape(String),

    // Training
    #[error("Number of inputs ({inputs}) must equal number of targets ({targets})")]
    PatternCountMismatch { inputs: usize, targets: usize },

    #[error("Invalid activation function: {0}")]
    InvalidActivation(String),

    // Persistence
    #[error("Cannot use input file to load weights. {reason}")]
    BadLoad {
        reason: String,
        #[source]
        source: Option<std::io::Error>,
    },
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] Box<bincode::ErrorKind>),

    // Configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Shape error: {0}")]
    ShapeError(#[from] ndarray::ShapeError),
}

impl NNError {
    pub(crate) fn bad_load(reason: impl Into<String>) -> Self {
        NNError::BadLoad {
            reason: reason.into(),
            source: None,
        }
    }

    /// True for precondition violations by the caller: vector lengths that do
    /// not match a layer, or indices outside a weight matrix.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            NNError::InvalidInputShape { .. }
                | NNError::InvalidOutputShape { .. }
                | NNError::InvalidIndex { .. }
                | NNError::PatternCountMismatch { .. }
        )
    }

    /// True when a persisted weight file failed validation.
    pub fn is_bad_load(&self) -> bool {
        matches!(self, NNError::BadLoad { .. })
    }
}

pub type Result<T> = std::result::Result<T, NNError>;
