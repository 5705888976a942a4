use thiserror::Error;

/// Error types for the asymfit-rs library.
#[derive(Error, Debug)]
pub enum AsymFitError {
    /// A background or good-bin window is inverted or lies outside the histogram.
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// A histogram pair or region holds no usable samples.
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    /// The model expression could not be parsed or resolved.
    #[error("Compilation error: {0}")]
    Compilation(#[from] crate::expression::ExpressionError),

    /// The fit request is inconsistent (bounds, guesses, dataset lengths, empty model).
    #[error("Fit error: {0}")]
    Fit(String),

    /// J^T J could not be inverted while estimating parameter uncertainties.
    #[error("Singular covariance matrix: the model is over-parameterized or a parameter is unidentifiable")]
    SingularCovariance,

    /// Error indicating a mismatch in array dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error for invalid parameter bounds.
    #[error("Bounds error: {0}")]
    Bounds(#[from] crate::parameters::BoundsError),

    /// Linear algebra error.
    #[error("Linear algebra error: {0}")]
    LinearAlgebra(String),

    /// Error during function evaluation.
    #[error("Function evaluation error: {0}")]
    FunctionEvaluation(String),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for asymfit-rs operations.
pub type Result<T> = std::result::Result<T, AsymFitError>;
