use thiserror::Error;

/// Errors raised while loading price data and assembling a price-taker model.
///
/// Every builder stage checks its own preconditions and returns one of these
/// before it touches model state.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid parameter value (horizon length, objective, limits, ...)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Input data does not fit the requested horizon or cluster count
    #[error("Data shape error: {0}")]
    DataShape(String),

    /// A categorical option that is not in its lookup table
    #[error("Unrecognized value '{value}' for {parameter}")]
    UnknownOption { parameter: &'static str, value: String },

    /// The knee detector found no elbow in the inertia curve
    #[error("No elbow found in inertia curve for k in [{kmin}, {kmax}); pass n_clusters explicitly")]
    NoElbow { kmin: usize, kmax: usize },

    /// The clustering backend failed to fit
    #[error("Clustering error: {0}")]
    Clustering(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Solver error: {0}")]
    Solver(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    pub(crate) fn shape(msg: impl Into<String>) -> Self {
        Error::DataShape(msg.into())
    }

    pub(crate) fn unknown(parameter: &'static str, value: impl Into<String>) -> Self {
        Error::UnknownOption {
            parameter,
            value: value.into(),
        }
    }
}
