//! Errors for the lhe-math crate.

use crate::rq::Representation;
use thiserror::Error;

/// The errors that can occur in lhe-math.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Generic error with a message.
    #[error("{0}")]
    Default(String),

    /// The polynomial contexts do not match, or a context is not reachable
    /// in the modulus chain.
    #[error("Invalid context")]
    InvalidContext,

    /// The polynomial is not in the expected representation.
    #[error("Incorrect representation: expected {1:?}, found {0:?}")]
    IncorrectRepresentation(Representation, Representation),

    /// Error forwarded from the sampling utilities.
    #[error("Sampling error: {0}")]
    Sampling(String),
}

impl From<lhe_util::Error> for Error {
    fn from(e: lhe_util::Error) -> Self {
        Error::Sampling(e.to_string())
    }
}

/// A result type for lhe-math operations.
pub type Result<T> = std::result::Result<T, Error>;
