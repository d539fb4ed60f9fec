#![crate_name = "lhe"]
#![crate_type = "lib"]
#![warn(missing_docs, unused_imports)]

//! Leveled homomorphic encryption in Rust: ciphertext construction for a
//! family of three schemes sharing one ring structure, with a leveled
//! modulus chain, public- and secret-key encryption, and a batched
//! data-parallel symmetric fast path.

mod ciphertext;
mod decryptor;
mod encryptor;
mod keys;
mod params;
mod plaintext;

pub mod kernel;

pub use ciphertext::Ciphertext;
pub use decryptor::Decryptor;
pub use encryptor::{Encryptor, KeyKind};
pub use keys::{PublicKey, SecretKey};
pub use params::{HeParameters, HeParametersBuilder, LevelData, LevelId, SchemeType};
pub use plaintext::{Plaintext, PlaintextForm};

use thiserror::Error as ThisError;

/// The errors that can occur in the lhe crate.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error {
    /// An error in the underlying mathematical operations.
    #[error("Math error: {0}")]
    Math(#[from] lhe_math::Error),

    /// The parameters are not fully set, a level identifier does not resolve
    /// against the modulus chain, or the scheme is not supported.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An operation-specific precondition does not hold: a required key is
    /// not set, a plaintext has the wrong representation form or is not
    /// valid for the parameters, or the random-state pool is not prepared.
    #[error("Precondition error: {0}")]
    Precondition(String),

    /// Not enough values were provided.
    #[error("Too few values: {0}, expected at least {1}")]
    TooFewValues(usize, usize),
}

impl Error {
    pub(crate) fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    pub(crate) fn precondition<S: Into<String>>(msg: S) -> Self {
        Self::Precondition(msg.into())
    }
}

impl From<lhe_util::Error> for Error {
    fn from(e: lhe_util::Error) -> Self {
        Self::Math(e.into())
    }
}

/// A result type for lhe operations.
pub type Result<T> = std::result::Result<T, Error>;
