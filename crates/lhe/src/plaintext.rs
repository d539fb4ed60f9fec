//! Plaintext type for the leveled encryption schemes.

use crate::{Error, HeParameters, LevelId, Result};
use lhe_math::rq::{Poly, Representation};
use lhe_traits::{FheDecoder, FheEncoder, FheParametrized, FhePlaintext};
use std::sync::Arc;
use zeroize::Zeroize;

/// The payload of a plaintext, tagged with its representation form.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaintextForm {
    /// Coefficients modulo the message modulus, used by the integer schemes.
    Coefficient(Box<[u64]>),
    /// An evaluation-form ring element over the moduli of some level, used
    /// by the approximate scheme.
    Evaluation(Poly),
}

/// A plaintext, produced by an external encoder and consumed read-only by
/// the encryptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Plaintext {
    /// The parameters of the encryption scheme.
    pub(crate) par: Arc<HeParameters>,

    /// The payload and its representation form.
    pub(crate) form: PlaintextForm,

    /// The level this plaintext is associated with; only meaningful for
    /// evaluation-form plaintexts.
    pub(crate) level: Option<LevelId>,

    /// The scale tracking fixed-point precision in the approximate scheme.
    pub(crate) scale: f64,
}

impl Plaintext {
    /// Creates an evaluation-form plaintext from a ring element at the given
    /// level, carrying a scale.
    pub fn new_evaluation(
        poly: Poly,
        level: &LevelId,
        scale: f64,
        par: &Arc<HeParameters>,
    ) -> Result<Self> {
        let data = par.level_data(level)?;
        if poly.ctx() != data.ctx() {
            return Err(Error::precondition(
                "The ring element does not match the level",
            ));
        }
        if poly.representation() != &Representation::Ntt {
            return Err(Error::precondition(
                "The ring element is not in evaluation form",
            ));
        }
        if !(scale > 0.0) {
            return Err(Error::precondition("The scale must be positive"));
        }
        Ok(Self {
            par: par.clone(),
            form: PlaintextForm::Evaluation(poly),
            level: Some(*level),
            scale,
        })
    }

    /// Creates the zero plaintext in coefficient form.
    pub fn zero(par: &Arc<HeParameters>) -> Result<Self> {
        Self::try_encode(vec![0u64; par.degree()].as_slice(), par)
    }

    /// Returns whether the plaintext is in evaluation form.
    pub fn is_evaluation_form(&self) -> bool {
        matches!(self.form, PlaintextForm::Evaluation(_))
    }

    /// Returns the level of the plaintext, if any.
    pub fn level(&self) -> Option<&LevelId> {
        self.level.as_ref()
    }

    /// Returns the scale of the plaintext.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Returns the coefficients of a coefficient-form plaintext.
    pub fn coefficients(&self) -> Option<&[u64]> {
        match &self.form {
            PlaintextForm::Coefficient(c) => Some(c),
            PlaintextForm::Evaluation(_) => None,
        }
    }

    /// Returns the ring element of an evaluation-form plaintext.
    pub fn poly(&self) -> Option<&Poly> {
        match &self.form {
            PlaintextForm::Coefficient(_) => None,
            PlaintextForm::Evaluation(p) => Some(p),
        }
    }
}

impl Zeroize for Plaintext {
    fn zeroize(&mut self) {
        match &mut self.form {
            PlaintextForm::Coefficient(c) => c.zeroize(),
            PlaintextForm::Evaluation(p) => p.zeroize(),
        }
    }
}

impl FheParametrized for Plaintext {
    type Parameters = HeParameters;
}

impl FhePlaintext for Plaintext {}

impl FheEncoder<&[u64]> for Plaintext {
    type Error = Error;

    /// Encode a vector of values modulo the message modulus as a
    /// coefficient-form plaintext. Only available for the integer schemes.
    fn try_encode(value: &[u64], par: &Arc<HeParameters>) -> Result<Self> {
        let t = par.plaintext();
        if t == 0 {
            return Err(Error::precondition(
                "The approximate scheme has no coefficient-form plaintexts",
            ));
        }
        if value.len() > par.degree() {
            return Err(Error::precondition(
                "The plaintext has more coefficients than the polynomial degree",
            ));
        }
        if value.iter().any(|v| *v >= t) {
            return Err(Error::precondition(
                "A coefficient is not reduced modulo the plaintext modulus",
            ));
        }
        let mut coefficients = vec![0u64; par.degree()];
        coefficients[..value.len()].copy_from_slice(value);
        Ok(Self {
            par: par.clone(),
            form: PlaintextForm::Coefficient(coefficients.into_boxed_slice()),
            level: None,
            scale: 1.0,
        })
    }
}

impl FheDecoder<Plaintext> for Vec<u64> {
    type Error = Error;

    fn try_decode(pt: &Plaintext) -> Result<Self> {
        match &pt.form {
            PlaintextForm::Coefficient(c) => Ok(c.to_vec()),
            PlaintextForm::Evaluation(_) => Err(Error::precondition(
                "Only coefficient-form plaintexts can be decoded to values",
            )),
        }
    }
}
