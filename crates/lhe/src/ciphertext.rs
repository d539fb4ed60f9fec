//! Ciphertext type for the leveled encryption schemes.

use crate::{Error, HeParameters, LevelId, Result, SchemeType};
use lhe_math::rq::{Poly, Representation};
use lhe_traits::{FheCiphertext, FheParametrized};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

/// A ciphertext encrypting a plaintext: an ordered tuple of ring-element
/// components stored across all moduli of its level.
#[derive(Debug, Clone, PartialEq)]
pub struct Ciphertext {
    /// The parameters of the encryption scheme.
    pub(crate) par: Arc<HeParameters>,

    /// The seed that generated the mask component of a compact ciphertext.
    pub(crate) seed: Option<<ChaCha8Rng as SeedableRng>::Seed>,

    /// The ciphertext components.
    pub c: Vec<Poly>,

    /// The level of the ciphertext in the modulus chain.
    pub(crate) level: LevelId,

    /// Whether the components are in evaluation form.
    pub(crate) is_ntt: bool,

    /// The scale tracking fixed-point precision in the approximate scheme.
    pub(crate) scale: f64,

    /// Multiplier accumulated by level descents of the
    /// message-modulus-preserving scheme, modulo the message modulus.
    pub(crate) correction_factor: u64,
}

impl Ciphertext {
    /// Create a ciphertext from components. All components must share the
    /// context of the given level and the same representation.
    pub fn new(c: Vec<Poly>, level: &LevelId, par: &Arc<HeParameters>) -> Result<Self> {
        if c.is_empty() {
            return Err(Error::TooFewValues(0, 1));
        }
        let ctx = par.level_data(level)?.ctx().clone();
        let representation = c[0].representation().clone();
        for ci in &c {
            if ci.ctx() != &ctx {
                return Err(Error::Math(lhe_math::Error::InvalidContext));
            }
            if ci.representation() != &representation {
                return Err(Error::Math(lhe_math::Error::IncorrectRepresentation(
                    ci.representation().clone(),
                    representation.clone(),
                )));
            }
        }
        Ok(Self {
            par: par.clone(),
            seed: None,
            c,
            level: *level,
            is_ntt: representation == Representation::Ntt,
            scale: 1.0,
            correction_factor: 1,
        })
    }

    /// Get the i-th component of the ciphertext.
    pub fn get(&self, i: usize) -> Option<&Poly> {
        self.c.get(i)
    }

    /// The level of the ciphertext.
    pub fn level(&self) -> &LevelId {
        &self.level
    }

    /// Whether the components are in evaluation form.
    pub fn is_evaluation_form(&self) -> bool {
        self.is_ntt
    }

    /// The scale of the ciphertext.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// The correction factor of the ciphertext.
    pub fn correction_factor(&self) -> u64 {
        self.correction_factor
    }

    /// The seed of the mask component, when compact storage was requested.
    pub fn seed(&self) -> Option<&<ChaCha8Rng as SeedableRng>::Seed> {
        self.seed.as_ref()
    }

    /// Switch the ciphertext to the next (finer) level of the modulus chain
    /// by one scheme-specific descent step. Does nothing if the ciphertext
    /// is already at the last level.
    pub fn mod_switch_to_next_level(&mut self) -> Result<()> {
        let idx = self.par.level_index(&self.level)?;
        let next = match self.par.levels()[idx].next() {
            Some(next) => next,
            None => return Ok(()),
        };

        self.seed = None;
        match self.par.scheme() {
            SchemeType::Bfv => {
                for ci in self.c.iter_mut() {
                    ci.mod_switch_down_next().map_err(Error::Math)?;
                }
            }
            SchemeType::Ckks => {
                let q_last = *self.par.levels()[idx].ctx().moduli().last().unwrap();
                for ci in self.c.iter_mut() {
                    ci.mod_switch_down_next_ntt().map_err(Error::Math)?;
                }
                self.scale /= q_last as f64;
            }
            SchemeType::Bgv => {
                let t = self.par.plaintext_op()?.clone();
                let mut inv_q_last_mod_t = None;
                for ci in self.c.iter_mut() {
                    inv_q_last_mod_t =
                        Some(ci.mod_switch_down_next_mod_t(&t).map_err(Error::Math)?);
                }
                if let Some(inv) = inv_q_last_mod_t {
                    self.correction_factor = t.mul(self.correction_factor, inv);
                }
            }
            SchemeType::None => {
                return Err(Error::configuration("Unsupported scheme"));
            }
        }
        self.level = *self.par.levels()[next].id();
        Ok(())
    }
}

impl FheParametrized for Ciphertext {
    type Parameters = HeParameters;
}

impl FheCiphertext for Ciphertext {}
