//! Parameters for the leveled encryption schemes.

use crate::{Error, Result};
use lhe_math::{
    rq::{Context, Representation},
    zq::{primes::generate_prime, Modulus},
};
use lhe_traits::FheParameters;
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Describes the encryption scheme to be used.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SchemeType {
    /// Fallback. Not valid for encryption.
    #[default]
    None,
    /// Scale-rounding integer scheme, coefficient-form native: plaintexts
    /// are injected scaled by the rounded ratio of the ciphertext modulus to
    /// the message modulus.
    Bfv,
    /// Approximate scheme with a floating scale, evaluation-form native.
    Ckks,
    /// Message-modulus-preserving integer scheme, evaluation-form native:
    /// the correction factor of a ciphertext tracks the implicit scaling
    /// accumulated by level descents.
    Bgv,
}

impl From<SchemeType> for u8 {
    fn from(val: SchemeType) -> Self {
        match val {
            SchemeType::None => 0,
            SchemeType::Bfv => 1,
            SchemeType::Ckks => 2,
            SchemeType::Bgv => 3,
        }
    }
}

/// An opaque fingerprint naming one level of the modulus chain.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LevelId([u8; 32]);

impl Debug for LevelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LevelId(")?;
        for b in &self.0[..8] {
            write!(f, "{b:02x}")?;
        }
        write!(f, "..)")
    }
}

/// One node of the modulus chain.
#[derive(Debug, Clone)]
pub struct LevelData {
    id: LevelId,
    ctx: Arc<Context>,
    prev: Option<usize>,
    next: Option<usize>,
}

impl LevelData {
    /// The identifier of this level.
    pub fn id(&self) -> &LevelId {
        &self.id
    }

    /// The polynomial context of this level.
    pub fn ctx(&self) -> &Arc<Context> {
        &self.ctx
    }

    /// The index of the coarser level this level descends from, if any.
    pub fn prev(&self) -> Option<usize> {
        self.prev
    }

    /// The index of the finer level below this level, if any.
    pub fn next(&self) -> Option<usize> {
        self.next
    }
}

/// Parameters for the leveled encryption schemes.
pub struct HeParameters {
    scheme: SchemeType,

    /// Number of coefficients in a polynomial.
    polynomial_degree: usize,

    /// Modulus of the plaintext, 0 for the approximate scheme.
    plaintext_modulus: u64,

    /// Vector of coprime moduli q_i for the ciphertext, the key level using
    /// all of them.
    moduli: Box<[u64]>,

    /// Error variance
    variance: usize,

    /// The modulus chain, from the key level down to a single modulus.
    levels: Vec<LevelData>,

    /// Resolution of level identifiers to chain indices.
    level_index: HashMap<LevelId, usize>,

    /// Plaintext modulus operator, for the integer schemes.
    plaintext: Option<Modulus>,

    /// floor(q / t) modulo each modulus of the first level.
    delta: Box<[u64]>,

    /// q modulo t at the first level.
    q_mod_t: u64,

    /// (t + 1) / 2: values at or above it represent negatives.
    upper_half_threshold: u64,

    /// q_i - t per modulus of the first level, when every modulus exceeds
    /// the message modulus.
    fast_lift_increment: Option<Box<[u64]>>,

    /// q - t at the first level.
    lift_increment: Option<BigUint>,
}

impl Debug for HeParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeParameters")
            .field("scheme", &self.scheme)
            .field("polynomial_degree", &self.polynomial_degree)
            .field("plaintext_modulus", &self.plaintext_modulus)
            .field("moduli", &self.moduli)
            .finish()
    }
}

impl FheParameters for HeParameters {}

impl PartialEq for HeParameters {
    fn eq(&self, other: &Self) -> bool {
        self.scheme == other.scheme
            && self.polynomial_degree == other.polynomial_degree
            && self.plaintext_modulus == other.plaintext_modulus
            && self.moduli == other.moduli
            && self.variance == other.variance
    }
}

impl Eq for HeParameters {}

impl HeParameters {
    /// Returns the scheme.
    pub const fn scheme(&self) -> SchemeType {
        self.scheme
    }

    /// Returns the underlying polynomial degree.
    pub const fn degree(&self) -> usize {
        self.polynomial_degree
    }

    /// Returns a reference to the ciphertext moduli.
    pub fn moduli(&self) -> &[u64] {
        &self.moduli
    }

    /// Returns the plaintext modulus, 0 for the approximate scheme.
    pub const fn plaintext(&self) -> u64 {
        self.plaintext_modulus
    }

    /// Returns the variance.
    pub const fn variance(&self) -> usize {
        self.variance
    }

    /// Returns the maximum level allowed by these parameters.
    pub fn max_level(&self) -> usize {
        self.levels.len() - 1
    }

    /// Returns the modulus chain.
    pub fn levels(&self) -> &[LevelData] {
        &self.levels
    }

    /// Returns the identifier of the key level, the coarsest level of the
    /// chain, holding the key material.
    pub fn key_level_id(&self) -> &LevelId {
        self.levels[0].id()
    }

    /// Returns the identifier of the first level usable for fresh
    /// encryptions.
    pub fn first_level_id(&self) -> &LevelId {
        self.levels[std::cmp::min(1, self.levels.len() - 1)].id()
    }

    /// Resolve a level identifier to its index in the chain.
    pub fn level_index(&self, id: &LevelId) -> Result<usize> {
        self.level_index
            .get(id)
            .copied()
            .ok_or_else(|| Error::configuration("The level identifier does not resolve"))
    }

    /// Resolve a level identifier to its chain node.
    pub fn level_data(&self, id: &LevelId) -> Result<&LevelData> {
        Ok(&self.levels[self.level_index(id)?])
    }

    /// Returns the context corresponding to the level index.
    pub fn ctx_at_level(&self, level: usize) -> Result<&Arc<Context>> {
        self.levels
            .get(level)
            .map(LevelData::ctx)
            .ok_or_else(|| Error::configuration("No context at the specified level"))
    }

    /// The representation in which ciphertexts of this scheme natively live.
    pub fn native_representation(&self) -> Representation {
        match self.scheme {
            SchemeType::Bfv => Representation::PowerBasis,
            _ => Representation::Ntt,
        }
    }

    /// The plaintext modulus operator, for the integer schemes.
    pub(crate) fn plaintext_op(&self) -> Result<&Modulus> {
        self.plaintext
            .as_ref()
            .ok_or_else(|| Error::configuration("The scheme has no plaintext modulus"))
    }

    pub(crate) fn delta(&self) -> &[u64] {
        &self.delta
    }

    pub(crate) fn q_mod_t(&self) -> u64 {
        self.q_mod_t
    }

    pub(crate) fn upper_half_threshold(&self) -> u64 {
        self.upper_half_threshold
    }

    pub(crate) fn fast_lift_increment(&self) -> Option<&[u64]> {
        self.fast_lift_increment.as_deref()
    }

    pub(crate) fn lift_increment(&self) -> Option<&BigUint> {
        self.lift_increment.as_ref()
    }
}

/// Fingerprint of one level of the chain.
fn fingerprint(scheme: SchemeType, degree: usize, moduli: &[u64], plaintext: u64) -> LevelId {
    let mut hasher = Sha256::new();
    hasher.update([u8::from(scheme)]);
    hasher.update((degree as u64).to_le_bytes());
    hasher.update(plaintext.to_le_bytes());
    hasher.update((moduli.len() as u64).to_le_bytes());
    for m in moduli {
        hasher.update(m.to_le_bytes());
    }
    LevelId(hasher.finalize().into())
}

/// Builder for [`HeParameters`].
#[derive(Debug, Default)]
pub struct HeParametersBuilder {
    scheme: SchemeType,
    degree: usize,
    plaintext_modulus: u64,
    moduli: Vec<u64>,
    moduli_sizes: Vec<usize>,
    variance: usize,
}

impl HeParametersBuilder {
    /// Creates a new builder with no parameter specified.
    pub fn new() -> Self {
        Self {
            variance: 10,
            ..Default::default()
        }
    }

    /// Sets the encryption scheme.
    pub fn set_scheme(mut self, scheme: SchemeType) -> Self {
        self.scheme = scheme;
        self
    }

    /// Sets the polynomial degree.
    pub fn set_degree(mut self, degree: usize) -> Self {
        self.degree = degree;
        self
    }

    /// Sets the plaintext modulus, required for the integer schemes.
    pub fn set_plaintext_modulus(mut self, plaintext: u64) -> Self {
        self.plaintext_modulus = plaintext;
        self
    }

    /// Sets the ciphertext moduli explicitly. Only one of `set_moduli` and
    /// `set_moduli_sizes` may be used.
    pub fn set_moduli(mut self, moduli: &[u64]) -> Self {
        self.moduli = moduli.to_vec();
        self.moduli_sizes.clear();
        self
    }

    /// Sets the sizes in bits of the ciphertext moduli; suitable NTT-friendly
    /// primes are generated. Only one of `set_moduli` and `set_moduli_sizes`
    /// may be used.
    pub fn set_moduli_sizes(mut self, moduli_sizes: &[usize]) -> Self {
        self.moduli_sizes = moduli_sizes.to_vec();
        self.moduli.clear();
        self
    }

    /// Sets the error variance.
    pub fn set_variance(mut self, variance: usize) -> Self {
        self.variance = variance;
        self
    }

    /// Generate NTT-friendly primes of the specified sizes.
    fn generate_moduli(&self) -> Result<Vec<u64>> {
        let mut moduli = Vec::with_capacity(self.moduli_sizes.len());
        for size in &self.moduli_sizes {
            if *size > 62 || *size < 10 {
                return Err(Error::configuration(
                    "The moduli sizes must be between 10 and 62 bits",
                ));
            }
            let mut upper_bound = u64::MAX >> (64 - size);
            loop {
                if let Some(p) =
                    generate_prime(*size, 2 * self.degree as u64, upper_bound)
                {
                    if !moduli.contains(&p) && p != self.plaintext_modulus {
                        moduli.push(p);
                        break;
                    }
                    upper_bound = p - 1;
                } else {
                    return Err(Error::configuration(
                        "Could not generate enough moduli of the given sizes",
                    ));
                }
            }
        }
        Ok(moduli)
    }

    /// Build the parameters, validating that the full set is well-formed.
    pub fn build(self) -> Result<HeParameters> {
        if self.scheme == SchemeType::None {
            return Err(Error::configuration("The scheme is not set"));
        }
        if !self.degree.is_power_of_two() || self.degree < 8 {
            return Err(Error::configuration(
                "The degree is not a power of two larger or equal to 8",
            ));
        }
        if !(1..=16).contains(&self.variance) {
            return Err(Error::configuration(
                "The variance should be between 1 and 16",
            ));
        }
        if self.moduli.is_empty() && self.moduli_sizes.is_empty() {
            return Err(Error::configuration("The moduli are not set"));
        }

        let moduli = if self.moduli.is_empty() {
            self.generate_moduli()?
        } else {
            self.moduli.clone()
        };

        let plaintext = match self.scheme {
            SchemeType::Ckks => {
                if self.plaintext_modulus != 0 {
                    return Err(Error::configuration(
                        "The approximate scheme does not use a plaintext modulus",
                    ));
                }
                None
            }
            _ => {
                if self.plaintext_modulus < 2 {
                    return Err(Error::configuration("The plaintext modulus is not set"));
                }
                if moduli.contains(&self.plaintext_modulus) {
                    return Err(Error::configuration(
                        "The plaintext modulus must be coprime to the ciphertext moduli",
                    ));
                }
                Some(Modulus::new(self.plaintext_modulus).map_err(Error::Math)?)
            }
        };

        let key_ctx = Context::new_arc(&moduli, self.degree).map_err(Error::Math)?;
        let chain = Context::chain(&key_ctx);
        let n_levels = chain.len();

        let mut levels = Vec::with_capacity(n_levels);
        let mut level_index = HashMap::with_capacity(n_levels);
        for (i, ctx) in chain.into_iter().enumerate() {
            let id = fingerprint(
                self.scheme,
                self.degree,
                ctx.moduli(),
                self.plaintext_modulus,
            );
            level_index.insert(id, i);
            levels.push(LevelData {
                id,
                ctx,
                prev: i.checked_sub(1),
                next: (i + 1 < n_levels).then_some(i + 1),
            });
        }

        // Plaintext scaling data at the first level, for the integer
        // schemes.
        let first_ctx = levels[std::cmp::min(1, n_levels - 1)].ctx.clone();
        let t = self.plaintext_modulus;
        let (delta, q_mod_t, upper_half_threshold, fast_lift_increment, lift_increment) =
            if plaintext.is_some() {
                let q = first_ctx.modulus();
                let delta_big = q / t;
                let delta = first_ctx
                    .moduli()
                    .iter()
                    .map(|qi| (&delta_big % *qi).to_u64().unwrap())
                    .collect::<Vec<_>>()
                    .into_boxed_slice();
                let q_mod_t = (q % t).to_u64().unwrap();
                let fast = first_ctx
                    .moduli()
                    .iter()
                    .all(|qi| *qi > t)
                    .then(|| {
                        first_ctx
                            .moduli()
                            .iter()
                            .map(|qi| *qi - t)
                            .collect::<Vec<_>>()
                            .into_boxed_slice()
                    });
                (delta, q_mod_t, (t + 1) >> 1, fast, Some(q - t))
            } else {
                (Box::default(), 0, 0, None, None)
            };

        Ok(HeParameters {
            scheme: self.scheme,
            polynomial_degree: self.degree,
            plaintext_modulus: t,
            moduli: moduli.into_boxed_slice(),
            variance: self.variance,
            levels,
            level_index,
            plaintext,
            delta,
            q_mod_t,
            upper_half_threshold,
            fast_lift_increment,
            lift_increment,
        })
    }

    /// Build the parameters in an `Arc`.
    pub fn build_arc(self) -> Result<Arc<HeParameters>> {
        self.build().map(Arc::new)
    }
}

#[cfg(test)]
mod tests {
    use super::{HeParametersBuilder, SchemeType};
    use std::error::Error;

    #[test]
    fn build_rejects_incomplete_parameters() {
        assert!(HeParametersBuilder::new().build().is_err());
        assert!(HeParametersBuilder::new()
            .set_scheme(SchemeType::Bfv)
            .build()
            .is_err());
        assert!(HeParametersBuilder::new()
            .set_scheme(SchemeType::Bfv)
            .set_degree(7)
            .build()
            .is_err());
        assert!(HeParametersBuilder::new()
            .set_scheme(SchemeType::Bfv)
            .set_degree(8)
            .set_moduli_sizes(&[62])
            .build()
            .is_err()); // plaintext modulus missing
        assert!(HeParametersBuilder::new()
            .set_scheme(SchemeType::Ckks)
            .set_degree(8)
            .set_plaintext_modulus(17)
            .set_moduli_sizes(&[62])
            .build()
            .is_err()); // the approximate scheme rejects a plaintext modulus
    }

    #[test]
    fn chain_links_and_resolution() -> Result<(), Box<dyn Error>> {
        let par = HeParametersBuilder::new()
            .set_scheme(SchemeType::Bgv)
            .set_degree(8)
            .set_plaintext_modulus(17)
            .set_moduli_sizes(&[50, 50, 50])
            .build_arc()?;

        assert_eq!(par.max_level(), 2);
        assert_eq!(par.level_index(par.key_level_id())?, 0);
        assert_eq!(par.level_index(par.first_level_id())?, 1);

        for (i, level) in par.levels().iter().enumerate() {
            assert_eq!(par.level_index(level.id())?, i);
            assert_eq!(level.prev(), i.checked_sub(1));
            assert_eq!(
                level.next(),
                if i + 1 < par.levels().len() {
                    Some(i + 1)
                } else {
                    None
                }
            );
            assert_eq!(level.ctx().moduli().len(), par.moduli().len() - i);
        }
        Ok(())
    }

    #[test]
    fn level_ids_are_scheme_specific() -> Result<(), Box<dyn Error>> {
        let bgv = HeParametersBuilder::new()
            .set_scheme(SchemeType::Bgv)
            .set_degree(8)
            .set_plaintext_modulus(17)
            .set_moduli_sizes(&[50, 50])
            .build_arc()?;
        let bfv = HeParametersBuilder::new()
            .set_scheme(SchemeType::Bfv)
            .set_degree(8)
            .set_plaintext_modulus(17)
            .set_moduli_sizes(&[50, 50])
            .build_arc()?;

        assert_eq!(bgv.moduli(), bfv.moduli());
        assert_ne!(bgv.key_level_id(), bfv.key_level_id());
        assert!(bgv.level_index(bfv.key_level_id()).is_err());
        Ok(())
    }

    #[test]
    fn single_modulus_chain() -> Result<(), Box<dyn Error>> {
        let par = HeParametersBuilder::new()
            .set_scheme(SchemeType::Bfv)
            .set_degree(8)
            .set_plaintext_modulus(1153)
            .set_moduli_sizes(&[62])
            .build_arc()?;
        assert_eq!(par.max_level(), 0);
        assert_eq!(par.key_level_id(), par.first_level_id());
        Ok(())
    }

    #[test]
    fn generated_moduli_are_distinct() -> Result<(), Box<dyn Error>> {
        let par = HeParametersBuilder::new()
            .set_scheme(SchemeType::Bfv)
            .set_degree(8)
            .set_plaintext_modulus(1153)
            .set_moduli_sizes(&[50, 50, 50])
            .build_arc()?;
        let mut moduli = par.moduli().to_vec();
        moduli.dedup();
        assert_eq!(moduli.len(), 3);
        Ok(())
    }
}
