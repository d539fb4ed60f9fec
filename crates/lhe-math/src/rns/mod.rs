//! Residue number system operations, based on the CRT decomposition of a
//! product of word-sized coprime moduli.

use crate::{zq::Modulus, Error, Result};
use itertools::izip;
use num_bigint::BigUint;
use num_traits::ToPrimitive;

/// Context for residue number system operations: converts between the RNS
/// representation over coprime moduli `q_i` and integers modulo the product
/// `q = q_1 * ... * q_k`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RnsContext {
    moduli: Box<[Modulus]>,
    product: BigUint,
    /// `q / q_i`
    q_star: Box<[BigUint]>,
    /// `(q / q_i)^(-1) mod q_i` (Garner constants)
    q_tilde: Box<[u64]>,
}

impl RnsContext {
    /// Create an RNS context from a list of pairwise coprime moduli.
    pub fn new(moduli: &[u64]) -> Result<Self> {
        if moduli.is_empty() {
            return Err(Error::Default(
                "The list of moduli is empty".to_string(),
            ));
        }

        let mut q = Vec::with_capacity(moduli.len());
        let mut product = BigUint::from(1u64);
        for m in moduli {
            q.push(Modulus::new(*m)?);
            product *= *m;
        }

        let mut q_star = Vec::with_capacity(moduli.len());
        let mut q_tilde = Vec::with_capacity(moduli.len());
        for (m, qi) in izip!(moduli, &q) {
            let star = &product / *m;
            let star_mod_qi = (&star % *m).to_u64().unwrap();
            let tilde = qi.inv(star_mod_qi).ok_or_else(|| {
                Error::Default("The moduli are not pairwise coprime".to_string())
            })?;
            q_star.push(star);
            q_tilde.push(tilde);
        }

        Ok(Self {
            moduli: q.into_boxed_slice(),
            product,
            q_star: q_star.into_boxed_slice(),
            q_tilde: q_tilde.into_boxed_slice(),
        })
    }

    /// Returns the product of the moduli.
    pub fn modulus(&self) -> &BigUint {
        &self.product
    }

    /// Lift RNS residues to the corresponding integer in `[0, q)`.
    pub fn lift(&self, residues: &[u64]) -> BigUint {
        debug_assert_eq!(residues.len(), self.moduli.len());

        let mut out = BigUint::from(0u64);
        for (ri, qi, star, tilde) in izip!(residues, self.moduli.iter(), self.q_star.iter(), self.q_tilde.iter()) {
            out += star * qi.mul(*ri, *tilde);
        }
        out % &self.product
    }

    /// Project an integer to its RNS residues.
    pub fn project(&self, value: &BigUint) -> Vec<u64> {
        self.moduli
            .iter()
            .map(|qi| (value % qi.modulus()).to_u64().unwrap())
            .collect()
    }
}
