//! Public keys for the leveled encryption schemes.

use crate::{Ciphertext, Error, HeParameters, Result, SchemeType, SecretKey};
use lhe_math::rq::{Poly, Representation};
use rand::{CryptoRng, RngCore};
use std::sync::Arc;
use zeroize::Zeroizing;

/// Public key for the leveled encryption schemes: a precomputed encryption
/// of zero at the key level, in evaluation form for every scheme.
#[derive(Debug, PartialEq, Clone)]
pub struct PublicKey {
    /// The encryption parameters.
    pub(crate) par: Arc<HeParameters>,
    /// The public key ciphertext.
    pub(crate) c: Ciphertext,
}

impl PublicKey {
    /// Generate a new [`PublicKey`] from a [`SecretKey`].
    pub fn new<R: RngCore + CryptoRng>(sk: &SecretKey, rng: &mut R) -> Result<Self> {
        let par = sk.par.clone();
        let key_id = *par.key_level_id();
        let ctx = par.level_data(&key_id)?.ctx().clone();

        let s = sk.to_poly(&ctx)?;
        let a = Poly::random(&ctx, Representation::Ntt, rng);
        let a_s = Zeroizing::new(&a * s.as_ref());

        let mut b =
            Poly::small(&ctx, Representation::Ntt, par.variance(), rng).map_err(Error::Math)?;
        if par.scheme() == SchemeType::Bgv {
            // The message-modulus-preserving scheme carries its noise as a
            // multiple of the message modulus.
            b.mul_scalar(par.plaintext());
        }
        b -= &a_s;

        let c = Ciphertext::new(vec![b, a], &key_id, &par)?;
        Ok(Self { par, c })
    }

    /// The public key ciphertext.
    pub fn ciphertext(&self) -> &Ciphertext {
        &self.c
    }

    /// Validate that the public key is structurally compatible with the
    /// given parameters.
    pub(crate) fn validate(&self, par: &Arc<HeParameters>) -> Result<()> {
        if self.par != *par
            || self.c.c.len() != 2
            || !self.c.is_ntt
            || &self.c.level != par.key_level_id()
        {
            return Err(Error::precondition(
                "The public key does not match the parameters",
            ));
        }
        Ok(())
    }
}
