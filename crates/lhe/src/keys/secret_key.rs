//! Secret keys for the leveled encryption schemes.

use crate::{Error, HeParameters, Result};
use lhe_math::rq::{traits::TryConvertFrom, Context, Poly, Representation};
use lhe_util::sample_vec_cbd_f32;
use rand::{CryptoRng, RngCore};
use std::sync::Arc;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Secret key for the leveled encryption schemes.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SecretKey {
    /// The encryption parameters.
    pub(crate) par: Arc<HeParameters>,
    /// The secret key coefficients.
    pub(crate) coeffs: Box<[i64]>,
}

impl Zeroize for SecretKey {
    fn zeroize(&mut self) {
        self.coeffs.zeroize();
    }
}

impl ZeroizeOnDrop for SecretKey {}

impl SecretKey {
    /// The variance used for secret key sampling.
    pub const SK_VARIANCE: f32 = 0.5;

    /// Generate a random [`SecretKey`].
    pub fn random<R: RngCore + CryptoRng>(par: &Arc<HeParameters>, rng: &mut R) -> Self {
        let s_coefficients = sample_vec_cbd_f32(par.degree(), Self::SK_VARIANCE, rng).unwrap();
        Self::new(s_coefficients, par)
    }

    /// Generate a [`SecretKey`] from its coefficients.
    pub fn new(coeffs: Vec<i64>, par: &Arc<HeParameters>) -> Self {
        Self {
            par: par.clone(),
            coeffs: coeffs.into_boxed_slice(),
        }
    }

    /// Convert the secret key into an evaluation-form ring element over the
    /// moduli of the given context.
    pub(crate) fn to_poly(&self, ctx: &Arc<Context>) -> Result<Zeroizing<Poly>> {
        let mut s = Zeroizing::new(
            Poly::try_convert_from(self.coeffs.as_ref(), ctx, Representation::PowerBasis)
                .map_err(Error::Math)?,
        );
        s.change_representation(Representation::Ntt);
        Ok(s)
    }

    /// Validate that the secret key is structurally compatible with the
    /// given parameters.
    pub(crate) fn validate(&self, par: &Arc<HeParameters>) -> Result<()> {
        if self.par != *par || self.coeffs.len() != par.degree() {
            return Err(Error::precondition(
                "The secret key does not match the parameters",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SecretKey;
    use crate::{HeParametersBuilder, SchemeType};
    use rand::thread_rng;
    use std::error::Error;

    #[test]
    fn keygen() -> Result<(), Box<dyn Error>> {
        let mut rng = thread_rng();
        let par = HeParametersBuilder::new()
            .set_scheme(SchemeType::Bfv)
            .set_degree(8)
            .set_plaintext_modulus(1153)
            .set_moduli_sizes(&[62])
            .build_arc()?;
        let sk = SecretKey::random(&par, &mut rng);
        assert_eq!(sk.par, par);
        assert_eq!(sk.coeffs.len(), 8);

        // The coefficients are ternary for the secret key variance.
        sk.coeffs.iter().for_each(|ci| assert!(ci.abs() <= 1));
        Ok(())
    }

    #[test]
    fn to_poly_roundtrip() -> Result<(), Box<dyn Error>> {
        let mut rng = thread_rng();
        let par = HeParametersBuilder::new()
            .set_scheme(SchemeType::Bfv)
            .set_degree(8)
            .set_plaintext_modulus(1153)
            .set_moduli_sizes(&[62, 62])
            .build_arc()?;
        let sk = SecretKey::random(&par, &mut rng);

        for level in par.levels() {
            let s = sk.to_poly(level.ctx())?;
            assert_eq!(s.ctx(), level.ctx());
        }
        Ok(())
    }
}
