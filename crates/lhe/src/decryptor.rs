//! Reference decryptor for the leveled encryption schemes.

use crate::{Ciphertext, Error, HeParameters, Plaintext, Result, SchemeType, SecretKey};
use itertools::Itertools;
use lhe_math::rq::Representation;
use lhe_traits::{FheDecrypter, FheEncoder, FheParametrized};
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use std::sync::Arc;
use zeroize::Zeroizing;

/// Decrypts ciphertexts with the secret key.
#[derive(Debug)]
pub struct Decryptor {
    par: Arc<HeParameters>,
    sk: SecretKey,
}

impl Decryptor {
    /// Creates a decryptor from a secret key.
    pub fn new(par: &Arc<HeParameters>, sk: SecretKey) -> Result<Self> {
        sk.validate(par)?;
        Ok(Self {
            par: par.clone(),
            sk,
        })
    }
}

impl FheParametrized for Decryptor {
    type Parameters = HeParameters;
}

impl FheDecrypter<Plaintext, Ciphertext> for Decryptor {
    type Error = Error;

    fn try_decrypt(&self, ct: &Ciphertext) -> Result<Plaintext> {
        if ct.par != self.par {
            return Err(Error::precondition(
                "The ciphertext does not match the parameters",
            ));
        }
        let idx = self.par.level_index(&ct.level)?;
        let ctx = self.par.levels()[idx].ctx().clone();
        let s = self.sk.to_poly(&ctx)?;

        // Accumulate c_0 + c_1 * s + c_2 * s^2 + ... in evaluation form.
        let mut c = Zeroizing::new(ct.c[0].clone());
        c.change_representation(Representation::Ntt);
        let mut si = s.clone();
        for i in 1..ct.c.len() {
            let mut cis = Zeroizing::new(ct.c[i].clone());
            cis.change_representation(Representation::Ntt);
            *cis.as_mut() *= si.as_ref();
            *c.as_mut() += cis.as_ref();
            *si.as_mut() *= s.as_ref();
        }

        match self.par.scheme() {
            SchemeType::Bfv => {
                c.change_representation(Representation::PowerBasis);
                let q = ctx.modulus();
                let half_q = q >> 1u32;
                let t = self.par.plaintext();
                let values = Vec::<BigUint>::from(c.as_ref())
                    .iter()
                    .map(|x| {
                        // m = round(t * x / q) mod t
                        (((x * t + &half_q) / q) % t).to_u64().unwrap()
                    })
                    .collect_vec();
                Plaintext::try_encode(values.as_slice(), &self.par)
            }
            SchemeType::Ckks => Plaintext::new_evaluation(
                c.as_ref().clone(),
                &ct.level,
                ct.scale,
                &self.par,
            ),
            SchemeType::Bgv => {
                c.change_representation(Representation::PowerBasis);
                let q = ctx.modulus();
                let t_op = self.par.plaintext_op()?;
                let t = t_op.modulus();
                let inv_correction =
                    t_op.inv(t_op.reduce(ct.correction_factor)).ok_or_else(|| {
                        Error::precondition("The correction factor is not invertible")
                    })?;
                let values = Vec::<BigUint>::from(c.as_ref())
                    .iter()
                    .map(|x| {
                        // Centered reduction modulo q, then modulo t.
                        let m = if &(x << 1u32) >= q {
                            (x + (BigUint::from(t) - (q % t))) % t
                        } else {
                            x % t
                        }
                        .to_u64()
                        .unwrap();
                        t_op.mul(m, inv_correction)
                    })
                    .collect_vec();
                Plaintext::try_encode(values.as_slice(), &self.par)
            }
            SchemeType::None => Err(Error::configuration("Unsupported scheme")),
        }
    }
}
