//! Ciphertext construction: encryptions of zero at any level of the modulus
//! chain, scheme-specific plaintext injection, and a batched symmetric fast
//! path.

use crate::{
    kernel, Ciphertext, Error, HeParameters, LevelId, Plaintext, PublicKey, Result, SchemeType,
    SecretKey,
};
use lhe_math::rq::{traits::TryConvertFrom, Context, Poly, Representation};
use lhe_traits::{FheEncrypter, FheParametrized};
use lhe_util::sample_vec_cbd;
use ndarray::Array2;
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use rand::{CryptoRng, Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use zeroize::Zeroizing;

/// Selects which key material an encryption uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Asymmetric encryption with the public key.
    Public,
    /// Symmetric encryption with the secret key.
    Secret,
}

/// Pool of deterministic random state backing the symmetric paths, sized to
/// the ring degree.
#[derive(Debug)]
struct NoisePool {
    rng: ChaCha8Rng,
    degree: usize,
}

/// Constructs ciphertexts at any level of the modulus chain, from a public
/// or a secret key.
///
/// The encryptor owns its random-state pool for symmetric encryption; key
/// material is read-only and shared.
#[derive(Debug)]
pub struct Encryptor {
    par: Arc<HeParameters>,
    pk: Option<PublicKey>,
    sk: Option<SecretKey>,
    pool: Option<NoisePool>,
}

impl Encryptor {
    /// Creates an encryptor with no key material set.
    pub fn new(par: &Arc<HeParameters>) -> Self {
        Self {
            par: par.clone(),
            pk: None,
            sk: None,
            pool: None,
        }
    }

    /// Creates an encryptor for asymmetric encryption.
    pub fn with_public_key(par: &Arc<HeParameters>, pk: PublicKey) -> Result<Self> {
        let mut enc = Self::new(par);
        enc.set_public_key(pk)?;
        Ok(enc)
    }

    /// Creates an encryptor for symmetric encryption. The random-state pool
    /// still needs to be prepared with [`Encryptor::prepare_noise_pool`].
    pub fn with_secret_key(par: &Arc<HeParameters>, sk: SecretKey) -> Result<Self> {
        let mut enc = Self::new(par);
        enc.set_secret_key(sk)?;
        Ok(enc)
    }

    /// Sets the public key, validating its structural compatibility.
    pub fn set_public_key(&mut self, pk: PublicKey) -> Result<()> {
        pk.validate(&self.par)?;
        self.pk = Some(pk);
        Ok(())
    }

    /// Sets the secret key, validating its structural compatibility.
    pub fn set_secret_key(&mut self, sk: SecretKey) -> Result<()> {
        sk.validate(&self.par)?;
        self.sk = Some(sk);
        Ok(())
    }

    /// Prepares the random-state pool used by the symmetric paths, sized to
    /// the ring degree. Must be called before any symmetric encryption.
    pub fn prepare_noise_pool<R: RngCore + CryptoRng>(&mut self, rng: &mut R) {
        let mut seed = <ChaCha8Rng as SeedableRng>::Seed::default();
        rng.fill(&mut seed);
        self.pool = Some(NoisePool {
            rng: ChaCha8Rng::from_seed(seed),
            degree: self.par.degree(),
        });
    }

    fn checked_scheme(&self) -> Result<SchemeType> {
        match self.par.scheme() {
            SchemeType::None => Err(Error::configuration("Unsupported scheme")),
            scheme => Ok(scheme),
        }
    }

    fn public_key(&self) -> Result<&PublicKey> {
        self.pk
            .as_ref()
            .ok_or_else(|| Error::precondition("The public key is not set"))
    }

    fn secret_key(&self) -> Result<&SecretKey> {
        self.sk
            .as_ref()
            .ok_or_else(|| Error::precondition("The secret key is not set"))
    }

    /// Sample a fresh error ring element, scaled by the message modulus for
    /// the message-modulus-preserving scheme.
    fn error_poly<R: RngCore + CryptoRng>(
        &self,
        ctx: &Arc<Context>,
        representation: Representation,
        rng: &mut R,
    ) -> Result<Poly> {
        let mut e =
            Poly::small(ctx, representation, self.par.variance(), rng).map_err(Error::Math)?;
        if self.par.scheme() == SchemeType::Bgv {
            e.mul_scalar(self.par.plaintext());
        }
        Ok(e)
    }

    fn check_noise_pool(&self) -> Result<()> {
        match &self.pool {
            Some(pool) if pool.degree == self.par.degree() => Ok(()),
            Some(_) => Err(Error::precondition(
                "The random-state pool is not sized to the ring degree",
            )),
            None => Err(Error::precondition(
                "The random-state pool is not prepared",
            )),
        }
    }

    /// Encrypt zero at the given level.
    ///
    /// The ciphertext has two components in the scheme's native
    /// representation. In asymmetric mode, a level below the key level is
    /// reached by generating at its coarser predecessor and applying one
    /// scheme-specific descent step. In symmetric mode the ciphertext is
    /// always generated directly at the target level, and `compact` stores
    /// the seed of the mask component instead of requiring its transmission.
    pub fn try_encrypt_zero<R: RngCore + CryptoRng>(
        &mut self,
        level: &LevelId,
        kind: KeyKind,
        compact: bool,
        rng: &mut R,
    ) -> Result<Ciphertext> {
        self.checked_scheme()?;
        let idx = self.par.level_index(level)?;
        match kind {
            KeyKind::Public => {
                if compact {
                    return Err(Error::precondition(
                        "Compact storage requires the secret key",
                    ));
                }
                self.public_key()?;
                if let Some(prev) = self.par.levels()[idx].prev() {
                    let mut ct = self.encrypt_zero_asymmetric_at(prev, rng)?;
                    let scale = ct.scale;
                    let correction_factor = ct.correction_factor;
                    ct.mod_switch_to_next_level()?;
                    // A fresh encryption of zero carries no scaled payload,
                    // so the descent step consumes neither the scale nor the
                    // tracked correction.
                    ct.scale = scale;
                    ct.correction_factor = correction_factor;
                    Ok(ct)
                } else {
                    self.encrypt_zero_asymmetric_at(idx, rng)
                }
            }
            KeyKind::Secret => self.encrypt_zero_symmetric_at(idx, compact, rng),
        }
    }

    /// Direct asymmetric encryption of zero at the level of index `idx`.
    fn encrypt_zero_asymmetric_at<R: RngCore + CryptoRng>(
        &self,
        idx: usize,
        rng: &mut R,
    ) -> Result<Ciphertext> {
        let pk = self.public_key()?;
        let level = &self.par.levels()[idx];
        let ctx = level.ctx().clone();
        let id = *level.id();
        let native = self.par.native_representation();

        let u = Zeroizing::new(
            Poly::small(&ctx, Representation::Ntt, self.par.variance(), rng)
                .map_err(Error::Math)?,
        );
        let p0 = pk.c.c[0].restrict(&ctx).map_err(Error::Math)?;
        let p1 = pk.c.c[1].restrict(&ctx).map_err(Error::Math)?;

        let mut c0 = u.as_ref() * &p0;
        let mut c1 = u.as_ref() * &p1;
        if native == Representation::PowerBasis {
            c0.change_representation(Representation::PowerBasis);
            c1.change_representation(Representation::PowerBasis);
        }

        let e0 = Zeroizing::new(self.error_poly(&ctx, native.clone(), rng)?);
        let e1 = Zeroizing::new(self.error_poly(&ctx, native, rng)?);
        c0 += e0.as_ref();
        c1 += e1.as_ref();

        Ciphertext::new(vec![c0, c1], &id, &self.par)
    }

    /// Direct symmetric encryption of zero at the level of index `idx`.
    fn encrypt_zero_symmetric_at<R: RngCore + CryptoRng>(
        &mut self,
        idx: usize,
        compact: bool,
        rng: &mut R,
    ) -> Result<Ciphertext> {
        self.secret_key()?;
        self.check_noise_pool()?;

        let level = &self.par.levels()[idx];
        let ctx = level.ctx().clone();
        let id = *level.id();
        let native = self.par.native_representation();

        let mut seed = <ChaCha8Rng as SeedableRng>::Seed::default();
        rng.fill(&mut seed);

        let s = self.sk.as_ref().unwrap().to_poly(&ctx)?;
        let mut a = Poly::random_from_seed(&ctx, Representation::Ntt, seed);
        let a_s = Zeroizing::new(&a * s.as_ref());

        let pool = self.pool.as_mut().unwrap();
        let e = Zeroizing::new(sample_vec_cbd(
            pool.degree,
            self.par.variance(),
            &mut pool.rng,
        )?);
        let mut b = Poly::try_convert_from(e.as_slice(), &ctx, Representation::Ntt)
            .map_err(Error::Math)?;
        if self.par.scheme() == SchemeType::Bgv {
            // The message-modulus-preserving scheme carries its noise as a
            // multiple of the message modulus.
            b.mul_scalar(self.par.plaintext());
        }
        b -= a_s.as_ref();

        if native == Representation::PowerBasis {
            b.change_representation(Representation::PowerBasis);
            a.change_representation(Representation::PowerBasis);
        }

        let mut ct = Ciphertext::new(vec![b, a], &id, &self.par)?;
        if compact {
            ct.seed = Some(seed);
        }
        Ok(ct)
    }

    /// Encrypt a plaintext with the selected key kind, by encrypting zero
    /// and injecting the plaintext into the leading component.
    pub fn try_encrypt<R: RngCore + CryptoRng>(
        &mut self,
        pt: &Plaintext,
        kind: KeyKind,
        compact: bool,
        rng: &mut R,
    ) -> Result<Ciphertext> {
        let scheme = self.checked_scheme()?;
        match kind {
            KeyKind::Public => {
                self.public_key()?;
            }
            KeyKind::Secret => {
                self.secret_key()?;
                self.check_noise_pool()?;
            }
        }
        if pt.par != self.par {
            return Err(Error::precondition(
                "The plaintext does not match the parameters",
            ));
        }

        match scheme {
            SchemeType::Bfv => {
                let coeffs = pt.coefficients().ok_or_else(|| {
                    Error::precondition("The scheme requires a coefficient-form plaintext")
                })?;
                let first = *self.par.first_level_id();
                let mut ct = self.try_encrypt_zero(&first, kind, compact, rng)?;
                let inj = self.scaled_plaintext(coeffs)?;
                ct.c[0] += &inj;
                Ok(ct)
            }
            SchemeType::Ckks => {
                let poly = pt.poly().ok_or_else(|| {
                    Error::precondition("The scheme requires an evaluation-form plaintext")
                })?;
                let level = *pt.level().ok_or_else(|| {
                    Error::precondition("The plaintext is not associated with a level")
                })?;
                self.par.level_index(&level)?;
                let mut ct = self.try_encrypt_zero(&level, kind, compact, rng)?;
                ct.c[0] += poly;
                ct.scale = pt.scale;
                Ok(ct)
            }
            SchemeType::Bgv => {
                let coeffs = pt.coefficients().ok_or_else(|| {
                    Error::precondition("The scheme requires a coefficient-form plaintext")
                })?;
                let first = *self.par.first_level_id();
                let first_ctx = self.par.level_data(&first)?.ctx().clone();
                let mut ct = self.try_encrypt_zero(&first, kind, compact, rng)?;
                let mut lifted = self.lift_plaintext(coeffs, &first_ctx)?;
                lifted.change_representation(Representation::Ntt);
                ct.c[0] += &lifted;
                Ok(ct)
            }
            SchemeType::None => unreachable!("checked above"),
        }
    }

    /// The scale-rounding injection: the plaintext scaled by the rounded
    /// ratio of the ciphertext modulus to the message modulus, as a
    /// coefficient-form ring element at the first level.
    fn scaled_plaintext(&self, coeffs: &[u64]) -> Result<Poly> {
        let t = self.par.plaintext_op()?.modulus();
        let q_mod_t = self.par.q_mod_t();
        let threshold = self.par.upper_half_threshold();
        let ctx = self
            .par
            .level_data(self.par.first_level_id())?
            .ctx()
            .clone();
        let delta = self.par.delta();

        let mut rows = Array2::<u64>::zeros((ctx.moduli().len(), self.par.degree()));
        for (i, m) in coeffs.iter().enumerate() {
            // round(m * q / t) = m * floor(q / t) + fix, with the division
            // rounding up from the half-open upper half of [0, t).
            let fix = ((*m as u128 * q_mod_t as u128 + threshold as u128) / t as u128) as u64;
            for (j, qj) in ctx.moduli_operators().iter().enumerate() {
                rows[[j, i]] = qj.add(qj.mul(qj.reduce(*m), delta[j]), qj.reduce(fix));
            }
        }
        Poly::try_from_residues(&ctx, Representation::PowerBasis, rows).map_err(Error::Math)
    }

    /// The congruence-preserving lift: coefficients in the upper half of the
    /// message range are raised to their centered representatives modulo
    /// each ring modulus.
    fn lift_plaintext(&self, coeffs: &[u64], ctx: &Arc<Context>) -> Result<Poly> {
        let threshold = self.par.upper_half_threshold();
        let rows = if let Some(increments) = self.par.fast_lift_increment() {
            lift_fast(coeffs, threshold, increments, ctx)
        } else {
            let increment = self.par.lift_increment().ok_or_else(|| {
                Error::configuration("The scheme has no plaintext modulus")
            })?;
            lift_generic(coeffs, threshold, increment, ctx)
        };
        Poly::try_from_residues(ctx, Representation::PowerBasis, rows).map_err(Error::Math)
    }

    /// Sample the mask component of the fast symmetric path: a 1-component,
    /// evaluation-form shell holding a uniformly random ring element at the
    /// first level. With `compact`, the mask is derived from a sampled seed
    /// and the seed is stored for transmission in its place.
    pub fn sample_symmetric_mask<R: RngCore + CryptoRng>(
        &self,
        compact: bool,
        rng: &mut R,
    ) -> Result<Ciphertext> {
        if self.par.scheme() != SchemeType::Ckks {
            return Err(Error::configuration(
                "The fast path is specific to the evaluation-form-native approximate scheme",
            ));
        }
        let first = *self.par.first_level_id();
        let ctx = self.par.level_data(&first)?.ctx().clone();

        let mut seed = <ChaCha8Rng as SeedableRng>::Seed::default();
        rng.fill(&mut seed);
        let a = Poly::random_from_seed(&ctx, Representation::Ntt, seed);

        let mut ct = Ciphertext::new(vec![a], &first, &self.par)?;
        if compact {
            ct.seed = Some(seed);
        }
        Ok(ct)
    }

    /// Fused symmetric encryption against a previously sampled mask.
    ///
    /// For every modulus residue independently, fresh centered-binomial
    /// noise is derived, transformed into evaluation form, and the leading
    /// component is computed as `-(secret * mask) + noise + plaintext` as a
    /// batch of data-parallel per-element updates. The plaintext's scale is
    /// copied onto the result.
    pub fn try_encrypt_symmetric_fast(
        &mut self,
        pt: &Plaintext,
        mask: &Ciphertext,
    ) -> Result<Ciphertext> {
        self.check_fast_path(pt, mask)?;
        let pool = self.pool.as_mut().unwrap();
        let mut noise_seed = <ChaCha8Rng as SeedableRng>::Seed::default();
        pool.rng.fill(&mut noise_seed);
        self.encrypt_symmetric_fast_with_seed(pt, mask, noise_seed)
    }

    fn check_fast_path(&self, pt: &Plaintext, mask: &Ciphertext) -> Result<()> {
        if self.par.scheme() != SchemeType::Ckks {
            return Err(Error::configuration(
                "The fast path is specific to the evaluation-form-native approximate scheme",
            ));
        }
        self.secret_key()?;
        self.check_noise_pool()?;
        if pt.par != self.par {
            return Err(Error::precondition(
                "The plaintext does not match the parameters",
            ));
        }
        if pt.poly().is_none() {
            return Err(Error::precondition(
                "The scheme requires an evaluation-form plaintext",
            ));
        }
        let level = pt
            .level()
            .ok_or_else(|| Error::precondition("The plaintext is not associated with a level"))?;
        self.par.level_index(level)?;
        if mask.par != self.par || mask.c.len() != 1 || !mask.is_ntt || &mask.level != level {
            return Err(Error::precondition(
                "The mask is not a 1-component evaluation-form shell at the plaintext's level",
            ));
        }
        Ok(())
    }

    /// The fused computation, with the noise derivation seed fixed by the
    /// caller. Each residue re-derives the same centered-binomial
    /// coefficients from the seed, so the noise is a well-formed ring
    /// element while every residue's batch stays independent.
    pub(crate) fn encrypt_symmetric_fast_with_seed(
        &self,
        pt: &Plaintext,
        mask: &Ciphertext,
        noise_seed: <ChaCha8Rng as SeedableRng>::Seed,
    ) -> Result<Ciphertext> {
        self.check_fast_path(pt, mask)?;

        let level = *pt.level().unwrap();
        let ctx = self.par.level_data(&level)?.ctx().clone();
        let degree = self.par.degree();
        let pt_poly = pt.poly().unwrap();
        let s = self.sk.as_ref().unwrap().to_poly(&ctx)?;

        let mut rows = Array2::<u64>::zeros((ctx.moduli().len(), degree));
        for (j, (qj, op)) in ctx
            .moduli_operators()
            .iter()
            .zip(ctx.ops.iter())
            .enumerate()
        {
            let mut noise_rng = ChaCha8Rng::from_seed(noise_seed);
            let e = Zeroizing::new(sample_vec_cbd(
                degree,
                self.par.variance(),
                &mut noise_rng,
            )?);
            let mut noise_row = qj.reduce_vec_i64(&e);
            op.forward(&mut noise_row);

            let s_row = s.coefficients().row(j);
            let mask_row = mask.c[0].coefficients().row(j);
            let pt_row = pt_poly.coefficients().row(j);

            let mut out = vec![0u64; degree];
            kernel::for_each(&mut out, |i, x| {
                *x = qj.add(
                    qj.add(qj.neg(qj.mul(s_row[i], mask_row[i])), noise_row[i]),
                    pt_row[i],
                );
            });
            rows.row_mut(j)
                .as_slice_mut()
                .unwrap()
                .copy_from_slice(&out);
        }

        let c0 = Poly::try_from_residues(&ctx, Representation::Ntt, rows).map_err(Error::Math)?;
        let mut ct = Ciphertext::new(vec![c0, mask.c[0].clone()], &level, &self.par)?;
        ct.scale = pt.scale;
        ct.seed = mask.seed;
        Ok(ct)
    }
}

impl FheParametrized for Encryptor {
    type Parameters = HeParameters;
}

/// Lift with the per-residue precomputed increment; valid when every ring
/// modulus exceeds the message modulus.
pub(crate) fn lift_fast(
    coeffs: &[u64],
    threshold: u64,
    increments: &[u64],
    ctx: &Arc<Context>,
) -> Array2<u64> {
    let mut rows = Array2::<u64>::zeros((ctx.moduli().len(), ctx.degree));
    for (i, m) in coeffs.iter().enumerate() {
        for (j, inc) in increments.iter().enumerate() {
            rows[[j, i]] = if *m >= threshold { *m + *inc } else { *m };
        }
    }
    rows
}

/// Lift by decomposing the full-precision addition of `q - t` into residues
/// generically.
pub(crate) fn lift_generic(
    coeffs: &[u64],
    threshold: u64,
    increment: &BigUint,
    ctx: &Arc<Context>,
) -> Array2<u64> {
    let mut rows = Array2::<u64>::zeros((ctx.moduli().len(), ctx.degree));
    for (i, m) in coeffs.iter().enumerate() {
        if *m >= threshold {
            let lifted = increment + *m;
            for (j, qi) in ctx.moduli().iter().enumerate() {
                rows[[j, i]] = (&lifted % *qi).to_u64().unwrap();
            }
        } else {
            for (j, qj) in ctx.moduli_operators().iter().enumerate() {
                rows[[j, i]] = qj.reduce(*m);
            }
        }
    }
    rows
}

impl FheParametrized for PublicKey {
    type Parameters = HeParameters;
}

impl FheParametrized for SecretKey {
    type Parameters = HeParameters;
}

impl FheEncrypter<Plaintext, Ciphertext> for PublicKey {
    type Error = Error;

    fn try_encrypt<R: RngCore + CryptoRng>(
        &self,
        pt: &Plaintext,
        rng: &mut R,
    ) -> Result<Ciphertext> {
        let mut enc = Encryptor::with_public_key(&self.par, self.clone())?;
        enc.try_encrypt(pt, KeyKind::Public, false, rng)
    }
}

impl FheEncrypter<Plaintext, Ciphertext> for SecretKey {
    type Error = Error;

    fn try_encrypt<R: RngCore + CryptoRng>(
        &self,
        pt: &Plaintext,
        rng: &mut R,
    ) -> Result<Ciphertext> {
        let mut enc = Encryptor::with_secret_key(&self.par, self.clone())?;
        enc.prepare_noise_pool(rng);
        enc.try_encrypt(pt, KeyKind::Secret, false, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::{lift_fast, lift_generic, Encryptor, KeyKind};
    use crate::{
        Error, HeParameters, HeParametersBuilder, Plaintext, PublicKey, SchemeType, SecretKey,
    };
    use lhe_math::rq::{traits::TryConvertFrom, Poly, Representation};
    use lhe_traits::FheEncoder;
    use lhe_util::sample_vec_cbd;
    use rand::{thread_rng, CryptoRng, Rng, RngCore, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use std::error::Error as StdError;
    use std::sync::Arc;

    fn params(scheme: SchemeType, n_moduli: usize) -> Arc<HeParameters> {
        let builder = HeParametersBuilder::new()
            .set_scheme(scheme)
            .set_degree(8)
            .set_moduli_sizes(&vec![50usize; n_moduli]);
        match scheme {
            SchemeType::Ckks => builder.build_arc().unwrap(),
            _ => builder.set_plaintext_modulus(17).build_arc().unwrap(),
        }
    }

    fn keyed<R: RngCore + CryptoRng>(par: &Arc<HeParameters>, rng: &mut R) -> Encryptor {
        let sk = SecretKey::random(par, rng);
        let pk = PublicKey::new(&sk, rng).unwrap();
        let mut enc = Encryptor::new(par);
        enc.set_public_key(pk).unwrap();
        enc.set_secret_key(sk).unwrap();
        enc.prepare_noise_pool(rng);
        enc
    }

    fn ckks_plaintext<R: RngCore + CryptoRng>(
        par: &Arc<HeParameters>,
        scale: f64,
        rng: &mut R,
    ) -> Plaintext {
        let level = *par.first_level_id();
        let ctx = par.level_data(&level).unwrap().ctx().clone();
        let poly = Poly::random(&ctx, Representation::Ntt, rng);
        Plaintext::new_evaluation(poly, &level, scale, par).unwrap()
    }

    #[test]
    fn zero_encryption_native_forms() -> Result<(), Box<dyn StdError>> {
        let mut rng = thread_rng();
        for (scheme, evaluation_form) in [
            (SchemeType::Bfv, false),
            (SchemeType::Ckks, true),
            (SchemeType::Bgv, true),
        ] {
            let par = params(scheme, 3);
            let mut enc = keyed(&par, &mut rng);
            for kind in [KeyKind::Public, KeyKind::Secret] {
                let ct = enc.try_encrypt_zero(par.first_level_id(), kind, false, &mut rng)?;
                assert_eq!(ct.c.len(), 2);
                assert_eq!(ct.is_evaluation_form(), evaluation_form);
                assert_eq!(ct.level(), par.first_level_id());
                assert_eq!(ct.scale(), 1.0);
                assert_eq!(ct.correction_factor(), 1);
                assert!(ct.seed().is_none());
            }
        }
        Ok(())
    }

    #[test]
    fn compact_storage_stores_the_mask_seed() -> Result<(), Box<dyn StdError>> {
        let mut rng = thread_rng();
        let par = params(SchemeType::Ckks, 2);
        let mut enc = keyed(&par, &mut rng);

        let ct = enc.try_encrypt_zero(par.first_level_id(), KeyKind::Secret, true, &mut rng)?;
        let seed = *ct.seed().expect("compact ciphertext must carry its seed");
        let ctx = par.level_data(par.first_level_id())?.ctx().clone();
        let regenerated = Poly::random_from_seed(&ctx, Representation::Ntt, seed);
        assert_eq!(&ct.c[1], &regenerated);

        let ct = enc.try_encrypt_zero(par.first_level_id(), KeyKind::Secret, false, &mut rng)?;
        assert!(ct.seed().is_none());
        Ok(())
    }

    #[test]
    fn compact_storage_requires_the_secret_key() {
        let mut rng = thread_rng();
        let par = params(SchemeType::Ckks, 2);
        let mut enc = keyed(&par, &mut rng);
        assert!(matches!(
            enc.try_encrypt_zero(par.first_level_id(), KeyKind::Public, true, &mut rng),
            Err(Error::Precondition(_))
        ));
    }

    #[test]
    fn unresolved_level_is_a_configuration_error() {
        let mut rng = thread_rng();
        let par = params(SchemeType::Bfv, 2);
        let other = params(SchemeType::Bgv, 2);
        let mut enc = keyed(&par, &mut rng);
        assert!(matches!(
            enc.try_encrypt_zero(other.first_level_id(), KeyKind::Public, false, &mut rng),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn missing_key_material_is_a_precondition_error() {
        let mut rng = thread_rng();
        let par = params(SchemeType::Bfv, 2);
        let mut enc = Encryptor::new(&par);
        assert!(matches!(
            enc.try_encrypt_zero(par.first_level_id(), KeyKind::Public, false, &mut rng),
            Err(Error::Precondition(_))
        ));
        assert!(matches!(
            enc.try_encrypt_zero(par.first_level_id(), KeyKind::Secret, false, &mut rng),
            Err(Error::Precondition(_))
        ));
    }

    #[test]
    fn symmetric_requires_a_prepared_pool() -> Result<(), Box<dyn StdError>> {
        let mut rng = thread_rng();
        let par = params(SchemeType::Bfv, 2);
        let sk = SecretKey::random(&par, &mut rng);
        let mut enc = Encryptor::with_secret_key(&par, sk)?;

        assert!(matches!(
            enc.try_encrypt_zero(par.first_level_id(), KeyKind::Secret, false, &mut rng),
            Err(Error::Precondition(_))
        ));

        enc.prepare_noise_pool(&mut rng);
        assert!(enc
            .try_encrypt_zero(par.first_level_id(), KeyKind::Secret, false, &mut rng)
            .is_ok());
        Ok(())
    }

    #[test]
    fn representation_form_invariants() -> Result<(), Box<dyn StdError>> {
        let mut rng = thread_rng();

        // The coefficient-form-native and congruence-preserving schemes
        // reject evaluation-form plaintexts.
        for scheme in [SchemeType::Bfv, SchemeType::Bgv] {
            let par = params(scheme, 2);
            let mut enc = keyed(&par, &mut rng);
            let level = *par.first_level_id();
            let ctx = par.level_data(&level)?.ctx().clone();
            let poly = Poly::random(&ctx, Representation::Ntt, &mut rng);
            let pt = Plaintext::new_evaluation(poly, &level, 1.0, &par)?;
            assert!(matches!(
                enc.try_encrypt(&pt, KeyKind::Public, false, &mut rng),
                Err(Error::Precondition(_))
            ));
        }

        // The approximate scheme rejects coefficient-form plaintexts; a
        // coefficient-form plaintext cannot even be encoded for it.
        let par = params(SchemeType::Ckks, 2);
        assert!(matches!(
            Plaintext::try_encode([1u64, 2].as_slice(), &par),
            Err(Error::Precondition(_))
        ));
        Ok(())
    }

    #[test]
    fn upper_half_lift_strategies_agree() -> Result<(), Box<dyn StdError>> {
        let par = params(SchemeType::Bgv, 2);
        let ctx = par.level_data(par.first_level_id())?.ctx().clone();
        let threshold = par.upper_half_threshold();
        assert_eq!(threshold, 9);

        // Boundary coefficients of the message range [0, 17).
        let mut coeffs = vec![0u64; 8];
        coeffs[..4].copy_from_slice(&[0, 8, 9, 16]);

        let fast = lift_fast(
            &coeffs,
            threshold,
            par.fast_lift_increment().unwrap(),
            &ctx,
        );
        let generic = lift_generic(&coeffs, threshold, par.lift_increment().unwrap(), &ctx);
        assert_eq!(fast, generic);

        // Lifted residues differ from the raw coefficient by exactly the
        // centered offset q_i - t.
        for (j, qi) in ctx.moduli().iter().enumerate() {
            assert_eq!(fast[[j, 0]], 0);
            assert_eq!(fast[[j, 1]], 8);
            assert_eq!(fast[[j, 2]], 9 + qi - 17);
            assert_eq!(fast[[j, 3]], 16 + qi - 17);
        }
        Ok(())
    }

    #[test]
    fn mask_is_a_one_component_shell() -> Result<(), Box<dyn StdError>> {
        let mut rng = thread_rng();
        let par = params(SchemeType::Ckks, 2);
        let enc = keyed(&par, &mut rng);

        let mask = enc.sample_symmetric_mask(false, &mut rng)?;
        assert_eq!(mask.c.len(), 1);
        assert!(mask.is_evaluation_form());
        assert_eq!(mask.level(), par.first_level_id());
        assert!(mask.seed().is_none());

        let mask = enc.sample_symmetric_mask(true, &mut rng)?;
        let seed = *mask.seed().expect("compact mask must carry its seed");
        let ctx = par.level_data(par.first_level_id())?.ctx().clone();
        assert_eq!(
            &mask.c[0],
            &Poly::random_from_seed(&ctx, Representation::Ntt, seed)
        );

        // The fast path is specific to the approximate scheme.
        let par = params(SchemeType::Bgv, 2);
        let enc = keyed(&par, &mut rng);
        assert!(matches!(
            enc.sample_symmetric_mask(false, &mut rng),
            Err(Error::Configuration(_))
        ));
        Ok(())
    }

    #[test]
    fn fast_path_matches_sequential_reference() -> Result<(), Box<dyn StdError>> {
        let mut rng = thread_rng();
        let par = params(SchemeType::Ckks, 3);
        let mut enc = keyed(&par, &mut rng);

        let scale = 2f64.powi(30);
        let pt = ckks_plaintext(&par, scale, &mut rng);
        let mask = enc.sample_symmetric_mask(true, &mut rng)?;

        let mut noise_seed = <ChaCha8Rng as SeedableRng>::Seed::default();
        rng.fill(&mut noise_seed);
        let ct = enc.encrypt_symmetric_fast_with_seed(&pt, &mask, noise_seed)?;

        // Reference: the same leading component computed with sequential
        // ring operations, re-deriving the noise from the same seed.
        let level = *pt.level().unwrap();
        let ctx = par.level_data(&level)?.ctx().clone();
        let s = enc.sk.as_ref().unwrap().to_poly(&ctx)?;
        let mut noise_rng = ChaCha8Rng::from_seed(noise_seed);
        let e = sample_vec_cbd(par.degree(), par.variance(), &mut noise_rng)?;
        let e_poly = Poly::try_convert_from(e.as_slice(), &ctx, Representation::Ntt)?;

        let mut expected = -&(&mask.c[0] * s.as_ref());
        expected += &e_poly;
        expected += pt.poly().unwrap();

        assert_eq!(&ct.c[0], &expected);
        assert_eq!(&ct.c[1], &mask.c[0]);
        assert_eq!(ct.scale(), scale);
        assert_eq!(ct.seed(), mask.seed());
        Ok(())
    }

    #[test]
    fn fast_path_preconditions() -> Result<(), Box<dyn StdError>> {
        let mut rng = thread_rng();
        let par = params(SchemeType::Ckks, 2);
        let mut enc = keyed(&par, &mut rng);
        let pt = ckks_plaintext(&par, 2f64.powi(30), &mut rng);
        let mask = enc.sample_symmetric_mask(false, &mut rng)?;

        // No secret key.
        let sk = SecretKey::random(&par, &mut rng);
        let mut pk_only =
            Encryptor::with_public_key(&par, PublicKey::new(&sk, &mut rng)?)?;
        assert!(matches!(
            pk_only.try_encrypt_symmetric_fast(&pt, &mask),
            Err(Error::Precondition(_))
        ));

        // A 2-component ciphertext is not a valid mask.
        let not_a_mask = enc.try_encrypt_zero(par.first_level_id(), KeyKind::Secret, false, &mut rng)?;
        assert!(matches!(
            enc.try_encrypt_symmetric_fast(&pt, &not_a_mask),
            Err(Error::Precondition(_))
        ));

        // The happy path works and propagates the scale.
        let ct = enc.try_encrypt_symmetric_fast(&pt, &mask)?;
        assert_eq!(ct.c.len(), 2);
        assert_eq!(ct.scale(), pt.scale());
        Ok(())
    }

    #[test]
    fn scale_propagation() -> Result<(), Box<dyn StdError>> {
        let mut rng = thread_rng();
        let par = params(SchemeType::Ckks, 2);
        let mut enc = keyed(&par, &mut rng);
        for scale in [1.0, 2f64.powi(20), 2f64.powi(40)] {
            let pt = ckks_plaintext(&par, scale, &mut rng);
            for kind in [KeyKind::Public, KeyKind::Secret] {
                let ct = enc.try_encrypt(&pt, kind, false, &mut rng)?;
                assert_eq!(ct.scale(), scale);
            }
        }
        Ok(())
    }
}
