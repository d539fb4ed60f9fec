//! Polynomials in the cyclotomic ring `Z_q[x] / (x^degree + 1)`, stored in
//! RNS representation with one row of residues per modulus.

mod context;
mod ops;
mod switcher;
pub mod traits;

pub use context::Context;

use crate::{Error, Result};
use ndarray::Array2;
use num_bigint::BigUint;
use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use traits::TryConvertFrom;
use zeroize::Zeroize;

/// The representation of a polynomial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Representation {
    /// The polynomial is stored by its coefficients.
    PowerBasis,
    /// The polynomial is stored by the images under the number-theoretic
    /// transform; pointwise products correspond to ring products.
    Ntt,
}

/// A polynomial over the cyclotomic ring defined by a [`Context`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poly {
    ctx: Arc<Context>,
    representation: Representation,
    coefficients: Array2<u64>,
}

impl Poly {
    /// Creates a polynomial identically equal to zero.
    pub fn zero(ctx: &Arc<Context>, representation: Representation) -> Self {
        Self {
            ctx: ctx.clone(),
            representation,
            coefficients: Array2::zeros((ctx.moduli.len(), ctx.degree)),
        }
    }

    /// Returns the context of the polynomial.
    pub fn ctx(&self) -> &Arc<Context> {
        &self.ctx
    }

    /// Returns the representation of the polynomial.
    pub fn representation(&self) -> &Representation {
        &self.representation
    }

    /// Returns the underlying residues, one row per modulus.
    pub fn coefficients(&self) -> &Array2<u64> {
        &self.coefficients
    }

    /// Creates a polynomial from already-reduced residues.
    ///
    /// Returns an error if the shape does not match the context, or if a
    /// residue is not reduced against its modulus.
    pub fn try_from_residues(
        ctx: &Arc<Context>,
        representation: Representation,
        coefficients: Array2<u64>,
    ) -> Result<Self> {
        if coefficients.shape() != [ctx.moduli.len(), ctx.degree] {
            return Err(Error::Default(
                "The residue matrix does not match the context".to_string(),
            ));
        }
        for (row, qi) in coefficients.outer_iter().zip(ctx.moduli.iter()) {
            if row.iter().any(|r| r >= qi) {
                return Err(Error::Default(
                    "A residue is not reduced against its modulus".to_string(),
                ));
            }
        }
        Ok(Self {
            ctx: ctx.clone(),
            representation,
            coefficients,
        })
    }

    /// Change the representation of the polynomial in place.
    pub fn change_representation(&mut self, to: Representation) {
        if self.representation == to {
            return;
        }
        match to {
            Representation::Ntt => {
                for (mut row, op) in self
                    .coefficients
                    .outer_iter_mut()
                    .zip(self.ctx.ops.iter())
                {
                    op.forward(row.as_slice_mut().unwrap());
                }
            }
            Representation::PowerBasis => {
                for (mut row, op) in self
                    .coefficients
                    .outer_iter_mut()
                    .zip(self.ctx.ops.iter())
                {
                    op.backward(row.as_slice_mut().unwrap());
                }
            }
        }
        self.representation = to;
    }

    /// Generate a uniformly random polynomial.
    pub fn random<R: RngCore + CryptoRng>(
        ctx: &Arc<Context>,
        representation: Representation,
        rng: &mut R,
    ) -> Self {
        let mut out = Self::zero(ctx, representation);
        for (mut row, qi) in out.coefficients.outer_iter_mut().zip(ctx.q.iter()) {
            row.as_slice_mut()
                .unwrap()
                .copy_from_slice(&qi.random_vec(ctx.degree, rng));
        }
        out
    }

    /// Generate a uniformly random polynomial deterministically from a seed.
    pub fn random_from_seed(
        ctx: &Arc<Context>,
        representation: Representation,
        seed: <ChaCha8Rng as SeedableRng>::Seed,
    ) -> Self {
        let mut rng = ChaCha8Rng::from_seed(seed);
        Self::random(ctx, representation, &mut rng)
    }

    /// Generate a small polynomial with centered-binomial coefficients of the
    /// given variance. Returns an error if the variance is not between 1 and
    /// 16.
    pub fn small<R: RngCore + CryptoRng>(
        ctx: &Arc<Context>,
        representation: Representation,
        variance: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let coeffs = lhe_util::sample_vec_cbd(ctx.degree, variance, rng)?;
        Poly::try_convert_from(coeffs.as_slice(), ctx, representation)
    }

    /// Restrict the polynomial to a context that uses a prefix of this
    /// context's moduli, by dropping the residues of the removed moduli.
    ///
    /// This reduces the polynomial modulo the smaller ciphertext modulus; it
    /// does not rescale the underlying value.
    pub fn restrict(&self, ctx: &Arc<Context>) -> Result<Self> {
        if !self.ctx.starts_with(ctx) {
            return Err(Error::InvalidContext);
        }
        let coefficients = self
            .coefficients
            .slice(ndarray::s![..ctx.moduli.len(), ..])
            .to_owned();
        Ok(Self {
            ctx: ctx.clone(),
            representation: self.representation.clone(),
            coefficients,
        })
    }
}

impl AsRef<Poly> for Poly {
    fn as_ref(&self) -> &Poly {
        self
    }
}

impl AsMut<Poly> for Poly {
    fn as_mut(&mut self) -> &mut Poly {
        self
    }
}

impl Zeroize for Poly {
    fn zeroize(&mut self) {
        if let Some(slice) = self.coefficients.as_slice_mut() {
            slice.zeroize();
        }
    }
}

impl From<&Poly> for Vec<BigUint> {
    /// Lift each coefficient to its CRT representative in `[0, q)`.
    ///
    /// The polynomial must be in power basis for the output to be the
    /// polynomial coefficients.
    fn from(p: &Poly) -> Self {
        debug_assert_eq!(p.representation, Representation::PowerBasis);
        let mut residues = vec![0u64; p.ctx.moduli.len()];
        (0..p.ctx.degree)
            .map(|j| {
                for (ri, row) in residues.iter_mut().zip(p.coefficients.outer_iter()) {
                    *ri = row[j];
                }
                p.ctx.rns.lift(&residues)
            })
            .collect()
    }
}

impl TryConvertFrom<&[i64]> for Poly {
    fn try_convert_from(
        value: &[i64],
        ctx: &Arc<Context>,
        representation: Representation,
    ) -> Result<Self> {
        if value.len() > ctx.degree {
            return Err(Error::Default(
                "More coefficients than the polynomial degree".to_string(),
            ));
        }
        let mut out = Self::zero(ctx, Representation::PowerBasis);
        for (mut row, qi) in out.coefficients.outer_iter_mut().zip(ctx.q.iter()) {
            for (r, v) in row.iter_mut().zip(value.iter()) {
                *r = qi.reduce_i64(*v);
            }
        }
        out.change_representation(representation);
        Ok(out)
    }
}

impl TryConvertFrom<&[u64]> for Poly {
    fn try_convert_from(
        value: &[u64],
        ctx: &Arc<Context>,
        representation: Representation,
    ) -> Result<Self> {
        if value.len() > ctx.degree {
            return Err(Error::Default(
                "More coefficients than the polynomial degree".to_string(),
            ));
        }
        let mut out = Self::zero(ctx, Representation::PowerBasis);
        for (mut row, qi) in out.coefficients.outer_iter_mut().zip(ctx.q.iter()) {
            for (r, v) in row.iter_mut().zip(value.iter()) {
                *r = qi.reduce(*v);
            }
        }
        out.change_representation(representation);
        Ok(out)
    }
}
