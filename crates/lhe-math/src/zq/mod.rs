//! Arithmetic modulo a word-sized prime.

pub mod primes;

use crate::{Error, Result};
use rand::{CryptoRng, RngCore};

/// Structure encapsulating arithmetic modulo an integer `p` with
/// `2 <= p < 2^62`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modulus {
    pub(crate) p: u64,
    leading_zeros: u32,
}

impl Modulus {
    /// Create a modulus. Returns an error if `p` is not between 2 and 2^62.
    pub fn new(p: u64) -> Result<Self> {
        if p < 2 || p >= (1 << 62) {
            Err(Error::Default(
                "The modulus should be between 2 and 2^62".to_string(),
            ))
        } else {
            Ok(Self {
                p,
                leading_zeros: p.leading_zeros(),
            })
        }
    }

    /// Returns the value of the modulus.
    pub const fn modulus(&self) -> u64 {
        self.p
    }

    /// Modular addition of `a` and `b` which must be already reduced.
    pub const fn add(&self, a: u64, b: u64) -> u64 {
        debug_assert!(a < self.p && b < self.p);
        Self::reduce1(a + b, self.p)
    }

    /// Modular subtraction of `b` from `a`, both already reduced.
    pub const fn sub(&self, a: u64, b: u64) -> u64 {
        debug_assert!(a < self.p && b < self.p);
        Self::reduce1(a + self.p - b, self.p)
    }

    /// Modular negation of `a`, already reduced.
    pub const fn neg(&self, a: u64) -> u64 {
        debug_assert!(a < self.p);
        Self::reduce1(self.p - a, self.p)
    }

    /// Modular multiplication of `a` and `b`, both already reduced.
    pub const fn mul(&self, a: u64, b: u64) -> u64 {
        debug_assert!(a < self.p && b < self.p);
        self.reduce_u128((a as u128) * (b as u128))
    }

    /// Compute the Shoup representation of `a`, i.e. `floor(a * 2^64 / p)`.
    pub const fn shoup(&self, a: u64) -> u64 {
        debug_assert!(a < self.p);
        (((a as u128) << 64) / (self.p as u128)) as u64
    }

    /// Compute the Shoup representation of a vector.
    pub fn shoup_vec(&self, a: &[u64]) -> Vec<u64> {
        a.iter().map(|ai| self.shoup(*ai)).collect()
    }

    /// Shoup multiplication of `a` by `b`, given `b_shoup = shoup(b)`.
    pub const fn mul_shoup(&self, a: u64, b: u64, b_shoup: u64) -> u64 {
        Self::reduce1(self.lazy_mul_shoup(a, b, b_shoup), self.p)
    }

    /// Lazy Shoup multiplication: the output is reduced modulo `2 * p` only.
    pub const fn lazy_mul_shoup(&self, a: u64, b: u64, b_shoup: u64) -> u64 {
        debug_assert!(b < self.p);
        debug_assert!(b_shoup == self.shoup(b));

        let q = ((a as u128) * (b_shoup as u128) >> 64) as u64;
        let r = a.wrapping_mul(b).wrapping_sub(q.wrapping_mul(self.p));
        debug_assert!(r < 2 * self.p);
        r
    }

    /// Modular exponentiation.
    pub fn pow(&self, a: u64, n: u64) -> u64 {
        debug_assert!(a < self.p);

        let mut base = a;
        let mut exp = n;
        let mut result = 1u64;
        while exp > 0 {
            if exp & 1 == 1 {
                result = self.mul(result, base);
            }
            base = self.mul(base, base);
            exp >>= 1;
        }
        result
    }

    /// Modular inverse of `a`, if it exists.
    pub fn inv(&self, a: u64) -> Option<u64> {
        if a == 0 {
            return None;
        }
        let (mut t, mut new_t) = (0i128, 1i128);
        let (mut r, mut new_r) = (self.p as i128, a as i128);
        while new_r != 0 {
            let quotient = r / new_r;
            (t, new_t) = (new_t, t - quotient * new_t);
            (r, new_r) = (new_r, r - quotient * new_r);
        }
        if r != 1 {
            None
        } else {
            Some(t.rem_euclid(self.p as i128) as u64)
        }
    }

    /// Reduce `a` modulo `p`.
    pub const fn reduce(&self, a: u64) -> u64 {
        a % self.p
    }

    /// Reduce a 128-bit value modulo `p`.
    pub const fn reduce_u128(&self, a: u128) -> u64 {
        (a % (self.p as u128)) as u64
    }

    /// Reduce a signed value modulo `p`, mapping negative values to their
    /// representative in `[0, p)`.
    pub const fn reduce_i64(&self, a: i64) -> u64 {
        let r = a % (self.p as i64);
        if r < 0 {
            (r + self.p as i64) as u64
        } else {
            r as u64
        }
    }

    /// Conditional subtraction: reduce `x` against `p` assuming `x < 2 * p`.
    pub(crate) const fn reduce1(x: u64, p: u64) -> u64 {
        debug_assert!(x < 2 * p);
        if x >= p {
            x - p
        } else {
            x
        }
    }

    /// Reduce a vector in place.
    pub fn reduce_vec(&self, a: &mut [u64]) {
        a.iter_mut().for_each(|ai| *ai = self.reduce(*ai));
    }

    /// Reduce a vector of signed values into representatives in `[0, p)`.
    pub fn reduce_vec_i64(&self, a: &[i64]) -> Vec<u64> {
        a.iter().map(|ai| self.reduce_i64(*ai)).collect()
    }

    /// Modular addition of vectors in place.
    pub fn add_vec(&self, a: &mut [u64], b: &[u64]) {
        debug_assert_eq!(a.len(), b.len());
        a.iter_mut()
            .zip(b.iter())
            .for_each(|(ai, bi)| *ai = self.add(*ai, *bi));
    }

    /// Modular subtraction of vectors in place.
    pub fn sub_vec(&self, a: &mut [u64], b: &[u64]) {
        debug_assert_eq!(a.len(), b.len());
        a.iter_mut()
            .zip(b.iter())
            .for_each(|(ai, bi)| *ai = self.sub(*ai, *bi));
    }

    /// Modular multiplication of vectors in place.
    pub fn mul_vec(&self, a: &mut [u64], b: &[u64]) {
        debug_assert_eq!(a.len(), b.len());
        a.iter_mut()
            .zip(b.iter())
            .for_each(|(ai, bi)| *ai = self.mul(*ai, *bi));
    }

    /// Modular negation of a vector in place.
    pub fn neg_vec(&self, a: &mut [u64]) {
        a.iter_mut().for_each(|ai| *ai = self.neg(*ai));
    }

    /// Modular multiplication of a vector by a scalar in place. The scalar
    /// does not need to be reduced.
    pub fn scalar_mul_vec(&self, a: &mut [u64], b: u64) {
        let b = self.reduce(b);
        let b_shoup = self.shoup(b);
        a.iter_mut()
            .for_each(|ai| *ai = self.mul_shoup(*ai, b, b_shoup));
    }

    /// Sample a vector of uniform elements of `[0, p)`.
    pub fn random_vec<R: RngCore + CryptoRng>(&self, size: usize, rng: &mut R) -> Vec<u64> {
        let mask = u64::MAX >> self.leading_zeros;
        let mut out = Vec::with_capacity(size);
        while out.len() != size {
            // Rejection sampling on the masked draw keeps the distribution
            // uniform.
            let v = rng.next_u64() & mask;
            if v < self.p {
                out.push(v);
            }
        }
        out
    }
}
