#![crate_name = "lhe_util"]
#![crate_type = "lib"]
#![warn(missing_docs, unused_imports)]

//! Utilities for the lhe.rs library.

use rand::{CryptoRng, RngCore};
use std::fmt;

/// The errors that can occur in lhe-util.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The requested variance is outside of the supported range.
    UnsupportedVariance,
    /// The requested vector size is invalid.
    InvalidSize,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnsupportedVariance => write!(f, "unsupported variance"),
            Error::InvalidSize => write!(f, "invalid vector size"),
        }
    }
}

impl std::error::Error for Error {}

/// A result type for lhe-util operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Sample a vector of independent centered binomial distributions of a given
/// variance. Returns an error if the variance is not between 1 and 16.
///
/// A sample of variance `v` is the difference of the popcounts of two
/// `2 * v`-bit draws, so the output lies in `[-2v, 2v]`.
pub fn sample_vec_cbd<R: RngCore + CryptoRng>(
    vector_size: usize,
    variance: usize,
    rng: &mut R,
) -> Result<Vec<i64>> {
    if !(1..=16).contains(&variance) {
        return Err(Error::UnsupportedVariance);
    }
    Ok(sample_vec_cbd_unchecked(vector_size, 2 * variance, rng))
}

/// Sample a vector of independent centered binomial distributions of a given
/// fractional variance. Returns an error if twice the variance does not
/// round to an integer between 1 and 32.
///
/// This variant supports the small variances used for secret keys, e.g. a
/// variance of 0.5 yields ternary samples.
pub fn sample_vec_cbd_f32<R: RngCore + CryptoRng>(
    vector_size: usize,
    variance: f32,
    rng: &mut R,
) -> Result<Vec<i64>> {
    let pairs = (2.0 * variance).round() as i64;
    if !(1..=32).contains(&pairs) {
        return Err(Error::UnsupportedVariance);
    }
    Ok(sample_vec_cbd_unchecked(vector_size, pairs as usize, rng))
}

/// Sample `vector_size` centered binomial values, each the difference of
/// `pairs` fresh bit pairs.
fn sample_vec_cbd_unchecked<R: RngCore + CryptoRng>(
    vector_size: usize,
    pairs: usize,
    rng: &mut R,
) -> Vec<i64> {
    let mut out = Vec::with_capacity(vector_size);
    let mut pool = 0u64;
    let mut pool_bits = 0usize;
    for _ in 0..vector_size {
        let mut v = 0i64;
        for _ in 0..pairs {
            if pool_bits < 2 {
                pool = rng.next_u64();
                pool_bits = 64;
            }
            v += (pool & 1) as i64 - ((pool >> 1) & 1) as i64;
            pool >>= 2;
            pool_bits -= 2;
        }
        out.push(v);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{sample_vec_cbd, sample_vec_cbd_f32, Error};
    use rand::thread_rng;

    #[test]
    fn cbd_bounds() {
        let mut rng = thread_rng();
        for variance in 1..=16 {
            let v = sample_vec_cbd(1000, variance, &mut rng).unwrap();
            assert_eq!(v.len(), 1000);
            let bound = 2 * variance as i64;
            assert!(v.iter().all(|vi| vi.abs() <= bound));
        }
    }

    #[test]
    fn cbd_rejects_out_of_range_variance() {
        let mut rng = thread_rng();
        assert_eq!(
            sample_vec_cbd(10, 0, &mut rng).unwrap_err(),
            Error::UnsupportedVariance
        );
        assert_eq!(
            sample_vec_cbd(10, 17, &mut rng).unwrap_err(),
            Error::UnsupportedVariance
        );
        assert_eq!(
            sample_vec_cbd_f32(10, 0.1, &mut rng).unwrap_err(),
            Error::UnsupportedVariance
        );
    }

    #[test]
    fn cbd_ternary() {
        let mut rng = thread_rng();
        let v = sample_vec_cbd_f32(1000, 0.5, &mut rng).unwrap();
        assert!(v.iter().all(|vi| vi.abs() <= 1));
        assert!(v.iter().any(|vi| *vi != 0));
    }

    #[test]
    fn cbd_empirical_variance() {
        let mut rng = thread_rng();
        let n = 100_000usize;
        let v = sample_vec_cbd(n, 10, &mut rng).unwrap();
        let mean = v.iter().sum::<i64>() as f64 / n as f64;
        let var = v.iter().map(|vi| (*vi as f64 - mean).powi(2)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.1, "mean too far from 0: {mean}");
        assert!((var - 10.0).abs() < 0.5, "variance too far from 10: {var}");
    }
}
