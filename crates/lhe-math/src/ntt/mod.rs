//! Number-theoretic transforms over prime fields.

mod native;

pub use native::NttOperator;

/// Returns whether a modulus `p` supports the negacyclic NTT of size `n`,
/// i.e. `p` is prime and congruent to 1 modulo `2 * n`.
pub fn supports_ntt(p: u64, n: usize) -> bool {
    if !n.is_power_of_two() || n < 8 {
        return false;
    }
    p % ((n as u64) << 1) == 1 && crate::zq::primes::is_prime(p)
}
