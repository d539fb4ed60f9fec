//! Data-parallel launch primitive for the batched fast path.
//!
//! The fused symmetric encryption loops over modulus residues on the host
//! and launches the per-element work of one residue as a batch of
//! independent updates. Keeping the launch decoupled from the algorithm
//! lets tests validate the parallel backend against the sequential twin.

use rayon::prelude::*;

/// Apply `f` to every element of `elems` as a batch of independent
/// data-parallel updates; `f` receives the element index.
pub fn for_each<T, F>(elems: &mut [T], f: F)
where
    T: Send,
    F: Fn(usize, &mut T) + Sync + Send,
{
    elems
        .par_iter_mut()
        .enumerate()
        .for_each(|(i, x)| f(i, x));
}

/// Sequential twin of [`for_each`], used as the reference implementation in
/// tests.
pub fn for_each_serial<T, F>(elems: &mut [T], mut f: F)
where
    F: FnMut(usize, &mut T),
{
    elems.iter_mut().enumerate().for_each(|(i, x)| f(i, x));
}
