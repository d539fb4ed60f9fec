#![crate_name = "lhe_math"]
#![crate_type = "lib"]
#![warn(missing_docs, unused_imports)]

//! Mathematical utilities for the lhe.rs library: modular arithmetic,
//! number-theoretic transforms, residue number systems, and polynomials over
//! cyclotomic rings.

mod errors;
pub use errors::{Error, Result};

pub mod ntt;
pub mod rns;
pub mod rq;
pub mod zq;
