//! Key material for the leveled encryption schemes.

mod public_key;
mod secret_key;

pub use public_key::PublicKey;
pub use secret_key::SecretKey;
