#![crate_name = "lhe_traits"]
#![crate_type = "lib"]
#![warn(missing_docs, unused_imports)]

//! Traits and common interfaces for the lhe.rs library.

use rand::{CryptoRng, RngCore};

/// The homomorphic encryption parameters.
pub trait FheParameters {}

/// Indicates that an object is parametrized by a set of homomorphic
/// encryption parameters.
pub trait FheParametrized {
    /// The type of the parameters.
    type Parameters: FheParameters;
}

/// A ciphertext in a homomorphic encryption scheme.
pub trait FheCiphertext: FheParametrized {}

/// A plaintext in a homomorphic encryption scheme.
pub trait FhePlaintext: FheParametrized {}

/// Encrypt a plaintext into a ciphertext.
pub trait FheEncrypter<P: FhePlaintext, C: FheCiphertext>: FheParametrized {
    /// The type of error returned by the encryption.
    type Error;

    /// Attempt to encrypt the plaintext.
    fn try_encrypt<R: RngCore + CryptoRng>(&self, pt: &P, rng: &mut R) -> Result<C, Self::Error>;
}

/// Decrypt a ciphertext into a plaintext.
pub trait FheDecrypter<P: FhePlaintext, C: FheCiphertext>: FheParametrized {
    /// The type of error returned by the decryption.
    type Error;

    /// Attempt to decrypt the ciphertext.
    fn try_decrypt(&self, ct: &C) -> Result<P, Self::Error>;
}

/// Encode a value into a plaintext.
pub trait FheEncoder<V>: FhePlaintext
where
    Self: Sized,
{
    /// The type of error returned by the encoding.
    type Error;

    /// Attempt to encode the value into a plaintext with the given
    /// parameters.
    fn try_encode(value: V, par: &std::sync::Arc<Self::Parameters>) -> Result<Self, Self::Error>;
}

/// Decode a plaintext into a value.
pub trait FheDecoder<P: FhePlaintext>
where
    Self: Sized,
{
    /// The type of error returned by the decoding.
    type Error;

    /// Attempt to decode the plaintext.
    fn try_decode(pt: &P) -> Result<Self, Self::Error>;
}
