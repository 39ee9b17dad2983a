//! Cryptographic helpers.

pub use self::digest::{Digest, DigestAlgorithm, Thumbprint};

pub mod digest;
