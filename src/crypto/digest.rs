//! Digest algorithms and certificate thumbprints.

use std::fmt;
use ring::digest;
use crate::util::hex;

// Re-export the things from ring for actual digest generation.
pub use ring::digest::Digest;


//------------ DigestAlgorithm -----------------------------------------------

/// The digest algorithms available for thumbprints.
///
/// The thumbprint commonly shown for a certificate, for instance by the
/// Windows certificate store or by the .NET `X509Certificate2` class, is
/// the SHA-1 digest of its DER encoding. This is the default. Because SHA-1
/// shouldn’t be used for anything security relevant these days, SHA-256
/// is available, too.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum DigestAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl DigestAlgorithm {
    /// Returns the digest of `data` using this algorithm.
    pub fn digest(self, data: &[u8]) -> Digest {
        digest::digest(self.ring_algorithm(), data)
    }

    fn ring_algorithm(self) -> &'static digest::Algorithm {
        match self {
            DigestAlgorithm::Sha1 => &digest::SHA1_FOR_LEGACY_USE_ONLY,
            DigestAlgorithm::Sha256 => &digest::SHA256,
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            DigestAlgorithm::Sha1 => "SHA-1",
            DigestAlgorithm::Sha256 => "SHA-256",
        })
    }
}


//------------ Thumbprint ----------------------------------------------------

/// The fingerprint of a certificate.
///
/// A thumbprint is the digest over the complete DER encoding of a
/// certificate. It is kept as the upper case hex string without any
/// separators since that is the form it is usually compared in.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Thumbprint {
    algorithm: DigestAlgorithm,
    hex: String,
}

impl Thumbprint {
    /// Computes the thumbprint of the DER-encoded certificate `der`.
    pub fn compute(algorithm: DigestAlgorithm, der: &[u8]) -> Self {
        Thumbprint {
            algorithm,
            hex: hex::encode(algorithm.digest(der).as_ref()),
        }
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    pub fn as_str(&self) -> &str {
        &self.hex
    }
}

impl AsRef<str> for Thumbprint {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Thumbprint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.hex)
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn known_digests() {
        assert_eq!(
            Thumbprint::compute(DigestAlgorithm::Sha1, b"abc").as_str(),
            "A9993E364706816ABA3E25717850C26C9CD0D89D"
        );
        assert_eq!(
            Thumbprint::compute(DigestAlgorithm::Sha256, b"abc").as_str(),
            "BA7816BF8F01CFEA414140DE5DAE2223\
             B00361A396177A9CB410FF61F20015AD"
        );
    }

    #[test]
    fn default_is_sha1() {
        assert_eq!(DigestAlgorithm::default(), DigestAlgorithm::Sha1);
        assert_eq!(DigestAlgorithm::Sha1.digest(b"abc").as_ref().len(), 20);
        assert_eq!(DigestAlgorithm::Sha256.to_string(), "SHA-256");
    }
}
