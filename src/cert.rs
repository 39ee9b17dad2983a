//! X.509 certificates.
//!
//! This module implements decoding of certificates as defined in
//! [RFC 5280] into the type [`Cert`]. Only the parts of a certificate
//! needed to identify it are kept: serial number, issuer and subject
//! names, the validity period, and the public key. Extensions are skipped
//! and no signatures are verified. The certificate keeps its complete DER
//! encoding so that thumbprints can be calculated and the certificate can
//! be handed on to other libraries.
//!
//! [RFC 5280]: https://tools.ietf.org/html/rfc5280

use std::ops;
use bcder::decode;
use bcder::{BitString, Captured, Mode, Oid, Tag};
use bcder::decode::{DecodeError, IntoSource, Source};
use bytes::Bytes;
use crate::crypto::{DigestAlgorithm, Thumbprint};
use crate::x509::{Name, Serial, Validity};


//------------ Cert ----------------------------------------------------------

/// A decoded X.509 certificate.
///
/// If the certificate is stored in a file, you can use the [`decode`]
/// function to parse the entire file. If it is part of some other
/// structure, [`take_from`] can be used during parsing of that structure.
///
/// The fields of the to-be-signed part of the certificate are available
/// through `Deref` to [`TbsCert`].
///
/// [`decode`]: #method.decode
/// [`take_from`]: #method.take_from
#[derive(Clone, Debug)]
pub struct Cert {
    /// The complete encoding of the certificate.
    der: Captured,

    /// The algorithm used for signing the certificate.
    signature_algorithm: Oid<Bytes>,

    /// The signature value.
    signature_value: Bytes,

    /// The actual data of the certificate.
    tbs: TbsCert,
}


/// # Decoding
///
impl Cert {
    /// Decodes a source as a certificate.
    ///
    /// The source must contain exactly one certificate.
    pub fn decode<S: IntoSource>(
        source: S,
    ) -> Result<Self, DecodeError<<S::Source as Source>::Error>> {
        Mode::Der.decode(source, |cons| {
            let cert = Self::take_from(cons)?;
            if !cons.capture_all()?.as_slice().is_empty() {
                return Err(cons.content_err(
                    "trailing data after certificate"
                ))
            }
            Ok(cert)
        })
    }

    /// Takes an encoded certificate from the beginning of a value.
    ///
    /// This function assumes that the certificate is encoded in the next
    /// constructed value in `cons` tagged as a sequence.
    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        let der = cons.capture_one()?;
        der.clone().decode(|cons| {
            cons.take_sequence(|cons| Self::from_constructed(cons, der))
        }).map_err(DecodeError::convert)
    }

    /// Parses the content of a Certificate sequence.
    fn from_constructed<S: decode::Source>(
        cons: &mut decode::Constructed<S>,
        der: Captured,
    ) -> Result<Self, DecodeError<S::Error>> {
        let tbs = TbsCert::take_from(cons)?;
        let signature_algorithm = take_algorithm(cons)?;
        let signature_value = BitString::take_from(cons)?.octet_bytes();
        if signature_algorithm != tbs.signature {
            return Err(cons.content_err(
                "signature algorithm differs from algorithm in signed data"
            ))
        }
        Ok(Cert { der, signature_algorithm, signature_value, tbs })
    }
}


/// # Data Access
///
impl Cert {
    /// Returns the complete DER encoding of the certificate.
    pub fn as_slice(&self) -> &[u8] {
        self.der.as_slice()
    }

    /// Returns the complete DER encoding as a bytes value.
    pub fn to_bytes(&self) -> Bytes {
        self.der.clone().into_bytes()
    }

    /// Returns the signature algorithm of the certificate.
    pub fn signature_algorithm(&self) -> &Oid<Bytes> {
        &self.signature_algorithm
    }

    /// Returns the raw signature value.
    pub fn signature_value(&self) -> &Bytes {
        &self.signature_value
    }

    /// Returns a reference to the to-be-signed part of the certificate.
    pub fn tbs(&self) -> &TbsCert {
        &self.tbs
    }

    /// Calculates the thumbprint of the certificate.
    pub fn thumbprint(&self, algorithm: DigestAlgorithm) -> Thumbprint {
        Thumbprint::compute(algorithm, self.as_slice())
    }
}


//--- Deref and AsRef

impl ops::Deref for Cert {
    type Target = TbsCert;

    fn deref(&self) -> &Self::Target {
        &self.tbs
    }
}

impl AsRef<TbsCert> for Cert {
    fn as_ref(&self) -> &TbsCert {
        &self.tbs
    }
}


//--- PartialEq and Eq

impl PartialEq for Cert {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for Cert { }


//------------ TbsCert -------------------------------------------------------

/// The data of a certificate.
#[derive(Clone, Debug)]
pub struct TbsCert {
    /// The certificate version.
    ///
    /// This is the encoded value, i.e., 0 for v1, 2 for v3.
    version: u8,

    /// The serial number.
    serial_number: Serial,

    /// The algorithm used for signing the certificate.
    signature: Oid<Bytes>,

    /// The name of the issuer.
    issuer: Name,

    /// The validity of the certificate.
    validity: Validity,

    /// The name of the subject of this certificate.
    subject: Name,

    /// The algorithm of the subject public key.
    public_key_algorithm: Oid<Bytes>,

    /// The bits of the subject public key.
    public_key: Bytes,
}

impl TbsCert {
    /// Takes the to-be-signed sequence from the beginning of a value.
    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            // version [0] EXPLICIT Version DEFAULT v1.
            let version = cons.take_opt_constructed_if(
                Tag::CTX_0, |c| c.take_u8()
            )?.unwrap_or(0);
            if version > 2 {
                return Err(cons.content_err(
                    "unsupported certificate version"
                ))
            }

            let serial_number = Serial::take_from(cons)?;
            let signature = take_algorithm(cons)?;
            let issuer = Name::take_from(cons)?;
            let validity = Validity::take_from(cons)?;
            let subject = Name::take_from(cons)?;
            let (public_key_algorithm, public_key) = {
                cons.take_sequence(|cons| {
                    let algorithm = take_algorithm(cons)?;
                    let key = BitString::take_from(cons)?;
                    Ok((algorithm, key.octet_bytes()))
                })?
            };

            // issuerUniqueID, subjectUniqueID, and extensions. We don’t
            // need any of them.
            cons.skip_all()?;

            Ok(TbsCert {
                version,
                serial_number,
                signature,
                issuer,
                validity,
                subject,
                public_key_algorithm,
                public_key,
            })
        })
    }

    /// Returns the X.509 version of the certificate, i.e., 1, 2, or 3.
    pub fn version(&self) -> u8 {
        self.version + 1
    }

    /// Returns the serial number of the certificate.
    pub fn serial_number(&self) -> &Serial {
        &self.serial_number
    }

    /// Returns a reference to the issuer name.
    pub fn issuer(&self) -> &Name {
        &self.issuer
    }

    /// Returns the validity period of the certificate.
    pub fn validity(&self) -> Validity {
        self.validity
    }

    /// Returns a reference to the subject name.
    pub fn subject(&self) -> &Name {
        &self.subject
    }

    /// Returns the algorithm identifier of the subject public key.
    pub fn public_key_algorithm(&self) -> &Oid<Bytes> {
        &self.public_key_algorithm
    }

    /// Returns the bits of the subject public key.
    pub fn public_key(&self) -> &Bytes {
        &self.public_key
    }

    /// Returns whether the certificate was issued by its own subject.
    pub fn is_self_issued(&self) -> bool {
        self.issuer == self.subject
    }
}


//------------ Helpers for Decoding ------------------------------------------

/// Takes an AlgorithmIdentifier and returns its object identifier.
///
/// The parameters are skipped.
fn take_algorithm<S: decode::Source>(
    cons: &mut decode::Constructed<S>
) -> Result<Oid<Bytes>, DecodeError<S::Error>> {
    cons.take_sequence(|cons| {
        let algorithm = Oid::take_from(cons)?;
        cons.skip_all()?;
        Ok(algorithm)
    })
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::x509::Time;

    const CONTOSO: &[u8] = include_bytes!("../test-data/contoso.cer");
    const ESCAPED: &[u8] = include_bytes!("../test-data/escaped.cer");

    #[test]
    fn decode_contoso() {
        let cert = Cert::decode(CONTOSO).unwrap();
        assert_eq!(cert.version(), 3);
        assert_eq!(cert.serial_number().to_string(), "1234ABCD");
        assert_eq!(
            cert.subject().to_string(),
            "CN=secret.contoso.com, OU=Secrets, O=Contoso Ltd, \
             ST=Washington, C=US"
        );
        assert_eq!(cert.subject().common_name(), Some("secret.contoso.com"));
        assert!(cert.is_self_issued());
        assert_eq!(
            cert.validity().not_before(),
            Time::utc(2026, 10, 19, 19, 49, 36).unwrap()
        );
        assert_eq!(
            cert.validity().not_after(),
            Time::utc(2036, 10, 16, 19, 49, 36).unwrap()
        );
        // id-ecPublicKey
        assert_eq!(cert.public_key_algorithm().to_string(), "1.2.840.10045.2.1");
        // Uncompressed P-256 point.
        assert_eq!(cert.public_key().len(), 65);
        assert_eq!(cert.as_slice(), CONTOSO);
    }

    #[test]
    fn decode_escaped() {
        let cert = Cert::decode(ESCAPED).unwrap();
        assert_eq!(cert.serial_number().to_string(), "07");
        assert_eq!(
            cert.subject().to_string(),
            "E=jdoe@example.com, O=Example #1, CN=Doe\\, John + UID=jdoe"
        );
        assert_eq!(cert.subject().common_name(), Some("Doe, John"));
        // GeneralizedTime for dates beyond 2049.
        assert_eq!(
            cert.validity().not_after(),
            Time::utc(2067, 11, 13, 19, 49, 41).unwrap()
        );
    }

    #[test]
    fn thumbprints() {
        let cert = Cert::decode(CONTOSO).unwrap();
        assert_eq!(
            cert.thumbprint(DigestAlgorithm::Sha1).as_str(),
            "4B2C4DF7D22F92E0F5639E75B0DC47008F14ACA2"
        );
        assert_eq!(
            cert.thumbprint(DigestAlgorithm::Sha256).as_str(),
            "96A00A73F774F6AC5DFE9E1056A1073D\
             8AF734F40665528E835634C9FCB03667"
        );
        let cert = Cert::decode(ESCAPED).unwrap();
        assert_eq!(
            cert.thumbprint(DigestAlgorithm::default()).as_str(),
            "5E7CC0E2170E143B113A1F3FFFBEB15BD2B2DA91"
        );
    }

    #[test]
    fn reject_garbage() {
        assert!(Cert::decode(b"hello world".as_ref()).is_err());
        assert!(Cert::decode(b"".as_ref()).is_err());
        assert!(Cert::decode(&CONTOSO[..CONTOSO.len() - 1]).is_err());

        for tail in [b"\x00".as_ref(), b"\x00\x00", b"junk", b"\x05\x00"] {
            let mut trailing = CONTOSO.to_vec();
            trailing.extend_from_slice(tail);
            assert!(Cert::decode(trailing.as_slice()).is_err(), "{:?}", tail);
        }

        // Flip the outer signature algorithm from ecdsa-with-SHA256 to
        // ecdsa-with-SHA384. The identifier follows the 449 octets of
        // header and to-be-signed data.
        let mut mismatch = CONTOSO.to_vec();
        let pos = 449 + 11;
        assert_eq!(mismatch[pos], 0x02);
        mismatch[pos] = 0x03;
        assert!(Cert::decode(mismatch.as_slice()).is_err());
    }
}
