//! Turning decoded secret data into certificates.
//!
//! The loader doesn’t parse certificates itself but hands the decoded
//! content of a secret to a [`CertificateParser`]. The [`DerParser`]
//! provided by this module decodes a single DER-encoded X.509 certificate.
//! Secrets can also contain PKCS #12 containers. This is what Azure Key
//! Vault stores as the secret value of a certificate, usually without a
//! password. The DER parser recognises those and fails with a clear
//! message. With the `pkcs12` feature, the [`Pkcs12Parser`] accepts both
//! forms.

use std::{error, fmt};
use std::convert::Infallible;
use bcder::{Mode, Oid};
use bcder::decode::DecodeError;
use bytes::Bytes;
use crate::cert::Cert;
use crate::oid;


//------------ CertificateParser ---------------------------------------------

/// A type that can parse the content of a secret into a certificate.
///
/// The parser receives the decoded secret and an optional password. It
/// must fail rather than return a certificate it didn’t fully understand.
///
/// The trait is implemented for closures with a matching signature.
pub trait CertificateParser {
    fn parse(
        &self, data: Bytes, password: Option<&str>
    ) -> Result<Cert, ParseError>;
}

impl<F> CertificateParser for F
where F: Fn(Bytes, Option<&str>) -> Result<Cert, ParseError> {
    fn parse(
        &self, data: Bytes, password: Option<&str>
    ) -> Result<Cert, ParseError> {
        (self)(data, password)
    }
}


//------------ DerParser -----------------------------------------------------

/// A parser for a single DER-encoded certificate.
///
/// The parser doesn’t support passwords. If one is given or if the data
/// looks like a PKCS #12 container, parsing fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct DerParser;

impl CertificateParser for DerParser {
    fn parse(
        &self, data: Bytes, password: Option<&str>
    ) -> Result<Cert, ParseError> {
        if password.is_some() {
            return Err(ParseError::new(
                "password-protected certificates are not supported"
            ))
        }
        if is_pkcs12(&data) {
            return Err(ParseError::new(
                "data is a PKCS #12 container which requires a \
                 password-capable parser"
            ))
        }
        Cert::decode(data).map_err(Into::into)
    }
}


//------------ Pkcs12Parser --------------------------------------------------

/// A parser for PKCS #12 containers and DER-encoded certificates.
///
/// If the data is a PKCS #12 container, it is opened with the given
/// password or the empty password if there is none. The end-entity
/// certificate is then taken from it. Private keys and further
/// certificates in the container are ignored.
///
/// Any other data is decoded as a single DER-encoded certificate. A
/// password is ignored in this case.
#[cfg(feature = "pkcs12")]
#[derive(Clone, Copy, Debug, Default)]
pub struct Pkcs12Parser;

#[cfg(feature = "pkcs12")]
impl CertificateParser for Pkcs12Parser {
    fn parse(
        &self, data: Bytes, password: Option<&str>
    ) -> Result<Cert, ParseError> {
        use openssl::pkcs12::Pkcs12;

        if !is_pkcs12(&data) {
            return Cert::decode(data).map_err(Into::into)
        }
        let pfx = Pkcs12::from_der(&data).map_err(|err| {
            ParseError::new(format_args!("invalid PKCS #12 container: {}", err))
        })?;
        let parsed = pfx.parse2(password.unwrap_or("")).map_err(|err| {
            ParseError::new(format_args!(
                "cannot open PKCS #12 container (wrong password?): {}", err
            ))
        })?;
        let der = parsed.cert.ok_or_else(|| {
            ParseError::new("PKCS #12 container holds no certificate")
        })?.to_der().map_err(|err| {
            ParseError::new(format_args!("invalid certificate: {}", err))
        })?;
        Cert::decode(Bytes::from(der)).map_err(Into::into)
    }
}


//------------ Helpers -------------------------------------------------------

/// Checks whether `data` starts like a PKCS #12 PFX structure.
///
/// This is a sequence starting with the version 3 followed by a content
/// info of type data. PFX files are frequently BER-encoded, so we decode
/// in BER mode.
fn is_pkcs12(data: &Bytes) -> bool {
    Mode::Ber.decode(data.clone(), |cons| {
        cons.take_sequence(|cons| {
            if cons.take_u8()? != 3 {
                return Ok(false)
            }
            let content_type = cons.take_sequence(|cons| {
                let content_type = Oid::take_from(cons)?;
                cons.skip_all()?;
                Ok(content_type)
            })?;
            cons.skip_all()?;
            Ok(content_type == oid::PKCS7_DATA)
        })
    }).unwrap_or(false)
}


//------------ ParseError ----------------------------------------------------

/// The content of a secret couldn’t be parsed into a certificate.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseError {
    message: String,
}

impl ParseError {
    pub fn new(message: impl fmt::Display) -> Self {
        ParseError { message: message.to_string() }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<DecodeError<Infallible>> for ParseError {
    fn from(err: DecodeError<Infallible>) -> Self {
        ParseError::new(format_args!("invalid certificate: {}", err))
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl error::Error for ParseError { }


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    const CONTOSO: &[u8] = include_bytes!("../test-data/contoso.cer");
    const CONTOSO_PFX: &[u8] = include_bytes!("../test-data/contoso.pfx");

    #[test]
    fn parse_der() {
        let cert = DerParser.parse(
            Bytes::from_static(CONTOSO), None
        ).unwrap();
        assert_eq!(cert.as_slice(), CONTOSO);
    }

    #[test]
    fn reject_password() {
        let err = DerParser.parse(
            Bytes::from_static(CONTOSO), Some("secret")
        ).unwrap_err();
        assert!(err.message().contains("password"));
    }

    #[test]
    fn reject_pkcs12() {
        assert!(is_pkcs12(&Bytes::from_static(CONTOSO_PFX)));
        assert!(!is_pkcs12(&Bytes::from_static(CONTOSO)));
        let err = DerParser.parse(
            Bytes::from_static(CONTOSO_PFX), None
        ).unwrap_err();
        assert!(err.message().contains("PKCS #12"));
    }

    #[test]
    fn reject_garbage() {
        let err = DerParser.parse(
            Bytes::from_static(b"hello world"), None
        ).unwrap_err();
        assert!(err.message().starts_with("invalid certificate"));
        assert!(DerParser.parse(Bytes::new(), None).is_err());
    }

    #[test]
    #[cfg(feature = "pkcs12")]
    fn pkcs12_parser() {
        const NO_PASSWORD: &[u8] = include_bytes!(
            "../test-data/contoso-nopass.pfx"
        );

        let cert = Pkcs12Parser.parse(
            Bytes::from_static(CONTOSO_PFX), Some("secret")
        ).unwrap();
        assert_eq!(cert.as_slice(), CONTOSO);

        // The form Key Vault uses: no password at all.
        let cert = Pkcs12Parser.parse(
            Bytes::from_static(NO_PASSWORD), None
        ).unwrap();
        assert_eq!(cert.as_slice(), CONTOSO);

        let err = Pkcs12Parser.parse(
            Bytes::from_static(CONTOSO_PFX), Some("wrong")
        ).unwrap_err();
        assert!(err.message().contains("wrong password"));
        assert!(Pkcs12Parser.parse(
            Bytes::from_static(CONTOSO_PFX), None
        ).is_err());

        // Plain DER passes through, the password doesn’t matter.
        assert!(Pkcs12Parser.parse(
            Bytes::from_static(CONTOSO), Some("secret")
        ).is_ok());
        assert!(Pkcs12Parser.parse(
            Bytes::from_static(b"hello world"), None
        ).is_err());
    }

    #[test]
    fn closure_parser() {
        let parser = |data: Bytes, password: Option<&str>| {
            assert_eq!(password, Some("secret"));
            Cert::decode(data).map_err(ParseError::from)
        };
        assert!(parser.parse(
            Bytes::from_static(CONTOSO), Some("secret")
        ).is_ok());
    }
}
