//! Loading certificates from secret files.
//!
//! Secret stores such as the Azure Key Vault FlexVolume driver or the
//! Secrets Store CSI driver surface each secret as a file in a mounted
//! volume. For certificates, the content of that file is the Base 64
//! encoding of the DER-encoded certificate.
//!
//! The [`CertificateSecretLoader`] turns a base path and a secret name into
//! either a [`ParsedCertificate`] or a [`LoadError`] that tells exactly
//! which step failed. Loading goes through these steps in order, with any
//! failure ending the process:
//!
//! 1. The secret name is checked and joined to the base path. Names that
//!    are empty or would lead outside the base path are rejected with
//!    [`ErrorKind::InvalidName`].
//! 2. The resulting path must refer to an existing regular file or loading
//!    fails with [`ErrorKind::NotFound`].
//! 3. The file is read. Failures result in [`ErrorKind::IoError`].
//! 4. The content is decoded as Base 64. Failures result in
//!    [`ErrorKind::DecodeError`].
//! 5. The decoded data is parsed into a certificate. Failures result in
//!    [`ErrorKind::ParseError`].
//!
//! The loader keeps no state between calls and never writes anything, so
//! it can be shared freely between threads. It doesn’t log either. What to
//! report is left to the caller.

use std::{error, fmt, fs};
use std::path::{Component, Path, PathBuf};
use bytes::Bytes;
use crate::cert::Cert;
use crate::crypto::{DigestAlgorithm, Thumbprint};
use crate::parser::{CertificateParser, DerParser};
use crate::util::base64;
use crate::x509::{Time, Validity};


//------------ load ----------------------------------------------------------

/// Loads the certificate secret `secret_name` below `base_path`.
///
/// This uses a loader with the default configuration. See
/// [`CertificateSecretLoader`] for the details.
pub fn load(base_path: impl AsRef<Path>, secret_name: &str) -> LoadResult {
    CertificateSecretLoader::new().load(base_path, secret_name)
}


//------------ LoadResult ----------------------------------------------------

/// The outcome of loading a certificate secret.
pub type LoadResult = Result<ParsedCertificate, LoadError>;


//------------ CertificateSecretLoader ---------------------------------------

/// A loader for certificates stored in secret files.
///
/// The loader is generic over the parser used for the decoded content of
/// the secret file. By default, this is the [`DerParser`] which accepts a
/// single DER-encoded certificate.
#[derive(Clone, Debug, Default)]
pub struct CertificateSecretLoader<P = DerParser> {
    /// The parser for the decoded secret.
    parser: P,

    /// The password handed to the parser.
    password: Option<String>,

    /// The digest algorithm for the thumbprint.
    thumbprint_algorithm: DigestAlgorithm,
}

impl CertificateSecretLoader {
    /// Creates a new loader using the DER parser.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P> CertificateSecretLoader<P> {
    /// Creates a new loader using the given parser.
    pub fn with_parser(parser: P) -> Self {
        CertificateSecretLoader {
            parser,
            password: None,
            thumbprint_algorithm: DigestAlgorithm::default(),
        }
    }

    /// Sets the password handed to the parser.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the digest algorithm used for the thumbprint.
    ///
    /// The default is SHA-1.
    pub fn thumbprint_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.thumbprint_algorithm = algorithm;
        self
    }
}

impl<P: CertificateParser> CertificateSecretLoader<P> {
    /// Loads the certificate secret `secret_name` below `base_path`.
    pub fn load(
        &self, base_path: impl AsRef<Path>, secret_name: &str
    ) -> LoadResult {
        self.load_location(
            &SecretLocation::new(base_path.as_ref(), secret_name)?
        )
    }

    /// Loads the certificate secret at the given location.
    pub fn load_location(&self, location: &SecretLocation) -> LoadResult {
        let content = read_secret(&location.path())?;
        self.process(content)
    }

    /// Decodes and parses the content of a secret file.
    fn process(&self, content: Vec<u8>) -> LoadResult {
        let data = base64::Secret.decode_bytes(&content).map_err(|err| {
            LoadError::new(ErrorKind::DecodeError, err)
        })?;
        let cert = self.parser.parse(
            data.into(), self.password.as_deref()
        ).map_err(|err| LoadError::new(ErrorKind::ParseError, err))?;
        Ok(ParsedCertificate::from_cert(&cert, self.thumbprint_algorithm))
    }
}

#[cfg(feature = "tokio")]
impl<P: CertificateParser> CertificateSecretLoader<P> {
    /// Loads a certificate secret, giving up on reading after `deadline`.
    ///
    /// Secret volumes may be backed by network storage which can stall.
    /// This method performs the existence check and the read on Tokio’s
    /// blocking thread pool and returns an [`ErrorKind::IoError`] if they
    /// haven’t finished before the deadline passed. The blocking read
    /// itself can’t be cancelled and will finish in the background.
    pub async fn load_with_deadline(
        &self,
        base_path: impl AsRef<Path>,
        secret_name: &str,
        deadline: std::time::Duration,
    ) -> LoadResult {
        let path = SecretLocation::new(base_path.as_ref(), secret_name)?.path();
        let content = read_with_deadline(
            move || read_secret(&path), deadline
        ).await?;
        self.process(content)
    }
}

/// Runs a blocking read operation with a deadline.
#[cfg(feature = "tokio")]
async fn read_with_deadline<F>(
    op: F, deadline: std::time::Duration
) -> Result<Vec<u8>, LoadError>
where F: FnOnce() -> Result<Vec<u8>, LoadError> + Send + 'static {
    match tokio::time::timeout(
        deadline, tokio::task::spawn_blocking(op)
    ).await {
        Ok(Ok(res)) => res,
        Ok(Err(err)) => {
            Err(LoadError::new(
                ErrorKind::IoError,
                format_args!("reading the secret failed: {}", err)
            ))
        }
        Err(_) => {
            Err(LoadError::new(
                ErrorKind::IoError,
                std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("reading the secret timed out after {:?}", deadline)
                )
            ))
        }
    }
}

/// Checks that `path` is a regular file and reads all of it.
fn read_secret(path: &Path) -> Result<Vec<u8>, LoadError> {
    // Follows symlinks. Secret volumes mostly consist of those.
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => { }
        Ok(_) => {
            return Err(LoadError::new(
                ErrorKind::NotFound,
                format_args!("{} is not a regular file", path.display())
            ))
        }
        Err(err) => {
            return Err(LoadError::new(
                ErrorKind::NotFound,
                format_args!("{}: {}", path.display(), err)
            ))
        }
    }
    fs::read(path).map_err(|err| {
        LoadError::new(
            ErrorKind::IoError,
            format_args!("{}: {}", path.display(), err)
        )
    })
}


//------------ SecretLocation ------------------------------------------------

/// The location of a secret file.
///
/// A location consists of the base path of the volume containing the
/// secrets and the name of the secret. The name is relative to the base
/// path and must not lead outside of it.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SecretLocation {
    base_path: PathBuf,
    secret_name: String,
}

impl SecretLocation {
    /// Creates a new location.
    ///
    /// Fails with [`ErrorKind::InvalidName`] if either argument is empty
    /// or if the secret name contains a root, a drive prefix, or a parent
    /// directory component.
    pub fn new(
        base_path: impl Into<PathBuf>, secret_name: impl Into<String>
    ) -> Result<Self, LoadError> {
        let base_path = base_path.into();
        let secret_name = secret_name.into();
        if base_path.as_os_str().is_empty() {
            return Err(LoadError::new(
                ErrorKind::InvalidName, "empty base path"
            ))
        }
        if secret_name.is_empty() {
            return Err(LoadError::new(
                ErrorKind::InvalidName, "empty secret name"
            ))
        }
        for component in Path::new(&secret_name).components() {
            match component {
                Component::Normal(_) | Component::CurDir => { }
                Component::ParentDir => {
                    return Err(LoadError::new(
                        ErrorKind::InvalidName,
                        format_args!(
                            "secret name '{}' refers to a parent directory",
                            secret_name
                        )
                    ))
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(LoadError::new(
                        ErrorKind::InvalidName,
                        format_args!(
                            "secret name '{}' is an absolute path",
                            secret_name
                        )
                    ))
                }
            }
        }
        Ok(SecretLocation { base_path, secret_name })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn secret_name(&self) -> &str {
        &self.secret_name
    }

    /// Returns the path of the secret file.
    pub fn path(&self) -> PathBuf {
        self.base_path.join(&self.secret_name)
    }
}

impl fmt::Display for SecretLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.path().display())
    }
}


//------------ ParsedCertificate ---------------------------------------------

/// The information about a certificate loaded from a secret.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ParsedCertificate {
    subject_name: String,
    issuer_name: String,
    serial_number: String,
    thumbprint: Thumbprint,
    validity: Validity,

    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_der"))]
    raw_bytes: Bytes,
}

impl ParsedCertificate {
    /// Collects the information from a certificate.
    pub fn from_cert(cert: &Cert, algorithm: DigestAlgorithm) -> Self {
        ParsedCertificate {
            subject_name: cert.subject().to_string(),
            issuer_name: cert.issuer().to_string(),
            serial_number: cert.serial_number().to_string(),
            thumbprint: cert.thumbprint(algorithm),
            validity: cert.validity(),
            raw_bytes: cert.to_bytes(),
        }
    }

    /// Returns the subject name in its RFC 4514 string representation.
    pub fn subject_name(&self) -> &str {
        &self.subject_name
    }

    /// Returns the issuer name in its RFC 4514 string representation.
    pub fn issuer_name(&self) -> &str {
        &self.issuer_name
    }

    /// Returns the serial number as a hex string.
    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    pub fn thumbprint(&self) -> &Thumbprint {
        &self.thumbprint
    }

    pub fn validity(&self) -> Validity {
        self.validity
    }

    pub fn not_before(&self) -> Time {
        self.validity.not_before()
    }

    pub fn not_after(&self) -> Time {
        self.validity.not_after()
    }

    /// Returns the DER encoding of the certificate.
    pub fn raw_bytes(&self) -> &Bytes {
        &self.raw_bytes
    }
}

#[cfg(feature = "serde")]
fn serialize_der<S: serde::Serializer>(
    data: &Bytes, serializer: S
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&base64::Serde.encode(data.as_ref()))
}


//------------ ErrorKind -----------------------------------------------------

/// The step at which loading a certificate secret failed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ErrorKind {
    /// The secret name is empty or leads outside the base path.
    InvalidName,

    /// There is no regular file at the secret’s path.
    NotFound,

    /// Reading the secret file failed.
    IoError,

    /// The content of the secret file isn’t valid Base 64.
    DecodeError,

    /// The decoded secret isn’t a certificate the parser understands.
    ParseError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            ErrorKind::InvalidName => "invalid secret name",
            ErrorKind::NotFound => "secret not found",
            ErrorKind::IoError => "failed to read secret",
            ErrorKind::DecodeError => "malformed Base 64 in secret",
            ErrorKind::ParseError => "failed to parse certificate",
        })
    }
}


//------------ LoadError -----------------------------------------------------

/// Loading a certificate secret failed.
///
/// The error tells which step failed via its [`kind`][Self::kind] and
/// keeps the message of the underlying error.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LoadError {
    kind: ErrorKind,
    message: String,
}

impl LoadError {
    pub fn new(kind: ErrorKind, message: impl fmt::Display) -> Self {
        LoadError { kind, message: message.to_string() }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl error::Error for LoadError { }


//============ Tests =========================================================
