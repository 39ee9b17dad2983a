//! Certificates stored as mounted secrets.
//!
//! Secret stores such as Azure Key Vault can be made available to
//! containers as a volume in which each secret appears as a file. For a
//! certificate, the file contains the Base 64 encoding of its DER
//! encoding.
//!
//! This crate loads such a certificate given the mount path of the volume
//! and the name of the secret and provides the information identifying
//! it: subject and issuer name, serial number, thumbprint, and validity
//! period. If loading fails, the error tells which step went wrong so it
//! can be reported meaningfully.
//!
//! ```no_run
//! let cert = certsecret::loader::load("/kvmnt", "mycert")?;
//! println!("{} ({})", cert.subject_name(), cert.thumbprint());
//! # Ok::<(), certsecret::loader::LoadError>(())
//! ```
//!
//! The [`loader`] module contains the loader itself. The certificate model
//! lives in [`cert`] and [`x509`]. If the `settings` feature is enabled,
//! the [`settings`] module reads the location of the secret from a JSON
//! settings file and the environment.

pub use self::loader::{
    CertificateSecretLoader, ErrorKind, LoadError, LoadResult,
    ParsedCertificate, SecretLocation, load,
};

pub mod cert;
pub mod crypto;
pub mod loader;
pub mod oid;
pub mod parser;
#[cfg(feature = "settings")]
pub mod settings;
pub mod util;
pub mod x509;
