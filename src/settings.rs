//! Settings for locating the certificate secret.
//!
//! Applications typically learn where the secret volume is mounted and
//! which secret holds their certificate from a JSON settings file such as
//! this:
//!
//! ```json
//! {
//!     "SecretSettings": {
//!         "KeyVaultVolMountPath": "/kvmnt",
//!         "CertificateSecretName": "mycert"
//!     }
//! }
//! ```
//!
//! The environment variables `SECRET_MOUNT_PATH` and `SECRET_NAME` can be
//! used to override the values from the file.

use std::{env, error, fmt, fs, io};
use std::path::{Path, PathBuf};
use log::debug;
use serde::Deserialize;
use crate::loader::{LoadError, SecretLocation};


//------------ SecretSettings ------------------------------------------------

/// The location of the certificate secret as configured.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SecretSettings {
    /// The path where the secret volume is mounted.
    pub key_vault_vol_mount_path: PathBuf,

    /// The name of the secret containing the certificate.
    pub certificate_secret_name: String,
}

impl SecretSettings {
    /// The environment variable overriding the mount path.
    pub const MOUNT_PATH_VAR: &'static str = "SECRET_MOUNT_PATH";

    /// The environment variable overriding the secret name.
    pub const SECRET_NAME_VAR: &'static str = "SECRET_NAME";

    /// Loads the settings from the given JSON file.
    ///
    /// Both values must be present in the `SecretSettings` section of the
    /// file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let section = SettingsFile::read(path)?.ok_or_else(|| {
            SettingsError::new(
                SettingsErrorKind::Missing,
                format_args!("{}: file not found", path.display())
            )
        })?;
        section.finalize(|_| None)
    }

    /// Loads the settings from the environment and the given file.
    ///
    /// Values present in the environment take precedence over those in
    /// the file. The file is only required if not both values are given
    /// in the environment.
    pub fn from_env_or_file(
        path: impl AsRef<Path>
    ) -> Result<Self, SettingsError> {
        Self::from_lookup_or_file(path.as_ref(), |name| env::var(name).ok())
    }

    fn from_lookup_or_file(
        path: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SettingsError> {
        SettingsFile::read(path)?.unwrap_or_default().finalize(lookup)
    }

    /// Converts the settings into the location of the secret.
    pub fn to_location(&self) -> Result<SecretLocation, LoadError> {
        SecretLocation::new(
            self.key_vault_vol_mount_path.clone(),
            self.certificate_secret_name.clone()
        )
    }
}


//------------ SettingsFile --------------------------------------------------

/// The content of a settings file.
///
/// Other sections may be present and are ignored.
#[derive(Default, Deserialize)]
struct SettingsFile {
    #[serde(rename = "SecretSettings", default)]
    section: Section,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Section {
    key_vault_vol_mount_path: Option<PathBuf>,
    certificate_secret_name: Option<String>,
}

impl SettingsFile {
    /// Reads the settings section of a file.
    ///
    /// Returns `Ok(None)` if the file doesn’t exist.
    fn read(path: &Path) -> Result<Option<Section>, SettingsError> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("No settings file at {}.", path.display());
                return Ok(None)
            }
            Err(err) => {
                return Err(SettingsError::new(
                    SettingsErrorKind::Io,
                    format_args!("{}: {}", path.display(), err)
                ))
            }
        };
        let file: SettingsFile = serde_json::from_slice(&data).map_err(|err| {
            SettingsError::new(
                SettingsErrorKind::Format,
                format_args!("{}: {}", path.display(), err)
            )
        })?;
        debug!("Read secret settings from {}.", path.display());
        Ok(Some(file.section))
    }
}

impl Section {
    fn finalize(
        self, lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<SecretSettings, SettingsError> {
        let lookup = |name: &str| {
            let value = lookup(name).filter(|value| !value.is_empty())?;
            debug!("Using {} from the environment.", name);
            Some(value)
        };
        let mount_path = lookup(SecretSettings::MOUNT_PATH_VAR)
            .map(PathBuf::from)
            .or(self.key_vault_vol_mount_path)
            .filter(|path| !path.as_os_str().is_empty())
            .ok_or_else(|| SettingsError::missing(
                "KeyVaultVolMountPath", SecretSettings::MOUNT_PATH_VAR
            ))?;
        let secret_name = lookup(SecretSettings::SECRET_NAME_VAR)
            .or(self.certificate_secret_name)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| SettingsError::missing(
                "CertificateSecretName", SecretSettings::SECRET_NAME_VAR
            ))?;
        Ok(SecretSettings {
            key_vault_vol_mount_path: mount_path,
            certificate_secret_name: secret_name,
        })
    }
}


//------------ SettingsError -------------------------------------------------

/// The settings could not be loaded.
#[derive(Clone, Debug)]
pub struct SettingsError {
    kind: SettingsErrorKind,
    message: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SettingsErrorKind {
    /// Reading the settings file failed.
    Io,

    /// The settings file isn’t valid JSON of the expected structure.
    Format,

    /// A required value is missing.
    Missing,
}

impl SettingsError {
    fn new(kind: SettingsErrorKind, message: impl fmt::Display) -> Self {
        SettingsError { kind, message: message.to_string() }
    }

    fn missing(key: &str, var: &str) -> Self {
        Self::new(
            SettingsErrorKind::Missing,
            format_args!(
                "missing setting SecretSettings:{} (or environment \
                 variable {})",
                key, var
            )
        )
    }

    pub fn kind(&self) -> SettingsErrorKind {
        self.kind
    }
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl error::Error for SettingsError { }


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    fn settings_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        io::Write::write_all(&mut file, content.as_bytes()).unwrap();
        file
    }

    const FULL: &str = r#"{
        "Logging": { "LogLevel": { "Default": "Warning" } },
        "SecretSettings": {
            "KeyVaultVolMountPath": "/kvmnt",
            "CertificateSecretName": "mycert"
        }
    }"#;

    #[test]
    fn load_file() {
        let file = settings_file(FULL);
        let settings = SecretSettings::load(file.path()).unwrap();
        assert_eq!(
            settings,
            SecretSettings {
                key_vault_vol_mount_path: "/kvmnt".into(),
                certificate_secret_name: "mycert".into(),
            }
        );
        assert_eq!(
            settings.to_location().unwrap().path(),
            Path::new("/kvmnt/mycert")
        );
    }

    #[test]
    fn load_incomplete() {
        let file = settings_file(
            r#"{ "SecretSettings": { "KeyVaultVolMountPath": "/kvmnt" } }"#
        );
        let err = SecretSettings::load(file.path()).unwrap_err();
        assert_eq!(err.kind(), SettingsErrorKind::Missing);
        assert!(err.to_string().contains("CertificateSecretName"));

        let file = settings_file("{}");
        assert_eq!(
            SecretSettings::load(file.path()).unwrap_err().kind(),
            SettingsErrorKind::Missing
        );
    }

    #[test]
    fn load_malformed() {
        let file = settings_file(r#"{ "SecretSettings": "#);
        assert_eq!(
            SecretSettings::load(file.path()).unwrap_err().kind(),
            SettingsErrorKind::Format
        );
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appsettings.json");
        assert_eq!(
            SecretSettings::load(&path).unwrap_err().kind(),
            SettingsErrorKind::Missing
        );
        let settings = SecretSettings::from_lookup_or_file(&path, |name| {
            match name {
                "SECRET_MOUNT_PATH" => Some("/env".into()),
                "SECRET_NAME" => Some("envcert".into()),
                _ => None
            }
        }).unwrap();
        assert_eq!(settings.key_vault_vol_mount_path, Path::new("/env"));
        assert_eq!(settings.certificate_secret_name, "envcert");
    }

    #[test]
    fn environment_overrides() {
        let file = settings_file(FULL);
        let settings = SecretSettings::from_lookup_or_file(
            file.path(),
            |name| {
                match name {
                    "SECRET_NAME" => Some("other".into()),
                    "SECRET_MOUNT_PATH" => Some(String::new()),
                    _ => None
                }
            }
        ).unwrap();
        // Empty variables are ignored.
        assert_eq!(settings.key_vault_vol_mount_path, Path::new("/kvmnt"));
        assert_eq!(settings.certificate_secret_name, "other");
    }
}
