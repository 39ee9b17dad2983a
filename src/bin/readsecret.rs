//! Reading a certificate from a mounted secret.

use std::path::PathBuf;
use certsecret::crypto::DigestAlgorithm;
use certsecret::loader::{CertificateSecretLoader, SecretLocation};
use certsecret::parser::Pkcs12Parser;
use certsecret::settings::SecretSettings;
use structopt::StructOpt;


//------------ main ----------------------------------------------------------

fn main() {
    if let Err(()) = ReadSecret::from_args().run() {
        std::process::exit(1)
    }
}


//------------ ReadSecret ----------------------------------------------------

#[derive(StructOpt)]
#[structopt(
    name="readsecret",
    about="Loads a certificate from a mounted secret volume."
)]
struct ReadSecret {
    /// The settings file to use if no location is given.
    #[structopt(long, default_value="appsettings.json", parse(from_os_str))]
    settings: PathBuf,

    /// Use SHA-256 rather than SHA-1 for the thumbprint.
    #[structopt(long)]
    sha256: bool,

    /// The password if the secret is a protected PKCS #12 container.
    #[structopt(long)]
    password: Option<String>,

    /// Print the result as JSON.
    #[structopt(long)]
    json: bool,

    /// The path where the secret volume is mounted.
    #[structopt(parse(from_os_str), requires="secret-name")]
    mount_path: Option<PathBuf>,

    /// The name of the secret holding the certificate.
    secret_name: Option<String>,
}

impl ReadSecret {
    fn run(self) -> Result<(), ()> {
        let settings = self.settings()?;
        println!(
            "Mount path: {}",
            settings.key_vault_vol_mount_path.display()
        );
        println!("Secret name: {}", settings.certificate_secret_name);

        let location = match settings.to_location() {
            Ok(location) => location,
            Err(err) => {
                eprintln!("{:?}: {}", err.kind(), err.message());
                return Err(())
            }
        };
        println!("Reading certificate from {}", location);

        let algorithm = if self.sha256 {
            DigestAlgorithm::Sha256
        }
        else {
            DigestAlgorithm::Sha1
        };
        self.load(&location, algorithm)
    }

    fn settings(&self) -> Result<SecretSettings, ()> {
        if let (Some(path), Some(name)) = (
            self.mount_path.as_ref(), self.secret_name.as_ref()
        ) {
            return Ok(SecretSettings {
                key_vault_vol_mount_path: path.clone(),
                certificate_secret_name: name.clone(),
            })
        }
        SecretSettings::from_env_or_file(&self.settings).map_err(|err| {
            eprintln!("Cannot load settings: {}", err);
        })
    }

    fn load(
        &self, location: &SecretLocation, algorithm: DigestAlgorithm
    ) -> Result<(), ()> {
        let mut loader = CertificateSecretLoader::with_parser(Pkcs12Parser)
            .thumbprint_algorithm(algorithm);
        if let Some(password) = self.password.as_ref() {
            loader = loader.password(password.as_str());
        }
        let cert = match loader.load_location(location) {
            Ok(cert) => cert,
            Err(err) => {
                eprintln!("{:?}: {}", err.kind(), err.message());
                return Err(())
            }
        };

        if self.json {
            match serde_json::to_string_pretty(&cert) {
                Ok(json) => println!("{}", json),
                Err(err) => {
                    eprintln!("Cannot serialize certificate: {}", err);
                    return Err(())
                }
            }
        }
        else {
            println!("Subject: {}", cert.subject_name());
            println!("Issuer: {}", cert.issuer_name());
            println!("Serial number: {}", cert.serial_number());
            println!(
                "Thumbprint ({}): {}",
                cert.thumbprint().algorithm(), cert.thumbprint()
            );
            println!("Not before: {}", cert.not_before());
            println!("Not after: {}", cert.not_after());
            if let Err(err) = cert.validity().verify() {
                println!("Warning: {}", err);
            }
        }
        Ok(())
    }
}
