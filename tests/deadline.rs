//! Loading certificate secrets with a deadline.

use std::fs;
use std::time::Duration;
use certsecret::{CertificateSecretLoader, ErrorKind};

const CONTOSO_B64: &[u8] = include_bytes!("../test-data/contoso.b64");

#[tokio::test]
async fn load_before_deadline() {
    let volume = tempfile::tempdir().unwrap();
    fs::write(volume.path().join("contoso"), CONTOSO_B64).unwrap();

    let loader = CertificateSecretLoader::new();
    let cert = loader.load_with_deadline(
        volume.path(), "contoso", Duration::from_secs(10)
    ).await.unwrap();
    assert_eq!(
        cert.thumbprint().as_str(),
        "4B2C4DF7D22F92E0F5639E75B0DC47008F14ACA2"
    );
    assert_eq!(cert, loader.load(volume.path(), "contoso").unwrap());
}

#[tokio::test]
async fn failures_keep_their_kind() {
    let volume = tempfile::tempdir().unwrap();
    fs::write(volume.path().join("bad"), "not-base64!!").unwrap();
    let loader = CertificateSecretLoader::new();
    let deadline = Duration::from_secs(10);

    assert_eq!(
        loader.load_with_deadline(volume.path(), "missing", deadline)
            .await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        loader.load_with_deadline(volume.path(), "../bad", deadline)
            .await.unwrap_err().kind(),
        ErrorKind::InvalidName
    );
    assert_eq!(
        loader.load_with_deadline(volume.path(), "bad", deadline)
            .await.unwrap_err().kind(),
        ErrorKind::DecodeError
    );
}
