#![no_main]

use certsecret::cert::Cert;
use certsecret::parser::{CertificateParser, DerParser};
use certsecret::util::base64;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let (which, data) = match data.split_first() {
        Some((first, data)) => (*first, data),
        None => return,
    };

    match which % 3 {
        0 => { let _ = Cert::decode(data); },
        1 => { let _ = DerParser.parse(data.to_vec().into(), None); },
        2 => {
            if let Ok(data) = base64::Secret.decode_bytes(data) {
                let _ = DerParser.parse(data.into(), None);
            }
        }
        _ => panic!("what?"),
    }
});
