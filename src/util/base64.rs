//! Handling of Base 64-encoded data.
//!
//! There are different dialects of Base 64 and applications place slight
//! differences atop those. This module provides structs that describe the
//! flavors of Base 64 used in a certain context, so you don’t have to
//! remember how exactly a value is encoded but just pick the context.
use std::str;
use base64::Engine;
use base64::engine::general_purpose::{GeneralPurpose, STANDARD};

pub use base64::DecodeError;


//------------ Secret --------------------------------------------------------

/// The flavor used for the content of secret files.
///
/// This uses the standard alphabet with padding. Secret stores frequently
/// end the file with a line feed or wrap long values over several lines,
/// so ASCII white space anywhere in the input is skipped during decoding.
/// A leading UTF-8 byte order mark is skipped, too. No white space is
/// added during encoding.
pub struct Secret;

impl Secret {
    const ENGINE: GeneralPurpose = STANDARD;

    pub fn decode(self, input: &str) -> Result<Vec<u8>, DecodeError> {
        self.decode_bytes(input.as_bytes())
    }

    /// Decodes the raw content of a file.
    ///
    /// Content that isn’t valid UTF-8 can’t be Base 64 and is reported as
    /// an invalid byte at the first offending position.
    pub fn decode_bytes(self, input: &[u8]) -> Result<Vec<u8>, DecodeError> {
        let input = input.strip_prefix(b"\xef\xbb\xbf").unwrap_or(input);
        if let Err(err) = str::from_utf8(input) {
            let pos = err.valid_up_to();
            return Err(DecodeError::InvalidByte(pos, input[pos]))
        }
        let stripped: Vec<u8> = input.iter().copied().filter(|ch| {
            !ch.is_ascii_whitespace()
        }).collect();
        Self::ENGINE.decode(stripped)
    }

    pub fn encode(self, data: &[u8]) -> String {
        Self::ENGINE.encode(data)
    }
}


//------------ Serde ---------------------------------------------------------

/// The flavor used for serialization of objects in this crate.
///
/// It uses the standard alphabet with padding and no white space allowed.
#[cfg(feature = "serde")]
pub struct Serde;

#[cfg(feature = "serde")]
impl Serde {
    const ENGINE: GeneralPurpose = STANDARD;

    pub fn encode(self, data: &[u8]) -> String {
        Self::ENGINE.encode(data)
    }
}


//============ Tests =========================================================
