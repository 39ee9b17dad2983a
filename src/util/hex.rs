//! Converting octet sequences into hex strings.

use std::fmt;


/// Encodes an octet sequence as an upper case hex string.
pub fn encode(src: &[u8]) -> String {
    let mut res = String::with_capacity(src.len() * 2);
    for &ch in src {
        let [high, low] = encode_u8(ch);
        res.push(char::from(high));
        res.push(char::from(low));
    }
    res
}

/// Encodes a single octet as two upper case hex digits.
pub fn encode_u8(ch: u8) -> [u8; 2] {
    [DIGITS[usize::from(ch >> 4)], DIGITS[usize::from(ch & 0x0F)]]
}

/// Writes an octet sequence as upper case hex into a formatter.
pub fn write(src: &[u8], f: &mut fmt::Formatter) -> fmt::Result {
    for &ch in src {
        let [high, low] = encode_u8(ch);
        write!(f, "{}{}", char::from(high), char::from(low))?;
    }
    Ok(())
}

const DIGITS: &[u8] = b"0123456789ABCDEF";


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn encode_octets() {
        assert_eq!(encode(b""), "");
        assert_eq!(encode(b"\x00\x0f\xa5\xff"), "000FA5FF");
        assert_eq!(encode_u8(0x3c), *b"3C");
    }
}
