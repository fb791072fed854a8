//! Small ASCII decoding helpers shared by both record types: decimal
//! field parsing and hex byte-array decoding for the `H` aux type.

use crate::error::RecordError;

fn as_str(bytes: &[u8]) -> Result<&str, RecordError> {
    Ok(std::str::from_utf8(bytes)?)
}

pub fn parse_u8(bytes: &[u8]) -> Result<u8, RecordError> {
    Ok(as_str(bytes)?.parse()?)
}

pub fn parse_u16(bytes: &[u8]) -> Result<u16, RecordError> {
    Ok(as_str(bytes)?.parse()?)
}

pub fn parse_u32(bytes: &[u8]) -> Result<u32, RecordError> {
    Ok(as_str(bytes)?.parse()?)
}

pub fn parse_i32(bytes: &[u8]) -> Result<i32, RecordError> {
    Ok(as_str(bytes)?.parse()?)
}

pub fn parse_i64(bytes: &[u8]) -> Result<i64, RecordError> {
    Ok(as_str(bytes)?.parse()?)
}

pub fn parse_f32(bytes: &[u8]) -> Result<f32, RecordError> {
    Ok(as_str(bytes)?.parse()?)
}

/// Decodes a run of hex-digit pairs (e.g. `b"DEADBEEF"`) into bytes.
/// Fails on an odd-length run or a non-hex-digit byte.
pub fn decode_hex(bytes: &[u8]) -> Result<Vec<u8>, RecordError> {
    if bytes.len() % 2 != 0 {
        return Err(RecordError::InvalidHex);
    }
    let mut out = Vec::with_capacity(bytes.len() / 2);
    for pair in bytes.chunks_exact(2) {
        let hi = hex_digit(pair[0])?;
        let lo = hex_digit(pair[1])?;
        out.push((hi << 4) | lo);
    }
    Ok(out)
}

fn hex_digit(b: u8) -> Result<u8, RecordError> {
    match b {
        b'0'..=b'9' => Ok(b - b'0'),
        b'a'..=b'f' => Ok(b - b'a' + 10),
        b'A'..=b'F' => Ok(b - b'A' + 10),
        _ => Err(RecordError::InvalidHex),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_signed_and_unsigned_decimals() {
        assert_eq!(parse_u32(b"99").unwrap(), 99);
        assert_eq!(parse_i32(b"-1").unwrap(), -1);
        assert_eq!(parse_i64(b"-42").unwrap(), -42);
    }

    #[test]
    fn decodes_hex_pairs() {
        assert_eq!(decode_hex(b"DEADBEEF").unwrap(), vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(decode_hex(b"deadbeef").unwrap(), vec![0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn rejects_odd_length_or_bad_digit() {
        assert!(decode_hex(b"ABC").is_err());
        assert!(decode_hex(b"ZZ").is_err());
    }
}
