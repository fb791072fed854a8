//! The CIGAR run-length model shared by the binary and text record types.
//!
//! Operation codes and the reference/sequence consumption rules below
//! follow SAM v1 section 1.4.6.

use crate::error::RecordError;

/// A single CIGAR operation.
///
/// Wire encoding (low 4 bits of the packed `u32` CIGAR word): `0 M  1 I
/// 2 D  3 N  4 S  5 H  6 P  7 =  8 X  9 B`. `Back` (`B`) is not part of
/// the standard SAM alphabet but is carried here because some BIN
/// producers emit it; it consumes neither reference nor sequence bases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CigarOp {
    Match,
    Insertion,
    Deletion,
    Skip,
    SoftClip,
    HardClip,
    Pad,
    SeqMatch,
    SeqMismatch,
    Back,
}

impl CigarOp {
    /// Decodes a wire op code (the low 4 bits of a packed CIGAR `u32`).
    pub fn from_code(code: u8) -> Result<Self, RecordError> {
        match code {
            0 => Ok(CigarOp::Match),
            1 => Ok(CigarOp::Insertion),
            2 => Ok(CigarOp::Deletion),
            3 => Ok(CigarOp::Skip),
            4 => Ok(CigarOp::SoftClip),
            5 => Ok(CigarOp::HardClip),
            6 => Ok(CigarOp::Pad),
            7 => Ok(CigarOp::SeqMatch),
            8 => Ok(CigarOp::SeqMismatch),
            9 => Ok(CigarOp::Back),
            other => Err(RecordError::UnsupportedCigarOp(other as char)),
        }
    }

    /// Decodes a CIGAR character as it appears in a TXT CIGAR string.
    pub fn from_symbol(symbol: u8) -> Result<Self, RecordError> {
        match symbol {
            b'M' => Ok(CigarOp::Match),
            b'I' => Ok(CigarOp::Insertion),
            b'D' => Ok(CigarOp::Deletion),
            b'N' => Ok(CigarOp::Skip),
            b'S' => Ok(CigarOp::SoftClip),
            b'H' => Ok(CigarOp::HardClip),
            b'P' => Ok(CigarOp::Pad),
            b'=' => Ok(CigarOp::SeqMatch),
            b'X' => Ok(CigarOp::SeqMismatch),
            b'B' => Ok(CigarOp::Back),
            other => Err(RecordError::UnsupportedCigarOp(other as char)),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            CigarOp::Match => 0,
            CigarOp::Insertion => 1,
            CigarOp::Deletion => 2,
            CigarOp::Skip => 3,
            CigarOp::SoftClip => 4,
            CigarOp::HardClip => 5,
            CigarOp::Pad => 6,
            CigarOp::SeqMatch => 7,
            CigarOp::SeqMismatch => 8,
            CigarOp::Back => 9,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            CigarOp::Match => 'M',
            CigarOp::Insertion => 'I',
            CigarOp::Deletion => 'D',
            CigarOp::Skip => 'N',
            CigarOp::SoftClip => 'S',
            CigarOp::HardClip => 'H',
            CigarOp::Pad => 'P',
            CigarOp::SeqMatch => '=',
            CigarOp::SeqMismatch => 'X',
            CigarOp::Back => 'B',
        }
    }

    /// `M, D, N, =, X` advance the reference coordinate.
    pub fn consumes_reference(self) -> bool {
        matches!(
            self,
            CigarOp::Match | CigarOp::Deletion | CigarOp::Skip | CigarOp::SeqMatch | CigarOp::SeqMismatch
        )
    }

    /// `M, I, S, =, X` advance the read/query coordinate.
    pub fn consumes_sequence(self) -> bool {
        matches!(
            self,
            CigarOp::Match | CigarOp::Insertion | CigarOp::SoftClip | CigarOp::SeqMatch | CigarOp::SeqMismatch
        )
    }
}

/// Packs an operation and run length into a BIN CIGAR `u32` word.
pub fn pack(op: CigarOp, len: u32) -> u32 {
    (len << 4) | u32::from(op.code())
}

/// Unpacks a BIN CIGAR `u32` word into (operation, run length).
pub fn unpack(word: u32) -> Result<(CigarOp, u32), RecordError> {
    let op = CigarOp::from_code((word & 0xF) as u8)?;
    Ok((op, word >> 4))
}

/// Sums the lengths of reference-consuming ops, i.e. the alignment's
/// footprint on the reference sequence.
pub fn align_length(ops: &[CigarOp], lens: &[u32]) -> i64 {
    ops.iter()
        .zip(lens.iter())
        .filter(|(op, _)| op.consumes_reference())
        .map(|(_, len)| i64::from(*len))
        .sum()
}

/// Renders a run-length list as a CIGAR string, e.g. `"8M2I4M1D3M"`.
pub fn render(ops: &[CigarOp], lens: &[u32]) -> String {
    let mut out = String::with_capacity(ops.len() * 4);
    for (op, len) in ops.iter().zip(lens.iter()) {
        out.push_str(itoa_u32(*len).as_str());
        out.push(op.symbol());
    }
    out
}

fn itoa_u32(mut v: u32) -> String {
    if v == 0 {
        return "0".to_string();
    }
    let mut buf = [0u8; 10];
    let mut i = buf.len();
    while v > 0 {
        i -= 1;
        buf[i] = b'0' + (v % 10) as u8;
        v /= 10;
    }
    // SAFETY: buf[i..] is composed entirely of ASCII digits.
    std::str::from_utf8(&buf[i..]).unwrap().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_round_trip() {
        for code in 0u8..=9 {
            let op = CigarOp::from_code(code).unwrap();
            let word = pack(op, 42);
            assert_eq!(unpack(word).unwrap(), (op, 42));
        }
    }

    #[test]
    fn render_matches_cigar_string() {
        let ops = vec![
            CigarOp::Match,
            CigarOp::Insertion,
            CigarOp::Match,
            CigarOp::Deletion,
            CigarOp::Match,
        ];
        let lens = vec![8, 2, 4, 1, 3];
        assert_eq!(render(&ops, &lens), "8M2I4M1D3M");
    }

    #[test]
    fn align_length_ignores_insertions_and_clips() {
        let ops = vec![CigarOp::SoftClip, CigarOp::Match, CigarOp::Insertion, CigarOp::Deletion];
        let lens = vec![5, 10, 3, 2];
        assert_eq!(align_length(&ops, &lens), 12);
    }

    #[test]
    fn unknown_code_is_an_error() {
        assert!(CigarOp::from_code(15).is_err());
        assert!(CigarOp::from_symbol(b'Q').is_err());
    }
}
