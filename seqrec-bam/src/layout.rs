//! BIN's packed fixed header and the offsets it implies for the
//! variable-length trailing payload (read name, CIGAR array, packed
//! sequence, quality, auxiliary blob).
//!
//! `data` is the byte range stored by [`crate::record::BinRecord`]: the
//! 32 fixed fields from `refid` through `tlen`, followed immediately by
//! the variable payload. This differs slightly from the textual offset
//! formulas in the originating note (which read as relative to the
//! *start of the variable payload*, not to `data[0]`); see DESIGN.md for
//! why this crate treats `data` as starting at `refid` instead and adds
//! the 32-byte fixed prefix to every offset below.

use byteorder::{ByteOrder, LittleEndian};
use seqrec_common::cigar::{self, CigarOp};
use seqrec_common::error::RecordError;

/// Size, in bytes, of the fixed fields `refid` through `tlen`.
pub const FIXED_HEADER_LEN: usize = 32;

/// The fixed, non-size header fields, parsed once per accessor call
/// from `data[0..32]`.
#[derive(Debug, Clone, Copy)]
pub struct Header {
    pub refid: i32,
    pub pos: i32,
    pub l_read_name: u8,
    pub mapq: u8,
    pub bin: u16,
    pub n_cigar_op: u16,
    pub flag: u16,
    pub l_seq: i32,
    pub next_refid: i32,
    pub next_pos: i32,
    pub tlen: i32,
}

impl Header {
    /// Parses the fixed header from the first 32 bytes of `data`.
    /// `data` must already be known to have at least that many bytes.
    pub fn parse(data: &[u8]) -> Header {
        Header {
            refid: LittleEndian::read_i32(&data[0..4]),
            pos: LittleEndian::read_i32(&data[4..8]),
            l_read_name: data[8],
            mapq: data[9],
            bin: LittleEndian::read_u16(&data[10..12]),
            n_cigar_op: LittleEndian::read_u16(&data[12..14]),
            flag: LittleEndian::read_u16(&data[14..16]),
            l_seq: LittleEndian::read_i32(&data[16..20]),
            next_refid: LittleEndian::read_i32(&data[20..24]),
            next_pos: LittleEndian::read_i32(&data[24..28]),
            tlen: LittleEndian::read_i32(&data[28..32]),
        }
    }

    pub fn name_offset(&self) -> usize {
        FIXED_HEADER_LEN
    }

    pub fn cigar_offset(&self) -> usize {
        self.name_offset() + self.l_read_name as usize
    }

    pub fn seq_offset(&self) -> usize {
        self.cigar_offset() + 4 * self.n_cigar_op as usize
    }

    pub fn qual_offset(&self) -> usize {
        self.seq_offset() + (self.l_seq.max(0) as usize + 1) / 2
    }

    pub fn aux_offset(&self) -> usize {
        self.qual_offset() + self.l_seq.max(0) as usize
    }
}

/// Validates that every computed offset falls within `data`, returning
/// the aux-region start on success.
pub fn validate(data: &[u8], header: &Header) -> Result<usize, RecordError> {
    let aux_offset = header.aux_offset();
    if aux_offset > data.len() || header.cigar_offset() > data.len() || header.seq_offset() > data.len() {
        return Err(RecordError::ShortBuffer {
            needed: aux_offset,
            got: data.len(),
        });
    }
    Ok(aux_offset)
}

/// Decodes the CIGAR operation array stored at the header's CIGAR
/// offset, exactly as recorded on the wire (no CG-escape resolution).
pub fn read_stored_cigar(data: &[u8], header: &Header) -> Result<(Vec<CigarOp>, Vec<u32>), RecordError> {
    let start = header.cigar_offset();
    let n = header.n_cigar_op as usize;
    let end = start + 4 * n;
    if end > data.len() {
        return Err(RecordError::ShortBuffer { needed: end, got: data.len() });
    }
    let mut ops = Vec::with_capacity(n);
    let mut lens = Vec::with_capacity(n);
    for i in 0..n {
        let word = LittleEndian::read_u32(&data[start + 4 * i..start + 4 * i + 4]);
        let (op, len) = cigar::unpack(word)?;
        ops.push(op);
        lens.push(len);
    }
    Ok((ops, lens))
}

/// Applies the CG-escape rule: if the stored CIGAR is the two-op
/// soft-clip/placeholder pair produced when a true CIGAR would overflow
/// the 16-bit `n_cigar_op` field, the real run-length list lives in the
/// `CG:B,I` auxiliary tag instead.
///
/// Falls back to the stored CIGAR whenever any precondition fails,
/// including a missing or wrongly-typed `CG` tag — this is a
/// best-effort escape, not a hard requirement.
pub fn resolve_cigar(
    data: &[u8],
    header: &Header,
    aux: &crate::aux_view::AuxView,
    check_cg: bool,
) -> Result<(Vec<CigarOp>, Vec<u32>), RecordError> {
    let stored = read_stored_cigar(data, header)?;
    if !check_cg || header.n_cigar_op != 2 {
        return Ok(stored);
    }

    let start = header.cigar_offset();
    let first_word = LittleEndian::read_u32(&data[start..start + 4]);
    let expected_first = ((header.l_seq.max(0) as u32) << 4) | 4;
    if first_word != expected_first {
        return Ok(stored);
    }

    match aux.get(seqrec_common::aux::Tag::new(b'C', b'G')) {
        Ok(seqrec_common::aux::AuxValue::ArrayUInt32(words)) => {
            log::trace!("CG-escape triggered, recovering {} true CIGAR ops", words.len());
            let mut ops = Vec::with_capacity(words.len());
            let mut lens = Vec::with_capacity(words.len());
            for &word in words {
                let (op, len) = cigar::unpack(word)?;
                ops.push(op);
                lens.push(len);
            }
            Ok((ops, lens))
        }
        _ => Ok(stored),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_header(l_read_name: u8, n_cigar_op: u16, l_seq: i32) -> Header {
        Header {
            refid: 0,
            pos: 0,
            l_read_name,
            mapq: 0,
            bin: 0,
            n_cigar_op,
            flag: 0,
            l_seq,
            next_refid: -1,
            next_pos: -1,
            tlen: 0,
        }
    }

    #[test]
    fn offsets_stack_in_order() {
        let header = minimal_header(6, 1, 10);
        assert_eq!(header.name_offset(), 32);
        assert_eq!(header.cigar_offset(), 38);
        assert_eq!(header.seq_offset(), 42);
        assert_eq!(header.qual_offset(), 47);
        assert_eq!(header.aux_offset(), 57);
    }
}
