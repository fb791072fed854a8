//! `BinRecord`: an owned BIN alignment record with offset-computed,
//! on-demand accessors rather than eagerly parsed fields.

use std::sync::Weak;

use byteorder::{ByteOrder, LittleEndian};
use seqrec_common::aux::{AuxValue, Tag};
use seqrec_common::cigar::{self, CigarOp};
use seqrec_common::error::RecordError;
use seqrec_common::reference::ReferenceDictionary;

use crate::alignment::{self, Anchor};
use crate::aux_view::AuxView;
use crate::layout::{self, Header, FIXED_HEADER_LEN};
use crate::sequence::FourBitSeq;

const FLAG_UNMAPPED: u16 = 0x4;
const FLAG_REVERSE: u16 = 0x10;
const FLAG_SECONDARY: u16 = 0x100;
const FLAG_SUPPLEMENTARY: u16 = 0x800;

/// An owned BIN alignment record.
///
/// `data` holds the 32 fixed fields (`refid` through `tlen`) followed by
/// the variable payload, i.e. exactly `block_size` bytes. An unfilled
/// record (`BinRecord::empty`) has no data at all; every accessor fails
/// with [`RecordError::NotFilled`] until [`BinRecord::from_bytes`] (or a
/// future `fill_from`) populates it.
pub struct BinRecord {
    filled: bool,
    data: Vec<u8>,
    reader: Option<Weak<dyn ReferenceDictionary + Send + Sync>>,
}

impl BinRecord {
    pub fn empty() -> Self {
        BinRecord { filled: false, data: Vec::new(), reader: None }
    }

    /// Parses one record from `buf`, which must start with the 4-byte
    /// `block_size` field. Trailing bytes in `buf` beyond this record
    /// are ignored by the caller, not by this constructor: `buf` is
    /// expected to be exactly one record's bytes.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, RecordError> {
        if buf.len() < 36 {
            log::debug!("BIN record buffer too short for fixed header: {} bytes", buf.len());
            return Err(RecordError::ShortBuffer { needed: 36, got: buf.len() });
        }
        let block_size = LittleEndian::read_i32(&buf[0..4]);
        if block_size < FIXED_HEADER_LEN as i32 {
            return Err(RecordError::ShortBuffer { needed: FIXED_HEADER_LEN, got: block_size.max(0) as usize });
        }
        let total_needed = 4 + block_size as usize;
        if buf.len() < total_needed {
            log::debug!(
                "BIN record buffer too short for declared block_size {}: have {}, need {}",
                block_size,
                buf.len(),
                total_needed
            );
            return Err(RecordError::ShortBuffer { needed: total_needed, got: buf.len() });
        }
        let data = buf[4..total_needed].to_vec();
        let header = Header::parse(&data);
        layout::validate(&data, &header)?;
        Ok(BinRecord { filled: true, data, reader: None })
    }

    /// Resets this record to the unfilled state, releasing its buffer.
    pub fn clear(&mut self) {
        self.filled = false;
        self.data.clear();
        self.reader = None;
    }

    /// Attaches a weak, non-owning link to a reference dictionary for
    /// `refname`/`reflen`/`next_refname` lookups. Does not keep the
    /// dictionary alive.
    pub fn attach_reader(&mut self, reader: Weak<dyn ReferenceDictionary + Send + Sync>) {
        self.reader = Some(reader);
    }

    pub fn is_filled(&self) -> bool {
        self.filled
    }

    fn require_filled(&self) -> Result<(), RecordError> {
        if self.filled {
            Ok(())
        } else {
            Err(RecordError::NotFilled)
        }
    }

    fn header(&self) -> Result<Header, RecordError> {
        self.require_filled()?;
        Ok(Header::parse(&self.data))
    }

    fn aux_bytes(&self) -> Result<&[u8], RecordError> {
        let header = self.header()?;
        Ok(&self.data[header.aux_offset()..])
    }

    pub fn flag(&self) -> Result<u16, RecordError> {
        Ok(self.header()?.flag)
    }

    pub fn is_mapped(&self) -> Result<bool, RecordError> {
        Ok(self.flag()? & FLAG_UNMAPPED == 0)
    }

    pub fn is_primary(&self) -> Result<bool, RecordError> {
        Ok(self.flag()? & (FLAG_SECONDARY | FLAG_SUPPLEMENTARY) == 0)
    }

    pub fn is_positive_strand(&self) -> Result<bool, RecordError> {
        Ok(self.flag()? & FLAG_REVERSE == 0)
    }

    pub fn refid(&self) -> Result<i64, RecordError> {
        Ok(i64::from(self.header()?.refid) + 1)
    }

    pub fn refname(&self) -> Result<String, RecordError> {
        let id = self.refid()?;
        if id == 0 {
            return Err(RecordError::Unmapped);
        }
        let reader = self.reader.as_ref().and_then(Weak::upgrade).ok_or(RecordError::NoReader)?;
        reader.ref_name((id - 1) as usize).map(str::to_string).ok_or(RecordError::Unmapped)
    }

    pub fn reflen(&self) -> Result<i64, RecordError> {
        let id = self.refid()?;
        if id == 0 {
            return Err(RecordError::Unmapped);
        }
        let reader = self.reader.as_ref().and_then(Weak::upgrade).ok_or(RecordError::NoReader)?;
        reader.ref_len((id - 1) as usize).ok_or(RecordError::Unmapped)
    }

    pub fn position(&self) -> Result<i64, RecordError> {
        Ok(i64::from(self.header()?.pos) + 1)
    }

    pub fn has_position(&self) -> Result<bool, RecordError> {
        Ok(self.position()? != 0)
    }

    pub fn right_position(&self) -> Result<i64, RecordError> {
        Ok(self.position()? + self.align_length()? - 1)
    }

    pub fn next_refid(&self) -> Result<i64, RecordError> {
        Ok(i64::from(self.header()?.next_refid) + 1)
    }

    pub fn next_position(&self) -> Result<i64, RecordError> {
        Ok(i64::from(self.header()?.next_pos) + 1)
    }

    pub fn mapping_quality(&self) -> Result<u8, RecordError> {
        Ok(self.header()?.mapq)
    }

    pub fn has_mapping_quality(&self) -> Result<bool, RecordError> {
        Ok(self.mapping_quality()? != 255)
    }

    pub fn template_length(&self) -> Result<i64, RecordError> {
        Ok(i64::from(self.header()?.tlen))
    }

    pub fn template_name(&self) -> Result<String, RecordError> {
        let header = self.header()?;
        let start = FIXED_HEADER_LEN;
        let len = header.l_read_name as usize;
        let raw = &self.data[start..start + len];
        let trimmed = if len > 0 { &raw[..len - 1] } else { raw };
        Ok(String::from_utf8_lossy(trimmed).into_owned())
    }

    pub fn has_template_name(&self) -> Result<bool, RecordError> {
        Ok(!self.template_name()?.is_empty())
    }

    /// Decoded run-length CIGAR. With `check_cg` set, applies the
    /// CG-escape rule when the stored CIGAR is a placeholder.
    pub fn cigar_rle(&self, check_cg: bool) -> Result<(Vec<CigarOp>, Vec<u32>), RecordError> {
        let header = self.header()?;
        if check_cg {
            let aux = self.aux_view()?;
            layout::resolve_cigar(&self.data, &header, &aux, true)
        } else {
            layout::read_stored_cigar(&self.data, &header)
        }
    }

    pub fn cigar(&self, check_cg: bool) -> Result<String, RecordError> {
        let (ops, lens) = self.cigar_rle(check_cg)?;
        Ok(cigar::render(&ops, &lens))
    }

    pub fn n_cigar_op(&self, check_cg: bool) -> Result<u32, RecordError> {
        Ok(self.cigar_rle(check_cg)?.0.len() as u32)
    }

    /// Alignment footprint on the reference, always computed from the
    /// *stored* CIGAR (bypassing CG-escape), matching `right_position`'s
    /// use of it.
    pub fn align_length(&self) -> Result<i64, RecordError> {
        let header = self.header()?;
        let (ops, lens) = layout::read_stored_cigar(&self.data, &header)?;
        Ok(cigar::align_length(&ops, &lens))
    }

    pub fn alignment(&self) -> Result<Vec<Anchor>, RecordError> {
        if !self.is_mapped()? {
            return Ok(Vec::new());
        }
        let (ops, lens) = self.cigar_rle(true)?;
        alignment::walk(self.position()?, &ops, &lens)
    }

    pub fn seq_length(&self) -> Result<i64, RecordError> {
        Ok(i64::from(self.header()?.l_seq))
    }

    pub fn sequence(&self) -> Result<Option<FourBitSeq>, RecordError> {
        let header = self.header()?;
        let start = header.seq_offset();
        let end = header.qual_offset();
        Ok(FourBitSeq::from_wire(&self.data[start..end], header.l_seq.max(0) as usize))
    }

    pub fn has_sequence(&self) -> Result<bool, RecordError> {
        Ok(self.seq_length()? > 0)
    }

    /// Per-base quality scores, or `None` if every byte is the 0xFF
    /// fill value BAM writers use for "no quality".
    pub fn quality(&self) -> Result<Option<Vec<u8>>, RecordError> {
        let header = self.header()?;
        let start = header.qual_offset();
        let end = header.aux_offset();
        let raw = &self.data[start..end];
        if raw.iter().all(|&q| q == 0xFF) {
            Ok(None)
        } else {
            Ok(Some(raw.to_vec()))
        }
    }

    fn aux_view(&self) -> Result<AuxView, RecordError> {
        AuxView::parse(self.aux_bytes()?)
    }

    pub fn aux_data(&self) -> Result<AuxView, RecordError> {
        self.aux_view()
    }

    pub fn get(&self, tag: Tag) -> Result<AuxValue, RecordError> {
        self.aux_view()?.get(tag).map(AuxValue::clone)
    }

    pub fn has(&self, tag: Tag) -> Result<bool, RecordError> {
        Ok(self.aux_view()?.has(tag))
    }

    pub fn keys(&self) -> Result<Vec<Tag>, RecordError> {
        Ok(self.aux_view()?.keys().collect())
    }

    pub fn values(&self) -> Result<Vec<AuxValue>, RecordError> {
        Ok(self.aux_view()?.values().cloned().collect())
    }

    /// Re-serializes this record to its original wire bytes
    /// (`block_size` followed by `data`).
    pub fn to_bytes(&self) -> Result<Vec<u8>, RecordError> {
        self.require_filled()?;
        let mut out = Vec::with_capacity(4 + self.data.len());
        out.extend_from_slice(&(self.data.len() as i32).to_le_bytes());
        out.extend_from_slice(&self.data);
        Ok(out)
    }
}

impl PartialEq for BinRecord {
    fn eq(&self, other: &Self) -> bool {
        self.filled == other.filled && self.data == other.data
    }
}

impl Clone for BinRecord {
    fn clone(&self) -> Self {
        BinRecord { filled: self.filled, data: self.data.clone(), reader: self.reader.clone() }
    }
}
