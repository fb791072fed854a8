//! `TxtRecord`: an owned TXT alignment record line with a byte-range
//! index rather than eagerly split, owned field strings.

use std::sync::Weak;

use seqrec_common::aux::{AuxValue, Tag};
use seqrec_common::ascii;
use seqrec_common::cigar::{self, CigarOp};
use seqrec_common::error::RecordError;
use seqrec_common::reference::ReferenceDictionary;

use crate::aux::TxtAuxView;
use crate::indexer::{self, LineIndex};

const MANDATORY_QNAME: usize = 0;
const MANDATORY_FLAG: usize = 1;
const MANDATORY_RNAME: usize = 2;
const MANDATORY_POS: usize = 3;
const MANDATORY_MAPQ: usize = 4;
const MANDATORY_CIGAR: usize = 5;
const MANDATORY_RNEXT: usize = 6;
const MANDATORY_PNEXT: usize = 7;
const MANDATORY_TLEN: usize = 8;
const MANDATORY_SEQ: usize = 9;
const MANDATORY_QUAL: usize = 10;

/// An owned TXT alignment record: one tab-separated line plus a
/// sidecar byte-range index into it. Nothing is parsed until an
/// accessor asks for it.
pub struct TxtRecord {
    filled: bool,
    line: Vec<u8>,
    index: LineIndex,
    reader: Option<Weak<dyn ReferenceDictionary + Send + Sync>>,
}

impl TxtRecord {
    pub fn empty() -> Self {
        TxtRecord {
            filled: false,
            line: Vec::new(),
            index: LineIndex::empty(),
            reader: None,
        }
    }

    /// Indexes `line`, a single record line with no trailing newline.
    pub fn from_line(line: &[u8]) -> Result<Self, RecordError> {
        let index = indexer::index(line)?;
        Ok(TxtRecord { filled: true, line: line.to_vec(), index, reader: None })
    }

    pub fn clear(&mut self) {
        self.filled = false;
        self.line.clear();
        self.index = LineIndex::empty();
        self.reader = None;
    }

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

    fn field(&self, slot: usize) -> Result<&[u8], RecordError> {
        self.require_filled()?;
        Ok(&self.line[self.index.mandatory[slot].clone()])
    }

    fn field_str(&self, slot: usize) -> Result<&str, RecordError> {
        Ok(std::str::from_utf8(self.field(slot)?)?)
    }

    pub fn flag(&self) -> Result<u16, RecordError> {
        ascii::parse_u16(self.field(MANDATORY_FLAG)?)
    }

    pub fn is_mapped(&self) -> Result<bool, RecordError> {
        Ok(self.flag()? & 0x4 == 0)
    }

    pub fn is_primary(&self) -> Result<bool, RecordError> {
        Ok(self.flag()? & 0x900 == 0)
    }

    pub fn is_positive_strand(&self) -> Result<bool, RecordError> {
        Ok(self.flag()? & 0x10 == 0)
    }

    /// Requires a non-missing `qname`; fails `Missing` on `*`.
    pub fn template_name(&self) -> Result<String, RecordError> {
        if self.field(MANDATORY_QNAME)? == b"*" {
            return Err(RecordError::Missing("qname"));
        }
        Ok(self.field_str(MANDATORY_QNAME)?.to_string())
    }

    pub fn has_template_name(&self) -> Result<bool, RecordError> {
        Ok(self.field(MANDATORY_QNAME)? != b"*")
    }

    /// Requires a non-missing `rname`; fails `Missing` on `*`.
    pub fn refname(&self) -> Result<String, RecordError> {
        let raw = self.field_str(MANDATORY_RNAME)?;
        if raw == "*" {
            return Err(RecordError::Missing("rname"));
        }
        Ok(raw.to_string())
    }

    /// Requires a non-missing `rnext`; fails `Missing` on `*`. `=`
    /// resolves through `refname()`.
    pub fn next_refname(&self) -> Result<String, RecordError> {
        let raw = self.field_str(MANDATORY_RNEXT)?;
        if raw == "=" {
            return self.refname();
        }
        if raw == "*" {
            return Err(RecordError::Missing("rnext"));
        }
        Ok(raw.to_string())
    }

    pub fn position(&self) -> Result<i64, RecordError> {
        ascii::parse_i64(self.field(MANDATORY_POS)?)
    }

    pub fn has_position(&self) -> Result<bool, RecordError> {
        Ok(self.position()? != 0)
    }

    pub fn next_position(&self) -> Result<i64, RecordError> {
        ascii::parse_i64(self.field(MANDATORY_PNEXT)?)
    }

    pub fn template_length(&self) -> Result<i64, RecordError> {
        ascii::parse_i64(self.field(MANDATORY_TLEN)?)
    }

    fn mapq_value(&self) -> Result<u8, RecordError> {
        ascii::parse_u8(self.field(MANDATORY_MAPQ)?)
    }

    /// Fails `Missing` when the stored `mapq` is the sentinel `255`.
    pub fn mapping_quality(&self) -> Result<u8, RecordError> {
        let v = self.mapq_value()?;
        if v == 255 {
            Err(RecordError::Missing("mapq"))
        } else {
            Ok(v)
        }
    }

    pub fn has_mapping_quality(&self) -> Result<bool, RecordError> {
        Ok(self.mapq_value()? != 255)
    }

    /// The raw CIGAR string, e.g. `"8M2I4M1D3M"`, or `"*"` if absent.
    pub fn cigar(&self) -> Result<String, RecordError> {
        Ok(self.field_str(MANDATORY_CIGAR)?.to_string())
    }

    pub fn has_cigar(&self) -> Result<bool, RecordError> {
        Ok(self.field(MANDATORY_CIGAR)? != b"*")
    }

    /// Decodes the CIGAR string into a run-length op list.
    pub fn cigar_rle(&self) -> Result<(Vec<CigarOp>, Vec<u32>), RecordError> {
        let raw = self.field(MANDATORY_CIGAR)?;
        if raw == b"*" {
            return Ok((Vec::new(), Vec::new()));
        }
        let mut ops = Vec::new();
        let mut lens = Vec::new();
        let mut num_start = 0usize;
        for (i, &b) in raw.iter().enumerate() {
            if b.is_ascii_digit() {
                continue;
            }
            let len = ascii::parse_u32(&raw[num_start..i])?;
            let op = CigarOp::from_symbol(b)?;
            ops.push(op);
            lens.push(len);
            num_start = i + 1;
        }
        Ok((ops, lens))
    }

    pub fn align_length(&self) -> Result<i64, RecordError> {
        let (ops, lens) = self.cigar_rle()?;
        Ok(cigar::align_length(&ops, &lens))
    }

    pub fn sequence(&self) -> Result<Option<Vec<u8>>, RecordError> {
        let raw = self.field(MANDATORY_SEQ)?;
        if raw == b"*" {
            Ok(None)
        } else {
            Ok(Some(raw.to_vec()))
        }
    }

    pub fn has_sequence(&self) -> Result<bool, RecordError> {
        Ok(self.field(MANDATORY_SEQ)? != b"*")
    }

    pub fn seq_length(&self) -> Result<i64, RecordError> {
        Ok(match self.sequence()? {
            Some(seq) => seq.len() as i64,
            None => 0,
        })
    }

    /// Per-base Phred quality scores, decoded from the ASCII quality
    /// string (subtracting the `+33` offset). `None` if the field is
    /// `"*"`.
    pub fn quality(&self) -> Result<Option<Vec<u8>>, RecordError> {
        let raw = self.field(MANDATORY_QUAL)?;
        if raw == b"*" {
            Ok(None)
        } else {
            Ok(Some(raw.iter().map(|&q| q.saturating_sub(33)).collect()))
        }
    }

    /// The raw ASCII quality string exactly as stored, without the
    /// `+33` decode. `None` if the field is `"*"`.
    pub fn quality_string(&self) -> Result<Option<String>, RecordError> {
        let raw = self.field_str(MANDATORY_QUAL)?;
        if raw == "*" {
            Ok(None)
        } else {
            Ok(Some(raw.to_string()))
        }
    }

    fn aux_view(&self) -> Result<TxtAuxView, RecordError> {
        self.require_filled()?;
        TxtAuxView::parse(&self.line, &self.index.aux)
    }

    pub fn aux_data(&self) -> Result<TxtAuxView, RecordError> {
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

    /// The original line bytes, with no trailing newline.
    pub fn as_bytes(&self) -> Result<&[u8], RecordError> {
        self.require_filled()?;
        Ok(&self.line)
    }
}

impl PartialEq for TxtRecord {
    fn eq(&self, other: &Self) -> bool {
        self.filled == other.filled && self.line == other.line
    }
}

impl Clone for TxtRecord {
    fn clone(&self) -> Self {
        TxtRecord {
            filled: self.filled,
            line: self.line.clone(),
            index: self.index.clone(),
            reader: self.reader.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unfilled_record_fails_every_accessor() {
        let r = TxtRecord::empty();
        assert!(matches!(r.flag(), Err(RecordError::NotFilled)));
    }

    #[test]
    fn fully_specified_line() {
        let line = b"read1\t0\tchr1\t100\t60\t4M\t=\t100\t4\tACGT\tIIII\tNM:i:0";
        let rec = TxtRecord::from_line(line).unwrap();
        assert_eq!(rec.template_name().unwrap(), "read1");
        assert!(rec.is_mapped().unwrap());
        assert_eq!(rec.refname().unwrap(), "chr1");
        assert_eq!(rec.position().unwrap(), 100);
        assert_eq!(rec.next_refname().unwrap(), "chr1");
        assert_eq!(rec.mapping_quality().unwrap(), 60);
        assert_eq!(rec.cigar().unwrap(), "4M");
        assert_eq!(rec.align_length().unwrap(), 4);
        assert_eq!(rec.sequence().unwrap().unwrap(), b"ACGT");
        assert_eq!(rec.quality().unwrap().unwrap(), vec![40, 40, 40, 40]);
        assert_eq!(rec.get(Tag::new(b'N', b'M')).unwrap(), AuxValue::Int(0));
    }

    #[test]
    fn missing_fields_use_sentinels() {
        let line = b"*\t4\t*\t0\t255\t*\t*\t0\t0\t*\t*";
        let rec = TxtRecord::from_line(line).unwrap();
        assert!(!rec.has_template_name().unwrap());
        assert!(!rec.is_mapped().unwrap());
        assert!(rec.refname().is_err());
        assert!(!rec.has_position().unwrap());
        assert!(!rec.has_mapping_quality().unwrap());
        assert!(!rec.has_cigar().unwrap());
        assert!(rec.sequence().unwrap().is_none());
        assert!(rec.quality().unwrap().is_none());
    }

    #[test]
    fn aux_types_decode() {
        let line = b"r\t0\tchr1\t1\t0\t1M\t*\t0\t0\tA\tI\tXA:Z:hi\tCG:B:I,70000,1\tBB:H:DEAD";
        let rec = TxtRecord::from_line(line).unwrap();
        assert_eq!(rec.get(Tag::new(b'X', b'A')).unwrap(), AuxValue::Str("hi".to_string()));
        assert_eq!(rec.get(Tag::new(b'C', b'G')).unwrap(), AuxValue::ArrayUInt32(vec![70000, 1]));
        assert_eq!(rec.get(Tag::new(b'B', b'B')).unwrap(), AuxValue::Hex(vec![0xDE, 0xAD]));
    }

    #[test]
    fn rejects_too_few_fields() {
        assert!(TxtRecord::from_line(b"a\tb\tc").is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_base() -> impl Strategy<Value = char> {
        prop_oneof![Just('A'), Just('C'), Just('G'), Just('T'), Just('N')]
    }

    fn build_line(name: &str, pos: i64, mapped: bool, seq: &str) -> Vec<u8> {
        let flag = if mapped { 0 } else { 4 };
        let rname = if mapped { "chr1" } else { "*" };
        let qual: String = std::iter::repeat('I').take(seq.len()).collect();
        let seq_field = if seq.is_empty() { "*".to_string() } else { seq.to_string() };
        let qual_field = if seq.is_empty() { "*".to_string() } else { qual };
        format!("{name}\t{flag}\t{rname}\t{pos}\t40\t*\t*\t0\t0\t{seq_field}\t{qual_field}").into_bytes()
    }

    proptest! {
        #[test]
        fn round_trip_holds_for_arbitrary_lines(
            name in "[a-zA-Z0-9]{1,15}",
            pos in 0i64..10_000,
            mapped in any::<bool>(),
            seq in proptest::collection::vec(arb_base(), 0..20),
        ) {
            let seq_str: String = seq.into_iter().collect();
            let line = build_line(&name, pos, mapped, &seq_str);
            let rec = TxtRecord::from_line(&line).unwrap();

            prop_assert_eq!(rec.as_bytes().unwrap(), line.as_slice());
            prop_assert_eq!(rec.clone(), rec);
            prop_assert_eq!(rec.template_name().unwrap(), name);
            prop_assert_eq!(rec.is_mapped().unwrap(), mapped);

            if let (Some(q), Some(s)) = (rec.quality().unwrap(), rec.sequence().unwrap()) {
                prop_assert_eq!(q.len(), s.len());
            }
        }

        #[test]
        fn empty_then_refill_round_trips(
            name in "[a-zA-Z0-9]{1,10}",
            pos in 0i64..1000,
        ) {
            let line = build_line(&name, pos, true, "");
            let mut rec = TxtRecord::from_line(&line).unwrap();
            rec.clear();
            prop_assert!(!rec.is_filled());
            prop_assert!(matches!(rec.flag(), Err(RecordError::NotFilled)));

            rec = TxtRecord::from_line(&line).unwrap();
            prop_assert_eq!(rec.as_bytes().unwrap(), line.as_slice());
        }
    }
}
