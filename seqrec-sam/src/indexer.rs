//! Byte-range indexing of one TXT record line.
//!
//! A line is never eagerly split into owned `String`s; instead this
//! scans tab positions with `memchr` and records half-open byte ranges
//! into the original line buffer. The eleven mandatory fields always
//! get fixed slots; anything after the eleventh tab is one auxiliary
//! field per further tab-separated chunk.

use std::ops::Range;

use memchr::memchr;
use seqrec_common::error::RecordError;

pub const N_MANDATORY: usize = 11;

#[derive(Debug, Clone)]
pub struct LineIndex {
    pub mandatory: [Range<usize>; N_MANDATORY],
    pub aux: Vec<Range<usize>>,
}

impl LineIndex {
    /// An index with no fields, paired with an empty line buffer in an
    /// unfilled [`crate::record::TxtRecord`].
    pub fn empty() -> Self {
        LineIndex { mandatory: std::array::from_fn(|_| 0..0), aux: Vec::new() }
    }
}

/// Indexes `line`, a single record line with no trailing newline.
/// Fails with [`RecordError::MalformedLine`] if fewer than the eleven
/// mandatory tab-separated fields are present.
pub fn index(line: &[u8]) -> Result<LineIndex, RecordError> {
    let mut ranges = Vec::with_capacity(N_MANDATORY + 4);
    let mut start = 0usize;
    loop {
        match memchr(b'\t', &line[start..]) {
            Some(rel) => {
                let end = start + rel;
                ranges.push(start..end);
                start = end + 1;
            }
            None => {
                ranges.push(start..line.len());
                break;
            }
        }
    }

    if ranges.len() < N_MANDATORY {
        return Err(RecordError::MalformedLine { found: ranges.len() });
    }

    let mandatory: [Range<usize>; N_MANDATORY] = ranges[0..N_MANDATORY]
        .to_vec()
        .try_into()
        .map_err(|_| RecordError::MalformedLine { found: ranges.len() })?;
    let aux = ranges[N_MANDATORY..].to_vec();

    Ok(LineIndex { mandatory, aux })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexes_mandatory_fields_only() {
        let line = b"r1\t0\tchr1\t100\t60\t4M\t*\t0\t0\tACGT\tIIII";
        let idx = index(line).unwrap();
        assert_eq!(&line[idx.mandatory[0].clone()], b"r1");
        assert_eq!(&line[idx.mandatory[3].clone()], b"100");
        assert_eq!(&line[idx.mandatory[9].clone()], b"ACGT");
        assert!(idx.aux.is_empty());
    }

    #[test]
    fn indexes_trailing_aux_fields() {
        let line = b"r1\t0\tchr1\t100\t60\t4M\t*\t0\t0\tACGT\tIIII\tNM:i:0\tMD:Z:4";
        let idx = index(line).unwrap();
        assert_eq!(idx.aux.len(), 2);
        assert_eq!(&line[idx.aux[0].clone()], b"NM:i:0");
        assert_eq!(&line[idx.aux[1].clone()], b"MD:Z:4");
    }

    #[test]
    fn rejects_too_few_fields() {
        let line = b"r1\t0\tchr1";
        assert!(matches!(index(line), Err(RecordError::MalformedLine { found: 3 })));
    }
}
