//! The per-base anchor walk over a resolved CIGAR run-length list.

use seqrec_common::cigar::CigarOp;
use seqrec_common::error::RecordError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorOp {
    Start,
    Cigar(CigarOp),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub seq_pos: i64,
    pub ref_pos: i64,
    pub aln_pos: i64,
    pub op: AnchorOp,
}

/// Walks `ops`/`lens` base by base starting from 1-based reference
/// position `pos`, emitting one anchor per base plus a leading `Start`
/// anchor at `(0, pos - 1, 0)`.
///
/// Only match, insertion and deletion ops are legal here; anything else
/// (soft/hard clip, skip, pad, `=`/`X`, the internal `Back` op) fails
/// with [`RecordError::UnsupportedCigarOp`].
pub fn walk(pos: i64, ops: &[CigarOp], lens: &[u32]) -> Result<Vec<Anchor>, RecordError> {
    let mut anchors = Vec::with_capacity(1 + lens.iter().map(|&l| l as usize).sum::<usize>());
    anchors.push(Anchor {
        seq_pos: 0,
        ref_pos: pos - 1,
        aln_pos: 0,
        op: AnchorOp::Start,
    });

    let mut seq_pos = 0i64;
    let mut ref_pos = pos - 1;
    let mut aln_pos = 0i64;

    for (&op, &len) in ops.iter().zip(lens.iter()) {
        match op {
            CigarOp::Match | CigarOp::Insertion | CigarOp::Deletion => {}
            other => return Err(RecordError::UnsupportedCigarOp(op_symbol(other))),
        }
        for _ in 0..len {
            if op.consumes_sequence() {
                seq_pos += 1;
            }
            if op.consumes_reference() {
                ref_pos += 1;
            }
            aln_pos += 1;
            anchors.push(Anchor {
                seq_pos,
                ref_pos,
                aln_pos,
                op: AnchorOp::Cigar(op),
            });
        }
    }
    Ok(anchors)
}

fn op_symbol(op: CigarOp) -> char {
    op.symbol()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_anchor_precedes_walk() {
        let anchors = walk(10, &[CigarOp::Match], &[3]).unwrap();
        assert_eq!(anchors[0], Anchor { seq_pos: 0, ref_pos: 9, aln_pos: 0, op: AnchorOp::Start });
        assert_eq!(anchors.len(), 4);
        assert_eq!(anchors[3].ref_pos, 12);
        assert_eq!(anchors[3].seq_pos, 3);
    }

    #[test]
    fn insertion_advances_seq_only() {
        let anchors = walk(1, &[CigarOp::Insertion], &[2]).unwrap();
        assert_eq!(anchors[2].seq_pos, 2);
        assert_eq!(anchors[2].ref_pos, 0);
    }

    #[test]
    fn deletion_advances_ref_only() {
        let anchors = walk(1, &[CigarOp::Deletion], &[2]).unwrap();
        assert_eq!(anchors[2].seq_pos, 0);
        assert_eq!(anchors[2].ref_pos, 2);
    }

    #[test]
    fn soft_clip_is_unsupported() {
        assert!(walk(1, &[CigarOp::SoftClip], &[3]).is_err());
    }
}
