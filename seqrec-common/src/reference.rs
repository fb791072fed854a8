//! The back-reference contract a [`BinRecord`](../seqrec_bam/struct.BinRecord.html)
//! holds onto its reader for reference-name and reference-length lookups.
//!
//! This crate defines only the trait; a concrete, file-backed
//! implementation (reading the BIN/TXT header's reference list) is an
//! external collaborator, out of scope for the record model itself.

/// A reference-sequence name/length dictionary, indexed 1-based from the
/// record's perspective (0 is reserved for "unmapped").
pub trait ReferenceDictionary {
    /// Returns the name of reference `id`, or `None` if `id` is out of
    /// range.
    fn ref_name(&self, id: usize) -> Option<&str>;

    /// Returns the length of reference `id`, or `None` if `id` is out
    /// of range.
    fn ref_len(&self, id: usize) -> Option<i64>;
}

/// Lightweight in-memory [`ReferenceDictionary`] for tests in this crate
/// and downstream record crates.
pub mod testing {
    use super::ReferenceDictionary;

    /// A trivial in-memory dictionary for unit tests in downstream
    /// crates.
    pub struct StaticDictionary {
        names: Vec<String>,
        lens: Vec<i64>,
    }

    impl StaticDictionary {
        pub fn new(entries: Vec<(&str, i64)>) -> Self {
            Self {
                names: entries.iter().map(|(n, _)| n.to_string()).collect(),
                lens: entries.iter().map(|(_, l)| *l).collect(),
            }
        }
    }

    impl ReferenceDictionary for StaticDictionary {
        fn ref_name(&self, id: usize) -> Option<&str> {
            self.names.get(id).map(String::as_str)
        }

        fn ref_len(&self, id: usize) -> Option<i64> {
            self.lens.get(id).copied()
        }
    }
}
