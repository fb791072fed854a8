//! Shared model for the BIN and TXT alignment record encodings: the
//! CIGAR run-length model, the typed auxiliary tag value, the error
//! taxonomy both record types raise, the reference-dictionary
//! back-reference contract, and small ASCII decoding helpers.

pub mod ascii;
pub mod aux;
pub mod cigar;
pub mod error;
pub mod reference;

pub use aux::{AuxValue, Tag};
pub use cigar::CigarOp;
pub use error::RecordError;
pub use reference::ReferenceDictionary;
