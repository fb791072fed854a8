//! The binary (BAM-style) alignment record: a 36-byte fixed header
//! followed by a variable payload, decoded lazily from an owned buffer
//! rather than eagerly parsed into a field-by-field struct.

pub mod alignment;
pub mod aux_view;
pub mod layout;
pub mod record;
pub mod sequence;

pub use alignment::{Anchor, AnchorOp};
pub use aux_view::AuxView;
pub use record::BinRecord;
pub use sequence::FourBitSeq;
