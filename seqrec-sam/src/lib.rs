//! The text (SAM-style) alignment record: eleven mandatory
//! tab-separated fields plus trailing `TAG:TYPE:VALUE` auxiliary
//! fields, indexed by byte range rather than split into owned strings.

pub mod aux;
pub mod indexer;
pub mod record;

pub use aux::TxtAuxView;
pub use record::TxtRecord;
