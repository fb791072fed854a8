use thiserror::Error;

/// Shared error surface for both the binary and text record types.
///
/// Not every variant applies to every caller; a `TxtRecord` will never
/// produce `ShortBuffer` and a `BinRecord` will never produce
/// `MalformedLine`, but giving both formats one `Result<_, RecordError>`
/// keeps accessor signatures uniform across the two encodings.
#[derive(Error, Debug, PartialEq)]
pub enum RecordError {
    #[error("accessor called on a record that has not been filled")]
    NotFilled,

    #[error("buffer too short: need at least {needed} bytes, got {got}")]
    ShortBuffer { needed: usize, got: usize },

    #[error("malformed line: expected at least 11 tab-separated fields, found {found}")]
    MalformedLine { found: usize },

    #[error("field `{0}` is missing")]
    Missing(&'static str),

    #[error("operation requires a mapped record")]
    Unmapped,

    #[error("no reference dictionary attached to this record")]
    NoReader,

    #[error("unknown auxiliary tag `{0}`")]
    UnknownTag(String),

    #[error("unknown auxiliary type byte 0x{0:02x}")]
    UnknownAuxType(u8),

    #[error("unsupported CIGAR operation `{0}` in alignment walk")]
    UnsupportedCigarOp(char),

    #[error("invalid hex byte array")]
    InvalidHex,

    #[error("invalid UTF-8 in record field")]
    Utf8,

    #[error("invalid integer in record field")]
    ParseInt,

    #[error("invalid float in record field")]
    ParseFloat,
}

impl From<std::str::Utf8Error> for RecordError {
    fn from(_: std::str::Utf8Error) -> Self {
        RecordError::Utf8
    }
}

impl From<std::num::ParseIntError> for RecordError {
    fn from(_: std::num::ParseIntError) -> Self {
        RecordError::ParseInt
    }
}

impl From<std::num::ParseFloatError> for RecordError {
    fn from(_: std::num::ParseFloatError) -> Self {
        RecordError::ParseFloat
    }
}
