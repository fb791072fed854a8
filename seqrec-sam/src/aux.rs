//! TXT auxiliary field parsing: `TAG:TYPE:VALUE`, decoded into the same
//! [`AuxValue`] the BIN encoding produces.

use std::ops::Range;

use fxhash::FxHashMap;
use memchr::memchr;
use seqrec_common::ascii;
use seqrec_common::aux::{AuxValue, Tag};
use seqrec_common::error::RecordError;

/// Parses one `TAG:TYPE:VALUE` auxiliary field, e.g. `b"NM:i:0"` or
/// `b"CG:B:I,70000,1"`.
pub fn parse_field(bytes: &[u8]) -> Result<(Tag, AuxValue), RecordError> {
    if bytes.len() < 5 || bytes[2] != b':' {
        return Err(RecordError::MalformedLine { found: bytes.len() });
    }
    let tag = Tag::new(bytes[0], bytes[1]);
    let rest = &bytes[3..];

    let second_colon = memchr(b':', rest).ok_or(RecordError::MalformedLine { found: rest.len() })?;
    let dtype = rest[0];
    if second_colon != 1 {
        return Err(RecordError::MalformedLine { found: rest.len() });
    }
    let value_bytes = &rest[2..];

    let value = match dtype {
        b'A' => {
            if value_bytes.is_empty() {
                return Err(RecordError::Missing("A value"));
            }
            AuxValue::Char(value_bytes[0] as char)
        }
        b'i' => AuxValue::Int(ascii::parse_i64(value_bytes)?),
        b'f' => AuxValue::Float(ascii::parse_f32(value_bytes)?),
        b'Z' => AuxValue::Str(String::from_utf8_lossy(value_bytes).into_owned()),
        b'H' => AuxValue::Hex(ascii::decode_hex(value_bytes)?),
        b'B' => parse_array(value_bytes)?,
        other => return Err(RecordError::UnknownAuxType(other)),
    };
    Ok((tag, value))
}

fn split_values(bytes: &[u8]) -> Vec<&[u8]> {
    if bytes.is_empty() {
        Vec::new()
    } else {
        bytes.split(|&b| b == b',').collect()
    }
}

fn parse_array(bytes: &[u8]) -> Result<AuxValue, RecordError> {
    if bytes.is_empty() {
        return Err(RecordError::Missing("B array subtype"));
    }
    let subtype = bytes[0];
    let rest = if bytes.len() > 1 { &bytes[2..] } else { &[][..] };
    let parts = split_values(rest);

    Ok(match subtype {
        b'c' => AuxValue::ArrayInt8(
            parts.iter().map(|p| ascii::parse_i32(p).map(|v| v as i8)).collect::<Result<_, _>>()?,
        ),
        b'C' => AuxValue::ArrayUInt8(parts.iter().map(|p| ascii::parse_u8(p)).collect::<Result<_, _>>()?),
        b's' => AuxValue::ArrayInt16(
            parts.iter().map(|p| ascii::parse_i32(p).map(|v| v as i16)).collect::<Result<_, _>>()?,
        ),
        b'S' => AuxValue::ArrayUInt16(parts.iter().map(|p| ascii::parse_u16(p)).collect::<Result<_, _>>()?),
        b'i' => AuxValue::ArrayInt32(parts.iter().map(|p| ascii::parse_i32(p)).collect::<Result<_, _>>()?),
        b'I' => AuxValue::ArrayUInt32(parts.iter().map(|p| ascii::parse_u32(p)).collect::<Result<_, _>>()?),
        b'f' => AuxValue::ArrayFloat32(parts.iter().map(|p| ascii::parse_f32(p)).collect::<Result<_, _>>()?),
        other => return Err(RecordError::UnknownAuxType(other)),
    })
}

/// Renders an aux field back to TXT form, e.g. `NM:i:0`.
pub fn render_field(tag: Tag, value: &AuxValue) -> String {
    format!("{tag}:{value}")
}

/// An ordered, indexed view over a line's trailing auxiliary fields,
/// mirroring [`crate::aux_view` in `seqrec-bam`](../../seqrec_bam/aux_view/struct.AuxView.html)'s
/// shape so both encodings expose the same lookup surface.
pub struct TxtAuxView {
    fields: Vec<(Tag, AuxValue, usize)>,
    index: FxHashMap<Tag, usize>,
}

impl TxtAuxView {
    /// Parses every auxiliary field named by `ranges` within `line`.
    pub fn parse(line: &[u8], ranges: &[Range<usize>]) -> Result<Self, RecordError> {
        let mut fields = Vec::with_capacity(ranges.len());
        for range in ranges {
            let (tag, value) = parse_field(&line[range.clone()])?;
            fields.push((tag, value, range.start));
        }
        let mut index = FxHashMap::default();
        for (i, (tag, _, _)) in fields.iter().enumerate() {
            index.entry(*tag).or_insert(i);
        }
        Ok(Self { fields, index })
    }

    pub fn has(&self, tag: Tag) -> bool {
        self.index.contains_key(&tag)
    }

    pub fn get(&self, tag: Tag) -> Result<&AuxValue, RecordError> {
        self.index
            .get(&tag)
            .map(|&i| &self.fields[i].1)
            .ok_or_else(|| RecordError::UnknownTag(tag.to_string()))
    }

    /// Byte offset of `tag` within the line this view was built from,
    /// or 0 if absent.
    pub fn find(&self, tag: Tag) -> usize {
        self.index.get(&tag).map(|&i| self.fields[i].2).unwrap_or(0)
    }

    pub fn keys(&self) -> impl Iterator<Item = Tag> + '_ {
        self.fields.iter().map(|(t, _, _)| *t)
    }

    pub fn values(&self) -> impl Iterator<Item = &AuxValue> + '_ {
        self.fields.iter().map(|(_, v, _)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_int_field() {
        let (tag, value) = parse_field(b"NM:i:0").unwrap();
        assert_eq!(tag, "NM");
        assert_eq!(value, AuxValue::Int(0));
    }

    #[test]
    fn parses_string_field() {
        let (_, value) = parse_field(b"MD:Z:4T0").unwrap();
        assert_eq!(value, AuxValue::Str("4T0".to_string()));
    }

    #[test]
    fn parses_cg_array_field() {
        let (tag, value) = parse_field(b"CG:B:I,70000,1").unwrap();
        assert_eq!(tag, "CG");
        assert_eq!(value, AuxValue::ArrayUInt32(vec![70000, 1]));
    }

    #[test]
    fn rejects_unknown_type() {
        assert!(parse_field(b"XX:Q:1").is_err());
    }

    #[test]
    fn round_trips_through_render() {
        let (tag, value) = parse_field(b"NM:i:3").unwrap();
        assert_eq!(render_field(tag, &value), "NM:i:3");
    }
}
