//! A borrowing-flavored decode of the BIN auxiliary blob: unlike the
//! eager `Vec<BamAuxField>` an older parser would build, this keeps
//! insertion order and offers O(1) lookup by tag without forcing every
//! caller to pay for fields they never read.
//!
//! Decoding still happens once per call (there is no unsafe borrowing
//! of `data` across accessor calls) but the result itself behaves like
//! a small ordered map plus an index.

use fxhash::FxHashMap;
use nom::bytes::complete::{take, take_until};
use nom::multi::count;
use nom::number::complete::{le_f32, le_i16, le_i32, le_i8, le_u16, le_u32, le_u8};
use nom::IResult;
use seqrec_common::ascii;
use seqrec_common::aux::{AuxValue, Tag};
use seqrec_common::error::RecordError;

pub struct AuxView {
    fields: Vec<(Tag, AuxValue, usize)>,
    index: FxHashMap<Tag, usize>,
}

impl AuxView {
    /// Decodes every field in `bytes`, which must be exactly the
    /// auxiliary blob (no trailing garbage beyond the last field).
    pub fn parse(bytes: &[u8]) -> Result<Self, RecordError> {
        let mut fields = Vec::new();
        let mut rest = bytes;
        while !rest.is_empty() {
            let offset = bytes.len() - rest.len();
            let ((tag, value), next) = parse_one(rest)?;
            fields.push((tag, value, offset));
            rest = next;
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

    /// Byte offset of `tag` within the blob this view was built from,
    /// or 0 if `tag` is absent.
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

fn req<'a, O>(r: IResult<&'a [u8], O>) -> Result<(O, &'a [u8]), RecordError> {
    match r {
        Ok((rest, val)) => Ok((val, rest)),
        Err(_) => Err(RecordError::ShortBuffer { needed: 1, got: 0 }),
    }
}

fn parse_one(input: &[u8]) -> Result<((Tag, AuxValue), &[u8]), RecordError> {
    let (tag_bytes, rest) = req(take::<_, _, nom::error::Error<&[u8]>>(2usize)(input))?;
    let tag = Tag::new(tag_bytes[0], tag_bytes[1]);
    let (dtype_bytes, rest) = req(take::<_, _, nom::error::Error<&[u8]>>(1usize)(rest))?;
    let dtype = dtype_bytes[0];
    let (value, rest) = parse_value(dtype, rest)?;
    Ok(((tag, value), rest))
}

fn parse_value(dtype: u8, rest: &[u8]) -> Result<(AuxValue, &[u8]), RecordError> {
    Ok(match dtype {
        b'A' => {
            let (v, r) = req(le_u8(rest))?;
            (AuxValue::Char(v as char), r)
        }
        b'c' => {
            let (v, r) = req(le_i8(rest))?;
            (AuxValue::Int(v as i64), r)
        }
        b'C' => {
            let (v, r) = req(le_u8(rest))?;
            (AuxValue::Int(v as i64), r)
        }
        b's' => {
            let (v, r) = req(le_i16(rest))?;
            (AuxValue::Int(v as i64), r)
        }
        b'S' => {
            let (v, r) = req(le_u16(rest))?;
            (AuxValue::Int(v as i64), r)
        }
        b'i' => {
            let (v, r) = req(le_i32(rest))?;
            (AuxValue::Int(v as i64), r)
        }
        b'I' => {
            let (v, r) = req(le_u32(rest))?;
            (AuxValue::Int(v as i64), r)
        }
        b'f' => {
            let (v, r) = req(le_f32(rest))?;
            (AuxValue::Float(v), r)
        }
        b'Z' => {
            let (bytes, r) = req(take_until::<_, _, nom::error::Error<&[u8]>>(&b"\0"[..])(rest))?;
            let (_, r) = req(take::<_, _, nom::error::Error<&[u8]>>(1usize)(r))?;
            (AuxValue::Str(String::from_utf8_lossy(bytes).into_owned()), r)
        }
        b'H' => {
            let (bytes, r) = req(take_until::<_, _, nom::error::Error<&[u8]>>(&b"\0"[..])(rest))?;
            let (_, r) = req(take::<_, _, nom::error::Error<&[u8]>>(1usize)(r))?;
            (AuxValue::Hex(ascii::decode_hex(bytes)?), r)
        }
        b'B' => parse_array(rest)?,
        other => return Err(RecordError::UnknownAuxType(other)),
    })
}

fn parse_array(rest: &[u8]) -> Result<(AuxValue, &[u8]), RecordError> {
    let (elem_bytes, rest) = req(take::<_, _, nom::error::Error<&[u8]>>(1usize)(rest))?;
    let elem = elem_bytes[0];
    let (len, rest) = req(le_u32(rest))?;
    let len = len as usize;
    Ok(match elem {
        b'c' => {
            let (v, r) = req(count(le_i8, len)(rest))?;
            (AuxValue::ArrayInt8(v), r)
        }
        b'C' => {
            let (v, r) = req(count(le_u8, len)(rest))?;
            (AuxValue::ArrayUInt8(v), r)
        }
        b's' => {
            let (v, r) = req(count(le_i16, len)(rest))?;
            (AuxValue::ArrayInt16(v), r)
        }
        b'S' => {
            let (v, r) = req(count(le_u16, len)(rest))?;
            (AuxValue::ArrayUInt16(v), r)
        }
        b'i' => {
            let (v, r) = req(count(le_i32, len)(rest))?;
            (AuxValue::ArrayInt32(v), r)
        }
        b'I' => {
            let (v, r) = req(count(le_u32, len)(rest))?;
            (AuxValue::ArrayUInt32(v), r)
        }
        b'f' => {
            let (v, r) = req(count(le_f32, len)(rest))?;
            (AuxValue::ArrayFloat32(v), r)
        }
        other => return Err(RecordError::UnknownAuxType(other)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nm_field(value: i32) -> Vec<u8> {
        let mut buf = vec![b'N', b'M', b'i'];
        buf.extend_from_slice(&value.to_le_bytes());
        buf
    }

    #[test]
    fn decodes_single_int_field() {
        let bytes = nm_field(3);
        let view = AuxView::parse(&bytes).unwrap();
        assert!(view.has(Tag::new(b'N', b'M')));
        assert_eq!(view.get(Tag::new(b'N', b'M')).unwrap(), &AuxValue::Int(3));
        assert_eq!(view.find(Tag::new(b'N', b'M')), 0);
    }

    #[test]
    fn decodes_cg_uint32_array() {
        let mut bytes = vec![b'C', b'G', b'B', b'I'];
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&100u32.to_le_bytes());
        bytes.extend_from_slice(&4u32.to_le_bytes());
        let view = AuxView::parse(&bytes).unwrap();
        match view.get(Tag::new(b'C', b'G')).unwrap() {
            AuxValue::ArrayUInt32(v) => assert_eq!(v, &vec![100, 4]),
            other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn missing_tag_has_zero_offset() {
        let bytes = nm_field(3);
        let view = AuxView::parse(&bytes).unwrap();
        assert_eq!(view.find(Tag::new(b'X', b'X')), 0);
        assert!(view.get(Tag::new(b'X', b'X')).is_err());
    }

    #[test]
    fn unknown_type_errors() {
        let bytes = vec![b'N', b'M', b'?', 1];
        assert!(AuxView::parse(&bytes).is_err());
    }
}
