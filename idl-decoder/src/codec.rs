//! Schema-driven borsh reader.
//!
//! Fixed-width numerics are little-endian, strings / bytes / vectors carry a
//! 4-byte length prefix, options a 1-byte presence tag, enums a 1-byte tag
//! unless the schema declares a wider one. Any short read, out-of-range
//! value or bad tag aborts the decode.

use std::collections::HashMap;

use borsh::BorshDeserialize;
use solana_pubkey::Pubkey;

use crate::error::FieldDecodeError;
use crate::schema::{FieldDef, IdlType, Schema, TypeDefKind};
use crate::value::DecodedValue;

/// Default limit on nested `defined` / container types.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Upper bound on the element count of a vector whose elements encode to
/// zero bytes.
const MAX_ZERO_SIZED_ELEMENTS: usize = 1024;

/// Cursor over an input buffer.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Take the next `len` bytes.
    pub fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8], FieldDecodeError> {
        if len > self.remaining() {
            return Err(FieldDecodeError::InsufficientData {
                what: what.to_string(),
                needed: len,
                remaining: self.remaining(),
            });
        }
        let bytes = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    /// Take exactly `size` bytes and deserialize them with borsh.
    fn read_borsh<T: BorshDeserialize>(
        &mut self,
        size: usize,
        what: &str,
    ) -> Result<T, FieldDecodeError> {
        let bytes = self.take(size, what)?;
        T::try_from_slice(bytes).map_err(|e| FieldDecodeError::InvalidValue {
            what: what.to_string(),
            detail: e.to_string(),
        })
    }

    fn read_len(&mut self, what: &str) -> Result<usize, FieldDecodeError> {
        let len: u32 = self.read_borsh(4, &format!("{what} length"))?;
        Ok(len as usize)
    }
}

/// Decodes byte buffers against the types of one schema.
#[derive(Debug, Clone, Copy)]
pub struct FieldDecoder<'s> {
    schema: &'s Schema,
    max_depth: usize,
}

impl<'s> FieldDecoder<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Decode `fields` in order into a [`DecodedValue::Struct`].
    pub fn decode_fields(
        &self,
        reader: &mut ByteReader<'_>,
        fields: &[FieldDef],
    ) -> Result<DecodedValue, FieldDecodeError> {
        self.decode_struct(reader, fields, 0)
    }

    /// Decode a single value of type `ty`.
    pub fn decode_type(
        &self,
        reader: &mut ByteReader<'_>,
        ty: &IdlType,
    ) -> Result<DecodedValue, FieldDecodeError> {
        self.decode(reader, ty, 0)
    }

    fn decode_struct(
        &self,
        reader: &mut ByteReader<'_>,
        fields: &[FieldDef],
        depth: usize,
    ) -> Result<DecodedValue, FieldDecodeError> {
        let mut values = Vec::with_capacity(fields.len());
        for field in fields {
            let value = self
                .decode(reader, &field.ty, depth)
                .map_err(|e| e.in_field(&field.name))?;
            values.push((field.name.clone(), value));
        }
        Ok(DecodedValue::Struct(values))
    }

    fn decode(
        &self,
        reader: &mut ByteReader<'_>,
        ty: &IdlType,
        depth: usize,
    ) -> Result<DecodedValue, FieldDecodeError> {
        if depth > self.max_depth {
            return Err(FieldDecodeError::DepthExceeded(self.max_depth));
        }
        let value = match ty {
            IdlType::Bool => DecodedValue::Bool(reader.read_borsh(1, "bool")?),
            IdlType::U8 => DecodedValue::Unsigned(reader.read_borsh::<u8>(1, "u8")?.into()),
            IdlType::U16 => DecodedValue::Unsigned(reader.read_borsh::<u16>(2, "u16")?.into()),
            IdlType::U32 => DecodedValue::Unsigned(reader.read_borsh::<u32>(4, "u32")?.into()),
            IdlType::U64 => DecodedValue::Unsigned(reader.read_borsh(8, "u64")?),
            IdlType::U128 => DecodedValue::U128(reader.read_borsh(16, "u128")?),
            IdlType::I8 => DecodedValue::Signed(reader.read_borsh::<i8>(1, "i8")?.into()),
            IdlType::I16 => DecodedValue::Signed(reader.read_borsh::<i16>(2, "i16")?.into()),
            IdlType::I32 => DecodedValue::Signed(reader.read_borsh::<i32>(4, "i32")?.into()),
            IdlType::I64 => DecodedValue::Signed(reader.read_borsh(8, "i64")?),
            IdlType::I128 => DecodedValue::I128(reader.read_borsh(16, "i128")?),
            IdlType::F32 => DecodedValue::Float(reader.read_borsh::<f32>(4, "f32")?.into()),
            IdlType::F64 => DecodedValue::Float(reader.read_borsh(8, "f64")?),
            IdlType::String => {
                let len = reader.read_len("string")?;
                let bytes = reader.take(len, "string")?;
                let text = std::str::from_utf8(bytes).map_err(|e| {
                    FieldDecodeError::InvalidValue {
                        what: "string".to_string(),
                        detail: e.to_string(),
                    }
                })?;
                DecodedValue::String(text.to_string())
            }
            IdlType::Bytes => {
                let len = reader.read_len("bytes")?;
                DecodedValue::Bytes(reader.take(len, "bytes")?.to_vec())
            }
            IdlType::Pubkey => {
                let bytes: [u8; 32] = reader.read_borsh(32, "pubkey")?;
                DecodedValue::Pubkey(Pubkey::new_from_array(bytes))
            }
            IdlType::Array(inner, len) => {
                if **inner == IdlType::U8 {
                    DecodedValue::Bytes(reader.take(*len, &ty.label())?.to_vec())
                } else {
                    self.check_count(*len, inner, reader, &ty.label())?;
                    let items = (0..*len)
                        .map(|_| self.decode(reader, inner, depth + 1))
                        .collect::<Result<Vec<_>, _>>()?;
                    DecodedValue::Array(items)
                }
            }
            IdlType::Vec(inner) => {
                let what = ty.label();
                let len = reader.read_len(&what)?;
                self.check_count(len, inner, reader, &what)?;
                let items = (0..len)
                    .map(|_| self.decode(reader, inner, depth + 1))
                    .collect::<Result<Vec<_>, _>>()?;
                DecodedValue::Array(items)
            }
            IdlType::Option(inner) => {
                let tag: u8 = reader.read_borsh(1, "option tag")?;
                match tag {
                    0 => DecodedValue::Option(None),
                    1 => DecodedValue::Option(Some(Box::new(self.decode(
                        reader,
                        inner,
                        depth + 1,
                    )?))),
                    other => {
                        return Err(FieldDecodeError::InvalidTag {
                            what: "option".to_string(),
                            tag: other.into(),
                        })
                    }
                }
            }
            IdlType::Defined(name) => self.decode_defined(reader, name, depth + 1)?,
        };
        Ok(value)
    }

    fn decode_defined(
        &self,
        reader: &mut ByteReader<'_>,
        name: &str,
        depth: usize,
    ) -> Result<DecodedValue, FieldDecodeError> {
        let def = self
            .schema
            .type_def(name)
            .ok_or_else(|| FieldDecodeError::UndefinedType(name.to_string()))?;
        match &def.kind {
            TypeDefKind::Struct { fields } => self.decode_struct(reader, fields, depth),
            TypeDefKind::Enum { variants, tag_size } => {
                let what = format!("{name} variant");
                let tag: u32 = match tag_size {
                    2 => reader.read_borsh::<u16>(2, &what)?.into(),
                    4 => reader.read_borsh(4, &what)?,
                    _ => reader.read_borsh::<u8>(1, &what)?.into(),
                };
                let variant = variants.get(tag as usize).ok_or(FieldDecodeError::InvalidTag {
                    what: name.to_string(),
                    tag,
                })?;
                let fields = if variant.fields.is_empty() {
                    None
                } else {
                    Some(Box::new(self.decode_struct(reader, &variant.fields, depth)?))
                };
                Ok(DecodedValue::Enum {
                    variant: variant.name.clone(),
                    fields,
                })
            }
        }
    }

    /// Reject element counts the remaining input cannot possibly hold.
    fn check_count(
        &self,
        count: usize,
        element: &IdlType,
        reader: &ByteReader<'_>,
        what: &str,
    ) -> Result<(), FieldDecodeError> {
        let min = self.min_size(element);
        let fits = if min == 0 {
            count <= MAX_ZERO_SIZED_ELEMENTS
        } else {
            count
                .checked_mul(min)
                .is_some_and(|needed| needed <= reader.remaining())
        };
        if fits {
            Ok(())
        } else {
            Err(FieldDecodeError::InsufficientData {
                what: what.to_string(),
                needed: count.saturating_mul(min.max(1)),
                remaining: reader.remaining(),
            })
        }
    }

    /// Smallest possible encoding of `ty` in bytes.
    fn min_size(&self, ty: &IdlType) -> usize {
        self.min_size_in(ty, &mut Vec::new(), &mut HashMap::new())
    }

    fn min_size_in(
        &self,
        ty: &IdlType,
        path: &mut Vec<&'s str>,
        known: &mut HashMap<&'s str, usize>,
    ) -> usize {
        if let Some(size) = ty.fixed_size() {
            return size;
        }
        match ty {
            IdlType::String | IdlType::Bytes | IdlType::Vec(_) => 4,
            IdlType::Option(_) => 1,
            IdlType::Array(inner, len) => self.min_size_in(inner, path, known).saturating_mul(*len),
            IdlType::Defined(name) => {
                let Some(def) = self.schema.type_def(name) else {
                    return 0;
                };
                let name = def.name.as_str();
                // A type still being measured adds nothing to its own size.
                if path.contains(&name) {
                    return 0;
                }
                if let Some(size) = known.get(name) {
                    return *size;
                }
                let size = match &def.kind {
                    TypeDefKind::Struct { fields } => {
                        path.push(name);
                        let size = fields
                            .iter()
                            .map(|f| self.min_size_in(&f.ty, path, known))
                            .fold(0usize, usize::saturating_add);
                        path.pop();
                        size
                    }
                    TypeDefKind::Enum { tag_size, .. } => *tag_size as usize,
                };
                known.insert(name, size);
                size
            }
            _ => 0,
        }
    }
}

/// Decode `data` against `fields`, returning the value and the bytes consumed.
pub fn decode_struct(
    schema: &Schema,
    fields: &[FieldDef],
    data: &[u8],
    max_depth: usize,
) -> Result<(DecodedValue, usize), FieldDecodeError> {
    let mut reader = ByteReader::new(data);
    let value = FieldDecoder::new(schema)
        .with_max_depth(max_depth)
        .decode_fields(&mut reader, fields)?;
    Ok((value, reader.offset()))
}
