//! Low-level wire encoding.
//!
//! All multi-byte integers are big-endian. Strings and byte blobs are
//! prefixed with a 4-byte signed length; vectors with a 4-byte signed
//! element count; containers with a 2-byte signed tag count.

use uuid::Uuid;

use crate::error::{ProtocolError, ProtocolResult};
use crate::types::Type;
use crate::variant::{Container, Variant, Vector};

/// Append-only encoder over a growable byte buffer.
#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Encoder {
        Encoder::default()
    }

    pub fn with_capacity(capacity: usize) -> Encoder {
        Encoder {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_i16(&mut self, value: i16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_flag(&mut self, value: bool) {
        self.buf.push(value as u8);
    }

    pub fn write_uuid(&mut self, value: &Uuid) {
        self.buf.extend_from_slice(value.as_bytes());
    }

    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Write a 4-byte signed length/count prefix.
    pub fn write_len(&mut self, len: usize) -> ProtocolResult<()> {
        let len = i32::try_from(len).map_err(|_| ProtocolError::LengthOverflow(len))?;
        self.write_i32(len);
        Ok(())
    }

    pub fn write_string(&mut self, value: &str) -> ProtocolResult<()> {
        self.write_len(value.len())?;
        self.buf.extend_from_slice(value.as_bytes());
        Ok(())
    }

    pub fn write_bytes(&mut self, value: &[u8]) -> ProtocolResult<()> {
        self.write_len(value.len())?;
        self.buf.extend_from_slice(value);
        Ok(())
    }

    pub fn write_type(&mut self, ty: Type) {
        self.buf.push(ty.wire_tag());
    }

    /// Write a variant value: type tag followed by the type-determined
    /// value encoding.
    pub fn write_variant(&mut self, value: &Variant) -> ProtocolResult<()> {
        self.write_type(value.kind());
        self.write_variant_value(value)
    }

    fn write_variant_value(&mut self, value: &Variant) -> ProtocolResult<()> {
        match value {
            Variant::Short(v) => self.write_i16(*v),
            Variant::Integer(v) => self.write_i32(*v),
            Variant::Long(v) => self.write_i64(*v),
            Variant::Double(v) => self.write_f64(*v),
            Variant::Flag(v) => self.write_flag(*v),
            Variant::String(v) => self.write_string(v)?,
            Variant::Bytes(v) => self.write_bytes(v)?,
            Variant::Uuid(v) => self.write_uuid(v),
            Variant::Container(v) => self.write_container(v)?,
            Variant::Vector(v) => self.write_vector(v)?,
        }
        Ok(())
    }

    /// Write a container body: 2-byte tag count, then name/type/value per tag.
    pub fn write_container(&mut self, container: &Container) -> ProtocolResult<()> {
        let count = container.len();
        if count > i16::MAX as usize {
            return Err(ProtocolError::TooManyTags(count));
        }
        self.write_i16(count as i16);
        for (name, value) in container.iter() {
            self.write_string(name)?;
            self.write_variant(value)?;
        }
        Ok(())
    }

    /// Write a vector body: 4-byte element count, then the elements.
    pub fn write_vector(&mut self, vector: &Vector) -> ProtocolResult<()> {
        self.write_len(vector.len())?;
        match vector {
            Vector::Shorts(values) => values.iter().for_each(|v| self.write_i16(*v)),
            Vector::Integers(values) => values.iter().for_each(|v| self.write_i32(*v)),
            Vector::Longs(values) => values.iter().for_each(|v| self.write_i64(*v)),
            Vector::Doubles(values) => values.iter().for_each(|v| self.write_f64(*v)),
            Vector::Flags(values) => values.iter().for_each(|v| self.write_flag(*v)),
            Vector::Strings(values) => {
                for v in values {
                    self.write_string(v)?;
                }
            }
            Vector::Bytes(values) => {
                for v in values {
                    self.write_bytes(v)?;
                }
            }
            Vector::Uuids(values) => values.iter().for_each(|v| self.write_uuid(v)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_are_big_endian() {
        let mut encoder = Encoder::new();
        encoder.write_i16(0x0102);
        encoder.write_i32(0x0304_0506);
        encoder.write_i64(0x0708_090a_0b0c_0d0e);
        assert_eq!(
            encoder.bytes(),
            &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14]
        );
    }

    #[test]
    fn string_is_length_prefixed() {
        let mut encoder = Encoder::new();
        encoder.write_string("ab").unwrap();
        assert_eq!(encoder.bytes(), &[0, 0, 0, 2, b'a', b'b']);
    }

    #[test]
    fn string_with_embedded_nul() {
        let mut encoder = Encoder::new();
        encoder.write_string("a\0b").unwrap();
        assert_eq!(encoder.bytes(), &[0, 0, 0, 3, b'a', 0, b'b']);
    }

    #[test]
    fn variant_carries_type_tag() {
        let mut encoder = Encoder::new();
        encoder.write_variant(&Variant::of_flag(true)).unwrap();
        assert_eq!(encoder.bytes(), &[Type::Flag.wire_tag(), 1]);
    }

    #[test]
    fn vector_carries_count() {
        let mut encoder = Encoder::new();
        encoder
            .write_variant(&Variant::of_vector(Vector::of_shorts(vec![1, 2])))
            .unwrap();
        assert_eq!(
            encoder.bytes(),
            &[Type::ShortVector.wire_tag(), 0, 0, 0, 2, 0, 1, 0, 2]
        );
    }
}
