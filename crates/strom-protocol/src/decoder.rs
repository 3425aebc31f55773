//! Low-level wire decoding.
//!
//! The decoder keeps a cursor over a borrowed byte slice. Every read and
//! every skip is bounds-checked; malformed input fails fast with the byte
//! offset, never by consuming garbage.
//!
//! [`Decoder::skip_value`] is the type-directed skip: for every [`Type`] it
//! consumes exactly the bytes [`Decoder::read_value`] would have consumed,
//! without materializing a variant. Selective tag decoding relies on this to
//! stay positioned correctly across events in a batch.

use uuid::Uuid;

use crate::error::{ProtocolError, ProtocolResult};
use crate::types::Type;
use crate::variant::{Container, Variant, Vector};

/// Cursor-based decoder over a byte slice.
#[derive(Debug)]
pub struct Decoder<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Decoder<'a> {
        Decoder { data, position: 0 }
    }

    /// Current cursor offset from the start of the input.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes left after the cursor.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// The input slice between two offsets, as captured verbatim.
    pub fn slice(&self, from: usize, to: usize) -> &'a [u8] {
        &self.data[from..to]
    }

    fn take(&mut self, n: usize) -> ProtocolResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(ProtocolError::UnexpectedEnd {
                offset: self.position,
                needed: n - self.remaining(),
            });
        }
        let slice = &self.data[self.position..self.position + n];
        self.position += n;
        Ok(slice)
    }

    fn skip(&mut self, n: usize) -> ProtocolResult<()> {
        self.take(n).map(|_| ())
    }

    pub fn read_u8(&mut self) -> ProtocolResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i16(&mut self) -> ProtocolResult<i16> {
        let bytes = self.take(2)?;
        Ok(i16::from_be_bytes(bytes.try_into().expect("2 bytes taken")))
    }

    pub fn read_i32(&mut self) -> ProtocolResult<i32> {
        let bytes = self.take(4)?;
        Ok(i32::from_be_bytes(bytes.try_into().expect("4 bytes taken")))
    }

    pub fn read_i64(&mut self) -> ProtocolResult<i64> {
        let bytes = self.take(8)?;
        Ok(i64::from_be_bytes(bytes.try_into().expect("8 bytes taken")))
    }

    pub fn read_u64(&mut self) -> ProtocolResult<u64> {
        let bytes = self.take(8)?;
        Ok(u64::from_be_bytes(bytes.try_into().expect("8 bytes taken")))
    }

    pub fn read_f64(&mut self) -> ProtocolResult<f64> {
        let bytes = self.take(8)?;
        Ok(f64::from_be_bytes(bytes.try_into().expect("8 bytes taken")))
    }

    pub fn read_flag(&mut self) -> ProtocolResult<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_uuid(&mut self) -> ProtocolResult<Uuid> {
        let bytes = self.take(16)?;
        Ok(Uuid::from_slice(bytes).expect("16 bytes taken"))
    }

    /// Read a 4-byte signed length/count prefix, rejecting negatives.
    pub fn read_len(&mut self) -> ProtocolResult<usize> {
        let offset = self.position;
        let count = self.read_i32()?;
        if count < 0 {
            return Err(ProtocolError::NegativeCount {
                count: count as i64,
                offset,
            });
        }
        Ok(count as usize)
    }

    pub fn read_string(&mut self) -> ProtocolResult<String> {
        let len = self.read_len()?;
        let offset = self.position;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| ProtocolError::InvalidUtf8 { offset })
    }

    pub fn read_bytes(&mut self) -> ProtocolResult<Vec<u8>> {
        let len = self.read_len()?;
        Ok(self.take(len)?.to_vec())
    }

    /// Check that `count` elements of at least `min_size` bytes each can
    /// still fit in the remaining input. Widened before multiplying; the
    /// count alone can be up to `i32::MAX`, so an unchecked
    /// `Vec::with_capacity(count)` could request gigabytes off a 4-byte
    /// header.
    pub(crate) fn ensure_elements(&self, count: usize, min_size: usize) -> ProtocolResult<()> {
        let total = count as u64 * min_size as u64;
        if total > self.remaining() as u64 {
            return Err(ProtocolError::UnexpectedEnd {
                offset: self.position,
                needed: (total - self.remaining() as u64) as usize,
            });
        }
        Ok(())
    }

    /// Read a vector element count and validate it against the remaining
    /// input, given the minimum encoded size of one element.
    fn read_vector_count(&mut self, min_element_size: usize) -> ProtocolResult<usize> {
        let count = self.read_len()?;
        self.ensure_elements(count, min_element_size)?;
        Ok(count)
    }

    /// Read and validate a type tag.
    pub fn read_type(&mut self) -> ProtocolResult<Type> {
        let offset = self.position;
        let tag = self.read_u8()?;
        Type::from_wire_tag(tag).ok_or(ProtocolError::UnknownType { tag, offset })
    }

    /// Materialize a value of the given type.
    pub fn read_value(&mut self, ty: Type) -> ProtocolResult<Variant> {
        Ok(match ty {
            Type::Short => Variant::Short(self.read_i16()?),
            Type::Integer => Variant::Integer(self.read_i32()?),
            Type::Long => Variant::Long(self.read_i64()?),
            Type::Double => Variant::Double(self.read_f64()?),
            Type::Flag => Variant::Flag(self.read_flag()?),
            Type::String => Variant::String(self.read_string()?),
            Type::Bytes => Variant::Bytes(self.read_bytes()?),
            Type::Uuid => Variant::Uuid(self.read_uuid()?),
            Type::Container => Variant::Container(self.read_container()?),
            Type::ShortVector => {
                let count = self.read_vector_count(2)?;
                let mut values = Vec::with_capacity(count);
                for _ in 0..count {
                    values.push(self.read_i16()?);
                }
                Variant::Vector(Vector::Shorts(values))
            }
            Type::IntegerVector => {
                let count = self.read_vector_count(4)?;
                let mut values = Vec::with_capacity(count);
                for _ in 0..count {
                    values.push(self.read_i32()?);
                }
                Variant::Vector(Vector::Integers(values))
            }
            Type::LongVector => {
                let count = self.read_vector_count(8)?;
                let mut values = Vec::with_capacity(count);
                for _ in 0..count {
                    values.push(self.read_i64()?);
                }
                Variant::Vector(Vector::Longs(values))
            }
            Type::DoubleVector => {
                let count = self.read_vector_count(8)?;
                let mut values = Vec::with_capacity(count);
                for _ in 0..count {
                    values.push(self.read_f64()?);
                }
                Variant::Vector(Vector::Doubles(values))
            }
            Type::FlagVector => {
                let count = self.read_vector_count(1)?;
                let mut values = Vec::with_capacity(count);
                for _ in 0..count {
                    values.push(self.read_flag()?);
                }
                Variant::Vector(Vector::Flags(values))
            }
            Type::StringVector => {
                // Each element carries at least its 4-byte length prefix.
                let count = self.read_vector_count(4)?;
                let mut values = Vec::with_capacity(count);
                for _ in 0..count {
                    values.push(self.read_string()?);
                }
                Variant::Vector(Vector::Strings(values))
            }
            Type::BytesVector => {
                let count = self.read_vector_count(4)?;
                let mut values = Vec::with_capacity(count);
                for _ in 0..count {
                    values.push(self.read_bytes()?);
                }
                Variant::Vector(Vector::Bytes(values))
            }
            Type::UuidVector => {
                let count = self.read_vector_count(16)?;
                let mut values = Vec::with_capacity(count);
                for _ in 0..count {
                    values.push(self.read_uuid()?);
                }
                Variant::Vector(Vector::Uuids(values))
            }
        })
    }

    /// Read a container body: 2-byte tag count, then name/type/value per tag.
    pub fn read_container(&mut self) -> ProtocolResult<Container> {
        let offset = self.position;
        let count = self.read_i16()?;
        if count < 0 {
            return Err(ProtocolError::NegativeCount {
                count: count as i64,
                offset,
            });
        }
        // Smallest possible tag: 4-byte empty name, type byte, 1-byte flag.
        self.ensure_elements(count as usize, 6)?;
        let mut container = Container::with_capacity(count as usize);
        for _ in 0..count {
            let name = self.read_string()?;
            let ty = self.read_type()?;
            let value = self.read_value(ty)?;
            container.insert(name, value);
        }
        Ok(container)
    }

    /// Advance the cursor past a value of the given type without decoding
    /// it. Consumes exactly the bytes [`Decoder::read_value`] would.
    pub fn skip_value(&mut self, ty: Type) -> ProtocolResult<()> {
        if let Some(size) = ty.fixed_size() {
            return self.skip(size);
        }
        match ty {
            Type::String | Type::Bytes => {
                let len = self.read_len()?;
                self.skip(len)
            }
            Type::Container => {
                let offset = self.position;
                let count = self.read_i16()?;
                if count < 0 {
                    return Err(ProtocolError::NegativeCount {
                        count: count as i64,
                        offset,
                    });
                }
                for _ in 0..count {
                    let name_len = self.read_len()?;
                    self.skip(name_len)?;
                    let nested = self.read_type()?;
                    self.skip_value(nested)?;
                }
                Ok(())
            }
            vector => {
                let element = vector
                    .element()
                    .expect("non-fixed, non-prefixed types are vectors");
                let count = self.read_len()?;
                match element.fixed_size() {
                    Some(size) => {
                        self.ensure_elements(count, size)?;
                        self.skip(count * size)
                    }
                    None => {
                        // String or Bytes elements: each is length-prefixed.
                        for _ in 0..count {
                            let len = self.read_len()?;
                            self.skip(len)?;
                        }
                        Ok(())
                    }
                }
            }
        }
    }
}
