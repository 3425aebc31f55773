//! The closed set of wire type tags.
//!
//! Every encoded variant is preceded by a single type byte that fully
//! determines how many value bytes follow. Vector tags set the high bit of
//! their scalar counterpart, so the scalar/vector relationship is visible in
//! the tag itself.

/// High bit marking a vector type tag.
const VECTOR_BIT: u8 = 0x80;

/// Wire type of a variant value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Short,
    Integer,
    Long,
    Double,
    Flag,
    String,
    Bytes,
    Uuid,
    Container,
    ShortVector,
    IntegerVector,
    LongVector,
    DoubleVector,
    FlagVector,
    StringVector,
    BytesVector,
    UuidVector,
}

impl Type {
    /// All scalar types, in tag order.
    pub const SCALARS: [Type; 9] = [
        Type::Short,
        Type::Integer,
        Type::Long,
        Type::Double,
        Type::Flag,
        Type::String,
        Type::Bytes,
        Type::Uuid,
        Type::Container,
    ];

    /// The byte written to the wire for this type.
    pub fn wire_tag(self) -> u8 {
        match self {
            Type::Short => 0x01,
            Type::Integer => 0x02,
            Type::Long => 0x03,
            Type::Double => 0x04,
            Type::Flag => 0x05,
            Type::String => 0x06,
            Type::Bytes => 0x07,
            Type::Uuid => 0x08,
            Type::Container => 0x09,
            Type::ShortVector => VECTOR_BIT | 0x01,
            Type::IntegerVector => VECTOR_BIT | 0x02,
            Type::LongVector => VECTOR_BIT | 0x03,
            Type::DoubleVector => VECTOR_BIT | 0x04,
            Type::FlagVector => VECTOR_BIT | 0x05,
            Type::StringVector => VECTOR_BIT | 0x06,
            Type::BytesVector => VECTOR_BIT | 0x07,
            Type::UuidVector => VECTOR_BIT | 0x08,
        }
    }

    /// Parse a wire tag. Returns `None` for bytes outside the closed set
    /// (there is no vector-of-container).
    pub fn from_wire_tag(tag: u8) -> Option<Type> {
        Some(match tag {
            0x01 => Type::Short,
            0x02 => Type::Integer,
            0x03 => Type::Long,
            0x04 => Type::Double,
            0x05 => Type::Flag,
            0x06 => Type::String,
            0x07 => Type::Bytes,
            0x08 => Type::Uuid,
            0x09 => Type::Container,
            0x81 => Type::ShortVector,
            0x82 => Type::IntegerVector,
            0x83 => Type::LongVector,
            0x84 => Type::DoubleVector,
            0x85 => Type::FlagVector,
            0x86 => Type::StringVector,
            0x87 => Type::BytesVector,
            0x88 => Type::UuidVector,
            _ => return None,
        })
    }

    /// Returns `true` for vector types.
    pub fn is_vector(self) -> bool {
        self.wire_tag() & VECTOR_BIT != 0
    }

    /// Element type of a vector, `None` for scalars.
    pub fn element(self) -> Option<Type> {
        if self.is_vector() {
            Type::from_wire_tag(self.wire_tag() & !VECTOR_BIT)
        } else {
            None
        }
    }

    /// Vector counterpart of a scalar, `None` for vectors and containers.
    pub fn vector_of(self) -> Option<Type> {
        if self.is_vector() || self == Type::Container {
            None
        } else {
            Type::from_wire_tag(self.wire_tag() | VECTOR_BIT)
        }
    }

    /// Encoded value size for fixed-width scalars, `None` for
    /// length-prefixed and self-describing types.
    pub fn fixed_size(self) -> Option<usize> {
        match self {
            Type::Short => Some(2),
            Type::Integer => Some(4),
            Type::Long => Some(8),
            Type::Double => Some(8),
            Type::Flag => Some(1),
            Type::Uuid => Some(16),
            _ => None,
        }
    }
}
