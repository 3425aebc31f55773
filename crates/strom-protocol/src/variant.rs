//! Tagged values carried by event tags.
//!
//! A [`Variant`] holds exactly one value of a fixed kind: a scalar, a
//! homogeneous [`Vector`] of scalars, or a nested [`Container`]. There is no
//! implicit coercion between kinds; collaborators match on their own source
//! value's shape and call the matching constructor directly.

use uuid::Uuid;

use crate::types::Type;

/// A tagged value: one scalar, one homogeneous vector, or one container.
///
/// Equality is structural: kind plus value equality, element-wise for
/// vectors and entry-wise (in insertion order) for containers.
#[derive(Clone, Debug, PartialEq)]
pub enum Variant {
    Short(i16),
    Integer(i32),
    Long(i64),
    Double(f64),
    Flag(bool),
    String(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Container(Container),
    Vector(Vector),
}

impl Variant {
    pub fn of_short(value: i16) -> Variant {
        Variant::Short(value)
    }

    pub fn of_integer(value: i32) -> Variant {
        Variant::Integer(value)
    }

    pub fn of_long(value: i64) -> Variant {
        Variant::Long(value)
    }

    pub fn of_double(value: f64) -> Variant {
        Variant::Double(value)
    }

    pub fn of_flag(value: bool) -> Variant {
        Variant::Flag(value)
    }

    pub fn of_string(value: impl Into<String>) -> Variant {
        Variant::String(value.into())
    }

    pub fn of_bytes(value: impl Into<Vec<u8>>) -> Variant {
        Variant::Bytes(value.into())
    }

    pub fn of_uuid(value: Uuid) -> Variant {
        Variant::Uuid(value)
    }

    pub fn of_container(value: Container) -> Variant {
        Variant::Container(value)
    }

    pub fn of_vector(value: Vector) -> Variant {
        Variant::Vector(value)
    }

    /// Wire type of this value.
    pub fn kind(&self) -> Type {
        match self {
            Variant::Short(_) => Type::Short,
            Variant::Integer(_) => Type::Integer,
            Variant::Long(_) => Type::Long,
            Variant::Double(_) => Type::Double,
            Variant::Flag(_) => Type::Flag,
            Variant::String(_) => Type::String,
            Variant::Bytes(_) => Type::Bytes,
            Variant::Uuid(_) => Type::Uuid,
            Variant::Container(_) => Type::Container,
            Variant::Vector(v) => v.kind(),
        }
    }
}

/// A homogeneous, length-prefixed sequence of one scalar kind.
///
/// The element kind is fixed at construction; mixed-kind arrays cannot be
/// expressed.
#[derive(Clone, Debug, PartialEq)]
pub enum Vector {
    Shorts(Vec<i16>),
    Integers(Vec<i32>),
    Longs(Vec<i64>),
    Doubles(Vec<f64>),
    Flags(Vec<bool>),
    Strings(Vec<String>),
    Bytes(Vec<Vec<u8>>),
    Uuids(Vec<Uuid>),
}

impl Vector {
    pub fn of_shorts(values: impl Into<Vec<i16>>) -> Vector {
        Vector::Shorts(values.into())
    }

    pub fn of_integers(values: impl Into<Vec<i32>>) -> Vector {
        Vector::Integers(values.into())
    }

    pub fn of_longs(values: impl Into<Vec<i64>>) -> Vector {
        Vector::Longs(values.into())
    }

    pub fn of_doubles(values: impl Into<Vec<f64>>) -> Vector {
        Vector::Doubles(values.into())
    }

    pub fn of_flags(values: impl Into<Vec<bool>>) -> Vector {
        Vector::Flags(values.into())
    }

    pub fn of_strings(values: impl IntoIterator<Item = impl Into<String>>) -> Vector {
        Vector::Strings(values.into_iter().map(Into::into).collect())
    }

    pub fn of_bytes(values: impl IntoIterator<Item = impl Into<Vec<u8>>>) -> Vector {
        Vector::Bytes(values.into_iter().map(Into::into).collect())
    }

    pub fn of_uuids(values: impl Into<Vec<Uuid>>) -> Vector {
        Vector::Uuids(values.into())
    }

    /// Wire type of the vector itself (high bit set).
    pub fn kind(&self) -> Type {
        self.element_kind()
            .vector_of()
            .expect("scalar kinds always have a vector counterpart")
    }

    /// Wire type of the elements.
    pub fn element_kind(&self) -> Type {
        match self {
            Vector::Shorts(_) => Type::Short,
            Vector::Integers(_) => Type::Integer,
            Vector::Longs(_) => Type::Long,
            Vector::Doubles(_) => Type::Double,
            Vector::Flags(_) => Type::Flag,
            Vector::Strings(_) => Type::String,
            Vector::Bytes(_) => Type::Bytes,
            Vector::Uuids(_) => Type::Uuid,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Vector::Shorts(v) => v.len(),
            Vector::Integers(v) => v.len(),
            Vector::Longs(v) => v.len(),
            Vector::Doubles(v) => v.len(),
            Vector::Flags(v) => v.len(),
            Vector::Strings(v) => v.len(),
            Vector::Bytes(v) => v.len(),
            Vector::Uuids(v) => v.len(),
        }
    }

    /// Returns `true` if the vector has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An insertion-ordered mapping from tag name to [`Variant`].
///
/// Tag names are unique; inserting an existing name replaces the value in
/// place. Iteration order is insertion order, which makes decode output
/// stable within a single decode.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Container {
    entries: Vec<(String, Variant)>,
}

impl Container {
    pub fn new() -> Container {
        Container::default()
    }

    pub fn with_capacity(capacity: usize) -> Container {
        Container {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert a tag, replacing any existing value under the same name
    /// without changing its position.
    pub fn insert(&mut self, name: impl Into<String>, value: Variant) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Look up a tag by name.
    pub fn get(&self, name: &str) -> Option<&Variant> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Variant)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl FromIterator<(String, Variant)> for Container {
    fn from_iter<I: IntoIterator<Item = (String, Variant)>>(iter: I) -> Container {
        let mut container = Container::new();
        for (name, value) in iter {
            container.insert(name, value);
        }
        container
    }
}
