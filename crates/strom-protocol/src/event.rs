//! Events and the event builder.
//!
//! An event is a version byte, a timestamp in ticks, a 128-bit identifier,
//! and an insertion-ordered payload of named tags. Every event also retains
//! its canonical encoded bytes: decoding captures the original byte range
//! verbatim, and building encodes exactly once, so an event can always be
//! re-emitted byte-for-byte without re-serialization.

use crate::encoder::Encoder;
use crate::error::{ProtocolError, ProtocolResult};
use crate::id::{EventId, EventIdGenerator};
use crate::variant::{Container, Variant};

/// Current wire format version.
pub const EVENT_VERSION: u8 = 1;

/// One event record.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    version: u8,
    timestamp: i64,
    id: EventId,
    payload: Container,
    bytes: Vec<u8>,
}

impl Event {
    pub(crate) fn from_wire(
        version: u8,
        timestamp: i64,
        id: EventId,
        payload: Container,
        bytes: Vec<u8>,
    ) -> Event {
        Event {
            version,
            timestamp,
            id,
            payload,
            bytes,
        }
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    /// Timestamp in ticks (100 ns units since the Unix epoch).
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn payload(&self) -> &Container {
        &self.payload
    }

    /// Look up one payload tag.
    pub fn tag(&self, name: &str) -> Option<&Variant> {
        self.payload.get(name)
    }

    /// The canonical encoded form of this event.
    ///
    /// For decoded events this is the original input range; for built
    /// events it is the single encode performed by [`EventBuilder::build`].
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Accumulates fields and tags, then encodes once.
#[derive(Debug, Default)]
pub struct EventBuilder {
    version: u8,
    timestamp: i64,
    id: Option<EventId>,
    payload: Container,
}

impl EventBuilder {
    pub fn new() -> EventBuilder {
        EventBuilder {
            version: EVENT_VERSION,
            timestamp: 0,
            id: None,
            payload: Container::new(),
        }
    }

    pub fn version(mut self, version: u8) -> EventBuilder {
        self.version = version;
        self
    }

    /// Timestamp in ticks.
    pub fn timestamp(mut self, ticks: i64) -> EventBuilder {
        self.timestamp = ticks;
        self
    }

    /// Use a pre-minted id. Its embedded ticks must match the event
    /// timestamp; `build` rejects mismatches.
    pub fn id(mut self, id: EventId) -> EventBuilder {
        self.id = Some(id);
        self
    }

    /// Add a payload tag, replacing any previous value under the name.
    pub fn tag(mut self, name: impl Into<String>, value: Variant) -> EventBuilder {
        self.payload.insert(name, value);
        self
    }

    /// Validate, encode, and produce the event.
    ///
    /// Without an explicit id, a CLIENT-origin id is minted for the
    /// timestamp.
    pub fn build(self) -> ProtocolResult<Event> {
        let id = match self.id {
            Some(id) => {
                if id.ticks() != self.timestamp {
                    return Err(ProtocolError::IdTicksMismatch {
                        id_ticks: id.ticks(),
                        timestamp: self.timestamp,
                    });
                }
                id
            }
            None => EventIdGenerator::client().next(self.timestamp),
        };

        let bytes = encode_event(self.version, self.timestamp, id, &self.payload)?;
        Ok(Event {
            version: self.version,
            timestamp: self.timestamp,
            id,
            payload: self.payload,
            bytes,
        })
    }
}

/// Canonical event encoding: header, then name/type/value per tag.
fn encode_event(
    version: u8,
    timestamp: i64,
    id: EventId,
    payload: &Container,
) -> ProtocolResult<Vec<u8>> {
    if payload.len() > i16::MAX as usize {
        return Err(ProtocolError::TooManyTags(payload.len()));
    }

    let mut encoder = Encoder::new();
    encoder.write_u8(version);
    encoder.write_i64(timestamp);
    encoder.write_u64(id.qualifier());
    encoder.write_i16(payload.len() as i16);
    for (name, value) in payload.iter() {
        encoder.write_string(name)?;
        encoder.write_variant(value)?;
    }
    Ok(encoder.into_bytes())
}
