//! Event and batch writing.
//!
//! Events carry their canonical bytes, so writing is a verbatim copy; a
//! batch is a 4-byte event count followed by the events.

use crate::encoder::Encoder;
use crate::error::ProtocolResult;
use crate::event::Event;

pub struct EventWriter;

impl EventWriter {
    /// Write one event's canonical bytes.
    pub fn write(encoder: &mut Encoder, event: &Event) {
        encoder.write_raw(event.bytes());
    }

    /// Write a batch: 4-byte count, then each event.
    pub fn write_batch(encoder: &mut Encoder, events: &[Event]) -> ProtocolResult<()> {
        encoder.write_len(events.len())?;
        for event in events {
            EventWriter::write(encoder, event);
        }
        Ok(())
    }
}

/// Encode a batch into a fresh buffer.
pub fn encode_batch(events: &[Event]) -> ProtocolResult<Vec<u8>> {
    let mut encoder = Encoder::new();
    EventWriter::write_batch(&mut encoder, events)?;
    Ok(encoder.into_bytes())
}
