//! Selective event decoding.
//!
//! An [`EventReader`] walks single events or count-prefixed batches in one
//! of three modes: materialize every tag, materialize none, or materialize a
//! named subset. Unwanted tag values are passed over with the type-directed
//! skip, so the cursor always lands exactly on the next event, and the
//! original byte range of every event is captured verbatim.

use std::collections::HashSet;

use crate::decoder::Decoder;
use crate::error::{ProtocolError, ProtocolResult};
use crate::event::Event;
use crate::id::EventId;
use crate::variant::Container;

/// Which payload tags a read session materializes.
#[derive(Clone, Debug)]
pub enum TagFilter {
    /// Decode every tag.
    All,
    /// Decode no tags; only the event header is materialized.
    None,
    /// Decode only tags whose name is in the set.
    Subset(HashSet<String>),
}

impl TagFilter {
    pub fn all() -> TagFilter {
        TagFilter::All
    }

    pub fn none() -> TagFilter {
        TagFilter::None
    }

    pub fn subset(names: impl IntoIterator<Item = impl Into<String>>) -> TagFilter {
        TagFilter::Subset(names.into_iter().map(Into::into).collect())
    }

    fn wants(&self, name: &str) -> bool {
        match self {
            TagFilter::All => true,
            TagFilter::None => false,
            TagFilter::Subset(names) => names.contains(name),
        }
    }
}

/// Smallest possible encoded event: version, timestamp, qualifier, and a
/// zero tag count.
const MIN_EVENT_SIZE: usize = 1 + 8 + 8 + 2;

/// Reads events from a byte slice under a tag filter.
pub struct EventReader<'a> {
    decoder: Decoder<'a>,
    filter: TagFilter,
    count: usize,
    remaining: usize,
}

impl<'a> EventReader<'a> {
    /// Reader over a count-prefixed batch.
    pub fn batch(data: &'a [u8], filter: TagFilter) -> ProtocolResult<EventReader<'a>> {
        let mut decoder = Decoder::new(data);
        let count = decoder.read_len()?;
        decoder.ensure_elements(count, MIN_EVENT_SIZE)?;
        Ok(EventReader {
            decoder,
            filter,
            count,
            remaining: count,
        })
    }

    /// Reader over exactly one unprefixed event.
    pub fn single(data: &'a [u8], filter: TagFilter) -> EventReader<'a> {
        EventReader {
            decoder: Decoder::new(data),
            filter,
            count: 1,
            remaining: 1,
        }
    }

    /// Total number of events this reader will yield.
    ///
    /// Named to stay clear of [`Iterator::count`], which would otherwise
    /// shadow an inherent `count` and consume the reader.
    pub fn event_count(&self) -> usize {
        self.count
    }

    pub fn has_next(&self) -> bool {
        self.remaining > 0
    }

    /// Cursor offset into the underlying input.
    pub fn position(&self) -> usize {
        self.decoder.position()
    }

    /// Decode the next event.
    pub fn read(&mut self) -> ProtocolResult<Event> {
        if self.remaining == 0 {
            return Err(ProtocolError::Exhausted);
        }
        self.remaining -= 1;

        let from = self.decoder.position();

        let version = self.decoder.read_u8()?;
        let timestamp = self.decoder.read_i64()?;
        let qualifier = self.decoder.read_u64()?;

        let tag_count_offset = self.decoder.position();
        let tag_count = self.decoder.read_i16()?;
        if tag_count < 0 {
            return Err(ProtocolError::NegativeCount {
                count: tag_count as i64,
                offset: tag_count_offset,
            });
        }

        let mut payload = Container::new();
        for _ in 0..tag_count {
            let name = self.decoder.read_string()?;
            let ty = self.decoder.read_type()?;
            if self.filter.wants(&name) {
                let value = self.decoder.read_value(ty)?;
                payload.insert(name, value);
            } else {
                self.decoder.skip_value(ty)?;
            }
        }

        let to = self.decoder.position();
        let bytes = self.decoder.slice(from, to).to_vec();

        Ok(Event::from_wire(
            version,
            timestamp,
            EventId::from_parts(timestamp, qualifier),
            payload,
            bytes,
        ))
    }

    /// Drain the remaining events.
    pub fn read_all(&mut self) -> ProtocolResult<Vec<Event>> {
        let mut events = Vec::with_capacity(self.remaining);
        while self.has_next() {
            events.push(self.read()?);
        }
        Ok(events)
    }
}

impl Iterator for EventReader<'_> {
    type Item = ProtocolResult<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_next() {
            Some(self.read())
        } else {
            None
        }
    }
}
