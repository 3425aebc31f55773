//! Binary event wire protocol for the Strom event-streaming platform.
//!
//! Events are self-describing, tag-oriented records: every tag value is
//! preceded by a one-byte type tag that fully determines how many bytes the
//! value occupies, so a reader can skip any value without decoding it.
//!
//! # Architecture
//!
//! - **Variant / Type**: the closed tagged-value model every tag is
//!   expressed in (scalars, homogeneous vectors, nested containers)
//! - **Encoder / Decoder**: bounds-checked primitives plus type-directed
//!   skip over a byte slice
//! - **EventReader / EventWriter**: single-event and count-prefixed batch
//!   framing with selective tag decoding (all / none / named subset)
//! - **EventId**: 128-bit identifier packing timestamp ticks, randomness,
//!   and a CLIENT/INTERNAL origin bit
//! - **StreamReadState**: per-shard consumer cursor payload

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod event;
pub mod id;
pub mod read_state;
pub mod reader;
pub mod time;
pub mod types;
pub mod variant;
pub mod writer;

pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{ProtocolError, ProtocolResult};
pub use event::{Event, EventBuilder, EVENT_VERSION};
pub use id::{EventId, EventIdGenerator, Origin};
pub use read_state::{ShardReadState, StreamReadState};
pub use reader::{EventReader, TagFilter};
pub use types::Type;
pub use variant::{Container, Variant, Vector};
pub use writer::{encode_batch, EventWriter};
