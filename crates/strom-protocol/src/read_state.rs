//! Stream read-state cursor payload.
//!
//! Consumers track their position in a partitioned stream as one
//! `(partition, offset)` pair per shard. The state travels over the same
//! encoder/decoder primitives as events: a 4-byte shard count, then 4-byte
//! partition and 8-byte offset per shard.

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::ProtocolResult;

/// Read position within one shard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShardReadState {
    pub partition: i32,
    pub offset: i64,
}

impl ShardReadState {
    pub fn new(partition: i32, offset: i64) -> ShardReadState {
        ShardReadState { partition, offset }
    }
}

/// Read positions across all shards of a stream.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamReadState {
    shards: Vec<ShardReadState>,
}

impl StreamReadState {
    pub fn new(shards: Vec<ShardReadState>) -> StreamReadState {
        StreamReadState { shards }
    }

    pub fn shards(&self) -> &[ShardReadState] {
        &self.shards
    }

    pub fn read(decoder: &mut Decoder<'_>) -> ProtocolResult<StreamReadState> {
        let count = decoder.read_len()?;
        let mut shards = Vec::with_capacity(count);
        for _ in 0..count {
            let partition = decoder.read_i32()?;
            let offset = decoder.read_i64()?;
            shards.push(ShardReadState { partition, offset });
        }
        Ok(StreamReadState { shards })
    }

    pub fn write(&self, encoder: &mut Encoder) -> ProtocolResult<()> {
        encoder.write_len(self.shards.len())?;
        for shard in &self.shards {
            encoder.write_i32(shard.partition);
            encoder.write_i64(shard.offset);
        }
        Ok(())
    }
}
