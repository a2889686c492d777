use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread::JoinHandle;

use crate::foundation::error::{KarmaError, KarmaResult};

/// One ordered unit of encoder output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedChunk {
    /// Arrival sequence number, starting at zero.
    pub seq: u64,
    /// Opaque container bytes.
    pub bytes: Vec<u8>,
}

/// Producer half of the chunk channel, owned by the encoder.
///
/// Dropping it tells the assembler that no more chunks will arrive.
#[derive(Debug)]
pub struct ChunkSender {
    tx: SyncSender<EncodedChunk>,
    next_seq: u64,
}

impl ChunkSender {
    /// Queue `bytes` as the next chunk, blocking while the channel is full.
    ///
    /// Empty buffers are skipped.
    pub fn send(&mut self, bytes: Vec<u8>) -> KarmaResult<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        let chunk = EncodedChunk {
            seq: self.next_seq,
            bytes,
        };
        self.tx
            .send(chunk)
            .map_err(|_| KarmaError::encoder("chunk assembler is no longer accepting chunks"))?;
        self.next_seq += 1;
        Ok(())
    }

    /// Number of chunks sent so far.
    pub fn sent(&self) -> u64 {
        self.next_seq
    }
}

/// The concatenated container produced by a [`ChunkAssembler`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssembledContainer {
    /// Chunks concatenated in arrival order.
    pub payload: Vec<u8>,
    /// Number of chunks that made up the payload.
    pub chunk_count: usize,
}

/// Consumer half of the chunk channel.
///
/// A background thread drains the channel as chunks arrive so the encoder never waits on
/// rendering; [`ChunkAssembler::finish`] returns once every sender is gone.
#[derive(Debug)]
pub struct ChunkAssembler {
    handle: JoinHandle<Vec<EncodedChunk>>,
}

/// Create a bounded chunk channel holding at most `capacity` undelivered chunks.
pub fn chunk_channel(capacity: usize) -> (ChunkSender, ChunkAssembler) {
    let (tx, rx) = mpsc::sync_channel::<EncodedChunk>(capacity.max(1));
    let handle = std::thread::spawn(move || drain(rx));
    (
        ChunkSender { tx, next_seq: 0 },
        ChunkAssembler { handle },
    )
}

fn drain(rx: Receiver<EncodedChunk>) -> Vec<EncodedChunk> {
    let mut chunks = Vec::new();
    while let Ok(chunk) = rx.recv() {
        tracing::trace!(seq = chunk.seq, len = chunk.bytes.len(), "chunk received");
        chunks.push(chunk);
    }
    chunks
}

impl ChunkAssembler {
    /// Wait for the channel to close and concatenate every chunk in arrival order.
    pub fn finish(self) -> KarmaResult<AssembledContainer> {
        let chunks = self
            .handle
            .join()
            .map_err(|_| KarmaError::encoder("chunk assembler thread panicked"))?;
        if chunks.iter().enumerate().any(|(i, c)| c.seq != i as u64) {
            return Err(KarmaError::encoder("chunks arrived out of sequence"));
        }

        let total: usize = chunks.iter().map(|c| c.bytes.len()).sum();
        let mut payload = Vec::with_capacity(total);
        for chunk in &chunks {
            payload.extend_from_slice(&chunk.bytes);
        }
        Ok(AssembledContainer {
            payload,
            chunk_count: chunks.len(),
        })
    }
}
