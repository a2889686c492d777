//! Streaming encoders and the chunk channel between an encoder and the container assembler.
//!
//! An encoder consumes rendered frames in timeline order and emits opaque [`EncodedChunk`]s as
//! they become available. Chunks travel over a bounded channel to a [`ChunkAssembler`], which
//! concatenates them in arrival order once the encoder has flushed.

/// Chunk channel and container assembly.
pub mod chunks;
/// Encoder contract shared by all backends.
pub mod encoder;
/// WebM output through the system `ffmpeg` binary.
pub mod ffmpeg;
/// Recording encoder for tests and dry runs.
pub mod memory;
