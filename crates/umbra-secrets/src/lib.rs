//! Chunking and secret sharing for distributed document storage
//!
//! A document is split into ordered chunks, and every chunk is sharded into
//! one share per storage node. No single node, and no proper subset of
//! nodes, learns anything about the document.

pub mod chunker;
pub mod codec;

pub use chunker::{reassemble, split, Chunk, DEFAULT_MAX_CHUNK_SIZE};
pub use codec::{ClusterKey, SecretCodec, Share};
