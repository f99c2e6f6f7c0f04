//! Payload chunking
//!
//! Splits an arbitrary byte payload into fixed-size opaque chunks suitable for
//! distributed storage. Chunk order is semantically required: reconstruction
//! concatenates chunks in original order, and any reordering is a correctness
//! bug rather than a recoverable condition.

use serde::{Deserialize, Serialize};
use umbra_core::{UmbraError, UmbraResult};

/// Maximum chunk size used for vault uploads, in bytes
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 4000;

/// An ordered slice of the original payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of this chunk in the original payload
    pub index: u32,

    /// Chunk bytes
    pub data: Vec<u8>,
}

/// Split a payload into chunks of at most `max_chunk_size` bytes
///
/// Deterministic and side-effect free. An empty payload yields no chunks.
pub fn split(payload: &[u8], max_chunk_size: usize) -> UmbraResult<Vec<Chunk>> {
    if max_chunk_size == 0 {
        return Err(UmbraError::invalid("Chunk size must be positive"));
    }

    let chunks = payload
        .chunks(max_chunk_size)
        .enumerate()
        .map(|(index, data)| Chunk {
            index: index as u32,
            data: data.to_vec(),
        })
        .collect();

    Ok(chunks)
}

/// Reassemble a payload from chunks in original order
///
/// Exact inverse of [`split`]: chunk indices must be contiguous and ascending
/// from zero.
pub fn reassemble(chunks: &[Chunk]) -> UmbraResult<Vec<u8>> {
    let mut payload = Vec::with_capacity(chunks.iter().map(|c| c.data.len()).sum());

    for (position, chunk) in chunks.iter().enumerate() {
        if chunk.index as usize != position {
            return Err(UmbraError::invalid(format!(
                "Chunk out of order: expected index {}, found {}",
                position, chunk.index
            )));
        }
        payload.extend_from_slice(&chunk.data);
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_split_exact_multiple() {
        let payload = vec![1u8; 12000];
        let chunks = split(&payload, 4000).unwrap();

        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.data.len() == 4000));
        assert_eq!(chunks[2].index, 2);
    }

    #[test]
    fn test_split_with_remainder() {
        let payload = vec![2u8; 4001];
        let chunks = split(&payload, 4000).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].data.len(), 1);
    }

    #[test]
    fn test_split_empty_payload() {
        assert!(split(&[], 4000).unwrap().is_empty());
        assert!(reassemble(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_split_zero_chunk_size_rejected() {
        assert!(split(b"data", 0).is_err());
    }

    #[test]
    fn test_reassemble_rejects_reordered_chunks() {
        let payload = b"abcdefgh".to_vec();
        let mut chunks = split(&payload, 4).unwrap();
        chunks.swap(0, 1);

        assert!(reassemble(&chunks).is_err());
    }

    #[test]
    fn test_reassemble_rejects_missing_chunk() {
        let payload = vec![3u8; 9000];
        let mut chunks = split(&payload, 4000).unwrap();
        chunks.remove(1);

        assert!(reassemble(&chunks).is_err());
    }

    proptest! {
        #[test]
        fn prop_round_trip(payload in proptest::collection::vec(any::<u8>(), 0..20_000),
                           chunk_size in 1usize..5000) {
            let chunks = split(&payload, chunk_size).unwrap();
            prop_assert!(chunks.iter().all(|c| c.data.len() <= chunk_size));
            prop_assert_eq!(reassemble(&chunks).unwrap(), payload);
        }
    }
}
