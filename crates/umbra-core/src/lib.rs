//! Umbra core types
//!
//! Shared vocabulary for the secure-workflow stack: public-key identities,
//! storage-cluster descriptors, the unified error type, and the externally
//! supplied session configuration. Everything here is pure data; network and
//! crypto behavior lives in the component crates.

pub mod cluster;
pub mod config;
pub mod errors;
pub mod identity;

pub use cluster::{ClusterDescriptor, NodeDescriptor};
pub use config::{UmbraConfig, WorkloadConfig};
pub use errors::{UmbraError, UmbraResult};
pub use identity::{Did, Keypair};

/// Seconds since the Unix epoch from the local wall clock
///
/// Token expiry is computed against this clock with no allowance for skew
/// against the verifying node.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
