//! Unified error system for Umbra
//!
//! One error type for the whole workspace. Component crates surface a single
//! coarse error to their caller instead of retrying internally; the processing
//! state machine is the only place that converts an error into a user-visible
//! terminal state.

use serde::{Deserialize, Serialize};

/// Unified error type for all Umbra operations
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum UmbraError {
    /// Invalid input, malformed data, or a rejected token
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Configuration error (missing or malformed configuration)
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration problem
        message: String,
    },

    /// Cryptographic operation failed
    #[error("Crypto error: {message}")]
    Crypto {
        /// Error message describing the cryptographic failure
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message describing the serialization failure
        message: String,
    },

    /// Network or transport error
    #[error("Network error: {message}")]
    Network {
        /// Error message describing the network issue
        message: String,
    },

    /// Publishing a document to the vault failed
    #[error("Upload failed: {message}")]
    UploadFailed {
        /// Error message describing which step of the upload failed
        message: String,
    },

    /// Secret-share reconstruction failed (missing or tampered shares)
    #[error("Reconstruction error: {message}")]
    Reconstruction {
        /// Error message describing the reconstruction failure
        message: String,
    },

    /// Minting a delegation token failed (key mismatch, malformed scope)
    #[error("Token mint error: {message}")]
    TokenMint {
        /// Error message describing the minting failure
        message: String,
    },

    /// Creating the remote compute workload failed
    #[error("Workload create error: {message}")]
    WorkloadCreate {
        /// Error message describing the creation failure
        message: String,
    },

    /// Polling the remote workload failed
    #[error("Workload poll error: {message}")]
    WorkloadPoll {
        /// Error message describing the polling failure
        message: String,
    },

    /// The remote inference job reported failure
    #[error("Inference error: {message}")]
    Inference {
        /// Error message relayed verbatim from the remote job
        message: String,
    },

    /// A bounded wait exceeded its deadline
    #[error("Timed out: {message}")]
    Timeout {
        /// Error message describing which wait timed out
        message: String,
    },
}

impl UmbraError {
    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a crypto error
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create an upload failure error
    pub fn upload_failed(message: impl Into<String>) -> Self {
        Self::UploadFailed {
            message: message.into(),
        }
    }

    /// Create a reconstruction error
    pub fn reconstruction(message: impl Into<String>) -> Self {
        Self::Reconstruction {
            message: message.into(),
        }
    }

    /// Create a token mint error
    pub fn token_mint(message: impl Into<String>) -> Self {
        Self::TokenMint {
            message: message.into(),
        }
    }

    /// Create a workload creation error
    pub fn workload_create(message: impl Into<String>) -> Self {
        Self::WorkloadCreate {
            message: message.into(),
        }
    }

    /// Create a workload polling error
    pub fn workload_poll(message: impl Into<String>) -> Self {
        Self::WorkloadPoll {
            message: message.into(),
        }
    }

    /// Create an inference error carrying the remote message verbatim
    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }
}

/// Unified result type for all Umbra operations
pub type UmbraResult<T> = Result<T, UmbraError>;
