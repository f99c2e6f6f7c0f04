//! Capability-based delegated authorization
//!
//! Signed, scoped, time-boxed tokens that chain from a root credential down
//! to a narrow capability for a named audience. Delegation narrows and
//! forwards authority; invocation exercises it. Verifiers walk the whole
//! chain before honoring a token.

pub mod chain;
pub mod command;
pub mod issuer;
pub mod token;

pub use chain::verify_envelope;
pub use command::Command;
pub use issuer::issue;
pub use token::{DelegationToken, SignedToken, TokenBody, TokenEnvelope};
