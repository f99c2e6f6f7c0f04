//! Hierarchical command scopes
//!
//! A command is a path like `["vault", "data", "create"]`. Delegation may only
//! narrow a command: a child token's command must extend its parent's path,
//! never widen it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A hierarchical command path naming what a token authorizes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command(Vec<String>);

impl Command {
    /// Build a command from path segments
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Command(segments.into_iter().map(Into::into).collect())
    }

    /// Path segments
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Whether this command is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this command is a prefix-scoped subset of `parent`
    ///
    /// `/vault/data/create` narrows `/vault/data` and `/vault`, but not
    /// `/vault/queries`. Equal commands narrow trivially.
    pub fn narrows(&self, parent: &Command) -> bool {
        self.0.len() >= parent.0.len() && self.0.starts_with(&parent.0)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}
