//! Event types (C7 half): the tagged union the adapter emits.
//!
//! Plain data, grounded on the teacher's `Match` struct in `lib.rs` (a
//! simple struct with accessor-shaped fields, no inheritance hierarchy).

use std::collections::HashMap;

/// One unit of the parsed output stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Plain text observed at `path`. `content` is always non-empty.
    Text { path: String, content: String },
    /// A schema-permitted tag opened, moving the current path to `path`.
    /// `attributes` holds only the entries whitelisted for this path.
    Open {
        path: String,
        attributes: HashMap<String, String>,
    },
    /// A schema-permitted tag closed. `path` is the path of the node being
    /// exited, i.e. the path *before* this transition, never the parent.
    Close { path: String },
}

impl Event {
    pub fn path(&self) -> &str {
        match self {
            Event::Text { path, .. } => path,
            Event::Open { path, .. } => path,
            Event::Close { path } => path,
        }
    }
}
