//! Turns a sequence of arbitrarily-segmented text chunks (as produced by
//! LLM token streams) into a sequence of path-tagged events.
//!
//! Clients declare a hierarchical schema of XML-like tags up front with
//! [`Schema`]; an [`Adapter`] then recognises schema-defined open/close
//! tags no matter how they are split across chunks, tracks a current path
//! through the schema tree, and emits [`Event`]s carrying either plain
//! text (with its originating chunk boundaries preserved) or tag-open/
//! tag-close markers with parsed and filtered attributes. Tags or
//! transitions the schema doesn't permit are surfaced as plain text,
//! never mutating the current path.
//!
//! ```
//! use tagstream::{Adapter, Schema};
//!
//! let schema = Schema::root()
//!     .tag("thinking")
//!     .build()
//!     .unwrap();
//! let mut adapter = Adapter::new(schema);
//!
//! let events = adapter.feed_all(["<thi", "nking>", "hmm", "</thinking>"]);
//! assert_eq!(events.len(), 3); // Open, Text, Close
//! ```
//!
//! Generalised XML/HTML is explicitly out of scope: no DOCTYPE,
//! processing instructions, comments, CDATA, namespaces, entities,
//! self-closing tags, or identical-name nesting (`<a><a>`).

mod adapter;
mod buffer;
mod error;
mod event;
mod matcher;
mod schema;
mod tag_parser;
mod trie;

pub use adapter::Adapter;
pub use error::ConfigError;
pub use event::Event;
pub use schema::{Schema, SchemaBuilder};
