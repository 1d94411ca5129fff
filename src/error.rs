//! Error taxonomy (spec §7).
//!
//! `ConfigError` covers construction-time ("fail fast") failures in the
//! schema builder. `InputError` covers the lower-level buffer/matcher
//! contract violations that spec.md calls out as throwing for *internal*
//! callers (the adapter itself never surfaces these to its own callers:
//! §7 "the adapter never raises on content").
//!
//! Negative extraction lengths (spec.md §4.2/§7) have no counterpart here:
//! `TokenBuffer`/`StreamMatcher` take `usize`, so the impossible state
//! doesn't need a runtime check.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("schema has no derived patterns; define at least one tag")]
    EmptyPatternSet,
    #[error("a pattern derived from the schema was empty")]
    EmptyPattern,
    #[error("tag name must not be empty")]
    EmptyTagName,
    #[error("alias name must not be empty")]
    EmptyAliasName,
    #[error("alias() was called before any tag() at this nesting level")]
    AliasBeforeTag,
    #[error("attr() was called before any tag() at this nesting level")]
    AttrBeforeTag,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("feed was called with no input")]
    MissingInput,
}
