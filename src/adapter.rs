//! Adapter (C6): orchestrator and event emitter.
//!
//! Owns the stream matcher (C3), the current schema-tree position, an
//! open-tag parser (C4, re-used across tags), and a raw-input accumulator.
//! Grounded on the teacher's `SimpleFinder`/`SimpleFinderIter` pairing in
//! `src/lib.rs` (an owning "finder" struct plus an iterator-driven
//! consumption loop), generalized to a stateful cursor that routes chunks
//! between the matcher and the tag parser and emits path-tagged events.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::event::Event;
use crate::matcher::{MatchResult, StreamMatcher};
use crate::schema::Schema;
use crate::tag_parser::{ParsedTag, TagParser};

/// A mutable, non-reentrant cursor over one streaming parse (spec.md §5:
/// "single-threaded cooperative... each adapter instance is a mutable
/// cursor and is not reentrant"). `Schema` itself is immutable and cheaply
/// cloned, so many adapters may share one compiled schema concurrently.
pub struct Adapter {
    schema: Schema,
    matcher: StreamMatcher,
    tag_parser: Option<TagParser>,
    current: usize,
    raw: String,
}

impl Adapter {
    pub fn new(schema: Schema) -> Self {
        let cap = (2 * schema.trie().max_pattern_len()).max(1);
        let root = schema.root_node();
        Adapter {
            schema,
            matcher: StreamMatcher::new(cap),
            tag_parser: None,
            current: root,
            raw: String::new(),
        }
    }

    pub fn current_path(&self) -> String {
        self.schema.path_of(self.current).to_string()
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Feeds one chunk. `None` or an empty chunk is tolerated and yields no
    /// events (spec.md §6: "null/empty returns empty list") — unlike the
    /// lower-level buffer/matcher APIs, which reject a missing chunk as an
    /// internal contract violation.
    pub fn feed(&mut self, chunk: Option<&str>) -> Vec<Event> {
        let chunk = match chunk {
            Some(c) if !c.is_empty() => c,
            _ => return Vec::new(),
        };
        self.raw.push_str(chunk);

        let mut events = Vec::new();

        // Step 2 (spec.md §4.6): if C4 was already parsing across the
        // previous chunk boundary, this new chunk belongs to it first.
        let to_feed_matcher: String;
        if let Some(mut parser) = self.tag_parser.take() {
            match parser.feed(chunk) {
                Some(parsed) => {
                    let remaining = parsed.remaining.clone();
                    self.emit_open_tag(parsed, &mut events);
                    if remaining.is_empty() {
                        return events;
                    }
                    to_feed_matcher = remaining;
                }
                None => {
                    self.tag_parser = Some(parser);
                    return events;
                }
            }
        } else {
            to_feed_matcher = chunk.to_string();
        }

        if to_feed_matcher.is_empty() {
            return events;
        }

        let results = self
            .matcher
            .feed(self.schema.trie(), Some(&to_feed_matcher))
            .expect("adapter always supplies Some chunk to the matcher");

        for result in results {
            match result {
                MatchResult::TextRun(frags) => {
                    self.route_fragments(frags, &mut events);
                }
                MatchResult::PatternHit {
                    text_before,
                    pattern_literal,
                } => {
                    self.route_fragments(text_before, &mut events);
                    self.dispatch_pattern(&pattern_literal, &mut events);
                }
            }
        }

        events
    }

    /// Finalises the stream: force-completes any in-flight open tag and
    /// flushes whatever the matcher is still holding back as plain text.
    /// Safe to call repeatedly; a second `flush()` after a first is a
    /// no-op (spec.md §8 property 6).
    pub fn flush(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        if let Some(mut parser) = self.tag_parser.take() {
            let parsed = parser.force_complete();
            self.emit_open_tag(parsed, &mut events);
        }
        for frag in self.matcher.flush_remaining() {
            if !frag.is_empty() {
                let path = self.current_path();
                events.push(Event::Text {
                    path,
                    content: frag,
                });
            }
        }
        events
    }

    /// Convenience wrapper over repeated `feed` + trailing `flush` for
    /// callers who already have the whole chunk sequence in hand. Not a
    /// new code path: it does not change the streaming contract.
    pub fn feed_all<I, S>(&mut self, chunks: I) -> Vec<Event>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut events = Vec::new();
        for chunk in chunks {
            events.extend(self.feed(Some(chunk.as_ref())));
        }
        events.extend(self.flush());
        events
    }

    /// Dispatches already-matcher-vetted fragments: routed through C4 if
    /// it is (or becomes) active mid-drain, otherwise emitted one `Text`
    /// event per fragment to preserve chunk boundaries (spec.md §8
    /// property 4).
    fn route_fragments(&mut self, frags: Vec<String>, events: &mut Vec<Event>) {
        let mut queue: VecDeque<String> = frags.into_iter().filter(|f| !f.is_empty()).collect();
        while let Some(piece) = queue.pop_front() {
            if self.tag_parser.is_some() {
                self.route_through_parser(piece, &mut queue, events);
            } else {
                let path = self.current_path();
                events.push(Event::Text {
                    path,
                    content: piece,
                });
            }
        }
    }

    fn route_through_parser(&mut self, text: String, queue: &mut VecDeque<String>, events: &mut Vec<Event>) {
        let mut parser = self.tag_parser.take().expect("caller checked is_some");
        match parser.feed(&text) {
            Some(parsed) => {
                let remaining = parsed.remaining.clone();
                self.emit_open_tag(parsed, events);
                if !remaining.is_empty() {
                    queue.push_front(remaining);
                }
            }
            None => {
                self.tag_parser = Some(parser);
            }
        }
    }

    fn dispatch_pattern(&mut self, pattern: &str, events: &mut Vec<Event>) {
        if pattern.starts_with("</") {
            let name = &pattern[2..pattern.len() - 1];
            self.emit_close_tag(name, events);
        } else {
            self.tag_parser = Some(TagParser::new(pattern));
        }
    }

    fn emit_open_tag(&mut self, parsed: ParsedTag, events: &mut Vec<Event>) {
        let path_before = self.current_path();
        match self.schema.try_open(self.current, &parsed.tag_name) {
            Some(next) => {
                self.current = next;
                let allowed = self.schema.allowed_attributes(self.current);
                let attributes = filter_attributes(parsed.attrs, &allowed);
                let path = self.current_path();
                events.push(Event::Open { path, attributes });
            }
            None => {
                tracing::debug!(
                    tag = %parsed.tag_name,
                    path = %path_before,
                    "rejected tag open: no such transition from current path"
                );
                events.push(Event::Text {
                    path: path_before,
                    content: parsed.raw_tag,
                });
            }
        }
    }

    fn emit_close_tag(&mut self, name: &str, events: &mut Vec<Event>) {
        let path_before = self.current_path();
        match self.schema.try_close(self.current, name) {
            Some(parent) => {
                events.push(Event::Close {
                    path: path_before,
                });
                self.current = parent;
            }
            None => {
                tracing::debug!(
                    tag = %name,
                    path = %path_before,
                    "rejected tag close: does not match current path"
                );
                events.push(Event::Text {
                    path: path_before,
                    content: format!("</{}>", name),
                });
            }
        }
    }
}

fn filter_attributes(
    attrs: HashMap<String, String>,
    allowed: &HashSet<String>,
) -> HashMap<String, String> {
    attrs
        .into_iter()
        .filter(|(k, _)| allowed.contains(k))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;

    fn schema_thinking() -> Schema {
        Schema::root().tag("thinking").build().unwrap()
    }

    #[test]
    fn s1_split_open_tag_across_chunks() {
        let mut a = Adapter::new(schema_thinking());
        let chunks = [
            "<thi", "nking>", "Let me ", "think", "...", "</", "thi", "nking>",
        ];
        let mut events = Vec::new();
        for c in chunks {
            events.extend(a.feed(Some(c)));
        }
        events.extend(a.flush());

        assert_eq!(
            events,
            vec![
                Event::Open {
                    path: "/thinking".to_string(),
                    attributes: HashMap::new(),
                },
                Event::Text {
                    path: "/thinking".to_string(),
                    content: "Let me ".to_string(),
                },
                Event::Text {
                    path: "/thinking".to_string(),
                    content: "think".to_string(),
                },
                Event::Text {
                    path: "/thinking".to_string(),
                    content: "...".to_string(),
                },
                Event::Close {
                    path: "/thinking".to_string(),
                },
            ]
        );
    }

    #[test]
    fn s2_alias_close() {
        let schema = Schema::root().tag("cite").alias(&["rag"]).build().unwrap();
        let mut a = Adapter::new(schema);
        let events = a.feed_all(["<rag>x</cite>"]);
        assert_eq!(
            events,
            vec![
                Event::Open {
                    path: "/cite".to_string(),
                    attributes: HashMap::new(),
                },
                Event::Text {
                    path: "/cite".to_string(),
                    content: "x".to_string(),
                },
                Event::Close {
                    path: "/cite".to_string(),
                },
            ]
        );
    }

    #[test]
    fn s3_attribute_whitelist() {
        let schema = Schema::root().tag("cite").attr(&["id"]).build().unwrap();
        let mut a = Adapter::new(schema);
        let events = a.feed_all(["<cite id=\"r1\" source=\"wiki\">c</cite>"]);
        let mut expected_attrs = HashMap::new();
        expected_attrs.insert("id".to_string(), "r1".to_string());
        assert_eq!(
            events,
            vec![
                Event::Open {
                    path: "/cite".to_string(),
                    attributes: expected_attrs,
                },
                Event::Text {
                    path: "/cite".to_string(),
                    content: "c".to_string(),
                },
                Event::Close {
                    path: "/cite".to_string(),
                },
            ]
        );
    }

    #[test]
    fn s4_disallowed_transition_passes_through_as_text() {
        let schema = Schema::root().tag("answer").build().unwrap();
        let mut a = Adapter::new(schema);
        let events = a.feed_all([
            "<invalid>", "x", "</invalid>", "<answer>", "y", "</answer>",
        ]);
        assert_eq!(
            events,
            vec![
                Event::Text {
                    path: "/".to_string(),
                    content: "<invalid>".to_string(),
                },
                Event::Text {
                    path: "/".to_string(),
                    content: "x".to_string(),
                },
                Event::Text {
                    path: "/".to_string(),
                    content: "</invalid>".to_string(),
                },
                Event::Open {
                    path: "/answer".to_string(),
                    attributes: HashMap::new(),
                },
                Event::Text {
                    path: "/answer".to_string(),
                    content: "y".to_string(),
                },
                Event::Close {
                    path: "/answer".to_string(),
                },
            ]
        );
    }

    #[test]
    fn s5_quote_straddling_chunks() {
        let schema = Schema::root().tag("cite").attr(&["expr"]).build().unwrap();
        let mut a = Adapter::new(schema);
        let mut events = a.feed(Some("<cite expr=\"a>"));
        events.extend(a.feed(Some("b\">c</cite>")));
        events.extend(a.flush());

        let mut expected_attrs = HashMap::new();
        expected_attrs.insert("expr".to_string(), "a>b".to_string());
        assert_eq!(
            events,
            vec![
                Event::Open {
                    path: "/cite".to_string(),
                    attributes: expected_attrs,
                },
                Event::Text {
                    path: "/cite".to_string(),
                    content: "c".to_string(),
                },
                Event::Close {
                    path: "/cite".to_string(),
                },
            ]
        );
    }

    #[test]
    fn s6_truncated_at_eof_recovered_by_flush() {
        let schema = Schema::root().tag("cite").attr(&["id"]).build().unwrap();
        let mut a = Adapter::new(schema);
        let mut events = a.feed(Some("Text <cite id=\"ref1\""));
        events.extend(a.flush());

        let mut expected_attrs = HashMap::new();
        expected_attrs.insert("id".to_string(), "ref1".to_string());
        assert_eq!(
            events,
            vec![
                Event::Text {
                    path: "/".to_string(),
                    content: "Text ".to_string(),
                },
                Event::Open {
                    path: "/cite".to_string(),
                    attributes: expected_attrs,
                },
            ]
        );
    }

    #[test]
    fn flush_is_idempotent() {
        let mut a = Adapter::new(schema_thinking());
        let _ = a.feed_all(["<thinking>hi</thinking>"]);
        assert_eq!(a.flush(), Vec::new());
        assert_eq!(a.flush(), Vec::new());
    }

    #[test]
    fn raw_accumulator_is_verbatim() {
        let mut a = Adapter::new(schema_thinking());
        a.feed(Some("<thi"));
        a.feed(Some("nking>hi</thinking>"));
        assert_eq!(a.raw(), "<thinking>hi</thinking>");
    }

    #[test]
    fn null_and_empty_chunks_yield_no_events() {
        let mut a = Adapter::new(schema_thinking());
        assert_eq!(a.feed(None), Vec::new());
        assert_eq!(a.feed(Some("")), Vec::new());
    }

    #[test]
    fn degenerate_all_text_stream_stays_at_root() {
        let mut a = Adapter::new(schema_thinking());
        let events = a.feed_all(["just plain text, no tags at all"]);
        assert_eq!(
            events,
            vec![Event::Text {
                path: "/".to_string(),
                content: "just plain text, no tags at all".to_string(),
            }]
        );
    }

    #[test]
    fn whitespace_only_tag_body_is_preserved() {
        let mut a = Adapter::new(schema_thinking());
        let events = a.feed_all(["<thinking>   </thinking>"]);
        assert_eq!(
            events,
            vec![
                Event::Open {
                    path: "/thinking".to_string(),
                    attributes: HashMap::new(),
                },
                Event::Text {
                    path: "/thinking".to_string(),
                    content: "   ".to_string(),
                },
                Event::Close {
                    path: "/thinking".to_string(),
                },
            ]
        );
    }
}
