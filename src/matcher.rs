//! Stream Matcher (C3): drives the pattern trie over the token buffer,
//! emitting `TextRun`/`PatternHit` results with greedy-longest-match
//! disambiguation and a safe-flush policy that never emits text that could
//! still turn out to be (a prefix of) a match.
//!
//! The walk itself is grounded on the teacher's `overlapping_find_at`
//! failure-chain walking loop (`automaton.rs`) and its cursor-carrying
//! iterator (`ahocorasick.rs`'s `FindOverlappingIter`), generalized from a
//! one-shot borrowed haystack to an incrementally-fed, owned buffer with a
//! greedy "pending" candidate the teacher's overlapping-match iterator has
//! no equivalent of.

use crate::buffer::TokenBuffer;
use crate::error::InputError;
use crate::trie::Trie;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MatchResult {
    TextRun(Vec<String>),
    PatternHit {
        text_before: Vec<String>,
        pattern_literal: String,
    },
}

#[derive(Clone, Copy)]
struct Pending {
    pattern: usize,
    start: usize,
}

pub(crate) struct StreamMatcher {
    buffer: TokenBuffer,
    pending: Option<Pending>,
    buffer_cap: usize,
}

impl StreamMatcher {
    pub(crate) fn new(buffer_cap: usize) -> Self {
        StreamMatcher {
            buffer: TokenBuffer::new(),
            pending: None,
            buffer_cap,
        }
    }

    /// Pushes `chunk` and drains every result currently derivable from the
    /// buffer. `None` is rejected (internal callers must not pass it); an
    /// empty string is tolerated by the underlying buffer.
    pub(crate) fn feed(
        &mut self,
        trie: &Trie,
        chunk: Option<&str>,
    ) -> Result<Vec<MatchResult>, InputError> {
        let chunk = chunk.ok_or(InputError::MissingInput)?;
        self.buffer.push(chunk);

        let mut results = Vec::new();
        while let Some(result) = self.process_buffer(trie) {
            results.push(result);
        }
        Ok(results)
    }

    pub(crate) fn flush_remaining(&mut self) -> Vec<String> {
        self.pending = None;
        self.buffer.flush_all()
    }

    pub(crate) fn total_length(&self) -> usize {
        self.buffer.total_length()
    }

    fn commit(&mut self, pattern: usize, start: usize, trie: &Trie) -> MatchResult {
        let len = trie.pattern_len(pattern);
        let text_before = self.buffer.extract_up_to(start);
        let pattern_literal = self.buffer.extract_as_string(len);
        tracing::trace!(pattern = %pattern_literal, "stream matcher committed pattern hit");
        MatchResult::PatternHit {
            text_before,
            pattern_literal,
        }
    }

    fn process_buffer(&mut self, trie: &Trie) -> Option<MatchResult> {
        if self.buffer.is_empty() {
            return None;
        }

        let text = self.buffer.content_as_string();
        let chars: Vec<char> = text.chars().collect();
        let mut state = trie.root();
        let mut longest_match_prefix_depth = 0usize;

        for (i, &c) in chars.iter().enumerate() {
            while state != trie.root() && trie.child(state, c).is_none() {
                state = trie.fail(state);
            }

            if let Some(next) = trie.child(state, c) {
                state = next;
            } else if let Some(pending) = self.pending.take() {
                return Some(self.commit(pending.pattern, pending.start, trie));
            } else {
                state = trie.root();
            }

            if !trie.out(state).is_empty() {
                let longest = *trie
                    .out(state)
                    .iter()
                    .max_by_key(|&&pid| trie.pattern_len(pid))
                    .expect("out is non-empty");
                let plen = trie.pattern_len(longest);
                let start = i + 1 - plen;

                if trie.has_children(state) {
                    self.pending = Some(Pending {
                        pattern: longest,
                        start,
                    });
                    continue;
                } else {
                    self.pending = None;
                    return Some(self.commit(longest, start, trie));
                }
            }

            if i == chars.len() - 1 {
                let mut depth = trie.depth(state);
                let mut s = trie.fail(state);
                while s != trie.root() {
                    depth = depth.max(trie.depth(s));
                    s = trie.fail(s);
                }
                longest_match_prefix_depth = depth;
            }
        }

        if let Some(pending) = self.pending {
            if self.buffer.total_length() > self.buffer_cap {
                self.pending = None;
                tracing::trace!("forcing overflow commit of pending greedy match");
                return Some(self.commit(pending.pattern, pending.start, trie));
            }
        }

        let mut safe = self
            .buffer
            .total_length()
            .saturating_sub(longest_match_prefix_depth);
        if let Some(pending) = self.pending {
            safe = safe.min(pending.start);
        }
        if self.buffer.total_length() > self.buffer_cap {
            safe = safe.max(
                self.buffer
                    .total_length()
                    .saturating_sub(trie.max_pattern_len()),
            );
        }

        if safe > 0 {
            return Some(MatchResult::TextRun(self.buffer.extract_up_to(safe)));
        }

        None
    }
}
