//! Token-boundary-preserving buffer (C2).
//!
//! Holds an ordered sequence of text fragments as they arrive from `push`,
//! and lets callers extract a character-counted prefix while preserving
//! the original fragment boundaries (or, via `extract_as_string`, collapse
//! them into one string). Front-truncation is O(1) amortised: consumed
//! fragments are only physically dropped from the backing `Vec` once the
//! logical front crosses a compaction threshold.

const COMPACTION_THRESHOLD: usize = 50;

struct Fragment {
    text: String,
    char_len: usize,
}

/// An ordered, append-only sequence of text fragments with O(1) amortised
/// front-truncation and mid-fragment splitting, counted in characters.
pub struct TokenBuffer {
    frags: Vec<Fragment>,
    start_index: usize,
    split_offset: usize,
    total_length: usize,
    warned_empty_push: bool,
}

impl TokenBuffer {
    pub fn new() -> Self {
        TokenBuffer {
            frags: Vec::new(),
            start_index: 0,
            split_offset: 0,
            total_length: 0,
            warned_empty_push: false,
        }
    }

    /// Appends `text`. Empty input is tolerated: some upstream token
    /// streams emit spurious empty deltas, and failing on them would make
    /// the parser brittle for no benefit. We warn once per buffer lifetime
    /// rather than on every occurrence, since a chatty stream can emit many.
    pub fn push(&mut self, text: &str) {
        if text.is_empty() {
            if !self.warned_empty_push {
                tracing::warn!("ignoring empty chunk pushed to token buffer");
                self.warned_empty_push = true;
            }
            return;
        }
        let char_len = text.chars().count();
        self.frags.push(Fragment {
            text: text.to_string(),
            char_len,
        });
        self.total_length += char_len;
    }

    /// Returns the earliest `n` characters as an ordered list of strings,
    /// preserving fragment boundaries where a fragment is fully consumed,
    /// and slicing (without mutating the stored fragment) where it straddles
    /// the cut. `n` greater than the buffer's length behaves as if it were
    /// exactly the buffer's length.
    pub fn extract_up_to(&mut self, n: usize) -> Vec<String> {
        let mut remaining = n.min(self.total_length);
        let mut out = Vec::new();

        while remaining > 0 {
            let idx = self.start_index;
            let frag = &self.frags[idx];
            let avail = frag.char_len - self.split_offset;

            if avail <= remaining {
                let piece = if self.split_offset == 0 {
                    frag.text.clone()
                } else {
                    frag.text.chars().skip(self.split_offset).collect()
                };
                out.push(piece);
                remaining -= avail;
                self.start_index += 1;
                self.split_offset = 0;
            } else {
                let piece: String = frag
                    .text
                    .chars()
                    .skip(self.split_offset)
                    .take(remaining)
                    .collect();
                self.split_offset += remaining;
                out.push(piece);
                remaining = 0;
            }
        }

        self.total_length -= n.min(self.total_length);
        self.maybe_compact();
        out
    }

    /// Like `extract_up_to`, but collapses the result into a single string;
    /// used for pattern payloads that don't need boundary preservation.
    pub fn extract_as_string(&mut self, n: usize) -> String {
        self.extract_up_to(n).concat()
    }

    /// Returns every remaining fragment (the first sliced by the current
    /// split offset) and clears the buffer entirely, including any
    /// physically-retained consumed prefix.
    pub fn flush_all(&mut self) -> Vec<String> {
        let all = self.extract_up_to(self.total_length);
        self.frags.clear();
        self.start_index = 0;
        self.split_offset = 0;
        all
    }

    /// A read-only view of the current contents, concatenated.
    pub fn content_as_string(&self) -> String {
        let mut s = String::with_capacity(self.total_length);
        for (i, frag) in self.frags.iter().enumerate().skip(self.start_index) {
            if i == self.start_index && self.split_offset > 0 {
                s.extend(frag.text.chars().skip(self.split_offset));
            } else {
                s.push_str(&frag.text);
            }
        }
        s
    }

    pub fn total_length(&self) -> usize {
        self.total_length
    }

    pub fn is_empty(&self) -> bool {
        self.total_length == 0
    }

    pub fn token_count(&self) -> usize {
        self.frags.len() - self.start_index
    }

    fn maybe_compact(&mut self) {
        if self.start_index >= COMPACTION_THRESHOLD {
            self.frags.drain(0..self.start_index);
            self.start_index = 0;
        }
    }
}

impl Default for TokenBuffer {
    fn default() -> Self {
        Self::new()
    }
}
