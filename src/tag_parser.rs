//! Open-Tag Parser (C4): a 6-state machine that consumes a buffered tail
//! starting at `<tagname` and runs until an unquoted `>`, across any
//! number of chunks, collecting attributes and honouring quotes.
//!
//! No teacher counterpart exists (the teacher never parses tag syntax);
//! the state shape is grounded on the hand-rolled XML attribute state
//! machines in `other_examples/40c933a3_bovee-entab__entab-src-parsers-xml.rs.rs`
//! and `other_examples/7d71e46a_horazont-rxml__rxml-src-parser-common.rs.rs`
//! (explicit `enum` state, char-by-char `feed`), translated into the exact
//! 6-state table of spec.md §4.4.

use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    AfterTagName,
    AttrName,
    AfterAttrName,
    BeforeAttrValue,
    AttrValueQuoted,
    AttrValueUnquoted,
}

/// The result of a completed open tag: its name, its filtered-later
/// attribute map, the raw literal text consumed (including the original
/// `<tagname` prefix), and any trailing characters observed after `>`
/// within the chunk that completed parsing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ParsedTag {
    pub(crate) tag_name: String,
    pub(crate) attrs: HashMap<String, String>,
    pub(crate) raw_tag: String,
    pub(crate) remaining: String,
}

pub(crate) struct TagParser {
    tag_name: String,
    attrs: HashMap<String, String>,
    raw: String,
    current_tok: String,
    state: State,
    current_attr_name: Option<String>,
    quote_char: Option<char>,
}

fn is_quote(c: char) -> bool {
    c == '"' || c == '\''
}

impl TagParser {
    /// `prefix` is the matched pattern literal, e.g. `"<thinking"`.
    pub(crate) fn new(prefix: &str) -> Self {
        TagParser {
            tag_name: prefix[1..].to_string(),
            attrs: HashMap::new(),
            raw: prefix.to_string(),
            current_tok: String::new(),
            state: State::AfterTagName,
            current_attr_name: None,
            quote_char: None,
        }
    }

    /// Feeds the next chunk of input, character by character, until `>`
    /// completes the tag (outside a quoted attribute value) or the chunk
    /// is exhausted. Returns `Some(parsed)` on completion, `None` if more
    /// input is needed.
    pub(crate) fn feed(&mut self, chunk: &str) -> Option<ParsedTag> {
        let mut byte_offset = 0;
        for c in chunk.chars() {
            let char_len = c.len_utf8();
            if self.step(c) {
                self.raw.push(c);
                let remaining = chunk[byte_offset + char_len..].to_string();
                return Some(ParsedTag {
                    tag_name: self.tag_name.clone(),
                    attrs: std::mem::take(&mut self.attrs),
                    raw_tag: self.raw.clone(),
                    remaining,
                });
            }
            self.raw.push(c);
            byte_offset += char_len;
        }
        None
    }

    /// Closes parsing with whatever attributes were already committed,
    /// discarding any half-parsed attribute (unclosed quote, name-only
    /// with `=` pending). Used by `flush()` for streams truncated mid-tag.
    pub(crate) fn force_complete(&mut self) -> ParsedTag {
        ParsedTag {
            tag_name: self.tag_name.clone(),
            attrs: std::mem::take(&mut self.attrs),
            raw_tag: self.raw.clone(),
            remaining: String::new(),
        }
    }

    fn flush_attr(&mut self, value: String) {
        if let Some(name) = self.current_attr_name.take() {
            self.attrs.insert(name, value);
        }
        self.current_tok.clear();
        self.quote_char = None;
    }

    fn flush_bare_if_nonempty(&mut self) {
        if !self.current_tok.is_empty() {
            let name = std::mem::take(&mut self.current_tok);
            self.attrs.insert(name, String::new());
        }
    }

    fn flush_bare(&mut self) {
        let name = std::mem::take(&mut self.current_tok);
        if !name.is_empty() {
            self.attrs.insert(name, String::new());
        }
    }

    fn finalize_attr_name(&mut self) {
        self.current_attr_name = Some(std::mem::take(&mut self.current_tok));
    }

    /// Advances one character. Returns `true` if this character completed
    /// the tag (an unquoted `>`).
    fn step(&mut self, c: char) -> bool {
        match self.state {
            State::AfterTagName => {
                if c == '>' {
                    return true;
                } else if c.is_whitespace() {
                    // stay
                } else {
                    self.current_tok.clear();
                    self.current_tok.push(c);
                    self.state = State::AttrName;
                }
            }
            State::AttrName => {
                if c == '>' {
                    self.flush_bare_if_nonempty();
                    return true;
                } else if c.is_whitespace() {
                    self.finalize_attr_name();
                    self.state = State::AfterAttrName;
                } else if c == '=' {
                    self.finalize_attr_name();
                    self.current_tok.clear();
                    self.state = State::BeforeAttrValue;
                } else {
                    self.current_tok.push(c);
                }
            }
            State::AfterAttrName => {
                if c == '>' {
                    self.flush_bare();
                    return true;
                } else if c.is_whitespace() {
                    // stay
                } else if c == '=' {
                    self.state = State::BeforeAttrValue;
                } else {
                    self.flush_bare();
                    self.current_tok.clear();
                    self.current_tok.push(c);
                    self.state = State::AttrName;
                }
            }
            State::BeforeAttrValue => {
                if c == '>' {
                    self.flush_attr(String::new());
                    return true;
                } else if c.is_whitespace() {
                    // stay
                } else if is_quote(c) {
                    self.quote_char = Some(c);
                    self.current_tok.clear();
                    self.state = State::AttrValueQuoted;
                } else {
                    self.current_tok.clear();
                    self.current_tok.push(c);
                    self.state = State::AttrValueUnquoted;
                }
            }
            State::AttrValueQuoted => {
                if Some(c) == self.quote_char {
                    let value = std::mem::take(&mut self.current_tok);
                    self.flush_attr(value);
                    self.state = State::AfterTagName;
                } else {
                    self.current_tok.push(c);
                }
            }
            State::AttrValueUnquoted => {
                if c == '>' {
                    let value = std::mem::take(&mut self.current_tok);
                    self.flush_attr(value);
                    return true;
                } else if c.is_whitespace() {
                    let value = std::mem::take(&mut self.current_tok);
                    self.flush_attr(value);
                    self.state = State::AfterTagName;
                } else {
                    self.current_tok.push(c);
                }
            }
        }
        false
    }
}
