//! Pattern Trie (C1): an immutable Aho-Corasick automaton built once from
//! schema-derived patterns.
//!
//! Construction follows the textbook two-pass approach also used by the
//! word-based automaton this crate's matcher grew out of: build a trie of
//! the literal patterns first (`build_trie`), then compute failure links
//! with a breadth-first traversal (`fill_failure_links`), aggregating each
//! node's match outputs with its failure target's so a single node lookup
//! reveals every pattern ending there.
//!
//! Unlike the teacher automaton this is grounded on, transitions are keyed
//! by `char` rather than by Unicode word, since the patterns here are XML-like
//! tag literals (`<foo`, `</foo>`) rather than natural-language tokens.

use std::collections::{HashMap, VecDeque};

use crate::error::ConfigError;

pub(crate) const ROOT: usize = 0;

struct Node {
    children: HashMap<char, usize>,
    fail: usize,
    /// Pattern ids ending at this node, aggregated along the failure chain.
    out: Vec<usize>,
    depth: usize,
}

impl Node {
    fn new(depth: usize) -> Self {
        Node {
            children: HashMap::new(),
            fail: ROOT,
            out: Vec::new(),
            depth,
        }
    }
}

/// An immutable multi-pattern automaton over a fixed pattern set.
pub(crate) struct Trie {
    nodes: Vec<Node>,
    patterns: Vec<Vec<char>>,
    max_pattern_len: usize,
}

impl Trie {
    /// Builds a trie from `patterns`. Patterns must be non-empty; duplicates
    /// are silently collapsed to a single pattern id (this can legitimately
    /// happen when a schema tag has an alias that collides with another
    /// tag's derived pattern string).
    pub(crate) fn build(patterns: Vec<String>) -> Result<Trie, ConfigError> {
        if patterns.is_empty() {
            return Err(ConfigError::EmptyPatternSet);
        }
        if patterns.iter().any(|p| p.is_empty()) {
            return Err(ConfigError::EmptyPattern);
        }

        let mut seen = HashMap::new();
        let mut unique_patterns = Vec::new();
        for p in patterns {
            if !seen.contains_key(&p) {
                seen.insert(p.clone(), unique_patterns.len());
                unique_patterns.push(p);
            }
        }

        let mut trie = Trie {
            nodes: vec![Node::new(0)],
            patterns: unique_patterns.iter().map(|p| p.chars().collect()).collect(),
            max_pattern_len: 0,
        };
        trie.build_trie();
        trie.fill_failure_links();
        Ok(trie)
    }

    fn build_trie(&mut self) {
        for (pattern_id, chars) in self.patterns.clone().into_iter().enumerate() {
            self.max_pattern_len = self.max_pattern_len.max(chars.len());
            let mut current = ROOT;
            for c in chars {
                current = match self.nodes[current].children.get(&c) {
                    Some(&next) => next,
                    None => {
                        let depth = self.nodes[current].depth + 1;
                        let next = self.nodes.len();
                        self.nodes.push(Node::new(depth));
                        self.nodes[current].children.insert(c, next);
                        next
                    }
                };
            }
            self.nodes[current].out.push(pattern_id);
        }
    }

    fn fill_failure_links(&mut self) {
        let mut queue = VecDeque::new();
        for &child in self.nodes[ROOT].children.values() {
            self.nodes[child].fail = ROOT;
            queue.push_back(child);
        }

        while let Some(id) = queue.pop_front() {
            let children: Vec<(char, usize)> = self.nodes[id]
                .children
                .iter()
                .map(|(&c, &next)| (c, next))
                .collect();

            for (c, next) in children {
                queue.push_back(next);

                let mut fail = self.nodes[id].fail;
                while fail != ROOT && !self.nodes[fail].children.contains_key(&c) {
                    fail = self.nodes[fail].fail;
                }
                fail = self.nodes[fail].children.get(&c).copied().unwrap_or(ROOT);

                self.nodes[next].fail = fail;

                let inherited = self.nodes[fail].out.clone();
                self.nodes[next].out.extend(inherited);
            }
        }
    }

    pub(crate) fn root(&self) -> usize {
        ROOT
    }

    pub(crate) fn child(&self, state: usize, c: char) -> Option<usize> {
        self.nodes[state].children.get(&c).copied()
    }

    pub(crate) fn fail(&self, state: usize) -> usize {
        self.nodes[state].fail
    }

    pub(crate) fn out(&self, state: usize) -> &[usize] {
        &self.nodes[state].out
    }

    pub(crate) fn has_children(&self, state: usize) -> bool {
        !self.nodes[state].children.is_empty()
    }

    pub(crate) fn depth(&self, state: usize) -> usize {
        self.nodes[state].depth
    }

    pub(crate) fn pattern_len(&self, pattern_id: usize) -> usize {
        self.patterns[pattern_id].len()
    }

    pub(crate) fn pattern_str(&self, pattern_id: usize) -> String {
        self.patterns[pattern_id].iter().collect()
    }

    pub(crate) fn max_pattern_len(&self) -> usize {
        self.max_pattern_len
    }
}
