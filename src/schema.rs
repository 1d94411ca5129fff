//! Transition Table (C5) and schema builder façade (C7 half).
//!
//! The tree of `StateNode`s is implemented as an arena of nodes indexed by
//! stable integers (root = 0), per spec.md §9's explicit recommendation
//! ("avoids cyclic ownership entirely"); this generalizes the teacher's own
//! `Vec<State>` arena indexed by `StateID` in `nfa.rs` from trie states to
//! schema tree nodes.
//!
//! `SchemaBuilder` is a fluent, consuming builder (`tag`/`alias`/`attr`,
//! each taking and returning `Self`) that accumulates validation errors
//! rather than failing immediately, surfacing the first one at `build()` —
//! idiomatic for a construction-time validation layer (spec.md §7
//! "Configuration errors").

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::ConfigError;
use crate::trie::Trie;

const ROOT: usize = 0;

struct StateNode {
    path: String,
    parent: Option<usize>,
    children: HashMap<String, usize>,
}

struct TransitionTable {
    nodes: Vec<StateNode>,
    attributes: HashMap<usize, HashSet<String>>,
}

impl TransitionTable {
    fn try_open(&self, current: usize, name: &str) -> Option<usize> {
        self.nodes[current].children.get(name).copied()
    }

    fn try_close(&self, current: usize, name: &str) -> Option<usize> {
        if current == ROOT {
            return None;
        }
        let parent = self.nodes[current].parent?;
        if self.nodes[parent].children.get(name) == Some(&current) {
            Some(parent)
        } else {
            None
        }
    }

    fn allowed_attributes(&self, node: usize) -> HashSet<String> {
        self.attributes.get(&node).cloned().unwrap_or_default()
    }

    fn path_of(&self, node: usize) -> &str {
        &self.nodes[node].path
    }

    fn describe(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            out.push_str(&node.path);
            out.push('\n');
        }
        out
    }
}

struct TagSpec {
    name: String,
    aliases: Vec<String>,
    attrs: HashSet<String>,
    children: Vec<TagSpec>,
}

/// Fluent, consuming builder for a tag schema. Populates the `path → [tag
/// names]` and `path → {attr names}` maps spec.md §1 describes as an
/// external collaborator's concern; this crate owns that collaborator.
pub struct SchemaBuilder {
    errors: Vec<ConfigError>,
    children: Vec<TagSpec>,
}

impl SchemaBuilder {
    pub fn root() -> Self {
        SchemaBuilder {
            errors: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Adds a leaf tag as a child of the current nesting level.
    pub fn tag(mut self, name: &str) -> Self {
        if name.is_empty() {
            self.errors.push(ConfigError::EmptyTagName);
            return self;
        }
        self.children.push(TagSpec {
            name: name.to_string(),
            aliases: Vec::new(),
            attrs: HashSet::new(),
            children: Vec::new(),
        });
        self
    }

    /// Adds a tag with nested children, built by `builder` starting from a
    /// fresh nesting level. The Rust equivalent of the pseudocode's
    /// `tag(name, builder)` overload, since Rust has no argument-count
    /// overloading.
    pub fn tag_with<F>(mut self, name: &str, builder: F) -> Self
    where
        F: FnOnce(SchemaBuilder) -> SchemaBuilder,
    {
        if name.is_empty() {
            self.errors.push(ConfigError::EmptyTagName);
            return self;
        }
        let nested = builder(SchemaBuilder::root());
        let SchemaBuilder {
            errors: mut nested_errors,
            children: nested_children,
        } = nested;
        self.errors.append(&mut nested_errors);
        self.children.push(TagSpec {
            name: name.to_string(),
            aliases: Vec::new(),
            attrs: HashSet::new(),
            children: nested_children,
        });
        self
    }

    /// Adds aliases to the most recently added tag at this nesting level.
    pub fn alias(mut self, names: &[&str]) -> Self {
        match self.children.last_mut() {
            Some(tag) => {
                for &n in names {
                    if n.is_empty() {
                        self.errors.push(ConfigError::EmptyAliasName);
                    } else {
                        tag.aliases.push(n.to_string());
                    }
                }
            }
            None => self.errors.push(ConfigError::AliasBeforeTag),
        }
        self
    }

    /// Adds allowed attribute names to the most recently added tag.
    pub fn attr(mut self, names: &[&str]) -> Self {
        match self.children.last_mut() {
            Some(tag) => {
                for &n in names {
                    tag.attrs.insert(n.to_string());
                }
            }
            None => self.errors.push(ConfigError::AttrBeforeTag),
        }
        self
    }

    pub fn build(self) -> Result<Schema, ConfigError> {
        if let Some(e) = self.errors.into_iter().next() {
            return Err(e);
        }
        let mut nodes = vec![StateNode {
            path: "/".to_string(),
            parent: None,
            children: HashMap::new(),
        }];
        let mut attributes = HashMap::new();
        let mut patterns = Vec::new();

        for spec in self.children {
            insert_tag(&mut nodes, &mut attributes, &mut patterns, ROOT, spec)?;
        }

        let trie = Trie::build(patterns)?;
        let transitions = TransitionTable { nodes, attributes };
        Ok(Schema(Arc::new(SchemaInner { trie, transitions })))
    }
}

fn insert_tag(
    nodes: &mut Vec<StateNode>,
    attributes: &mut HashMap<usize, HashSet<String>>,
    patterns: &mut Vec<String>,
    parent: usize,
    spec: TagSpec,
) -> Result<(), ConfigError> {
    if spec.name.is_empty() {
        return Err(ConfigError::EmptyTagName);
    }
    let parent_path = &nodes[parent].path;
    let path = if parent_path == "/" {
        format!("/{}", spec.name)
    } else {
        format!("{}/{}", parent_path, spec.name)
    };

    let idx = nodes.len();
    nodes.push(StateNode {
        path: path.clone(),
        parent: Some(parent),
        children: HashMap::new(),
    });

    nodes[parent].children.insert(spec.name.clone(), idx);
    patterns.push(format!("<{}", spec.name));
    patterns.push(format!("</{}>", spec.name));

    for alias in &spec.aliases {
        if alias.is_empty() {
            return Err(ConfigError::EmptyAliasName);
        }
        nodes[parent].children.insert(alias.clone(), idx);
        patterns.push(format!("<{}", alias));
        patterns.push(format!("</{}>", alias));
    }

    attributes.insert(idx, spec.attrs);

    for child in spec.children {
        insert_tag(nodes, attributes, patterns, idx, child)?;
    }
    Ok(())
}

struct SchemaInner {
    trie: Trie,
    transitions: TransitionTable,
}

/// An immutable, cheaply-cloneable compiled schema: C1's trie plus C5's
/// transition table, built once and shared by every `Adapter` that uses it
/// (spec.md §5: "may be shared by many adapter instances concurrently
/// without synchronisation").
#[derive(Clone)]
pub struct Schema(Arc<SchemaInner>);

impl Schema {
    pub fn root() -> SchemaBuilder {
        SchemaBuilder::root()
    }

    pub(crate) fn trie(&self) -> &Trie {
        &self.0.trie
    }

    pub(crate) fn root_node(&self) -> usize {
        ROOT
    }

    pub(crate) fn try_open(&self, current: usize, name: &str) -> Option<usize> {
        self.0.transitions.try_open(current, name)
    }

    pub(crate) fn try_close(&self, current: usize, name: &str) -> Option<usize> {
        self.0.transitions.try_close(current, name)
    }

    pub(crate) fn allowed_attributes(&self, node: usize) -> HashSet<String> {
        self.0.transitions.allowed_attributes(node)
    }

    pub(crate) fn path_of(&self, node: usize) -> &str {
        self.0.transitions.path_of(node)
    }

    /// Renders the tree of paths known to this schema, for diagnostics.
    pub fn describe(&self) -> String {
        self.0.transitions.describe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_tag_open_and_close_roundtrip() {
        let schema = Schema::root().tag("thinking").build().unwrap();
        let next = schema.try_open(ROOT, "thinking").unwrap();
        assert_eq!(schema.path_of(next), "/thinking");
        let back = schema.try_close(next, "thinking").unwrap();
        assert_eq!(back, ROOT);
    }

    #[test]
    fn alias_opens_and_closes_same_node() {
        let schema = Schema::root()
            .tag("cite")
            .alias(&["rag"])
            .build()
            .unwrap();
        let via_canonical = schema.try_open(ROOT, "cite").unwrap();
        let via_alias = schema.try_open(ROOT, "rag").unwrap();
        assert_eq!(via_canonical, via_alias);
        assert_eq!(schema.try_close(via_canonical, "rag"), Some(ROOT));
        assert_eq!(schema.try_close(via_canonical, "cite"), Some(ROOT));
    }

    #[test]
    fn attribute_whitelist_is_per_path() {
        let schema = Schema::root().tag("cite").attr(&["id"]).build().unwrap();
        let node = schema.try_open(ROOT, "cite").unwrap();
        let allowed = schema.allowed_attributes(node);
        assert!(allowed.contains("id"));
        assert!(!allowed.contains("source"));
    }

    #[test]
    fn unknown_tag_has_no_transition() {
        let schema = Schema::root().tag("answer").build().unwrap();
        assert!(schema.try_open(ROOT, "invalid").is_none());
    }

    #[test]
    fn nested_tags_build_multi_segment_paths() {
        let schema = Schema::root()
            .tag_with("answer", |b| b.tag("cite"))
            .build()
            .unwrap();
        let answer = schema.try_open(ROOT, "answer").unwrap();
        let cite = schema.try_open(answer, "cite").unwrap();
        assert_eq!(schema.path_of(cite), "/answer/cite");
        // cite is not reachable from root directly
        assert!(schema.try_open(ROOT, "cite").is_none());
    }

    #[test]
    fn empty_tag_name_is_rejected() {
        let result = Schema::root().tag("").build();
        assert_eq!(result.unwrap_err(), ConfigError::EmptyTagName);
    }

    #[test]
    fn alias_before_any_tag_is_rejected() {
        let result = Schema::root().alias(&["x"]).tag("a").build();
        assert_eq!(result.unwrap_err(), ConfigError::AliasBeforeTag);
    }

    #[test]
    fn close_with_mismatched_name_fails() {
        let schema = Schema::root()
            .tag_with("a", |b| b.tag("b"))
            .build()
            .unwrap();
        let a = schema.try_open(ROOT, "a").unwrap();
        let b = schema.try_open(a, "b").unwrap();
        // closing "b" from a node that is actually "a"'s sibling name fails
        assert!(schema.try_close(b, "a").is_none());
    }
}
