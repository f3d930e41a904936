//! Segment-indexed storage for pattern bindings
//!
//! Lookup walks the address token by token, so resolution cost grows with
//! address depth, not with the number of bound patterns.

use std::collections::{HashMap, HashSet};

use crate::address::{Address, AddressPattern, ANY_WORDS, SEPARATOR, SINGLE_WORD};
use crate::types::Role;

/// One trie node, keyed by the segments leading to it
#[derive(Debug, Default)]
struct TrieNode {
    /// Children keyed by literal segment
    children: HashMap<String, TrieNode>,

    /// Child reached through the `*` wildcard
    single_word: Option<Box<TrieNode>>,

    /// Roles bound to the exact pattern terminating at this node
    exact: Option<HashSet<Role>>,

    /// Roles bound to the subtree pattern `<path>.#` rooted at this node
    subtree: Option<HashSet<Role>>,
}

/// Pattern-to-roles binding store
#[derive(Debug, Default)]
pub(crate) struct PatternTrie {
    root: TrieNode,
    len: usize,
}

impl PatternTrie {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Number of bound patterns
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Merge roles into the binding for a pattern
    ///
    /// Returns `true` when the pattern already had a binding.
    pub(crate) fn bind(&mut self, pattern: &AddressPattern, roles: HashSet<Role>) -> bool {
        let slot = Self::slot_mut(&mut self.root, pattern.segments());
        let existed = slot.is_some();

        match slot {
            Some(existing) => existing.extend(roles),
            None => *slot = Some(roles),
        }

        if !existed {
            self.len += 1;
        }
        existed
    }

    /// Roles bound to the exact pattern, if any
    pub(crate) fn binding(&self, pattern: &AddressPattern) -> Option<&HashSet<Role>> {
        let mut node = &self.root;

        for segment in pattern.segments() {
            if segment == ANY_WORDS {
                return node.subtree.as_ref();
            }
            node = if segment == SINGLE_WORD {
                node.single_word.as_deref()?
            } else {
                node.children.get(segment)?
            };
        }

        node.exact.as_ref()
    }

    /// Remove the binding for a pattern, returning its roles
    pub(crate) fn remove(&mut self, pattern: &AddressPattern) -> Option<HashSet<Role>> {
        let removed = Self::take_binding(&mut self.root, pattern.segments());
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// Union of roles across every pattern matching the address
    ///
    /// The merge is additive: a role bound to a broad wildcard and another
    /// bound to a narrow exact pattern both land in the result. There is no
    /// most-specific-wins override.
    pub(crate) fn resolve(&self, address: &Address) -> HashSet<Role> {
        let mut roles = HashSet::new();
        Self::collect(&self.root, address.segments(), &mut roles);
        roles
    }

    /// All bindings as (pattern string, roles) pairs
    pub(crate) fn bindings(&self) -> Vec<(String, HashSet<Role>)> {
        let mut out = Vec::with_capacity(self.len);
        Self::walk(&self.root, &mut Vec::new(), &mut out);
        out
    }

    /// Drop every binding
    pub(crate) fn clear(&mut self) {
        self.root = TrieNode::default();
        self.len = 0;
    }

    fn slot_mut<'a>(
        mut node: &'a mut TrieNode,
        segments: &[String],
    ) -> &'a mut Option<HashSet<Role>> {
        for segment in segments {
            if segment == ANY_WORDS {
                // validation guarantees '#' is the final segment
                return &mut node.subtree;
            }
            node = if segment == SINGLE_WORD {
                &mut **node.single_word.get_or_insert_with(Box::default)
            } else {
                node.children.entry(segment.clone()).or_default()
            };
        }

        &mut node.exact
    }

    fn take_binding(root: &mut TrieNode, segments: &[String]) -> Option<HashSet<Role>> {
        let mut node = root;

        for segment in segments {
            if segment == ANY_WORDS {
                return node.subtree.take();
            }
            node = if segment == SINGLE_WORD {
                node.single_word.as_deref_mut()?
            } else {
                node.children.get_mut(segment)?
            };
        }

        node.exact.take()
    }

    fn collect(node: &TrieNode, remaining: &[String], roles: &mut HashSet<Role>) {
        if let Some(bound) = &node.subtree {
            roles.extend(bound.iter().cloned());
        }

        match remaining.split_first() {
            None => {
                if let Some(bound) = &node.exact {
                    roles.extend(bound.iter().cloned());
                }
            }
            Some((segment, rest)) => {
                if let Some(child) = node.children.get(segment) {
                    Self::collect(child, rest, roles);
                }
                if let Some(child) = &node.single_word {
                    Self::collect(child, rest, roles);
                }
            }
        }
    }

    fn walk(node: &TrieNode, path: &mut Vec<String>, out: &mut Vec<(String, HashSet<Role>)>) {
        if let Some(bound) = &node.exact {
            out.push((Self::join(path), bound.clone()));
        }
        if let Some(bound) = &node.subtree {
            path.push(ANY_WORDS.to_string());
            out.push((Self::join(path), bound.clone()));
            path.pop();
        }

        for (segment, child) in &node.children {
            path.push(segment.clone());
            Self::walk(child, path, out);
            path.pop();
        }
        if let Some(child) = &node.single_word {
            path.push(SINGLE_WORD.to_string());
            Self::walk(child, path, out);
            path.pop();
        }
    }

    fn join(path: &[String]) -> String {
        path.join(&SEPARATOR.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(s: &str) -> AddressPattern {
        AddressPattern::new(s).unwrap()
    }

    fn address(s: &str) -> Address {
        Address::new(s).unwrap()
    }

    fn roles(names: &[&str]) -> HashSet<Role> {
        names.iter().map(|n| Role::all(*n)).collect()
    }

    #[test]
    fn test_bind_and_resolve_exact() {
        let mut trie = PatternTrie::new();
        trie.bind(&pattern("orders.widgets"), roles(&["producers"]));

        let resolved = trie.resolve(&address("orders.widgets"));
        assert_eq!(resolved.len(), 1);
        assert!(resolved.contains(&Role::all("producers")));

        assert!(trie.resolve(&address("orders.gadgets")).is_empty());
        assert_eq!(trie.len(), 1);
    }

    #[test]
    fn test_subtree_resolution() {
        let mut trie = PatternTrie::new();
        trie.bind(&pattern("orders.#"), roles(&["producers"]));

        assert!(!trie.resolve(&address("orders")).is_empty());
        assert!(!trie.resolve(&address("orders.widgets.eu")).is_empty());
        assert!(trie.resolve(&address("invoices")).is_empty());
    }

    #[test]
    fn test_additive_union_across_patterns() {
        let mut trie = PatternTrie::new();
        trie.bind(&pattern("a.#"), roles(&["managers"]));
        trie.bind(&pattern("a.b.#"), roles(&["senders"]));
        trie.bind(&pattern("a.b.c"), roles(&["browsers"]));

        let resolved = trie.resolve(&address("a.b.c"));
        assert_eq!(resolved.len(), 3);

        let resolved = trie.resolve(&address("a.b"));
        assert_eq!(resolved.len(), 2);

        let resolved = trie.resolve(&address("a.x"));
        assert_eq!(resolved.len(), 1);
    }

    #[test]
    fn test_single_word_resolution() {
        let mut trie = PatternTrie::new();
        trie.bind(&pattern("orders.*.eu"), roles(&["regional"]));

        assert!(!trie.resolve(&address("orders.widgets.eu")).is_empty());
        assert!(trie.resolve(&address("orders.eu")).is_empty());
        assert!(trie.resolve(&address("orders.widgets.us")).is_empty());
    }

    #[test]
    fn test_merge_into_existing_binding() {
        let mut trie = PatternTrie::new();
        assert!(!trie.bind(&pattern("orders.#"), roles(&["producers"])));
        assert!(trie.bind(&pattern("orders.#"), roles(&["consumers"])));

        let resolved = trie.resolve(&address("orders.widgets"));
        assert_eq!(resolved.len(), 2);
        assert_eq!(trie.len(), 1);
    }

    #[test]
    fn test_remove_binding() {
        let mut trie = PatternTrie::new();
        trie.bind(&pattern("orders.#"), roles(&["producers"]));

        assert!(trie.remove(&pattern("orders.#")).is_some());
        assert!(trie.remove(&pattern("orders.#")).is_none());
        assert!(trie.resolve(&address("orders.widgets")).is_empty());
        assert!(trie.is_empty());
    }

    #[test]
    fn test_exact_and_subtree_are_distinct_bindings() {
        let mut trie = PatternTrie::new();
        trie.bind(&pattern("orders"), roles(&["exact"]));
        trie.bind(&pattern("orders.#"), roles(&["subtree"]));
        assert_eq!(trie.len(), 2);

        // both match the bare address
        assert_eq!(trie.resolve(&address("orders")).len(), 2);
        // only the subtree binding matches deeper addresses
        assert_eq!(trie.resolve(&address("orders.widgets")).len(), 1);

        trie.remove(&pattern("orders"));
        assert_eq!(trie.resolve(&address("orders")).len(), 1);
    }

    #[test]
    fn test_bindings_listing() {
        let mut trie = PatternTrie::new();
        trie.bind(&pattern("orders.#"), roles(&["a"]));
        trie.bind(&pattern("orders.*.eu"), roles(&["b"]));
        trie.bind(&pattern("invoices"), roles(&["c"]));

        let mut listed: Vec<String> = trie.bindings().into_iter().map(|(p, _)| p).collect();
        listed.sort();
        assert_eq!(listed, vec!["invoices", "orders.#", "orders.*.eu"]);
    }

    #[test]
    fn test_clear() {
        let mut trie = PatternTrie::new();
        trie.bind(&pattern("orders.#"), roles(&["a"]));
        trie.clear();

        assert!(trie.is_empty());
        assert!(trie.resolve(&address("orders.widgets")).is_empty());
    }
}
