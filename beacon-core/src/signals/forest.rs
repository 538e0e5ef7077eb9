//! Listener Forest
//!
//! Parent → children associations used by targeted dispatch. An invocation
//! addressed to a parent also reaches every descendant.
//!
//! The forest stores identifiers only. Dropping every edge of an identifier
//! says nothing about the lifetime of whatever the identifier names.

use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};

/// Parent → ordered child set.
#[derive(Debug, Clone)]
pub struct Forest<I> {
    children: IndexMap<I, IndexSet<I>>,
}

impl<I> Default for Forest<I> {
    fn default() -> Self {
        Self {
            children: IndexMap::new(),
        }
    }
}

impl<I> Forest<I>
where
    I: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an edge. Existing children of `parent` are kept.
    pub fn add_edge(&mut self, parent: I, child: I) {
        self.children.entry(parent).or_default().insert(child);
    }

    /// Remove an edge, dropping the parent entry once its last child goes.
    ///
    /// Returns `false` if the edge did not exist.
    pub fn remove_edge(&mut self, parent: &I, child: &I) -> bool {
        let Some(set) = self.children.get_mut(parent) else {
            return false;
        };
        let removed = set.shift_remove(child);
        if set.is_empty() {
            self.children.shift_remove(parent);
        }
        removed
    }

    pub fn children(&self, parent: &I) -> Option<&IndexSet<I>> {
        self.children.get(parent)
    }

    pub fn is_parent(&self, identifier: &I) -> bool {
        self.children.contains_key(identifier)
    }

    pub fn parents_of(&self, child: &I) -> Vec<I> {
        self.children
            .iter()
            .filter(|(_, set)| set.contains(child))
            .map(|(parent, _)| parent.clone())
            .collect()
    }

    /// Every `(parent, child)` edge with `identifier` on either end.
    pub fn edges_involving(&self, identifier: &I) -> Vec<(I, I)> {
        let mut edges = Vec::new();
        if let Some(set) = self.children.get(identifier) {
            edges.extend(set.iter().map(|child| (identifier.clone(), child.clone())));
        }
        for parent in self.parents_of(identifier) {
            if &parent != identifier {
                edges.push((parent, identifier.clone()));
            }
        }
        edges
    }

    /// Number of parents with at least one child.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}
