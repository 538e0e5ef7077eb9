//! Signal Kinds
//!
//! Every event type is a [`SignalKind`] tag. Kinds form a taxonomy: each kind
//! may name a parent kind, and an invocation of a kind escalates along the
//! chain of ancestors until it reaches a root. The taxonomy is an explicit
//! lookup table filled by declaration, never derived from type reflection.

use std::fmt;

use indexmap::IndexMap;

use crate::error::{SignalError, SignalResult};

/// Tag naming one event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalKind(&'static str);

impl SignalKind {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Whether a subscription reacts to every invocation or only to targeted ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Invoked on every invocation of the kind, regardless of target.
    Global,

    /// Invoked only when the invocation's target reaches the subscriber's
    /// identifier through the forest.
    Contextual,
}

/// One `(kind, scope)` association declared by a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignalBinding {
    pub kind: SignalKind,
    pub scope: Scope,
}

impl SignalBinding {
    pub fn global(kind: SignalKind) -> Self {
        Self { kind, scope: Scope::Global }
    }

    pub fn contextual(kind: SignalKind) -> Self {
        Self { kind, scope: Scope::Contextual }
    }
}

/// Declaration data for a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindSpec {
    /// Kind that receives escalated invocations. `None` for a root.
    pub parent: Option<SignalKind>,

    /// Whether invocations are logged and replayed to late global subscribers.
    pub cached: bool,
}

/// The parent-kind lookup table.
///
/// Parents must be declared before their children, so the table can never
/// contain a cycle.
#[derive(Debug, Default, Clone)]
pub struct SignalHierarchy {
    kinds: IndexMap<SignalKind, KindSpec>,
}

impl SignalHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a kind to the table.
    pub fn declare(
        &mut self,
        kind: SignalKind,
        parent: Option<SignalKind>,
        cached: bool,
    ) -> SignalResult<()> {
        if self.kinds.contains_key(&kind) {
            return Err(SignalError::DuplicateSignal(kind));
        }
        if let Some(parent) = parent {
            if !self.kinds.contains_key(&parent) {
                return Err(SignalError::UnknownSignal(parent));
            }
        }
        self.kinds.insert(kind, KindSpec { parent, cached });
        Ok(())
    }

    pub fn contains(&self, kind: SignalKind) -> bool {
        self.kinds.contains_key(&kind)
    }

    pub fn spec(&self, kind: SignalKind) -> Option<KindSpec> {
        self.kinds.get(&kind).copied()
    }

    pub fn parent(&self, kind: SignalKind) -> Option<SignalKind> {
        self.kinds.get(&kind).and_then(|spec| spec.parent)
    }

    pub fn is_root(&self, kind: SignalKind) -> bool {
        self.kinds.contains_key(&kind) && self.parent(kind).is_none()
    }

    /// The kind followed by each of its ancestors, ending at a root.
    pub fn chain(&self, kind: SignalKind) -> SignalResult<Vec<SignalKind>> {
        if !self.contains(kind) {
            return Err(SignalError::UnknownSignal(kind));
        }
        let mut chain = vec![kind];
        let mut current = kind;
        while let Some(parent) = self.parent(current) {
            chain.push(parent);
            current = parent;
        }
        Ok(chain)
    }

    /// All declared kinds in declaration order.
    pub fn kinds(&self) -> impl Iterator<Item = SignalKind> + '_ {
        self.kinds.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: SignalKind = SignalKind::new("root");
    const MID: SignalKind = SignalKind::new("mid");
    const LEAF: SignalKind = SignalKind::new("leaf");

    #[test]
    fn chain_walks_to_root() {
        let mut hierarchy = SignalHierarchy::new();
        hierarchy.declare(ROOT, None, false).unwrap();
        hierarchy.declare(MID, Some(ROOT), true).unwrap();
        hierarchy.declare(LEAF, Some(MID), false).unwrap();

        assert_eq!(hierarchy.chain(LEAF).unwrap(), vec![LEAF, MID, ROOT]);
        assert_eq!(hierarchy.chain(ROOT).unwrap(), vec![ROOT]);
        assert!(hierarchy.is_root(ROOT));
        assert!(!hierarchy.is_root(LEAF));
        assert!(hierarchy.spec(MID).unwrap().cached);
    }

    #[test]
    fn parent_must_exist() {
        let mut hierarchy = SignalHierarchy::new();
        let err = hierarchy.declare(LEAF, Some(MID), false).unwrap_err();
        assert!(matches!(err, SignalError::UnknownSignal(kind) if kind == MID));
    }

    #[test]
    fn duplicate_declaration_is_rejected() {
        let mut hierarchy = SignalHierarchy::new();
        hierarchy.declare(ROOT, None, false).unwrap();
        assert!(matches!(
            hierarchy.declare(ROOT, None, true),
            Err(SignalError::DuplicateSignal(_))
        ));
        assert_eq!(hierarchy.len(), 1);
    }

    #[test]
    fn unknown_kind_has_no_chain() {
        let hierarchy = SignalHierarchy::new();
        assert!(hierarchy.chain(ROOT).is_err());
        assert_eq!(format!("{}", LEAF), "leaf");
    }
}
