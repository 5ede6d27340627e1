//! FILENAME: core/model/src/member.rs
//! PURPOSE: Defines `Member`, one coordinate on one hierarchy.
//! CONTEXT: Members are shared, immutable handles. Tuple lists hold millions
//! of them, so a `Member` is a single `Arc` pointer and cloning it is cheap.
//! Identity (equality and hashing) is the member's unique name.

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// What kind of position a member represents on its hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MemberKind {
    /// A regular member loaded from the schema.
    Regular,
    /// The "(All)" member at the root of a hierarchy.
    All,
    /// A measure on the Measures hierarchy.
    Measure,
    /// A calculated member.
    Formula,
}

struct MemberInner {
    unique_name: String,
    name: String,
    hierarchy: Arc<str>,
    depth: u32,
    ordinal: u32,
    kind: MemberKind,
    parent: Option<Member>,
}

/// A position on a hierarchy.
#[derive(Clone)]
pub struct Member {
    inner: Arc<MemberInner>,
}

impl Member {
    /// Creates a member. The unique name is derived from the hierarchy and
    /// the parent chain, e.g. `[Product].[Food].[Apple]`.
    pub fn new(
        hierarchy: &str,
        name: &str,
        parent: Option<&Member>,
        ordinal: u32,
        kind: MemberKind,
    ) -> Self {
        let (unique_name, depth) = match parent {
            // Children of the all member hang directly off the hierarchy name.
            Some(p) if p.is_all() => (format!("[{}].[{}]", hierarchy, name), p.depth() + 1),
            Some(p) => (format!("{}.[{}]", p.unique_name(), name), p.depth() + 1),
            None => (format!("[{}].[{}]", hierarchy, name), 0),
        };
        Member {
            inner: Arc::new(MemberInner {
                unique_name,
                name: name.to_string(),
                hierarchy: Arc::from(hierarchy),
                depth,
                ordinal,
                kind,
                parent: parent.cloned(),
            }),
        }
    }

    /// Creates the "(All)" member of a hierarchy.
    pub fn all(hierarchy: &str, name: &str) -> Self {
        Member::new(hierarchy, name, None, 0, MemberKind::All)
    }

    pub fn unique_name(&self) -> &str {
        &self.inner.unique_name
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Unique name of the hierarchy this member belongs to.
    pub fn hierarchy_name(&self) -> &str {
        &self.inner.hierarchy
    }

    pub fn depth(&self) -> u32 {
        self.inner.depth
    }

    /// Position among all members of the hierarchy (pre-order).
    pub fn ordinal(&self) -> u32 {
        self.inner.ordinal
    }

    pub fn kind(&self) -> MemberKind {
        self.inner.kind
    }

    pub fn parent(&self) -> Option<&Member> {
        self.inner.parent.as_ref()
    }

    pub fn is_all(&self) -> bool {
        self.inner.kind == MemberKind::All
    }

    pub fn is_measure(&self) -> bool {
        self.inner.kind == MemberKind::Measure
    }

    /// Returns true if `self` is `other` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, other: &Member) -> bool {
        if self.inner.hierarchy != other.inner.hierarchy {
            return false;
        }
        if self.is_all() {
            return true;
        }
        let mut current = Some(other);
        while let Some(m) = current {
            if m == self {
                return true;
            }
            if m.depth() < self.depth() {
                return false;
            }
            current = m.parent();
        }
        false
    }
}

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.unique_name == other.inner.unique_name
    }
}

impl Eq for Member {}

impl Hash for Member {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.unique_name.hash(state);
    }
}

impl PartialOrd for Member {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Members order by hierarchy, then by their position in the hierarchy.
impl Ord for Member {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner
            .hierarchy
            .cmp(&other.inner.hierarchy)
            .then(self.inner.ordinal.cmp(&other.inner.ordinal))
            .then_with(|| self.inner.unique_name.cmp(&other.inner.unique_name))
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.unique_name)
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.unique_name)
    }
}

impl Serialize for Member {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.inner.unique_name)
    }
}
