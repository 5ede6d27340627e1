//! FILENAME: core/model/src/hierarchy.rs
//! PURPOSE: Hierarchies and levels, the axes that members live on.
//! CONTEXT: A hierarchy owns its members in insertion (pre-order) order,
//! knows its "(All)" member if it has one, and its default member. The
//! default member is what context simplification resets a hierarchy to.

use crate::member::{Member, MemberKind};
use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A level of a hierarchy: all members at the same depth.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Level {
    hierarchy: Arc<str>,
    name: String,
    depth: u32,
}

impl Level {
    pub fn new(hierarchy: &str, name: &str, depth: u32) -> Self {
        Level {
            hierarchy: Arc::from(hierarchy),
            name: name.to_string(),
            depth,
        }
    }

    pub fn hierarchy_name(&self) -> &str {
        &self.hierarchy
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn unique_name(&self) -> String {
        format!("[{}].[{}]", self.hierarchy, self.name)
    }
}

struct HierarchyInner {
    name: String,
    unique_name: String,
    dimension: String,
    all_member: Option<Member>,
    default_member: Member,
    levels: Vec<Level>,
    members: Vec<Member>,
}

/// A dimensional axis. Cheap to clone; identity is the unique name.
#[derive(Clone)]
pub struct Hierarchy {
    inner: Arc<HierarchyInner>,
}

impl Hierarchy {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn unique_name(&self) -> &str {
        &self.inner.unique_name
    }

    pub fn dimension_name(&self) -> &str {
        &self.inner.dimension
    }

    pub fn has_all(&self) -> bool {
        self.inner.all_member.is_some()
    }

    pub fn all_member(&self) -> Option<&Member> {
        self.inner.all_member.as_ref()
    }

    /// The member a context starts at for this hierarchy.
    pub fn default_member(&self) -> &Member {
        &self.inner.default_member
    }

    pub fn levels(&self) -> &[Level] {
        &self.inner.levels
    }

    pub fn level(&self, depth: u32) -> Option<&Level> {
        self.inner.levels.iter().find(|l| l.depth() == depth)
    }

    /// All members, including the all member, in hierarchy order.
    pub fn members(&self) -> &[Member] {
        &self.inner.members
    }

    pub fn members_at_depth(&self, depth: u32) -> Vec<Member> {
        self.inner
            .members
            .iter()
            .filter(|m| m.depth() == depth)
            .cloned()
            .collect()
    }

    pub fn children(&self, parent: &Member) -> Vec<Member> {
        self.inner
            .members
            .iter()
            .filter(|m| m.parent() == Some(parent))
            .cloned()
            .collect()
    }

    /// Looks a member up by unique name, or by plain name as a fallback.
    pub fn lookup(&self, name: &str) -> Option<&Member> {
        self.inner
            .members
            .iter()
            .find(|m| m.unique_name() == name)
            .or_else(|| self.inner.members.iter().find(|m| m.name() == name))
    }

    pub fn contains(&self, member: &Member) -> bool {
        member.hierarchy_name() == self.inner.name
    }
}

impl PartialEq for Hierarchy {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.unique_name == other.inner.unique_name
    }
}

impl Eq for Hierarchy {}

impl Hash for Hierarchy {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.unique_name.hash(state);
    }
}

impl fmt::Debug for Hierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.unique_name)
    }
}

impl fmt::Display for Hierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.unique_name)
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Builds a hierarchy member by member.
pub struct HierarchyBuilder {
    name: String,
    dimension: String,
    member_kind: MemberKind,
    all_member: Option<Member>,
    default_member: Option<Member>,
    level_names: Vec<String>,
    members: Vec<Member>,
}

impl HierarchyBuilder {
    /// A hierarchy with an "(All)" member named `All <name>s`.
    pub fn new(name: &str) -> Self {
        let all = Member::all(name, &format!("All {}s", name));
        HierarchyBuilder {
            name: name.to_string(),
            dimension: name.to_string(),
            member_kind: MemberKind::Regular,
            all_member: Some(all.clone()),
            default_member: None,
            level_names: vec!["(All)".to_string()],
            members: vec![all],
        }
    }

    /// A hierarchy whose top level has no aggregating root.
    pub fn without_all(name: &str) -> Self {
        HierarchyBuilder {
            name: name.to_string(),
            dimension: name.to_string(),
            member_kind: MemberKind::Regular,
            all_member: None,
            default_member: None,
            level_names: Vec::new(),
            members: Vec::new(),
        }
    }

    /// The Measures hierarchy. Its default member is the first measure.
    pub fn measures() -> Self {
        let mut builder = HierarchyBuilder::without_all("Measures");
        builder.member_kind = MemberKind::Measure;
        builder.level_names.push("MeasuresLevel".to_string());
        builder
    }

    pub fn dimension(&mut self, dimension: &str) -> &mut Self {
        self.dimension = dimension.to_string();
        self
    }

    /// Names the levels below the all level, top first.
    pub fn levels(&mut self, names: &[&str]) -> &mut Self {
        self.level_names.truncate(usize::from(self.all_member.is_some()));
        self.level_names.extend(names.iter().map(|n| n.to_string()));
        self
    }

    /// Adds a member. `None` as parent places it on the top level.
    pub fn add_member(&mut self, parent: Option<&Member>, name: &str) -> Member {
        let parent = parent.or(self.all_member.as_ref());
        let member = Member::new(
            &self.name,
            name,
            parent,
            self.members.len() as u32,
            self.member_kind,
        );
        self.members.push(member.clone());
        member
    }

    pub fn default_member(&mut self, member: &Member) -> &mut Self {
        self.default_member = Some(member.clone());
        self
    }

    /// # Panics
    /// Panics if the hierarchy has neither an all member nor any member.
    pub fn build(&self) -> Hierarchy {
        let default_member = self
            .default_member
            .clone()
            .or_else(|| self.all_member.clone())
            .or_else(|| self.members.first().cloned())
            .expect("a hierarchy needs at least one member");

        let max_depth = self.members.iter().map(|m| m.depth()).max().unwrap_or(0);
        let levels = (0..=max_depth)
            .map(|depth| {
                let name = self
                    .level_names
                    .get(depth as usize)
                    .cloned()
                    .unwrap_or_else(|| format!("Level{:02}", depth));
                Level::new(&self.name, &name, depth)
            })
            .collect();

        Hierarchy {
            inner: Arc::new(HierarchyInner {
                name: self.name.clone(),
                unique_name: format!("[{}]", self.name),
                dimension: self.dimension.clone(),
                all_member: self.all_member.clone(),
                default_member,
                levels,
                members: self.members.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> (Hierarchy, Member, Member) {
        let mut b = HierarchyBuilder::new("Product");
        b.levels(&["Category", "Item"]);
        let food = b.add_member(None, "Food");
        let apple = b.add_member(Some(&food), "Apple");
        b.add_member(Some(&food), "Bread");
        b.add_member(None, "Drink");
        (b.build(), food, apple)
    }

    #[test]
    fn test_default_is_all_member() {
        let (h, _, _) = product();
        assert!(h.has_all());
        assert!(h.default_member().is_all());
        assert_eq!(h.default_member().unique_name(), "[Product].[All Products]");
    }

    #[test]
    fn test_levels_and_depths() {
        let (h, food, apple) = product();
        assert_eq!(h.levels().len(), 3);
        assert_eq!(h.level(1).unwrap().name(), "Category");
        assert_eq!(food.depth(), 1);
        assert_eq!(apple.depth(), 2);
        assert_eq!(h.members_at_depth(1).len(), 2);
    }

    #[test]
    fn test_children() {
        let (h, food, _) = product();
        let names: Vec<_> = h.children(&food).iter().map(|m| m.name().to_string()).collect();
        assert_eq!(names, vec!["Apple", "Bread"]);
    }

    #[test]
    fn test_measures_default_is_first_measure() {
        let mut b = HierarchyBuilder::measures();
        let sales = b.add_member(None, "Sales");
        b.add_member(None, "Cost");
        let h = b.build();
        assert!(!h.has_all());
        assert_eq!(h.default_member(), &sales);
        assert!(sales.is_measure());
    }

    #[test]
    fn test_lookup() {
        let (h, food, _) = product();
        assert_eq!(h.lookup("Food"), Some(&food));
        assert_eq!(h.lookup("[Product].[Food].[Apple]").unwrap().name(), "Apple");
        assert!(h.lookup("Nope").is_none());
    }
}
