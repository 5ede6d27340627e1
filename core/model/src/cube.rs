//! FILENAME: core/model/src/cube.rs
//! PURPOSE: The cube: an ordered list of hierarchies.
//! CONTEXT: Evaluation contexts hold exactly one member per cube hierarchy,
//! in the order given here. Context simplification walks this list.

use crate::hierarchy::Hierarchy;
use crate::member::Member;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
pub struct Cube {
    name: String,
    hierarchies: Vec<Hierarchy>,
    /// Hierarchy name -> position in `hierarchies`.
    ordinals: FxHashMap<String, usize>,
}

impl Cube {
    pub fn new(name: &str, hierarchies: Vec<Hierarchy>) -> Self {
        let ordinals = hierarchies
            .iter()
            .enumerate()
            .map(|(i, h)| (h.name().to_string(), i))
            .collect();
        Cube {
            name: name.to_string(),
            hierarchies,
            ordinals,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hierarchies(&self) -> &[Hierarchy] {
        &self.hierarchies
    }

    pub fn hierarchy(&self, name: &str) -> Option<&Hierarchy> {
        self.ordinals.get(name).map(|&i| &self.hierarchies[i])
    }

    /// Position of a hierarchy in the cube, by name.
    pub fn ordinal(&self, hierarchy_name: &str) -> Option<usize> {
        self.ordinals.get(hierarchy_name).copied()
    }

    pub fn hierarchy_of(&self, member: &Member) -> Option<&Hierarchy> {
        self.hierarchy(member.hierarchy_name())
    }

    /// The context every evaluator starts from: each hierarchy's default member.
    pub fn default_context(&self) -> Vec<Member> {
        self.hierarchies
            .iter()
            .map(|h| h.default_member().clone())
            .collect()
    }
}
