//! FILENAME: core/calc-engine/src/calc/dependency.rs
//! PURPOSE: Which hierarchies an expression depends on, and using that to
//! narrow the evaluation context.
//! CONTEXT: A calc depends on a hierarchy if its result can change when
//! only the current member of that hierarchy changes. Set functions use
//! this to reset hierarchies the expression ignores to their default
//! member, so that equivalent evaluations share one context.

use super::{Calc, CalcRef};
use model::{Evaluator, Hierarchy};

// ============================================================================
// COMPOSITE PREDICATES
// ============================================================================

/// True if any calc depends on `hierarchy`.
pub fn any_depends(calcs: &[CalcRef], hierarchy: &Hierarchy) -> bool {
    calcs.iter().any(|c| c.depends_on(hierarchy))
}

/// For functions whose first argument is a set they iterate.
///
/// True if the first calc depends on `hierarchy`. Otherwise, if the first
/// calc's type spans `hierarchy`, the set supplies its own positions on it
/// and the answer is false. Otherwise true if any remaining calc depends.
pub fn any_depends_but_first(calcs: &[CalcRef], hierarchy: &Hierarchy) -> bool {
    let Some((first, rest)) = calcs.split_first() else {
        return false;
    };
    if first.depends_on(hierarchy) {
        return true;
    }
    if first.get_type().uses_hierarchy(hierarchy, true) {
        return false;
    }
    any_depends(rest, hierarchy)
}

/// True if any calc depends on `hierarchy`. Otherwise false if some calc's
/// type definitely spans `hierarchy`, and true if none does: a calc whose
/// type leaves the hierarchy open reads it from the context.
pub fn but_depends(calcs: &[CalcRef], hierarchy: &Hierarchy) -> bool {
    let mut result = true;
    for calc in calcs {
        if calc.depends_on(hierarchy) {
            return true;
        }
        if calc.get_type().uses_hierarchy(hierarchy, true) {
            result = false;
        }
    }
    result
}

/// How a calc computes `depends_on` from its children.
#[derive(Debug, Clone, PartialEq)]
pub enum DependencyRule {
    /// Any child depends. The default for composite calcs.
    Children,
    /// Depends on every hierarchy, e.g. reading the current cell.
    Always,
    /// Depends on none, e.g. a literal.
    Never,
    /// Depends only on the given hierarchy, e.g. its current member.
    Hierarchy(Hierarchy),
    /// See `any_depends_but_first`.
    ButFirst,
    /// See `but_depends`.
    ButDepends,
}

impl DependencyRule {
    pub fn depends_on(&self, children: &[CalcRef], hierarchy: &Hierarchy) -> bool {
        match self {
            DependencyRule::Children => any_depends(children, hierarchy),
            DependencyRule::Always => true,
            DependencyRule::Never => false,
            DependencyRule::Hierarchy(h) => h == hierarchy,
            DependencyRule::ButFirst => any_depends_but_first(children, hierarchy),
            DependencyRule::ButDepends => but_depends(children, hierarchy),
        }
    }
}

// ============================================================================
// CONTEXT SIMPLIFICATION
// ============================================================================

/// An evaluator that is either the caller's, untouched, or a pushed copy
/// with some hierarchies reset.
pub enum SimplifiedEvaluator<'a> {
    Unchanged(&'a mut dyn Evaluator),
    Pushed(Box<dyn Evaluator>),
}

impl SimplifiedEvaluator<'_> {
    pub fn get(&mut self) -> &mut dyn Evaluator {
        match self {
            SimplifiedEvaluator::Unchanged(ev) => &mut **ev,
            SimplifiedEvaluator::Pushed(ev) => ev.as_mut(),
        }
    }

    pub fn is_pushed(&self) -> bool {
        matches!(self, SimplifiedEvaluator::Pushed(_))
    }
}

/// Returns the most general context in which `calc` has the same value as
/// in `evaluator`'s context.
///
/// Every hierarchy that `calc` does not depend on and whose current member
/// is neither an all member nor the default member is reset to the default
/// member. The evaluator is pushed at most once, on the first reset; if no
/// hierarchy needs resetting the caller's evaluator comes back unchanged.
/// Nothing is simplified under non-empty evaluation, which needs the full
/// context to eliminate empty cells.
pub fn simplify_evaluator<'a>(
    calc: &dyn Calc,
    evaluator: &'a mut dyn Evaluator,
) -> SimplifiedEvaluator<'a> {
    if evaluator.is_non_empty() {
        return SimplifiedEvaluator::Unchanged(evaluator);
    }

    let mut pushed: Option<Box<dyn Evaluator>> = None;
    for hierarchy in evaluator.cube().hierarchies() {
        let member = evaluator.get_context(hierarchy);
        if member.is_all() || calc.depends_on(hierarchy) {
            continue;
        }
        let default_member = hierarchy.default_member();
        if member == default_member {
            continue;
        }
        log::trace!(
            "{} does not depend on {}; resetting {} to {}",
            calc.name(),
            hierarchy,
            member,
            default_member
        );
        pushed
            .get_or_insert_with(|| evaluator.push())
            .set_context(default_member);
    }

    match pushed {
        Some(pushed) => SimplifiedEvaluator::Pushed(pushed),
        None => SimplifiedEvaluator::Unchanged(evaluator),
    }
}

/// Runs `f` in the simplified context of `calc` when `simplify` is set,
/// otherwise in `evaluator` as it is.
pub fn with_simplified_context<T>(
    calc: &dyn Calc,
    evaluator: &mut dyn Evaluator,
    simplify: bool,
    f: impl FnOnce(&mut dyn Evaluator) -> T,
) -> T {
    if !simplify {
        return f(evaluator);
    }
    let mut simplified = simplify_evaluator(calc, evaluator);
    f(simplified.get())
}
