//! FILENAME: core/model/src/types.rs
//! PURPOSE: Static types of expressions.
//! CONTEXT: Every expression handed to the calc compiler carries a `Type`.
//! Besides shape checks, types answer `uses_hierarchy`: whether a value of
//! the type structurally spans a hierarchy. Dependency analysis relies on it.

use crate::hierarchy::Hierarchy;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Boolean,
    Numeric,
    String,
    /// Any scalar (boolean, numeric or string).
    Scalar,
    Null,
    /// No value; the expression is evaluated for its effect.
    Void,
    /// A member, of a known hierarchy if `Some`.
    Member(Option<Hierarchy>),
    Level(Option<Hierarchy>),
    Hierarchy(Option<Hierarchy>),
    /// A dimension, by name if known.
    Dimension(Option<String>),
    Tuple(Vec<Type>),
    /// A set of members or tuples.
    Set(Box<Type>),
}

impl Type {
    pub fn member_of(hierarchy: &Hierarchy) -> Type {
        Type::Member(Some(hierarchy.clone()))
    }

    pub fn set_of(element: Type) -> Type {
        Type::Set(Box::new(element))
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Type::Boolean | Type::Numeric | Type::String | Type::Scalar | Type::Null
        )
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Type::Set(_))
    }

    /// Number of members per element: 1 for members, n for n-ary tuples,
    /// and the element arity for sets. Scalars have arity 0.
    pub fn arity(&self) -> usize {
        match self {
            Type::Member(_) => 1,
            Type::Tuple(elements) => elements.len(),
            Type::Set(element) => element.arity(),
            _ => 0,
        }
    }

    /// The element type of a set, or `None` if this is not a set.
    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::Set(element) => Some(element),
            _ => None,
        }
    }

    /// Returns whether a value of this type references `hierarchy`.
    ///
    /// With `definitely`, answers "is it certain to"; without, answers "could it".
    /// A member of an unknown hierarchy could be on any hierarchy but is
    /// definitely on none.
    pub fn uses_hierarchy(&self, hierarchy: &Hierarchy, definitely: bool) -> bool {
        match self {
            Type::Member(h) | Type::Level(h) | Type::Hierarchy(h) => match h {
                Some(h) => h == hierarchy,
                None => !definitely,
            },
            Type::Dimension(d) => {
                !definitely && d.as_deref().map_or(true, |d| d == hierarchy.dimension_name())
            }
            Type::Tuple(elements) => elements
                .iter()
                .any(|t| t.uses_hierarchy(hierarchy, definitely)),
            Type::Set(element) => element.uses_hierarchy(hierarchy, definitely),
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn hierarchy_arg(h: &Option<Hierarchy>) -> String {
            match h {
                Some(h) => format!("<hierarchy={}>", h.unique_name()),
                None => String::new(),
            }
        }
        match self {
            Type::Boolean => write!(f, "BOOLEAN"),
            Type::Numeric => write!(f, "NUMERIC"),
            Type::String => write!(f, "STRING"),
            Type::Scalar => write!(f, "SCALAR"),
            Type::Null => write!(f, "NULL"),
            Type::Void => write!(f, "VOID"),
            Type::Member(h) => write!(f, "MemberType{}", hierarchy_arg(h)),
            Type::Level(h) => write!(f, "LevelType{}", hierarchy_arg(h)),
            Type::Hierarchy(h) => write!(f, "HierarchyType{}", hierarchy_arg(h)),
            Type::Dimension(Some(d)) => write!(f, "DimensionType<dimension=[{}]>", d),
            Type::Dimension(None) => write!(f, "DimensionType"),
            Type::Tuple(elements) => {
                write!(f, "TupleType<")?;
                for (i, t) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", t)?;
                }
                write!(f, ">")
            }
            Type::Set(element) => write!(f, "SetType<{}>", element),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::HierarchyBuilder;

    fn hierarchies() -> (Hierarchy, Hierarchy) {
        let mut p = HierarchyBuilder::new("Product");
        p.add_member(None, "Food");
        let mut t = HierarchyBuilder::new("Time");
        t.add_member(None, "2024");
        (p.build(), t.build())
    }

    #[test]
    fn test_member_type_uses_its_hierarchy() {
        let (product, time) = hierarchies();
        let ty = Type::member_of(&product);
        assert!(ty.uses_hierarchy(&product, true));
        assert!(!ty.uses_hierarchy(&time, false));
    }

    #[test]
    fn test_unknown_member_type_may_use_any() {
        let (product, _) = hierarchies();
        let ty = Type::Member(None);
        assert!(ty.uses_hierarchy(&product, false));
        assert!(!ty.uses_hierarchy(&product, true));
    }

    #[test]
    fn test_set_of_tuples() {
        let (product, time) = hierarchies();
        let ty = Type::set_of(Type::Tuple(vec![Type::member_of(&product), Type::member_of(&time)]));
        assert_eq!(ty.arity(), 2);
        assert!(ty.uses_hierarchy(&time, true));
        assert_eq!(
            ty.to_string(),
            "SetType<TupleType<MemberType<hierarchy=[Product]>, MemberType<hierarchy=[Time]>>>"
        );
    }

    #[test]
    fn test_scalars_use_nothing() {
        let (product, _) = hierarchies();
        assert!(!Type::Numeric.uses_hierarchy(&product, false));
        assert!(Type::Numeric.is_scalar());
        assert_eq!(Type::Numeric.arity(), 0);
    }

    #[test]
    fn test_void_is_neither_scalar_nor_set() {
        let (product, _) = hierarchies();
        assert!(!Type::Void.is_scalar());
        assert!(!Type::Void.is_set());
        assert!(!Type::Void.uses_hierarchy(&product, false));
        assert_eq!(Type::Void.to_string(), "VOID");
    }
}
