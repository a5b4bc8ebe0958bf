// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

use crate::data::Source;
use crate::declaration::Designator;
use std::fmt;
use std::sync::Arc;

pub type TypeRef = Arc<Type>;

/// The identity of a named type: the document and tree path of its declaration
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeclKey {
    pub source: Source,
    pub path: Arc<str>,
    pub name: Arc<str>,
}

impl DeclKey {
    /// Whether this is the type `name` of package `package`, such as `standard.boolean`
    pub fn is(&self, package: &str, name: &str) -> bool {
        self.path
            .strip_prefix(package)
            .and_then(|rest| rest.strip_prefix('.'))
            .is_some_and(|rest| rest == name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Integer,
    Real,
    Physical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpaqueKind {
    Access,
    File,
    Protected,
}

/// Statically known bounds of a discrete range, both inclusive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DiscreteRange {
    pub left: i64,
    pub right: i64,
    pub ascending: bool,
}

impl DiscreteRange {
    pub fn new(left: i64, right: i64, ascending: bool) -> DiscreteRange {
        DiscreteRange {
            left,
            right,
            ascending,
        }
    }

    pub fn length(&self) -> u64 {
        let (low, high) = self.low_high();
        if high < low {
            0
        } else {
            high.abs_diff(low) + 1
        }
    }

    pub fn low_high(&self) -> (i64, i64) {
        if self.ascending {
            (self.left, self.right)
        } else {
            (self.right, self.left)
        }
    }
}

/// A range of which none, one or both bounds are known
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct RangeBounds {
    pub left: Option<i64>,
    pub right: Option<i64>,
    pub ascending: bool,
}

impl RangeBounds {
    pub fn known(&self) -> Option<DiscreteRange> {
        Some(DiscreteRange::new(self.left?, self.right?, self.ascending))
    }

    pub fn unknown() -> RangeBounds {
        RangeBounds {
            left: None,
            right: None,
            ascending: true,
        }
    }
}

impl From<DiscreteRange> for RangeBounds {
    fn from(range: DiscreteRange) -> RangeBounds {
        RangeBounds {
            left: Some(range.left),
            right: Some(range.right),
            ascending: range.ascending,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EnumLiteral {
    Identifier(Arc<str>),
    Character(char),
}

impl EnumLiteral {
    pub fn from_designator(designator: &Designator) -> Option<EnumLiteral> {
        match designator {
            Designator::Identifier(sym) => Some(EnumLiteral::Identifier(Arc::from(
                sym.name().to_lowercase(),
            ))),
            Designator::Character(chr) => Some(EnumLiteral::Character(*chr)),
            _ => None,
        }
    }
}

impl fmt::Display for EnumLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumLiteral::Identifier(name) => write!(f, "{name}"),
            EnumLiteral::Character(chr) => write!(f, "'{chr}'"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    UniversalInteger,
    UniversalReal,
    /// The type of the literal `null`
    Null,
    CharacterLiteral(char),
    StringLiteral(String),
    BitStringLiteral(String),
    Enumeration {
        key: DeclKey,
        literals: Vec<EnumLiteral>,
    },
    /// A strong base type when there is no parent, otherwise a subtype of the parent
    Scalar {
        key: DeclKey,
        kind: ScalarKind,
        parent: Option<TypeRef>,
        range: Option<RangeBounds>,
        units: Vec<Arc<str>>,
    },
    Array {
        key: DeclKey,
        element: TypeRef,
        indexes: Vec<TypeRef>,
        /// `None` for unconstrained arrays
        constraint: Option<Vec<RangeBounds>>,
    },
    /// An unconstrained array with an index constraint
    IndexConstrained {
        key: Option<DeclKey>,
        base: TypeRef,
        ranges: Vec<RangeBounds>,
    },
    Slice {
        base: TypeRef,
        range: RangeBounds,
    },
    Record {
        key: DeclKey,
        fields: Vec<(Arc<str>, TypeRef)>,
    },
    /// A named subtype without constraint
    Reference {
        key: DeclKey,
        target: TypeRef,
    },
    /// The anonymous type of an aggregate
    Aggregate {
        element: TypeRef,
        length: Option<u64>,
    },
    Opaque {
        key: DeclKey,
        kind: OpaqueKind,
    },
    Unknown,
}

impl Type {
    pub fn unknown() -> TypeRef {
        Arc::new(Type::Unknown)
    }

    pub fn universal_integer() -> TypeRef {
        Arc::new(Type::UniversalInteger)
    }

    pub fn universal_real() -> TypeRef {
        Arc::new(Type::UniversalReal)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }

    pub fn key(&self) -> Option<&DeclKey> {
        match self {
            Type::Enumeration { key, .. }
            | Type::Scalar { key, .. }
            | Type::Array { key, .. }
            | Type::Record { key, .. }
            | Type::Reference { key, .. }
            | Type::Opaque { key, .. } => Some(key),
            Type::IndexConstrained { key, .. } => key.as_ref(),
            _ => None,
        }
    }

    /// A scalar is strong when it does not derive from a parent
    pub fn is_strong(&self) -> bool {
        matches!(self, Type::Scalar { parent: None, .. })
    }

    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            Type::UniversalInteger => Some(ScalarKind::Integer),
            Type::UniversalReal => Some(ScalarKind::Real),
            Type::Scalar { kind, .. } => Some(*kind),
            Type::Reference { target, .. } => target.scalar_kind(),
            _ => None,
        }
    }

    pub fn is_universal(&self) -> bool {
        matches!(self, Type::UniversalInteger | Type::UniversalReal)
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Type::CharacterLiteral(_) | Type::StringLiteral(_) | Type::BitStringLiteral(_)
        )
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::UniversalInteger => write!(f, "universal_integer"),
            Type::UniversalReal => write!(f, "universal_real"),
            Type::Null => write!(f, "null"),
            Type::CharacterLiteral(chr) => write!(f, "character literal '{chr}'"),
            Type::StringLiteral(text) => write!(f, "string literal \"{text}\""),
            Type::BitStringLiteral(text) => write!(f, "bit string literal \"{text}\""),
            Type::IndexConstrained { key: None, base, .. } | Type::Slice { base, .. } => {
                write!(f, "{base}")
            }
            Type::Aggregate { .. } => write!(f, "aggregate"),
            Type::Unknown => write!(f, "unknown type"),
            _ => match self.key() {
                Some(key) => write!(f, "type '{}'", key.name),
                None => write!(f, "anonymous type"),
            },
        }
    }
}

/// Strips named subtypes without constraint
pub fn dereference(typ: &TypeRef) -> TypeRef {
    let mut typ = typ.clone();
    while let Type::Reference { target, .. } = typ.as_ref() {
        let target = target.clone();
        typ = target;
    }
    typ
}

/// The strong root type from which `typ` derives
pub fn base_type(typ: &TypeRef) -> TypeRef {
    let typ = dereference(typ);
    match typ.as_ref() {
        Type::Scalar {
            parent: Some(parent),
            ..
        } => base_type(parent),
        Type::IndexConstrained { base, .. } | Type::Slice { base, .. } => base_type(base),
        _ => typ,
    }
}

/// Whether the base type is the type `name` declared in package `package`
pub fn is_named(typ: &TypeRef, package: &str, name: &str) -> bool {
    base_type(typ)
        .key()
        .is_some_and(|key| key.is(package, name))
}

/// The array type itself, unconstrained, of an array or array subtype
pub fn array_base(typ: &TypeRef) -> Option<TypeRef> {
    let base = base_type(typ);
    matches!(base.as_ref(), Type::Array { .. }).then_some(base)
}

pub fn element_type(typ: &TypeRef) -> Option<TypeRef> {
    match dereference(typ).as_ref() {
        Type::Array { element, .. } | Type::Aggregate { element, .. } => Some(element.clone()),
        Type::IndexConstrained { base, .. } | Type::Slice { base, .. } => element_type(base),
        _ => None,
    }
}

pub fn index_types(typ: &TypeRef) -> Vec<TypeRef> {
    match dereference(typ).as_ref() {
        Type::Array { indexes, .. } => indexes.clone(),
        Type::IndexConstrained { base, .. } | Type::Slice { base, .. } => index_types(base),
        _ => Vec::new(),
    }
}

/// Number of dimensions of array like types
pub fn dimensions(typ: &TypeRef) -> usize {
    match dereference(typ).as_ref() {
        Type::Array { indexes, .. } => indexes.len(),
        Type::IndexConstrained { base, .. } | Type::Slice { base, .. } => dimensions(base),
        Type::StringLiteral(_) | Type::BitStringLiteral(_) | Type::Aggregate { .. } => 1,
        _ => 0,
    }
}

pub fn is_array_like(typ: &TypeRef) -> bool {
    dimensions(typ) > 0
}

/// An array type that is neither constrained nor derived by a constraint
pub fn is_unconstrained(typ: &TypeRef) -> bool {
    matches!(
        dereference(typ).as_ref(),
        Type::Array {
            constraint: None,
            ..
        }
    )
}

/// The ranges of each dimension of a constrained array
pub fn index_ranges(typ: &TypeRef) -> Option<Vec<RangeBounds>> {
    match dereference(typ).as_ref() {
        Type::Array { constraint, .. } => constraint.clone(),
        Type::IndexConstrained { ranges, .. } => Some(ranges.clone()),
        Type::Slice { range, .. } => Some(vec![*range]),
        Type::StringLiteral(text) | Type::BitStringLiteral(text) => {
            let length = text.chars().count() as i64;
            Some(vec![DiscreteRange::new(1, length, true).into()])
        }
        _ => None,
    }
}

/// The statically known length of the first dimension
pub fn length(typ: &TypeRef) -> Option<u64> {
    match dereference(typ).as_ref() {
        Type::StringLiteral(text) | Type::BitStringLiteral(text) => {
            Some(text.chars().count() as u64)
        }
        Type::Aggregate { length, .. } => *length,
        _ => Some(index_ranges(typ)?.first()?.known()?.length()),
    }
}

/// The range of a scalar type or subtype, taken from the closest constrained ancestor
pub fn scalar_range(typ: &TypeRef) -> Option<RangeBounds> {
    match dereference(typ).as_ref() {
        Type::Scalar {
            range: Some(range), ..
        } => Some(*range),
        Type::Scalar {
            parent: Some(parent),
            ..
        } => scalar_range(parent),
        Type::Enumeration { literals, .. } => {
            Some(DiscreteRange::new(0, literals.len() as i64 - 1, true).into())
        }
        _ => None,
    }
}

pub fn is_discrete(typ: &TypeRef) -> bool {
    match dereference(typ).as_ref() {
        Type::Enumeration { .. } | Type::UniversalInteger | Type::CharacterLiteral(_) => true,
        Type::Scalar { kind, .. } => *kind == ScalarKind::Integer,
        _ => false,
    }
}

#[cfg(test)]
pub(crate) mod test_types {
    use super::*;
    use std::path::Path;

    pub fn key(name: &str) -> DeclKey {
        DeclKey {
            source: Source::inline(Path::new("types.vhd"), ""),
            path: Arc::from(format!("pkg.{name}")),
            name: Arc::from(name),
        }
    }

    pub fn integer() -> TypeRef {
        Arc::new(Type::Scalar {
            key: key("integer"),
            kind: ScalarKind::Integer,
            parent: None,
            range: Some(DiscreteRange::new(i32::MIN as i64, i32::MAX as i64, true).into()),
            units: Vec::new(),
        })
    }

    pub fn natural() -> TypeRef {
        Arc::new(Type::Scalar {
            key: key("natural"),
            kind: ScalarKind::Integer,
            parent: Some(integer()),
            range: Some(DiscreteRange::new(0, i32::MAX as i64, true).into()),
            units: Vec::new(),
        })
    }

    pub fn real() -> TypeRef {
        Arc::new(Type::Scalar {
            key: key("real"),
            kind: ScalarKind::Real,
            parent: None,
            range: None,
            units: Vec::new(),
        })
    }

    pub fn logic() -> TypeRef {
        Arc::new(Type::Enumeration {
            key: key("logic"),
            literals: "UX01Z".chars().map(EnumLiteral::Character).collect(),
        })
    }

    pub fn logic_vector() -> TypeRef {
        Arc::new(Type::Array {
            key: key("logic_vector"),
            element: logic(),
            indexes: vec![natural()],
            constraint: None,
        })
    }

    pub fn constrained(base: TypeRef, length: i64) -> TypeRef {
        Arc::new(Type::IndexConstrained {
            key: None,
            base,
            ranges: vec![DiscreteRange::new(length - 1, 0, false).into()],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::test_types::*;
    use super::*;

    #[test]
    fn base_type_of_subtype() {
        assert_eq!(base_type(&natural()), integer());
        let reference = Arc::new(Type::Reference {
            key: key("nat"),
            target: natural(),
        });
        assert_eq!(base_type(&reference), integer());
        assert_eq!(dereference(&reference), natural());
    }

    #[test]
    fn lengths() {
        assert_eq!(length(&constrained(logic_vector(), 8)), Some(8));
        assert_eq!(length(&logic_vector()), None);
        assert_eq!(
            length(&Arc::new(Type::StringLiteral("1010".to_owned()))),
            Some(4)
        );
        assert_eq!(DiscreteRange::new(3, 5, false).length(), 0);
    }

    #[test]
    fn strong_scalars() {
        assert!(integer().is_strong());
        assert!(!natural().is_strong());
    }

    #[test]
    fn key_identifies_package_member() {
        let key = key("boolean");
        assert!(key.is("pkg", "boolean"));
        assert!(!key.is("pk", "boolean"));
        assert!(!key.is("pkg", "bool"));
    }
}
