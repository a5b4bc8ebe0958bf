// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

use super::typ::*;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Compatibility {
    No,
    Unsure,
    Yes,
}

impl Compatibility {
    /// `Yes` wins over `Unsure` which wins over `No`
    pub fn or(self, other: Compatibility) -> Compatibility {
        self.max(other)
    }

    pub fn and(self, other: Compatibility) -> Compatibility {
        self.min(other)
    }

    pub fn is_no(&self) -> bool {
        *self == Compatibility::No
    }

    fn from_bool(value: bool) -> Compatibility {
        if value {
            Compatibility::Yes
        } else {
            Compatibility::No
        }
    }
}

/// Whether a value of one type can be used where the other is expected.
/// The relation is symmetric.
pub fn are_compatible(a: &TypeRef, b: &TypeRef) -> Compatibility {
    if Arc::ptr_eq(a, b) || a == b {
        return Compatibility::Yes;
    }
    one_way(a, b).or(one_way(b, a))
}

fn accepts_literal(typ: &TypeRef, literal: &str) -> bool {
    let Some(element) = element_type(typ) else {
        return false;
    };
    match dereference(&element).as_ref() {
        Type::Enumeration { literals, .. } => literal
            .chars()
            .all(|chr| literals.contains(&EnumLiteral::Character(chr))),
        Type::Unknown => true,
        _ => false,
    }
}

fn lengths_match(a: &TypeRef, b: &TypeRef) -> Compatibility {
    match (length(a), length(b)) {
        (Some(la), Some(lb)) => Compatibility::from_bool(la == lb),
        _ if is_unconstrained(a) || is_unconstrained(b) => Compatibility::Yes,
        _ => Compatibility::Unsure,
    }
}

fn one_way(a: &TypeRef, b: &TypeRef) -> Compatibility {
    use Compatibility::*;
    let da = dereference(a);
    let db = dereference(b);

    match (da.as_ref(), db.as_ref()) {
        (Type::Unknown, _) | (_, Type::Unknown) => Unsure,
        (Type::UniversalInteger, other) | (other, Type::UniversalInteger)
            if other.scalar_kind() == Some(ScalarKind::Integer) =>
        {
            Yes
        }
        (Type::UniversalReal, other) | (other, Type::UniversalReal)
            if other.scalar_kind() == Some(ScalarKind::Real) =>
        {
            Yes
        }
        (Type::Null, Type::Opaque { kind, .. }) => {
            Compatibility::from_bool(*kind == OpaqueKind::Access)
        }
        (Type::CharacterLiteral(chr), Type::Enumeration { literals, .. }) => {
            Compatibility::from_bool(literals.contains(&EnumLiteral::Character(*chr)))
        }
        (Type::CharacterLiteral(_), Type::CharacterLiteral(_)) => Yes,
        (
            Type::StringLiteral(la) | Type::BitStringLiteral(la),
            Type::StringLiteral(lb) | Type::BitStringLiteral(lb),
        ) => {
            if la.chars().count() == lb.chars().count() {
                Yes
            } else {
                Unsure
            }
        }
        (Type::StringLiteral(literal) | Type::BitStringLiteral(literal), _) => {
            if dimensions(&db) == 1 && accepts_literal(&db, literal) {
                lengths_match(&da, &db)
            } else {
                No
            }
        }
        (Type::Aggregate { .. }, Type::Aggregate { .. }) => Unsure,
        (Type::Aggregate { element, .. }, _) => {
            let Some(other_element) = element_type(&db) else {
                return No;
            };
            let elements = if element.is_unknown() {
                Unsure
            } else {
                are_compatible(element, &other_element)
            };
            if elements.is_no() {
                No
            } else {
                elements.and(lengths_match(&da, &db))
            }
        }
        _ => {
            let base_a = base_type(&da);
            let base_b = base_type(&db);
            match (base_a.key(), base_b.key()) {
                (Some(ka), Some(kb)) if ka == kb => {
                    if matches!(base_a.as_ref(), Type::Array { .. }) {
                        lengths_match(&da, &db)
                    } else {
                        Yes
                    }
                }
                _ => No,
            }
        }
    }
}

fn is_numeric(typ: &TypeRef) -> bool {
    matches!(
        typ.scalar_kind(),
        Some(ScalarKind::Integer | ScalarKind::Real)
    )
}

/// Whether an explicit type conversion from `from` to `to` is legal
pub fn is_castable(from: &TypeRef, to: &TypeRef) -> bool {
    if !are_compatible(from, to).is_no() {
        return true;
    }
    if is_numeric(from) && is_numeric(to) {
        return true;
    }
    if is_array_like(from) && is_array_like(to) && dimensions(from) == dimensions(to) {
        if let (Some(ea), Some(eb)) = (element_type(from), element_type(to)) {
            return !are_compatible(&ea, &eb).is_no();
        }
    }
    false
}
