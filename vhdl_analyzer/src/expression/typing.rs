// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

//! Lowering of type declarations and subtype indications to [Type]

use super::ast::*;
use super::evaluate::{EvalContext, Evaluated, NameTarget};
use super::{EvalError, EvalErrorKind, EvalResult};
use crate::analysis::DeclRef;
use crate::declaration::*;
use crate::types::*;
use std::sync::Arc;

fn decl_key(decl: &DeclRef) -> DeclKey {
    DeclKey {
        source: decl.source().clone(),
        path: decl.tree_path().clone(),
        name: Arc::from(decl.decl().designator.normalized()),
    }
}

fn is_real(evaluated: &Evaluated) -> bool {
    evaluated.typ.scalar_kind() == Some(ScalarKind::Real)
}

/// The full declaration of a type that was declared incomplete first
fn is_complete_type(decl: &DeclRef) -> bool {
    matches!(decl.kind(), DeclKind::Type(def) if !matches!(def, TypeDef::Incomplete))
}

impl EvalContext<'_> {
    /// A type from package `std.standard`
    pub fn standard_type(&mut self, name: &str) -> TypeRef {
        let Some(standard) = self.env.standard() else {
            return Type::unknown();
        };
        let found = standard.children_named(name).next();
        match found {
            Some(decl) => self.type_of_decl(&decl),
            None => Type::unknown(),
        }
    }

    /// The type declared by a type or subtype declaration, or the type of an
    /// enumeration literal or physical unit
    pub fn type_of_decl(&mut self, decl: &DeclRef) -> TypeRef {
        match decl.kind() {
            DeclKind::EnumLiteral { ty, .. } | DeclKind::PhysicalUnit { ty, .. } => {
                return self.type_of_decl(&decl.with_id(*ty));
            }
            DeclKind::Type(_) | DeclKind::Subtype(_) => {}
            _ => return self.object_type(decl),
        }
        if let Some(typ) = self.env.cached_type(decl) {
            return typ;
        }
        let lowered = self.guarded(decl, None, |ctx| {
            let parent = decl.parent()?;
            Some(ctx.with_scope(parent, |ctx| ctx.quietly(|ctx| ctx.lower_declared_type(decl))))
        });
        match lowered {
            Some(typ) => self.env.cache_type(decl, typ),
            None => Type::unknown(),
        }
    }

    fn lower_declared_type(&mut self, decl: &DeclRef) -> TypeRef {
        let key = decl_key(decl);
        match decl.kind() {
            DeclKind::Type(def) => self.lower_type_def(decl, key, def),
            DeclKind::Subtype(subtype) => {
                let subtype = subtype.clone();
                self.lower_subtype(&subtype, Some(key))
                    .unwrap_or_else(|_| Type::unknown())
            }
            _ => Type::unknown(),
        }
    }

    fn lower_type_def(&mut self, decl: &DeclRef, key: DeclKey, def: &TypeDef) -> TypeRef {
        let arena = decl.analysis.arena();
        let typ = match def {
            TypeDef::Enumeration(literals) => Type::Enumeration {
                key,
                literals: literals
                    .iter()
                    .filter_map(|id| EnumLiteral::from_designator(&arena.get(*id).designator))
                    .collect(),
            },
            TypeDef::Range(range) => {
                let (is_real, bounds) = self.scalar_bounds(range);
                Type::Scalar {
                    key,
                    kind: if is_real {
                        ScalarKind::Real
                    } else {
                        ScalarKind::Integer
                    },
                    parent: None,
                    range: bounds,
                    units: Vec::new(),
                }
            }
            TypeDef::Physical { range, units } => {
                let (_, bounds) = self.scalar_bounds(range);
                Type::Scalar {
                    key,
                    kind: ScalarKind::Physical,
                    parent: None,
                    range: bounds,
                    units: units
                        .iter()
                        .map(|id| Arc::from(arena.get(*id).designator.normalized()))
                        .collect(),
                }
            }
            TypeDef::Array { indexes, element } => {
                let mut index_types = Vec::new();
                let mut ranges = Vec::new();
                for index in indexes {
                    match index {
                        IndexDef::Unconstrained(mark) => {
                            let typ = self.type_mark(mark).unwrap_or_else(|_| Type::unknown());
                            index_types.push(typ);
                        }
                        IndexDef::Constrained(range) => {
                            let (typ, bounds) = self
                                .discrete_range(range)
                                .unwrap_or_else(|_| (Type::unknown(), RangeBounds::unknown()));
                            index_types.push(typ);
                            ranges.push(bounds);
                        }
                    }
                }
                let constraint = (ranges.len() == indexes.len()).then_some(ranges);
                Type::Array {
                    key,
                    element: self
                        .subtype_indication(element)
                        .unwrap_or_else(|_| Type::unknown()),
                    indexes: index_types,
                    constraint,
                }
            }
            TypeDef::Record(fields) => {
                let fields = fields
                    .iter()
                    .map(|id| {
                        let field = decl.with_id(*id);
                        let name = Arc::from(field.decl().designator.normalized());
                        (name, self.object_type(&field))
                    })
                    .collect();
                Type::Record { key, fields }
            }
            TypeDef::Access(_) => Type::Opaque {
                key,
                kind: OpaqueKind::Access,
            },
            TypeDef::File(_) => Type::Opaque {
                key,
                kind: OpaqueKind::File,
            },
            TypeDef::Protected => Type::Opaque {
                key,
                kind: OpaqueKind::Protected,
            },
            TypeDef::Incomplete => {
                let full = decl.parent().and_then(|parent| {
                    parent
                        .children_named(&key.name)
                        .find(|sibling| is_complete_type(sibling))
                });
                return match full {
                    Some(full) => self.type_of_decl(&full),
                    None => Type::unknown(),
                };
            }
        };
        Arc::new(typ)
    }

    /// Whether a range is a floating point range and its integer bounds
    fn scalar_bounds(&mut self, range: &Expr) -> (bool, Option<RangeBounds>) {
        let ExprKind::Range(left, direction, right) = &range.kind else {
            return match self.discrete_range(range) {
                Ok((typ, bounds)) => (typ.scalar_kind() == Some(ScalarKind::Real), Some(bounds)),
                Err(_) => (false, None),
            };
        };
        let (Ok(left), Ok(right)) = (self.evaluate(left, None), self.evaluate(right, None)) else {
            return (false, None);
        };
        if is_real(&left) || is_real(&right) {
            return (true, None);
        }
        let bounds = RangeBounds {
            left: left.value.and_then(|value| value.as_integer()),
            right: right.value.and_then(|value| value.as_integer()),
            ascending: *direction == Direction::Ascending,
        };
        (false, Some(bounds))
    }

    /// The type denoted by a type mark
    pub fn type_mark(&mut self, mark: &Expr) -> EvalResult<TypeRef> {
        match self.resolve_name(mark, None)? {
            NameTarget::Type(typ) => Ok(typ),
            other => Err(EvalError::new(
                EvalErrorKind::MismatchedKinds,
                format!("{} does not denote a type", other.describe()),
                mark,
            )),
        }
    }

    pub fn subtype_indication(&mut self, subtype: &SubtypeInd) -> EvalResult<TypeRef> {
        self.lower_subtype(subtype, None)
    }

    fn lower_subtype(&mut self, subtype: &SubtypeInd, key: Option<DeclKey>) -> EvalResult<TypeRef> {
        if let Some(resolution) = subtype.resolution.as_ref() {
            // Only record the reference, resolution functions are not checked
            self.resolve_name(resolution, None).ok();
        }
        let mark = self.type_mark(&subtype.type_mark)?;
        let typ = match &subtype.constraint {
            None => match key {
                Some(key) => Arc::new(Type::Reference { key, target: mark }),
                None => mark,
            },
            Some(Constraint::Range(range)) => {
                let (_, bounds) = self.discrete_range(range).unwrap_or_else(|_| {
                    (Type::unknown(), RangeBounds::unknown())
                });
                match (mark.scalar_kind(), key) {
                    (Some(kind), key) => {
                        let Some(key) = key.or_else(|| mark.key().cloned()) else {
                            return Ok(mark);
                        };
                        Arc::new(Type::Scalar {
                            key,
                            kind,
                            parent: Some(mark),
                            range: Some(bounds),
                            units: Vec::new(),
                        })
                    }
                    (None, Some(key)) => Arc::new(Type::Reference { key, target: mark }),
                    (None, None) => mark,
                }
            }
            Some(Constraint::Index(indexes)) => {
                let mut ranges = Vec::new();
                for index in indexes {
                    let bounds = match self.discrete_range(index) {
                        Ok((_, bounds)) => bounds,
                        Err(err) if err.kind == EvalErrorKind::Unresolved => return Err(err),
                        Err(_) => RangeBounds::unknown(),
                    };
                    ranges.push(bounds);
                }
                Arc::new(Type::IndexConstrained {
                    key,
                    base: mark,
                    ranges,
                })
            }
        };
        Ok(typ)
    }

    /// The type of an object, record element, alias or loop parameter
    pub fn object_type(&mut self, decl: &DeclRef) -> TypeRef {
        if let Some(typ) = self.env.cached_type(decl) {
            return typ;
        }
        let Some(parent) = decl.parent() else {
            return Type::unknown();
        };
        let lowered = self.guarded(decl, None, |ctx| {
            ctx.with_scope(parent, |ctx| {
                ctx.quietly(|ctx| match decl.kind() {
                    DeclKind::Object(object) => match (&object.subtype, &object.range) {
                        (Some(subtype), _) => ctx.subtype_indication(subtype).ok(),
                        (None, Some(range)) => ctx.discrete_range(range).ok().map(|(typ, _)| typ),
                        (None, None) => None,
                    },
                    DeclKind::RecordField(subtype)
                    | DeclKind::Alias {
                        subtype: Some(subtype),
                        ..
                    } => ctx.subtype_indication(subtype).ok(),
                    DeclKind::Alias {
                        subtype: None,
                        target,
                    } => {
                        let evaluated = ctx.evaluate(target, None).ok();
                        evaluated.map(|evaluated| evaluated.typ)
                    }
                    _ => None,
                })
            })
        });
        match lowered {
            Some(typ) => self.env.cache_type(decl, typ),
            None => Type::unknown(),
        }
    }

    /// The type and bounds of a discrete range or a discrete subtype
    pub fn discrete_range(&mut self, expr: &Expr) -> EvalResult<(TypeRef, RangeBounds)> {
        match &expr.kind {
            ExprKind::Range(left, direction, right) => {
                let left = self.evaluate(left, None)?;
                let expected = Some(&left.typ).filter(|typ| !typ.is_universal());
                let right = self.evaluate(right, expected)?;
                let typ = match (left.typ.as_ref(), right.typ.as_ref()) {
                    (Type::UniversalInteger, Type::UniversalInteger) => {
                        self.standard_type("integer")
                    }
                    (Type::UniversalInteger | Type::UniversalReal, _) => right.typ.clone(),
                    _ => left.typ.clone(),
                };
                if are_compatible(&left.typ, &right.typ).is_no() {
                    return Err(EvalError::new(
                        EvalErrorKind::TypeMismatch,
                        format!(
                            "Range bounds of {} and {} do not match",
                            left.typ, right.typ
                        ),
                        expr,
                    ));
                }
                let bounds = RangeBounds {
                    left: left.value.and_then(|value| value.as_integer()),
                    right: right.value.and_then(|value| value.as_integer()),
                    ascending: *direction == Direction::Ascending,
                };
                Ok((typ, bounds))
            }
            ExprKind::SubtypeRange(mark, range) => {
                let typ = self.type_mark(mark)?;
                let (_, bounds) = self.discrete_range(range)?;
                Ok((typ, bounds))
            }
            ExprKind::Attribute(prefix, attr) if attr == "range" || attr == "reverse_range" => {
                self.range_attribute(prefix, attr == "reverse_range", &expr.pos)
            }
            _ => match self.resolve_name(expr, None)? {
                NameTarget::Type(typ) => {
                    let bounds = scalar_range(&typ).unwrap_or_else(RangeBounds::unknown);
                    Ok((typ, bounds))
                }
                other => Err(EvalError::new(
                    EvalErrorKind::MismatchedKinds,
                    format!("{} is not a discrete range", other.describe()),
                    expr,
                )),
            },
        }
    }
}
