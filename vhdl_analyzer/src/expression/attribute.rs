// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

use super::ast::*;
use super::evaluate::{EvalContext, Evaluated, NameTarget};
use super::{EvalError, EvalErrorKind, EvalResult, Value};
use crate::data::SrcPos;
use crate::declaration::*;
use crate::types::*;

/// Attributes that are written like a function call
pub(crate) fn takes_argument(attr: &str) -> bool {
    matches!(
        attr,
        "image"
            | "value"
            | "pos"
            | "val"
            | "succ"
            | "pred"
            | "leftof"
            | "rightof"
            | "stable"
            | "quiet"
            | "delayed"
            | "length"
            | "left"
            | "right"
            | "high"
            | "low"
            | "ascending"
    )
}

struct Prefix {
    typ: TypeRef,
    is_type: bool,
    is_signal: bool,
}

fn is_enumeration(typ: &TypeRef) -> bool {
    matches!(base_type(typ).as_ref(), Type::Enumeration { .. })
}

/// The value of position `index` of a discrete type
fn discrete_value(typ: &TypeRef, index: i64) -> Option<Value> {
    if is_enumeration(typ) {
        usize::try_from(index).ok().map(Value::Enum)
    } else {
        Some(Value::Integer(index))
    }
}

/// The index type and bounds of one dimension of an array, or the range of a scalar
fn range_of(typ: &TypeRef, dimension: usize) -> Option<(TypeRef, RangeBounds)> {
    if is_array_like(typ) {
        let index = index_types(typ)
            .get(dimension)
            .cloned()
            .unwrap_or_else(Type::unknown);
        let bounds = index_ranges(typ)
            .and_then(|ranges| ranges.get(dimension).copied())
            .unwrap_or_else(RangeBounds::unknown);
        Some((index, bounds))
    } else if let Some(bounds) = scalar_range(typ) {
        Some((typ.clone(), bounds))
    } else if typ.is_unknown() || typ.scalar_kind().is_some() {
        Some((typ.clone(), RangeBounds::unknown()))
    } else {
        None
    }
}

fn illegal(attr: &str, requirement: &str, pos: &SrcPos) -> EvalError {
    EvalError::new(
        EvalErrorKind::IllegalAttribute,
        format!("Attribute '{attr}' requires {requirement}"),
        pos,
    )
}

impl EvalContext<'_> {
    /// The type and bounds of `prefix'range` or `prefix'reverse_range`
    pub(crate) fn range_attribute(
        &mut self,
        prefix: &Expr,
        reverse: bool,
        pos: &SrcPos,
    ) -> EvalResult<(TypeRef, RangeBounds)> {
        let typ = match self.resolve_name(prefix, None)? {
            NameTarget::Type(typ) => typ,
            target => self.target_value(target, &prefix.pos, None)?.typ,
        };
        let attr = if reverse { "reverse_range" } else { "range" };
        let (typ, bounds) =
            range_of(&typ, 0).ok_or_else(|| illegal(attr, "an array or scalar prefix", pos))?;
        if reverse {
            let reversed = RangeBounds {
                left: bounds.right,
                right: bounds.left,
                ascending: !bounds.ascending,
            };
            Ok((typ, reversed))
        } else {
            Ok((typ, bounds))
        }
    }

    fn prefix_of(&mut self, target: &NameTarget) -> Option<Prefix> {
        let prefix = match target {
            NameTarget::Type(typ) => Prefix {
                typ: typ.clone(),
                is_type: true,
                is_signal: false,
            },
            NameTarget::Object(decl) => {
                let is_signal = match decl.kind() {
                    DeclKind::Object(object) => object.class == ObjectClass::Signal,
                    _ => true,
                };
                Prefix {
                    typ: self.object_type(decl),
                    is_type: false,
                    is_signal,
                }
            }
            NameTarget::Value(evaluated) => Prefix {
                typ: evaluated.typ.clone(),
                is_type: false,
                is_signal: true,
            },
            _ => return None,
        };
        Some(prefix)
    }

    pub(crate) fn attribute(
        &mut self,
        prefix_expr: &Expr,
        attr: &str,
        args: &[Assoc],
        pos: &SrcPos,
    ) -> EvalResult<NameTarget> {
        let target = self.resolve_name(prefix_expr, None)?;
        let argument = match args {
            [] => None,
            [arg] => Some(&arg.actual),
            _ => {
                return Err(EvalError::new(
                    EvalErrorKind::WrongArgumentCount,
                    format!("Attribute '{attr}' takes at most one argument"),
                    pos,
                ))
            }
        };

        if matches!(attr, "simple_name" | "path_name" | "instance_name") {
            let typ = self.standard_type("string");
            return Ok(NameTarget::Value(Evaluated::new(typ, pos)));
        }
        let Some(prefix) = self.prefix_of(&target) else {
            return self.user_attribute(attr, pos);
        };

        let value = |typ: TypeRef, value: Option<Value>| -> EvalResult<NameTarget> {
            Ok(NameTarget::Value(Evaluated::with_value(typ, pos, value)))
        };

        match attr {
            "length" | "left" | "right" | "high" | "low" | "ascending" | "range"
            | "reverse_range" => {
                let dimension = match argument {
                    Some(argument) => {
                        let evaluated = self.evaluate(argument, None)?;
                        let index = evaluated
                            .value
                            .and_then(|value| value.as_integer())
                            .unwrap_or(1);
                        usize::try_from(index - 1).unwrap_or(0)
                    }
                    None => 0,
                };
                if attr == "length" && !is_array_like(&prefix.typ) && !prefix.typ.is_unknown() {
                    return Err(illegal(attr, "an array prefix", pos));
                }
                let (typ, bounds) = range_of(&prefix.typ, dimension)
                    .ok_or_else(|| illegal(attr, "an array or scalar prefix", pos))?;
                match attr {
                    "length" => {
                        let length = bounds
                            .known()
                            .map(|range| Value::Integer(range.length() as i64));
                        value(Type::universal_integer(), length)
                    }
                    "ascending" => {
                        let boolean = self.boolean();
                        value(boolean, Some(Value::boolean(bounds.ascending)))
                    }
                    "range" | "reverse_range" => value(typ, None),
                    _ => {
                        let bound = match attr {
                            "left" => bounds.left,
                            "right" => bounds.right,
                            "low" => bounds.known().map(|range| range.low_high().0),
                            _ => bounds.known().map(|range| range.low_high().1),
                        };
                        let bound = bound.and_then(|bound| discrete_value(&typ, bound));
                        value(typ, bound)
                    }
                }
            }
            "event" | "active" | "stable" | "quiet" | "driving" | "transaction" | "last_event"
            | "last_active" | "last_value" | "delayed" | "driving_value" => {
                if !prefix.is_signal || prefix.is_type {
                    return Err(illegal(attr, "a signal prefix", pos));
                }
                if let Some(argument) = argument {
                    let time = self.standard_type("time");
                    self.evaluate(argument, Some(&time))?;
                }
                let typ = match attr {
                    "event" | "active" | "stable" | "quiet" | "driving" => self.boolean(),
                    "transaction" => self.standard_type("bit"),
                    "last_event" | "last_active" => self.standard_type("time"),
                    _ => prefix.typ.clone(),
                };
                value(typ, None)
            }
            "image" => {
                if prefix.typ.scalar_kind().is_none()
                    && !is_enumeration(&prefix.typ)
                    && !prefix.typ.is_unknown()
                {
                    return Err(illegal(attr, "a scalar prefix", pos));
                }
                if let Some(argument) = argument {
                    self.evaluate(argument, Some(&prefix.typ))?;
                }
                let typ = self.standard_type("string");
                value(typ, None)
            }
            "value" => {
                if let Some(argument) = argument {
                    let string = self.standard_type("string");
                    self.evaluate(argument, Some(&string))?;
                }
                value(prefix.typ.clone(), None)
            }
            "pos" | "val" | "succ" | "pred" | "leftof" | "rightof" => {
                if !is_discrete(&prefix.typ)
                    && prefix.typ.scalar_kind() != Some(ScalarKind::Physical)
                    && !prefix.typ.is_unknown()
                {
                    return Err(illegal(attr, "a discrete or physical type prefix", pos));
                }
                let Some(argument) = argument else {
                    return Err(EvalError::new(
                        EvalErrorKind::WrongArgumentCount,
                        format!("Attribute '{attr}' takes one argument"),
                        pos,
                    ));
                };
                let argument_type = if attr == "val" {
                    Type::universal_integer()
                } else {
                    prefix.typ.clone()
                };
                let index = self
                    .evaluate(argument, Some(&argument_type))?
                    .value
                    .and_then(|value| value.as_integer());
                let ascending = scalar_range(&prefix.typ).is_none_or(|range| range.ascending);
                let step = if ascending { 1 } else { -1 };
                match attr {
                    "pos" => value(Type::universal_integer(), index.map(Value::Integer)),
                    "val" => {
                        let result = index.and_then(|index| discrete_value(&prefix.typ, index));
                        value(prefix.typ.clone(), result)
                    }
                    _ => {
                        let offset = match attr {
                            "succ" => 1,
                            "pred" => -1,
                            "rightof" => step,
                            _ => -step,
                        };
                        let result =
                            index.and_then(|index| discrete_value(&prefix.typ, index + offset));
                        value(prefix.typ.clone(), result)
                    }
                }
            }
            "element" => match element_type(&prefix.typ) {
                Some(element) => Ok(NameTarget::Type(element)),
                None => Err(illegal(attr, "an array prefix", pos)),
            },
            "base" => Ok(NameTarget::Type(base_type(&prefix.typ))),
            "subtype" => Ok(NameTarget::Type(prefix.typ.clone())),
            _ => self.user_attribute(attr, pos),
        }
    }

    fn user_attribute(&mut self, attr: &str, pos: &SrcPos) -> EvalResult<NameTarget> {
        let designator = Designator::Identifier(self.env.registry().symbols().insert(attr));
        let unknown = || {
            EvalError::new(
                EvalErrorKind::IllegalAttribute,
                format!("Unknown attribute '{attr}'"),
                pos,
            )
        };
        let found = self.lookup(&designator, pos).map_err(|_| unknown())?;
        let Some(decl) = found.into_iter().next() else {
            return Err(unknown());
        };
        let DeclKind::Attribute { type_mark } = decl.kind() else {
            return Err(unknown());
        };
        self.reference(pos, &decl);
        let type_mark = type_mark.clone();
        let typ = match decl.parent() {
            Some(parent) => self.with_scope(parent, |ctx| {
                ctx.quietly(|ctx| ctx.type_mark(&type_mark))
                    .unwrap_or_else(|_| Type::unknown())
            }),
            None => Type::unknown(),
        };
        Ok(NameTarget::Value(Evaluated::new(typ, pos)))
    }
}
