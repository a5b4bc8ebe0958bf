// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

//! Predefined operators and the fallback to user defined operator functions

use super::ast::*;
use super::evaluate::{EvalContext, Evaluated};
use super::{EvalError, EvalErrorKind, EvalResult, Value};
use crate::analysis::DeclRef;
use crate::data::SrcPos;
use crate::declaration::{DeclKind, Designator};
use crate::types::*;
use std::cmp::Ordering;
use std::sync::Arc;

/// Types that adopt the type of the other operand
fn is_weak(typ: &TypeRef) -> bool {
    typ.is_literal()
        || typ.is_universal()
        || matches!(
            typ.as_ref(),
            Type::Aggregate { .. } | Type::Null | Type::Unknown
        )
}

fn is_boolean_or_bit(typ: &TypeRef) -> bool {
    is_named(typ, "standard", "boolean") || is_named(typ, "standard", "bit")
}

fn is_bit_array(typ: &TypeRef) -> bool {
    dimensions(typ) == 1 && element_type(typ).is_some_and(|element| is_boolean_or_bit(&element))
}

fn is_logical_type(typ: &TypeRef) -> bool {
    is_boolean_or_bit(typ) || is_bit_array(typ)
}

/// The type of an operation on two operands of a common type
fn common_type(left: &Evaluated, right: &Evaluated) -> Option<TypeRef> {
    if are_compatible(&left.typ, &right.typ).is_no() {
        return None;
    }
    if is_weak(&left.typ) && !is_weak(&right.typ) {
        Some(right.typ.clone())
    } else {
        Some(left.typ.clone())
    }
}

/// Operators that pass the expected type on to their operands
fn passes_expected(op: Operator) -> bool {
    use Operator::*;
    op.is_logical() || op.is_shift() || matches!(op, Plus | Minus | Times | Div | Mod | Rem | Pow)
}

/// Unary operators whose result has the type of the operand
fn keeps_operand_type(op: Operator) -> bool {
    use Operator::*;
    matches!(op, Plus | Minus | Abs | Not)
}

fn is_integer(evaluated: &Evaluated) -> bool {
    evaluated.typ.scalar_kind() == Some(ScalarKind::Integer) || evaluated.typ.is_unknown()
}

fn has_arity(decl: &DeclRef, arity: usize) -> bool {
    matches!(decl.kind(), DeclKind::Subprogram(subprogram) if subprogram.params.len() == arity)
}

/// Operators of which both operands have the same type
fn shares_type(op: Operator) -> bool {
    use Operator::*;
    op.is_logical()
        || op.is_relational()
        || op.is_matching_relational()
        || matches!(op, Plus | Minus | Mod | Rem)
}

fn logical_value(op: Operator, left: Option<&Value>, right: Option<&Value>) -> Option<Value> {
    use Operator::*;
    let (a, b) = (left?.as_bool()?, right?.as_bool()?);
    let result = match op {
        And => a && b,
        Or => a || b,
        Nand => !(a && b),
        Nor => !(a || b),
        Xor => a != b,
        Xnor => a == b,
        _ => return None,
    };
    Some(Value::boolean(result))
}

fn relational_value(op: Operator, left: Option<&Value>, right: Option<&Value>) -> Option<Value> {
    use Operator::*;
    let ordering = left?.compare(right?)?;
    let result = match op {
        EQ | QueEQ => ordering == Ordering::Equal,
        NE | QueNE => ordering != Ordering::Equal,
        LT | QueLT => ordering == Ordering::Less,
        LTE | QueLTE => ordering != Ordering::Greater,
        GT | QueGT => ordering == Ordering::Greater,
        GTE | QueGTE => ordering != Ordering::Less,
        _ => return None,
    };
    Some(Value::boolean(result))
}

fn arithmetic_value(op: Operator, left: Option<&Value>, right: Option<&Value>) -> Option<Value> {
    use Operator::*;
    match (left?, right?) {
        (Value::Integer(a), Value::Integer(b)) => {
            let (a, b) = (*a, *b);
            let result = match op {
                Plus => a.checked_add(b),
                Minus => a.checked_sub(b),
                Times => a.checked_mul(b),
                Div => a.checked_div(b),
                Rem => a.checked_rem(b),
                Mod => a
                    .checked_rem(b)
                    .map(|rem| if rem != 0 && (rem < 0) != (b < 0) { rem + b } else { rem }),
                Pow => u32::try_from(b).ok().and_then(|exp| a.checked_pow(exp)),
                _ => None,
            };
            result.map(Value::Integer)
        }
        (a, b) => {
            let (a, b) = (a.as_real()?, b.as_real()?);
            let result = match op {
                Plus => a + b,
                Minus => a - b,
                Times => a * b,
                Div if b != 0.0 => a / b,
                Pow => a.powf(b),
                _ => return None,
            };
            Some(Value::Real(result))
        }
    }
}

impl EvalContext<'_> {
    /// User defined operator functions with `arity` parameters
    fn operator_candidates(&mut self, op: Operator, pos: &SrcPos, arity: usize) -> Vec<DeclRef> {
        let designator = Designator::OperatorSymbol(Arc::from(op.symbol()));
        let Ok(found) = self.lookup(&designator, pos) else {
            return Vec::new();
        };
        found
            .into_iter()
            .filter(|decl| has_arity(decl, arity))
            .collect()
    }

    fn user_operator(
        &mut self,
        op: Operator,
        operands: &[&Expr],
        pos: &SrcPos,
        expected: Option<&TypeRef>,
        not_applicable: impl FnOnce() -> EvalError,
    ) -> EvalResult<Evaluated> {
        let candidates = self.operator_candidates(op, pos, operands.len());
        if candidates.is_empty() {
            return Err(not_applicable());
        }
        let args: Vec<Assoc> = operands
            .iter()
            .map(|operand| Assoc {
                formal: None,
                actual: (*operand).clone(),
            })
            .collect();
        self.call(&candidates, &args, expected, pos, None)
            .map_err(|err| match err.kind {
                EvalErrorKind::NoCandidates
                | EvalErrorKind::TypeMismatch
                | EvalErrorKind::WrongArgumentCount => not_applicable(),
                _ => err,
            })
    }

    pub(crate) fn unary(
        &mut self,
        op: Operator,
        operand: &Expr,
        pos: &SrcPos,
        expected: Option<&TypeRef>,
    ) -> EvalResult<Evaluated> {
        let mark = self.reference_mark();
        let hint = expected.filter(|_| keeps_operand_type(op));
        let inner = self.evaluate(operand, hint)?;
        if let Some(result) = self.predefined_unary(op, &inner, pos) {
            return Ok(result);
        }
        self.rewind_references(mark);
        let typ = inner.typ.clone();
        self.user_operator(op, &[operand], pos, expected, || {
            EvalError::new(
                EvalErrorKind::OperatorNotApplicable,
                format!("Operator {op} is not defined for {typ}"),
                pos,
            )
        })
    }

    fn predefined_unary(
        &mut self,
        op: Operator,
        inner: &Evaluated,
        pos: &SrcPos,
    ) -> Option<Evaluated> {
        use Operator::*;
        let typ = inner.typ.clone();
        match op {
            Plus | Minus | Abs => {
                if typ.scalar_kind().is_none() && !typ.is_unknown() {
                    return None;
                }
                let value = match (op, &inner.value) {
                    (Plus, value) => value.clone(),
                    (Minus, Some(Value::Integer(value))) => value.checked_neg().map(Value::Integer),
                    (Minus, Some(Value::Real(value))) => Some(Value::Real(-value)),
                    (Abs, Some(Value::Integer(value))) => value.checked_abs().map(Value::Integer),
                    (Abs, Some(Value::Real(value))) => Some(Value::Real(value.abs())),
                    _ => None,
                };
                Some(Evaluated::with_value(typ, pos, value))
            }
            Not => {
                if !is_logical_type(&typ) && !typ.is_unknown() {
                    return None;
                }
                let value = inner
                    .value
                    .as_ref()
                    .filter(|_| is_boolean_or_bit(&typ))
                    .and_then(Value::as_bool)
                    .map(|value| Value::boolean(!value));
                Some(Evaluated::with_value(typ, pos, value))
            }
            QueQue => {
                if !is_named(&typ, "standard", "bit") {
                    return None;
                }
                let value = inner
                    .value
                    .as_ref()
                    .and_then(Value::as_bool)
                    .map(Value::boolean);
                Some(Evaluated::with_value(self.boolean(), pos, value))
            }
            And | Or | Nand | Nor | Xor | Xnor => {
                // Reduction of a one dimensional array
                if !is_bit_array(&typ) {
                    return None;
                }
                Some(Evaluated::new(element_type(&typ)?, pos))
            }
            _ => None,
        }
    }

    pub(crate) fn binary(
        &mut self,
        op: Operator,
        left: &Expr,
        right: &Expr,
        pos: &SrcPos,
        expected: Option<&TypeRef>,
    ) -> EvalResult<Evaluated> {
        let mark = self.reference_mark();
        let hint = expected.filter(|_| passes_expected(op));
        let lhs = self.evaluate(left, hint)?;
        let right_hint = if shares_type(op) && !is_weak(&lhs.typ) {
            Some(lhs.typ.clone())
        } else {
            hint.filter(|_| !op.is_shift()).cloned()
        };
        let rhs = self.evaluate(right, right_hint.as_ref())?;
        let lhs = if shares_type(op) && is_weak(&lhs.typ) && !is_weak(&rhs.typ) {
            let typ = rhs.typ.clone();
            self.quietly(|ctx| ctx.evaluate(left, Some(&typ)))?
        } else {
            lhs
        };

        if let Some(result) = self.predefined_binary(op, &lhs, &rhs, pos, expected) {
            return Ok(result);
        }
        self.rewind_references(mark);
        let (ltyp, rtyp) = (lhs.typ.clone(), rhs.typ.clone());
        self.user_operator(op, &[left, right], pos, expected, || {
            EvalError::new(
                EvalErrorKind::OperatorNotApplicable,
                format!("Operator {op} is not defined for {ltyp} and {rtyp}"),
                pos,
            )
        })
    }

    fn predefined_binary(
        &mut self,
        op: Operator,
        lhs: &Evaluated,
        rhs: &Evaluated,
        pos: &SrcPos,
        expected: Option<&TypeRef>,
    ) -> Option<Evaluated> {
        use Operator::*;
        let (lval, rval) = (lhs.value.as_ref(), rhs.value.as_ref());
        match op {
            And | Or | Nand | Nor | Xor | Xnor => {
                let typ = common_type(lhs, rhs)?;
                if !is_logical_type(&typ) && !typ.is_unknown() {
                    return None;
                }
                let value = logical_value(op, lval, rval).filter(|_| is_boolean_or_bit(&typ));
                Some(Evaluated::with_value(typ, pos, value))
            }
            EQ | NE | LT | LTE | GT | GTE => {
                let typ = common_type(lhs, rhs)?;
                if matches!(
                    base_type(&typ).as_ref(),
                    Type::Opaque {
                        kind: OpaqueKind::File | OpaqueKind::Protected,
                        ..
                    }
                ) {
                    return None;
                }
                let value = relational_value(op, lval, rval);
                Some(Evaluated::with_value(self.boolean(), pos, value))
            }
            QueEQ | QueNE | QueLT | QueLTE | QueGT | QueGTE => {
                let typ = common_type(lhs, rhs)?;
                if !is_boolean_or_bit(&typ) {
                    return None;
                }
                let value = relational_value(op, lval, rval);
                Some(Evaluated::with_value(typ, pos, value))
            }
            Plus | Minus | Mod | Rem => {
                let typ = common_type(lhs, rhs)?;
                let numeric = match typ.scalar_kind() {
                    Some(ScalarKind::Real) => !matches!(op, Mod | Rem),
                    Some(_) => true,
                    None => typ.is_unknown(),
                };
                if !numeric {
                    return None;
                }
                Some(Evaluated::with_value(typ, pos, arithmetic_value(op, lval, rval)))
            }
            Times | Div => {
                let typ = self.product_type(op, lhs, rhs)?;
                Some(Evaluated::with_value(typ, pos, arithmetic_value(op, lval, rval)))
            }
            Pow => {
                let exponent_ok = is_integer(rhs);
                let base_ok = matches!(
                    lhs.typ.scalar_kind(),
                    Some(ScalarKind::Integer | ScalarKind::Real)
                ) || lhs.typ.is_unknown();
                if !(exponent_ok && base_ok) {
                    return None;
                }
                Some(Evaluated::with_value(lhs.typ.clone(), pos, arithmetic_value(op, lval, rval)))
            }
            Concat => self.predefined_concat(lhs, rhs, pos, expected),
            Sll | Srl | Sla | Sra | Rol | Ror => {
                let amount_ok = is_integer(rhs);
                if !(is_bit_array(&lhs.typ) && amount_ok) {
                    return None;
                }
                Some(Evaluated::new(lhs.typ.clone(), pos))
            }
            QueQue | Abs | Not => None,
        }
    }

    /// The type of `*` and `/` on numeric and physical operands
    fn product_type(&mut self, op: Operator, lhs: &Evaluated, rhs: &Evaluated) -> Option<TypeRef> {
        use ScalarKind::*;
        if lhs.typ.is_unknown() || rhs.typ.is_unknown() {
            return Some(Type::unknown());
        }
        let (lkind, rkind) = (lhs.typ.scalar_kind()?, rhs.typ.scalar_kind()?);
        match (lkind, rkind) {
            (Integer, Integer) | (Real, Real) => common_type(lhs, rhs),
            (Real, Integer) | (Integer, Real)
                if lhs.typ.is_universal() && rhs.typ.is_universal() =>
            {
                Some(Type::universal_real())
            }
            (Physical, Integer | Real) => Some(lhs.typ.clone()),
            (Integer | Real, Physical) if op == Operator::Times => Some(rhs.typ.clone()),
            (Physical, Physical) if op == Operator::Div => {
                common_type(lhs, rhs).map(|_| Type::universal_integer())
            }
            _ => None,
        }
    }

    fn predefined_concat(
        &mut self,
        lhs: &Evaluated,
        rhs: &Evaluated,
        pos: &SrcPos,
        expected: Option<&TypeRef>,
    ) -> Option<Evaluated> {
        let value = match (&lhs.value, &rhs.value) {
            (Some(a), Some(b)) => Some(a.concat(b)),
            _ => None,
        };
        if lhs.typ.is_literal() && rhs.typ.is_literal() {
            if let Some(Value::Str(text)) = &value {
                return Some(Evaluated::with_value(
                    Arc::new(Type::StringLiteral(text.clone())),
                    pos,
                    value.clone(),
                ));
            }
        }

        let array = [&lhs.typ, &rhs.typ]
            .into_iter()
            .find(|typ| !is_weak(typ) && is_array_like(typ))
            .cloned()
            .or_else(|| expected.filter(|typ| is_array_like(typ)).cloned());
        let Some(array) = array else {
            if lhs.typ.is_unknown() || rhs.typ.is_unknown() {
                return Some(Evaluated::new(Type::unknown(), pos));
            }
            return None;
        };
        let base = array_base(&array)?;
        let element = element_type(&array)?;

        let mut total = Some(0);
        for operand in [lhs, rhs] {
            let length = if !are_compatible(&operand.typ, &base).is_no() {
                length(&operand.typ)
            } else if !are_compatible(&operand.typ, &element).is_no() {
                Some(1)
            } else {
                return None;
            };
            total = total.zip(length).map(|(total, length)| total + length);
        }

        let typ = match total {
            Some(total) if total > 0 => Arc::new(Type::IndexConstrained {
                key: None,
                base: base.clone(),
                ranges: vec![DiscreteRange::new(0, total as i64 - 1, true).into()],
            }),
            _ => base,
        };
        Some(Evaluated::with_value(typ, pos, value))
    }
}
