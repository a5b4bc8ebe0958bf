// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

//! Overload resolution of subprogram calls and enumeration literals

use super::ast::*;
use super::evaluate::{EvalContext, Evaluated};
use super::{EvalError, EvalErrorKind, EvalResult, Value};
use crate::analysis::DeclRef;
use crate::data::SrcPos;
use crate::declaration::*;
use crate::types::*;
use fnv::FnvHashSet;

#[derive(Clone)]
struct Param {
    name: String,
    typ: TypeRef,
    has_default: bool,
}

#[derive(Clone)]
struct Candidate {
    decl: DeclRef,
    params: Vec<Param>,
    return_type: Option<TypeRef>,
    /// The parameter of every argument
    mapping: Vec<usize>,
}

/// Maps arguments to parameters, `None` when the call does not fit
fn associate(params: &[Param], args: &[Assoc]) -> Option<Vec<usize>> {
    let mut filled = vec![false; params.len()];
    let mut mapping = Vec::with_capacity(args.len());
    let mut next = 0;
    for arg in args {
        let index = match &arg.formal {
            None => {
                next += 1;
                next - 1
            }
            Some(formal) => {
                let name = formal.base_name()?.0.normalized();
                params.iter().position(|param| param.name == name)?
            }
        };
        if index >= params.len() || filled[index] {
            return None;
        }
        filled[index] = true;
        mapping.push(index);
    }
    params
        .iter()
        .zip(&filled)
        .all(|(param, filled)| *filled || param.has_default)
        .then_some(mapping)
}

fn is_weak(typ: &TypeRef) -> bool {
    typ.is_literal()
        || typ.is_universal()
        || matches!(typ.as_ref(), Type::Aggregate { .. } | Type::Null | Type::Unknown)
}

impl EvalContext<'_> {
    fn candidate(&mut self, decl: &DeclRef, args: &[Assoc]) -> Option<Candidate> {
        match decl.kind() {
            DeclKind::EnumLiteral { .. } => {
                if !args.is_empty() {
                    return None;
                }
                Some(Candidate {
                    decl: decl.clone(),
                    params: Vec::new(),
                    return_type: Some(self.type_of_decl(decl)),
                    mapping: Vec::new(),
                })
            }
            DeclKind::Subprogram(subprogram) => {
                let mut params = Vec::with_capacity(subprogram.params.len());
                for id in &subprogram.params {
                    let param = decl.with_id(*id);
                    let has_default = param
                        .kind()
                        .as_object()
                        .is_some_and(|object| object.default.is_some());
                    params.push(Param {
                        name: param.decl().designator.normalized(),
                        typ: self.object_type(&param),
                        has_default,
                    });
                }
                let return_type = subprogram.return_type.as_ref().map(|mark| {
                    self.with_scope(decl.clone(), |ctx| {
                        ctx.quietly(|ctx| ctx.type_mark(mark))
                            .unwrap_or_else(|_| Type::unknown())
                    })
                });
                let mapping = associate(&params, args)?;
                Some(Candidate {
                    decl: decl.clone(),
                    params,
                    return_type,
                    mapping,
                })
            }
            _ => None,
        }
    }

    /// Resolves a function call or an enumeration literal
    pub(crate) fn call(
        &mut self,
        decls: &[DeclRef],
        args: &[Assoc],
        expected: Option<&TypeRef>,
        pos: &SrcPos,
        name_pos: Option<&SrcPos>,
    ) -> EvalResult<Evaluated> {
        self.resolve_overload(decls, args, expected, pos, name_pos, false)
    }

    /// Resolves a procedure call statement
    pub fn call_procedure(
        &mut self,
        decls: &[DeclRef],
        args: &[Assoc],
        pos: &SrcPos,
        name_pos: Option<&SrcPos>,
    ) -> EvalResult<()> {
        self.resolve_overload(decls, args, None, pos, name_pos, true)
            .map(|_| ())
    }

    fn resolve_overload(
        &mut self,
        decls: &[DeclRef],
        args: &[Assoc],
        expected: Option<&TypeRef>,
        pos: &SrcPos,
        name_pos: Option<&SrcPos>,
        procedure: bool,
    ) -> EvalResult<Evaluated> {
        let name = decls
            .first()
            .map(|decl| decl.decl().designator.to_string())
            .unwrap_or_default();
        let wanted = |decl: &DeclRef| match decl.kind() {
            DeclKind::Subprogram(subprogram) => subprogram.is_function != procedure,
            DeclKind::EnumLiteral { .. } => !procedure,
            _ => false,
        };

        let mut candidates = Vec::new();
        let mut signatures = FnvHashSet::default();
        let mut max_params = 0;
        for decl in decls.iter().filter(|decl| wanted(decl)) {
            if let Some(subprogram) = decl.kind().as_subprogram() {
                max_params = max_params.max(subprogram.params.len());
                if !signatures.insert(subprogram.signature.clone()) {
                    continue;
                }
            }
            if let Some(candidate) = self.candidate(decl, args) {
                candidates.push(candidate);
            }
        }

        if candidates.is_empty() {
            for arg in args {
                self.record_references(&arg.actual);
            }
            let what = if procedure { "procedure" } else { "function" };
            return Err(if !decls.iter().any(wanted) {
                EvalError::new(
                    EvalErrorKind::MismatchedKinds,
                    format!("'{name}' is not a {what}"),
                    pos,
                )
            } else if args.len() > max_params {
                EvalError::new(
                    EvalErrorKind::WrongArgumentCount,
                    format!("Too many arguments in call to '{name}'"),
                    pos,
                )
            } else {
                EvalError::new(
                    EvalErrorKind::NoCandidates,
                    format!("No {what} '{name}' matches the arguments"),
                    pos,
                )
            });
        }

        if let Some(expected) = expected.filter(|typ| !typ.is_unknown()) {
            if candidates.len() > 1 {
                let fitting: Vec<Candidate> = candidates
                    .iter()
                    .filter(|candidate| {
                        candidate
                            .return_type
                            .as_ref()
                            .is_none_or(|typ| !are_compatible(typ, expected).is_no())
                    })
                    .cloned()
                    .collect();
                if !fitting.is_empty() {
                    candidates = fitting;
                }
            }
        }

        if candidates.len() == 1 {
            let candidate = candidates.remove(0);
            return self.finish_call(candidate, args, None, pos, name_pos);
        }

        let mut evaluated = Vec::with_capacity(args.len());
        for arg in args {
            evaluated.push(self.evaluate(&arg.actual, None)?);
        }
        let scores: Vec<Compatibility> = candidates
            .iter()
            .map(|candidate| {
                evaluated
                    .iter()
                    .zip(&candidate.mapping)
                    .map(|(arg, index)| are_compatible(&arg.typ, &candidate.params[*index].typ))
                    .fold(Compatibility::Yes, Compatibility::and)
            })
            .collect();
        let best = scores.iter().copied().max().unwrap_or(Compatibility::No);
        if best.is_no() {
            let types: Vec<String> = evaluated.iter().map(|arg| arg.typ.to_string()).collect();
            return Err(EvalError::new(
                EvalErrorKind::NoCandidates,
                format!("No function '{name}' accepts {}", types.join(", ")),
                pos,
            ));
        }
        let mut chosen: Vec<Candidate> = candidates
            .into_iter()
            .zip(scores)
            .filter(|(_, score)| *score == best)
            .map(|(candidate, _)| candidate)
            .collect();

        if chosen.len() > 1 {
            if let Some(expected_key) = expected.and_then(|typ| base_type(typ).key().cloned()) {
                let exact: Vec<Candidate> = chosen
                    .iter()
                    .filter(|candidate| {
                        candidate.return_type.as_ref().is_some_and(|typ| {
                            base_type(typ).key() == Some(&expected_key)
                        })
                    })
                    .cloned()
                    .collect();
                if !exact.is_empty() {
                    chosen = exact;
                }
            }
        }

        if chosen.len() > 1 {
            if best == Compatibility::Unsure {
                return Ok(Evaluated::new(Type::unknown(), pos));
            }
            return Err(EvalError::new(
                EvalErrorKind::AmbiguousCall,
                format!(
                    "Ambiguous call to '{name}', {} candidates match",
                    chosen.len()
                ),
                pos,
            ));
        }
        let candidate = chosen.remove(0);
        self.finish_call(candidate, args, Some(evaluated), pos, name_pos)
    }

    fn finish_call(
        &mut self,
        candidate: Candidate,
        args: &[Assoc],
        evaluated: Option<Vec<Evaluated>>,
        pos: &SrcPos,
        name_pos: Option<&SrcPos>,
    ) -> EvalResult<Evaluated> {
        if let Some(name_pos) = name_pos {
            self.reference(name_pos, &candidate.decl);
        }
        let mut evaluated = evaluated.map(Vec::into_iter);
        let mut values: Vec<Option<Value>> = vec![None; candidate.params.len()];
        for (arg, index) in args.iter().zip(&candidate.mapping) {
            let param = &candidate.params[*index];
            let previous = evaluated.as_mut().and_then(Iterator::next);
            let actual = match previous {
                Some(actual) if !is_weak(&actual.typ) => actual,
                Some(_) => self.quietly(|ctx| ctx.evaluate(&arg.actual, Some(&param.typ)))?,
                None => self.evaluate(&arg.actual, Some(&param.typ))?,
            };
            if matches!(arg.actual.kind, ExprKind::Open) {
                continue;
            }
            if are_compatible(&actual.typ, &param.typ).is_no() {
                return Err(EvalError::new(
                    EvalErrorKind::TypeMismatch,
                    format!(
                        "{} does not match {} of parameter '{}'",
                        actual.typ, param.typ, param.name
                    ),
                    &arg.actual,
                ));
            }
            values[*index] = actual.value;
        }

        let typ = candidate.return_type.clone().unwrap_or_else(Type::unknown);
        let value = match candidate.decl.kind() {
            DeclKind::EnumLiteral { ordinal, .. } => Some(Value::Enum(*ordinal)),
            DeclKind::Subprogram(subprogram) if subprogram.is_function => {
                let Some(arguments) = values.into_iter().collect::<Option<Vec<Value>>>() else {
                    return Ok(Evaluated::with_value(typ, pos, None));
                };
                match self.interpret_call(&candidate.decl, arguments, &typ, pos) {
                    Ok(value) => value,
                    Err(err) if self.frames.is_empty() => {
                        return Err(EvalError {
                            pos: pos.clone(),
                            ..err
                        })
                    }
                    Err(err) => return Err(err),
                }
            }
            _ => None,
        };
        Ok(Evaluated::with_value(typ, pos, value))
    }
}
