// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

//! Evaluation of function calls with statically known arguments.
//!
//! Only a subset of sequential statements is interpreted, anything else
//! gives up and leaves the value of the call unknown.

use super::ast::*;
use super::evaluate::{is_range_expr, EvalContext, Frame};
use super::{EvalError, EvalErrorKind, EvalResult, Value};
use crate::analysis::DeclRef;
use crate::data::SrcPos;
use crate::declaration::*;
use crate::statement::*;
use crate::types::*;
use std::ops::ControlFlow;

/// Statements executed by one top level call before giving up
const MAX_STEPS: usize = 10_000;

enum Flow {
    Normal,
    Return(Option<Value>),
    Next(Option<String>),
    Exit(Option<String>),
    Abort,
}

fn is_variable(decl: &DeclRef) -> bool {
    matches!(decl.kind(), DeclKind::Object(object) if object.class == ObjectClass::Variable)
}

impl EvalContext<'_> {
    /// The subprogram body of a function declaration
    fn function_body(&self, decl: &DeclRef) -> Option<DeclRef> {
        let subprogram = decl.kind().as_subprogram()?;
        if subprogram.is_body {
            return Some(decl.clone());
        }
        let name = decl.decl().designator.normalized();
        let is_body = |candidate: &DeclRef| {
            candidate
                .kind()
                .as_subprogram()
                .is_some_and(|other| other.is_body && other.signature == subprogram.signature)
        };
        let parent = decl.parent()?;
        if let Some(body) = parent.children_named(&name).find(|candidate| is_body(candidate)) {
            return Some(body);
        }
        if !matches!(parent.kind(), DeclKind::Package) {
            return None;
        }
        let package_body = self
            .env
            .registry()
            .resolve_body(
                &decl.analysis.library,
                &parent.decl().designator.normalized(),
            )?;
        let found = package_body
            .children_named(&name)
            .find(|candidate| is_body(candidate));
        found
    }

    /// The value of a function call, `None` when it cannot be computed
    pub(crate) fn interpret_call(
        &mut self,
        function: &DeclRef,
        arguments: Vec<Value>,
        return_type: &TypeRef,
        pos: &SrcPos,
    ) -> EvalResult<Option<Value>> {
        let Some(body) = self.function_body(function) else {
            return Ok(None);
        };
        let Some(subprogram) = body.kind().as_subprogram() else {
            return Ok(None);
        };
        if subprogram.params.len() != arguments.len() {
            return Ok(None);
        }
        let max_depth = self.env.config().max_call_depth;
        if self.frames.len() >= max_depth {
            return Err(EvalError::new(
                EvalErrorKind::RecursionLimit,
                format!(
                    "Evaluation of {} exceeds the maximum call depth of {max_depth}",
                    function.decl().describe()
                ),
                pos,
            ));
        }
        if self.frames.is_empty() {
            self.steps = 0;
        }

        let mut frame = Frame::default();
        for (id, value) in subprogram.params.iter().zip(arguments) {
            frame.insert(body.with_id(*id).tree_path().clone(), value);
        }
        self.frames.push(frame);
        let result = self.with_scope(body.clone(), |ctx| {
            ctx.quietly(|ctx| ctx.run_body(&body, return_type))
        });
        self.frames.pop();
        result
    }

    fn bind(&mut self, decl: &DeclRef, value: Value) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(decl.tree_path().clone(), value);
        }
    }

    fn run_body(&mut self, body: &DeclRef, return_type: &TypeRef) -> EvalResult<Option<Value>> {
        let locals: Vec<DeclRef> = body
            .decl()
            .children
            .iter()
            .map(|id| body.with_id(*id))
            .filter(|decl| {
                matches!(decl.kind(), DeclKind::Object(object) if object.role == ObjectRole::Local)
            })
            .collect();
        for local in locals {
            let Some(default) = local
                .kind()
                .as_object()
                .and_then(|object| object.default.clone())
            else {
                continue;
            };
            let typ = self.object_type(&local);
            let value = match self.evaluate(&default, Some(&typ)) {
                Ok(evaluated) => evaluated.value,
                Err(err) if err.kind == EvalErrorKind::RecursionLimit => return Err(err),
                Err(_) => return Ok(None),
            };
            if let Some(value) = value {
                self.bind(&local, value);
            }
        }

        let analysis = body.analysis.clone();
        match self.execute(analysis.body(body.id), return_type) {
            Ok(Flow::Return(value)) => Ok(value),
            Ok(_) => Ok(None),
            Err(err) if err.kind == EvalErrorKind::RecursionLimit => Err(err),
            Err(_) => Ok(None),
        }
    }

    fn condition(&mut self, expr: &Expr) -> EvalResult<Option<bool>> {
        let boolean = self.boolean();
        let evaluated = self.evaluate(expr, Some(&boolean))?;
        Ok(evaluated.value.as_ref().and_then(Value::as_bool))
    }

    /// The value of the first alternative whose condition holds
    fn conditional_value(
        &mut self,
        values: &[(Expr, Option<Expr>)],
        typ: &TypeRef,
    ) -> EvalResult<Option<Value>> {
        for (value, condition) in values {
            let holds = match condition {
                None => true,
                Some(condition) => match self.condition(condition)? {
                    Some(holds) => holds,
                    None => return Ok(None),
                },
            };
            if holds {
                return Ok(self.evaluate(value, Some(typ))?.value);
            }
        }
        Ok(None)
    }

    fn choice_matches(
        &mut self,
        choice: &Expr,
        selector: &Value,
        typ: &TypeRef,
    ) -> EvalResult<Option<bool>> {
        if matches!(choice.kind, ExprKind::Others) {
            return Ok(Some(true));
        }
        if is_range_expr(choice) {
            let (_, bounds) = self.discrete_range(choice)?;
            let (Some(range), Some(index)) = (bounds.known(), selector.as_integer()) else {
                return Ok(None);
            };
            let (low, high) = range.low_high();
            return Ok(Some(low <= index && index <= high));
        }
        let value = self.evaluate(choice, Some(typ))?.value;
        Ok(value.map(|value| value == *selector))
    }

    fn execute(&mut self, statements: &[Stmt], return_type: &TypeRef) -> EvalResult<Flow> {
        for stmt in statements {
            self.steps += 1;
            if self.steps > MAX_STEPS {
                return Ok(Flow::Abort);
            }
            let flow = match &stmt.kind {
                StmtKind::Null | StmtKind::Report { .. } | StmtKind::Assert { .. } => Flow::Normal,
                StmtKind::VariableAssignment { target, values } => {
                    let Some(variable) = target
                        .as_designator()
                        .and_then(|designator| self.lookup(designator, &target.pos).ok())
                        .and_then(|found| found.into_iter().next())
                        .filter(is_variable)
                    else {
                        return Ok(Flow::Abort);
                    };
                    let typ = self.object_type(&variable);
                    match self.conditional_value(values, &typ)? {
                        Some(value) => {
                            self.bind(&variable, value);
                            Flow::Normal
                        }
                        None => Flow::Abort,
                    }
                }
                StmtKind::If(branches) => {
                    let mut flow = Flow::Normal;
                    for (condition, body) in branches {
                        let holds = match condition {
                            None => Some(true),
                            Some(condition) => self.condition(condition)?,
                        };
                        match holds {
                            Some(true) => {
                                flow = self.execute(body, return_type)?;
                                break;
                            }
                            Some(false) => {}
                            None => {
                                flow = Flow::Abort;
                                break;
                            }
                        }
                    }
                    flow
                }
                StmtKind::Case {
                    selector,
                    alternatives,
                } => {
                    let selector = self.evaluate(selector, None)?;
                    let Some(value) = selector.value else {
                        return Ok(Flow::Abort);
                    };
                    let mut flow = Flow::Abort;
                    'alternatives: for (choices, body) in alternatives {
                        for choice in choices {
                            match self.choice_matches(choice, &value, &selector.typ)? {
                                Some(true) => {
                                    flow = self.execute(body, return_type)?;
                                    break 'alternatives;
                                }
                                Some(false) => {}
                                None => break 'alternatives,
                            }
                        }
                    }
                    flow
                }
                StmtKind::Loop {
                    scope,
                    scheme,
                    body,
                } => {
                    let label = stmt.label.as_ref().map(|label| label.item.normalized());
                    let loop_scope = self.scope.with_id(*scope);
                    self.with_scope(loop_scope, |ctx| {
                        ctx.run_loop(label.as_deref(), scheme, body, return_type)
                    })?
                }
                StmtKind::Next {
                    loop_label,
                    condition,
                } => match self.jump_condition(condition.as_ref())? {
                    Some(true) => {
                        Flow::Next(loop_label.as_ref().map(|label| label.item.normalized()))
                    }
                    Some(false) => Flow::Normal,
                    None => Flow::Abort,
                },
                StmtKind::Exit {
                    loop_label,
                    condition,
                } => match self.jump_condition(condition.as_ref())? {
                    Some(true) => {
                        Flow::Exit(loop_label.as_ref().map(|label| label.item.normalized()))
                    }
                    Some(false) => Flow::Normal,
                    None => Flow::Abort,
                },
                StmtKind::Return(value) => match value {
                    Some(value) => Flow::Return(self.evaluate(value, Some(return_type))?.value),
                    None => Flow::Return(None),
                },
                _ => Flow::Abort,
            };
            if !matches!(flow, Flow::Normal) {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    fn jump_condition(&mut self, condition: Option<&Expr>) -> EvalResult<Option<bool>> {
        match condition {
            Some(condition) => self.condition(condition),
            None => Ok(Some(true)),
        }
    }

    fn iteration(
        &mut self,
        label: Option<&str>,
        body: &[Stmt],
        return_type: &TypeRef,
    ) -> EvalResult<ControlFlow<Flow>> {
        self.steps += 1;
        if self.steps > MAX_STEPS {
            return Ok(ControlFlow::Break(Flow::Abort));
        }
        let ours = |target: &Option<String>| target.is_none() || target.as_deref() == label;
        Ok(match self.execute(body, return_type)? {
            Flow::Normal => ControlFlow::Continue(()),
            Flow::Next(target) if ours(&target) => ControlFlow::Continue(()),
            Flow::Exit(target) if ours(&target) => ControlFlow::Break(Flow::Normal),
            flow => ControlFlow::Break(flow),
        })
    }

    fn run_loop(
        &mut self,
        label: Option<&str>,
        scheme: &LoopScheme,
        body: &[Stmt],
        return_type: &TypeRef,
    ) -> EvalResult<Flow> {
        match scheme {
            LoopScheme::For(param) => {
                let param = self.scope.with_id(*param);
                let Some(range) = param
                    .kind()
                    .as_object()
                    .and_then(|object| object.range.clone())
                else {
                    return Ok(Flow::Abort);
                };
                let (typ, bounds) = self.discrete_range(&range)?;
                let Some(range) = bounds.known() else {
                    return Ok(Flow::Abort);
                };
                let is_enum = matches!(base_type(&typ).as_ref(), Type::Enumeration { .. });
                let indexes: Box<dyn Iterator<Item = i64>> = if range.ascending {
                    Box::new(range.left..=range.right)
                } else {
                    Box::new((range.right..=range.left).rev())
                };
                for index in indexes {
                    let value = match usize::try_from(index) {
                        Ok(ordinal) if is_enum => Value::Enum(ordinal),
                        _ => Value::Integer(index),
                    };
                    self.bind(&param, value);
                    if let ControlFlow::Break(flow) = self.iteration(label, body, return_type)? {
                        return Ok(flow);
                    }
                }
                Ok(Flow::Normal)
            }
            LoopScheme::While(condition) => loop {
                match self.condition(condition)? {
                    Some(true) => {}
                    Some(false) => return Ok(Flow::Normal),
                    None => return Ok(Flow::Abort),
                }
                if let ControlFlow::Break(flow) = self.iteration(label, body, return_type)? {
                    return Ok(flow);
                }
            },
            LoopScheme::Infinite => loop {
                if let ControlFlow::Break(flow) = self.iteration(label, body, return_type)? {
                    return Ok(flow);
                }
            },
        }
    }
}
