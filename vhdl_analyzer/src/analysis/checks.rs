// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

//! Static checks of one declaration or of the statements of one region

use super::results::{DeclRef, Reference};
use crate::config::UnsurePolicy;
use crate::data::*;
use crate::declaration::*;
use crate::expression::ast::*;
use crate::expression::{
    is_range_expr, name_pos, Environment, EvalContext, EvalError, Evaluated, NameTarget,
};
use crate::statement::*;
use crate::types::*;
use fnv::FnvHashSet;
use std::sync::Arc;

#[derive(Clone, Copy, PartialEq, Eq)]
enum AssignKind {
    Signal,
    Variable,
}

/// What a return statement of the region must look like
enum ReturnKind {
    Function(TypeRef),
    Procedure,
    Forbidden,
}

struct EnclosingLoop {
    label: Option<String>,
    scope: DeclId,
}

pub(super) struct Checker<'e> {
    ctx: EvalContext<'e>,
    diagnostics: &'e mut dyn DiagnosticHandler,
    /// Names written by assignments, these do not count as reads
    targets: Vec<SrcPos>,
    loops: Vec<EnclosingLoop>,
}

fn interface_of(unit: &DeclRef, generics: bool) -> Vec<DeclRef> {
    unit.decl()
        .children
        .iter()
        .map(|id| unit.with_id(*id))
        .filter(|decl| match decl.kind().as_object().map(|object| object.role) {
            Some(ObjectRole::Generic) => generics,
            Some(ObjectRole::Port(_)) => !generics,
            _ => false,
        })
        .collect()
}

/// The reason an object may not be assigned to
fn illegal_target(object: &ObjectDecl, kind: AssignKind) -> Option<&'static str> {
    match object.role {
        ObjectRole::Port(Mode::In) | ObjectRole::Parameter(Mode::In) => {
            return Some("an input and cannot be assigned");
        }
        ObjectRole::Generic | ObjectRole::LoopParameter => {
            return Some("not an object that can be assigned");
        }
        _ => {}
    }
    match (kind, object.class) {
        (_, ObjectClass::Constant) => Some("a constant and cannot be assigned"),
        (AssignKind::Signal, ObjectClass::Signal) => None,
        (AssignKind::Variable, ObjectClass::Variable | ObjectClass::SharedVariable) => None,
        (AssignKind::Signal, _) => {
            Some("not a signal and cannot be the target of a signal assignment")
        }
        (AssignKind::Variable, _) => {
            Some("not a variable and cannot be the target of a variable assignment")
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl<'e> Checker<'e> {
    pub fn new(
        env: &'e Environment,
        scope: DeclRef,
        diagnostics: &'e mut dyn DiagnosticHandler,
    ) -> Checker<'e> {
        Checker {
            ctx: EvalContext::new(env, scope),
            diagnostics,
            targets: Vec::new(),
            loops: Vec::new(),
        }
    }

    /// The names resolved by the checks
    pub fn finish(mut self) -> Vec<Reference> {
        self.ctx.take_references()
    }

    fn report(&mut self, err: EvalError) {
        self.diagnostics.push(err.into_diagnostic());
    }

    fn error(&mut self, pos: impl AsRef<SrcPos>, message: impl Into<String>, code: ErrorCode) {
        self.diagnostics.error(pos, message, code);
    }

    fn expr(&mut self, expr: &Expr, expected: Option<&TypeRef>) -> Option<Evaluated> {
        match self.ctx.evaluate(expr, expected) {
            Ok(evaluated) => Some(evaluated),
            Err(err) => {
                self.report(err);
                None
            }
        }
    }

    /// Evaluates an expression that must have the type `expected`
    fn value(&mut self, expr: &Expr, expected: &TypeRef) -> Option<Evaluated> {
        let evaluated = self.expr(expr, Some(expected))?;
        self.compatible(&evaluated, expected, &expr.pos);
        Some(evaluated)
    }

    fn compatible(&mut self, evaluated: &Evaluated, expected: &TypeRef, pos: &SrcPos) {
        if evaluated.typ.is_unknown() || expected.is_unknown() {
            return;
        }
        match are_compatible(&evaluated.typ, expected) {
            Compatibility::Yes => {}
            Compatibility::No => self.error(
                pos,
                format!(
                    "{} does not match {expected}",
                    capitalize(&evaluated.typ.to_string())
                ),
                ErrorCode::TypeMismatch,
            ),
            Compatibility::Unsure => {
                if self.ctx.env.config().unsure == UnsurePolicy::Hint {
                    self.diagnostics.hint(
                        pos,
                        format!(
                            "Cannot decide statically whether {} matches {expected}",
                            evaluated.typ
                        ),
                        ErrorCode::UnsureCompatibility,
                    );
                }
            }
        }
    }

    fn standard_type(&mut self, name: &str) -> TypeRef {
        self.ctx.standard_type(name)
    }

    fn is_boolean(&mut self, typ: &TypeRef) -> bool {
        let boolean = self.ctx.boolean();
        typ.is_unknown() || !are_compatible(typ, &boolean).is_no()
    }

    /// A condition is boolean or converts to boolean by the condition operator
    fn condition(&mut self, expr: &Expr) {
        let boolean = self.ctx.boolean();
        let mark = self.ctx.reference_mark();
        let evaluated = match self.ctx.evaluate(expr, Some(&boolean)) {
            Ok(evaluated) => evaluated,
            Err(err) => {
                self.ctx.rewind_references(mark);
                match self.ctx.evaluate(expr, None) {
                    Ok(evaluated) => evaluated,
                    Err(_) => return self.report(err),
                }
            }
        };
        if self.is_boolean(&evaluated.typ) {
            return;
        }
        let implicit = Expr::new(
            ExprKind::Unary(Operator::QueQue, Box::new(expr.clone())),
            expr.pos.clone(),
        );
        let converted = self
            .ctx
            .quietly(|ctx| ctx.evaluate(&implicit, Some(&boolean)))
            .map(|converted| converted.typ);
        if !converted.is_ok_and(|typ| self.is_boolean(&typ)) {
            self.error(
                expr,
                format!("Condition must be boolean, got {}", evaluated.typ),
                ErrorCode::TypeMismatch,
            );
        }
    }

    fn opt_condition(&mut self, expr: Option<&Expr>) {
        if let Some(expr) = expr {
            self.condition(expr);
        }
    }

    // Declarations

    pub fn declaration(&mut self, decl: &DeclRef) {
        match decl.kind() {
            DeclKind::Library(symbol) => {
                let name = symbol.name().to_lowercase();
                if name != "work" && !self.ctx.env.registry().has_library(&name) {
                    self.error(
                        decl.decl().decl_pos(),
                        format!("No such library '{symbol}'"),
                        ErrorCode::NoSuchLibrary,
                    );
                }
            }
            DeclKind::Object(object) => self.object(decl, object),
            DeclKind::Type(def) => self.type_definition(def),
            DeclKind::Subtype(subtype) | DeclKind::RecordField(subtype) => {
                if let Err(err) = self.ctx.subtype_indication(subtype) {
                    self.report(err);
                }
            }
            DeclKind::PhysicalUnit {
                factor: Some(factor),
                ..
            } => {
                self.expr(factor, None);
            }
            DeclKind::Subprogram(subprogram) => {
                if let Some(return_type) = &subprogram.return_type {
                    if let Err(err) = self.ctx.type_mark(return_type) {
                        self.report(err);
                    }
                }
            }
            DeclKind::Alias { subtype, target } => {
                if let Some(subtype) = subtype {
                    if let Err(err) = self.ctx.subtype_indication(subtype) {
                        self.report(err);
                    }
                }
                if let Err(err) = self.ctx.resolve_name(target, None) {
                    self.report(err);
                }
            }
            DeclKind::Attribute { type_mark } => {
                if let Err(err) = self.ctx.type_mark(type_mark) {
                    self.report(err);
                }
            }
            _ => {}
        }
    }

    fn object(&mut self, decl: &DeclRef, object: &ObjectDecl) {
        let typ = match (&object.subtype, &object.range) {
            (Some(subtype), _) => match self.ctx.subtype_indication(subtype) {
                Ok(typ) => typ,
                Err(err) => {
                    self.report(err);
                    return;
                }
            },
            (None, Some(range)) => {
                if let Err(err) = self.ctx.discrete_range(range) {
                    self.report(err);
                }
                return;
            }
            (None, None) => return,
        };

        let must_be_constrained = object.role == ObjectRole::Local
            && matches!(
                object.class,
                ObjectClass::Signal | ObjectClass::Variable | ObjectClass::SharedVariable
            );
        if must_be_constrained && is_unconstrained(&typ) {
            self.error(
                decl.decl().decl_pos(),
                format!(
                    "{} must have a constrained type, {typ} is unconstrained",
                    capitalize(&decl.decl().describe())
                ),
                ErrorCode::UnconstrainedType,
            );
        }

        if let Some(default) = &object.default {
            self.value(default, &typ);
        }
    }

    fn type_definition(&mut self, def: &TypeDef) {
        let result = match def {
            TypeDef::Range(range) => self.ctx.discrete_range(range).map(|_| ()),
            TypeDef::Physical { range, .. } => self.ctx.discrete_range(range).map(|_| ()),
            TypeDef::Array { indexes, element } => {
                for index in indexes {
                    let result = match index {
                        IndexDef::Unconstrained(mark) => self.ctx.type_mark(mark).map(|_| ()),
                        IndexDef::Constrained(range) => {
                            self.ctx.discrete_range(range).map(|_| ())
                        }
                    };
                    if let Err(err) = result {
                        self.report(err);
                    }
                }
                self.ctx.subtype_indication(element).map(|_| ())
            }
            TypeDef::Access(subtype) => self.ctx.subtype_indication(subtype).map(|_| ()),
            TypeDef::File(mark) => self.ctx.type_mark(mark).map(|_| ()),
            TypeDef::Enumeration(_)
            | TypeDef::Record(_)
            | TypeDef::Protected
            | TypeDef::Incomplete => Ok(()),
        };
        if let Err(err) = result {
            self.report(err);
        }
    }

    // Regions

    /// Checks the statements of a region
    pub fn region(&mut self, region: &DeclRef, statements: &[Stmt]) {
        match region.kind() {
            DeclKind::Process(sensitivity) => self.process(sensitivity, statements),
            DeclKind::Subprogram(subprogram) => {
                let returns = match &subprogram.return_type {
                    Some(mark) => {
                        let typ = self
                            .ctx
                            .quietly(|ctx| ctx.type_mark(mark))
                            .unwrap_or_else(|_| Type::unknown());
                        ReturnKind::Function(typ)
                    }
                    None => ReturnKind::Procedure,
                };
                self.sequential(statements, &returns);
            }
            _ => {
                for statement in statements {
                    self.concurrent(statement);
                }
            }
        }
    }

    fn process(&mut self, sensitivity: &Sensitivity, statements: &[Stmt]) {
        let mut listed = Vec::new();
        if let Sensitivity::List(names) = sensitivity {
            for name in names {
                if let Some(signal) = self.sensitivity_signal(name) {
                    listed.push((name.pos.clone(), signal));
                }
            }
        }

        let mark = self.ctx.reference_mark();
        self.sequential(statements, &ReturnKind::Forbidden);

        let read: FnvHashSet<(Source, Arc<str>)> = self
            .ctx
            .references_since(mark)
            .iter()
            .filter(|reference| !self.targets.contains(&reference.pos))
            .map(|reference| reference.target.key())
            .collect();
        for (pos, signal) in listed {
            if !read.contains(&signal.key()) {
                self.diagnostics.warning(
                    pos,
                    format!(
                        "Signal '{}' is in the sensitivity list but never read by the process",
                        signal.decl().designator
                    ),
                    ErrorCode::UnusedSensitivity,
                );
            }
        }
    }

    /// The signal named by an element of a sensitivity list
    fn sensitivity_signal(&mut self, name: &Expr) -> Option<DeclRef> {
        if let Err(err) = self.ctx.resolve_name(name, None) {
            self.report(err);
            return None;
        }
        let (designator, pos) = name.base_name()?;
        let decl = self.ctx.lookup(designator, pos).ok()?.into_iter().next()?;
        let object = decl.kind().as_object()?;
        if object.class != ObjectClass::Signal {
            self.error(
                pos,
                format!("{} is not a signal", capitalize(&decl.decl().describe())),
                ErrorCode::MismatchedKinds,
            );
            return None;
        }
        Some(decl)
    }

    fn concurrent(&mut self, statement: &Stmt) {
        match &statement.kind {
            // Regions of their own
            StmtKind::Process(_) | StmtKind::Block(_) | StmtKind::ForGenerate(_) => {}
            StmtKind::IfGenerate(branches) => {
                for branch in branches {
                    self.opt_condition(branch.condition.as_ref());
                }
            }
            StmtKind::CaseGenerate { selector, branches } => {
                let typ = self.expr(selector, None).map(|selector| selector.typ);
                for branch in branches {
                    self.choices(&branch.choices, typ.as_ref());
                }
            }
            StmtKind::Instance {
                unit,
                generic_map,
                port_map,
            } => self.instance(statement, unit, generic_map, port_map),
            // `inst: comp;` parses as a procedure call
            StmtKind::ProcedureCall(call) if statement.label.is_some() => {
                self.procedure_call(call, Some(statement))
            }
            _ => self.sequential_statement(statement, &ReturnKind::Forbidden),
        }
    }

    fn sequential(&mut self, statements: &[Stmt], returns: &ReturnKind) {
        for statement in statements {
            self.sequential_statement(statement, returns);
        }
    }

    fn sequential_statement(&mut self, statement: &Stmt, returns: &ReturnKind) {
        match &statement.kind {
            StmtKind::SignalAssignment { target, waveforms } => {
                let typ = self.target(target, AssignKind::Signal);
                for alternative in waveforms {
                    self.waveform(&alternative.waveform, typ.as_ref());
                    self.opt_condition(alternative.condition.as_ref());
                }
            }
            StmtKind::SelectedAssignment {
                selector,
                target,
                alternatives,
            } => {
                let selector_type = self.expr(selector, None).map(|selector| selector.typ);
                let typ = self.target(target, AssignKind::Signal);
                for alternative in alternatives {
                    self.waveform(&alternative.waveform, typ.as_ref());
                    self.choices(&alternative.choices, selector_type.as_ref());
                }
            }
            StmtKind::VariableAssignment { target, values } => {
                let typ = self.target(target, AssignKind::Variable);
                for (value, condition) in values {
                    match &typ {
                        Some(typ) => {
                            self.value(value, typ);
                        }
                        None => {
                            self.expr(value, None);
                        }
                    }
                    self.opt_condition(condition.as_ref());
                }
            }
            StmtKind::Assert {
                condition,
                report,
                severity,
            } => {
                self.condition(condition);
                self.report_and_severity(report.as_ref(), severity.as_ref());
            }
            StmtKind::Report { report, severity } => {
                self.report_and_severity(Some(report), severity.as_ref());
            }
            StmtKind::ProcedureCall(call) => self.procedure_call(call, None),
            StmtKind::If(branches) => {
                for (condition, body) in branches {
                    self.opt_condition(condition.as_ref());
                    self.sequential(body, returns);
                }
            }
            StmtKind::Case {
                selector,
                alternatives,
            } => {
                let typ = self.expr(selector, None).map(|selector| selector.typ);
                for (choices, body) in alternatives {
                    self.choices(choices, typ.as_ref());
                    self.sequential(body, returns);
                }
            }
            StmtKind::Loop {
                scope,
                scheme,
                body,
            } => {
                let inner = self.ctx.scope.with_id(*scope);
                let outer = std::mem::replace(&mut self.ctx.scope, inner);
                if let LoopScheme::While(condition) = scheme {
                    self.condition(condition);
                }
                self.loops.push(EnclosingLoop {
                    label: statement
                        .label
                        .as_ref()
                        .map(|label| label.item.normalized()),
                    scope: *scope,
                });
                self.sequential(body, returns);
                self.loops.pop();
                self.ctx.scope = outer;
            }
            StmtKind::Next {
                loop_label,
                condition,
            } => {
                self.jump(
                    loop_label.as_ref(),
                    statement,
                    ErrorCode::NextOutsideLoop,
                    "Next",
                );
                self.opt_condition(condition.as_ref());
            }
            StmtKind::Exit {
                loop_label,
                condition,
            } => {
                self.jump(
                    loop_label.as_ref(),
                    statement,
                    ErrorCode::ExitOutsideLoop,
                    "Exit",
                );
                self.opt_condition(condition.as_ref());
            }
            StmtKind::Return(value) => self.return_statement(statement, value.as_ref(), returns),
            StmtKind::Wait {
                on,
                until,
                timeout,
            } => {
                for name in on {
                    if let Err(err) = self.ctx.resolve_name(name, None) {
                        self.report(err);
                    }
                }
                self.opt_condition(until.as_ref());
                if let Some(timeout) = timeout {
                    let time = self.standard_type("time");
                    self.value(timeout, &time);
                }
            }
            StmtKind::Null => {}
            StmtKind::Process(_)
            | StmtKind::Block(_)
            | StmtKind::ForGenerate(_)
            | StmtKind::IfGenerate(_)
            | StmtKind::CaseGenerate { .. }
            | StmtKind::Instance { .. } => self.concurrent(statement),
        }
    }

    fn waveform(&mut self, waveform: &[WaveformElement], typ: Option<&TypeRef>) {
        let time = self.standard_type("time");
        for element in waveform {
            match typ {
                Some(typ) => {
                    self.value(&element.value, typ);
                }
                None => {
                    self.expr(&element.value, None);
                }
            }
            if let Some(after) = &element.after {
                self.value(after, &time);
            }
        }
    }

    fn choices(&mut self, choices: &[Expr], typ: Option<&TypeRef>) {
        for choice in choices {
            if matches!(choice.kind, ExprKind::Others) {
                continue;
            }
            if is_range_expr(choice) {
                if let Err(err) = self.ctx.discrete_range(choice) {
                    self.report(err);
                }
                continue;
            }
            match typ {
                Some(typ) => {
                    self.value(choice, typ);
                }
                None => {
                    self.expr(choice, None);
                }
            }
        }
    }

    fn report_and_severity(&mut self, report: Option<&Expr>, severity: Option<&Expr>) {
        if let Some(report) = report {
            let string = self.standard_type("string");
            self.value(report, &string);
        }
        if let Some(severity) = severity {
            let level = self.standard_type("severity_level");
            self.value(severity, &level);
        }
    }

    /// Checks the target of an assignment and returns its type
    fn target(&mut self, target: &Expr, kind: AssignKind) -> Option<TypeRef> {
        if let ExprKind::Aggregate(elements) = &target.kind {
            for element in elements {
                self.target(&element.value, kind);
            }
            return None;
        }

        if let Some((designator, pos)) = target.base_name() {
            self.targets.push(pos.clone());
            if let Ok(found) = self.ctx.lookup(designator, pos) {
                if let Some(decl) = found.first() {
                    let reason = match decl.kind() {
                        DeclKind::Object(object) => illegal_target(object, kind),
                        DeclKind::Alias { .. } => None,
                        _ => Some("not an object and cannot be assigned"),
                    };
                    if let Some(reason) = reason {
                        self.error(
                            pos,
                            format!("{} is {reason}", capitalize(&decl.decl().describe())),
                            ErrorCode::IllegalTarget,
                        );
                    }
                }
            }
        }

        self.expr(target, None).map(|evaluated| evaluated.typ)
    }

    /// A labelled concurrent call without arguments may instead be an instance
    /// without map aspects
    fn procedure_call(&mut self, call: &Expr, instance: Option<&Stmt>) {
        let (prefix, args) = match &call.kind {
            ExprKind::CallOrIndex(prefix, args) => (prefix.as_ref(), args.as_slice()),
            _ => (call, &[][..]),
        };
        let result = match self.ctx.resolve_name(prefix, None) {
            Ok(NameTarget::Unit(unit))
                if args.is_empty()
                    && instance.is_some()
                    && matches!(unit.kind(), DeclKind::Entity | DeclKind::Component) =>
            {
                if let Some(statement) = instance {
                    self.associate(statement, &unit, &[], &[]);
                }
                Ok(())
            }
            Ok(NameTarget::Overloaded(candidates)) => {
                self.ctx
                    .call_procedure(&candidates, args, &call.pos, name_pos(prefix))
            }
            Ok(other) => {
                self.error(
                    prefix,
                    format!("{} is not a procedure", capitalize(&other.describe())),
                    ErrorCode::MismatchedKinds,
                );
                Ok(())
            }
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            self.report(err);
        }
    }

    fn jump(
        &mut self,
        label: Option<&WithPos<Designator>>,
        statement: &Stmt,
        code: ErrorCode,
        what: &str,
    ) {
        let Some(label) = label else {
            if self.loops.is_empty() {
                self.error(
                    statement,
                    format!("{what} statement outside of a loop"),
                    code,
                );
            }
            return;
        };
        let name = label.item.normalized();
        let found = self
            .loops
            .iter()
            .rev()
            .find(|enclosing| enclosing.label.as_deref() == Some(name.as_str()))
            .map(|enclosing| enclosing.scope);
        match found {
            Some(scope) => {
                let target = self.ctx.scope.with_id(scope);
                self.ctx.reference(&label.pos, &target);
            }
            None => self.error(
                &label.pos,
                format!(
                    "{what} statement is not inside a loop labeled '{}'",
                    label.item
                ),
                code,
            ),
        }
    }

    fn return_statement(&mut self, statement: &Stmt, value: Option<&Expr>, returns: &ReturnKind) {
        match (returns, value) {
            (ReturnKind::Function(typ), Some(value)) => {
                self.value(value, typ);
            }
            (ReturnKind::Function(_), None) => {
                self.error(
                    statement,
                    "Function must return a value",
                    ErrorCode::VoidReturn,
                )
            }
            (ReturnKind::Procedure, Some(value)) => {
                self.expr(value, None);
                self.error(
                    value,
                    "Procedures cannot return a value",
                    ErrorCode::NonVoidReturn,
                );
            }
            (ReturnKind::Procedure, None) => {}
            (ReturnKind::Forbidden, _) => self.error(
                statement,
                "Return statement outside of a subprogram",
                ErrorCode::IllegalReturn,
            ),
        }
    }

    // Instances

    fn instance(
        &mut self,
        statement: &Stmt,
        unit: &InstantiatedUnit,
        generic_map: &[Assoc],
        port_map: &[Assoc],
    ) {
        let instantiated = match unit {
            InstantiatedUnit::Component(name) => self.instantiated_unit(name, None),
            InstantiatedUnit::Entity(name) => match &name.kind {
                ExprKind::CallOrIndex(prefix, args) => {
                    self.instantiated_unit(prefix, args.first().map(|arg| &arg.actual))
                }
                _ => self.instantiated_unit(name, None),
            },
            // Configurations are not analyzed
            InstantiatedUnit::Configuration(_) => None,
        };
        let Some(instantiated) = instantiated else {
            for assoc in generic_map.iter().chain(port_map) {
                if !matches!(assoc.actual.kind, ExprKind::Open) {
                    self.expr(&assoc.actual, None);
                }
            }
            return;
        };
        self.associate(statement, &instantiated, generic_map, port_map);
    }

    /// Checks the generic and port maps of an instance against the interface
    /// of the instantiated unit
    fn associate(
        &mut self,
        statement: &Stmt,
        instantiated: &DeclRef,
        generic_map: &[Assoc],
        port_map: &[Assoc],
    ) {
        let pos = statement
            .label
            .as_ref()
            .map(|label| label.pos.clone())
            .unwrap_or_else(|| statement.pos.clone());
        let generics = interface_of(instantiated, true);
        self.association(instantiated, &generics, generic_map, "generic", &pos);
        let ports = interface_of(instantiated, false);
        self.association(instantiated, &ports, port_map, "port", &pos);
    }

    /// The entity or component of an instance
    fn instantiated_unit(&mut self, name: &Expr, architecture: Option<&Expr>) -> Option<DeclRef> {
        let unit = match self.ctx.resolve_name(name, None) {
            Ok(NameTarget::Unit(unit))
                if matches!(unit.kind(), DeclKind::Entity | DeclKind::Component) =>
            {
                unit
            }
            Ok(other) => {
                self.error(
                    name,
                    format!(
                        "{} is not an entity or a component",
                        capitalize(&other.describe())
                    ),
                    ErrorCode::MismatchedKinds,
                );
                return None;
            }
            Err(err) => {
                self.report(err);
                return None;
            }
        };
        if let Some(architecture) = architecture {
            self.architecture_of(&unit, architecture);
        }
        Some(unit)
    }

    fn architecture_of(&mut self, entity: &DeclRef, architecture: &Expr) {
        let Some(designator) = architecture.as_designator() else {
            return;
        };
        let name = designator.normalized();
        let entity_name = entity.decl().designator.normalized();
        let found = self
            .ctx
            .env
            .registry()
            .snapshot()
            .library_documents(&entity.analysis.library)
            .into_iter()
            .find_map(|analysis| {
                let id = analysis
                    .children_named(analysis.root(), &name)
                    .iter()
                    .copied()
                    .find(|id| match &analysis.get(*id).kind {
                        DeclKind::Architecture { entity, .. } => {
                            entity.normalized() == entity_name
                        }
                        _ => false,
                    })?;
                Some(DeclRef::new(analysis, id))
            });
        match found {
            Some(found) => self.ctx.reference(&architecture.pos, &found),
            None => self.error(
                architecture,
                format!(
                    "No architecture '{designator}' for entity '{}'",
                    entity.decl().designator
                ),
                ErrorCode::NoPrimaryUnit,
            ),
        }
    }

    fn association(
        &mut self,
        unit: &DeclRef,
        formals: &[DeclRef],
        assocs: &[Assoc],
        what: &str,
        instance_pos: &SrcPos,
    ) {
        let mut associated = vec![false; formals.len()];
        for (index, assoc) in assocs.iter().enumerate() {
            let is_open = matches!(assoc.actual.kind, ExprKind::Open);
            let (formal, whole) = match &assoc.formal {
                None => match formals.get(index) {
                    Some(_) => (index, true),
                    None => {
                        self.error(
                            &assoc.actual,
                            format!(
                                "Too many {what} associations for {}",
                                unit.decl().describe()
                            ),
                            ErrorCode::TooManyArguments,
                        );
                        if !is_open {
                            self.expr(&assoc.actual, None);
                        }
                        continue;
                    }
                },
                Some(formal) => {
                    let Some((designator, pos)) = formal.base_name() else {
                        continue;
                    };
                    let name = designator.normalized();
                    let found = formals
                        .iter()
                        .position(|candidate| candidate.decl().designator.normalized() == name);
                    match found {
                        Some(found) => {
                            self.ctx.reference(pos, &formals[found]);
                            (found, formal.as_designator().is_some())
                        }
                        None => {
                            self.error(
                                pos,
                                format!(
                                    "No {what} '{designator}' within {}",
                                    unit.decl().describe()
                                ),
                                ErrorCode::InvalidFormal,
                            );
                            if !is_open {
                                self.expr(&assoc.actual, None);
                            }
                            continue;
                        }
                    }
                }
            };
            associated[formal] = true;
            if is_open {
                continue;
            }
            if whole {
                let typ = self.ctx.object_type(&formals[formal]);
                self.value(&assoc.actual, &typ);
            } else {
                self.expr(&assoc.actual, None);
            }
        }

        for (formal, done) in formals.iter().zip(associated) {
            let Some(object) = formal.kind().as_object() else {
                continue;
            };
            if done || object.default.is_some() {
                continue;
            }
            let message = format!("No association of {what} '{}'", formal.decl().designator);
            let diagnostic = match object.mode() {
                Some(Mode::Out | Mode::Buffer | Mode::Linkage) => {
                    Diagnostic::warning(instance_pos, message, ErrorCode::Unassociated)
                }
                _ => Diagnostic::error(instance_pos, message, ErrorCode::Unassociated),
            };
            self.diagnostics
                .push(diagnostic.related(formal.decl().decl_pos(), "Defined here"));
        }
    }
}
