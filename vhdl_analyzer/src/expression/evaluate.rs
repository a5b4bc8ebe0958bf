// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

use super::ast::*;
use super::attribute::takes_argument;
use super::{Environment, EvalError, EvalErrorKind, EvalResult, Value};
use crate::analysis::{DeclRef, Reference};
use crate::data::*;
use crate::declaration::*;
use crate::resolve::find_name;
use crate::types::*;
use fnv::FnvHashMap;
use std::sync::Arc;

/// The type and, when statically known, the value of an expression
#[derive(Clone, Debug)]
pub struct Evaluated {
    pub typ: TypeRef,
    pub pos: SrcPos,
    pub value: Option<Value>,
}

impl Evaluated {
    pub fn new(typ: TypeRef, pos: &SrcPos) -> Evaluated {
        Evaluated {
            typ,
            pos: pos.clone(),
            value: None,
        }
    }

    pub fn with_value(typ: TypeRef, pos: &SrcPos, value: Option<Value>) -> Evaluated {
        Evaluated {
            typ,
            pos: pos.clone(),
            value,
        }
    }
}

/// What a name denotes
#[derive(Clone, Debug)]
pub enum NameTarget {
    Object(DeclRef),
    Type(TypeRef),
    /// Subprograms and enumeration literals
    Overloaded(Vec<DeclRef>),
    /// Normalized library name, `work` already substituted
    Library(String),
    /// Design units and components
    Unit(DeclRef),
    /// Record elements, indexed names, slices, calls and attribute values
    Value(Evaluated),
    Other(DeclRef),
}

impl NameTarget {
    pub fn describe(&self) -> String {
        match self {
            NameTarget::Object(decl) | NameTarget::Unit(decl) | NameTarget::Other(decl) => {
                decl.decl().describe()
            }
            NameTarget::Type(typ) => typ.to_string(),
            NameTarget::Overloaded(candidates) => candidates
                .first()
                .map(|decl| decl.decl().describe())
                .unwrap_or_default(),
            NameTarget::Library(name) => format!("library '{name}'"),
            NameTarget::Value(evaluated) => format!("value of {}", evaluated.typ),
        }
    }
}

/// Interpreter variables by tree path
pub(crate) type Frame = FnvHashMap<Arc<str>, Value>;

/// The state of evaluating expressions within one region
pub struct EvalContext<'e> {
    pub env: &'e Environment,
    pub scope: DeclRef,
    pub(crate) frames: Vec<Frame>,
    pub(crate) steps: usize,
    in_progress: Vec<(Source, Arc<str>)>,
    record: bool,
    references: Vec<Reference>,
}

fn is_incomplete(decl: &DeclRef) -> bool {
    matches!(decl.kind(), DeclKind::Type(TypeDef::Incomplete))
}

fn is_access(typ: &TypeRef) -> bool {
    matches!(
        typ.as_ref(),
        Type::Opaque {
            kind: OpaqueKind::Access,
            ..
        }
    )
}

/// The position of the designator naming a subprogram
pub(crate) fn name_pos(prefix: &Expr) -> Option<&SrcPos> {
    match &prefix.kind {
        ExprKind::Name(_) => Some(&prefix.pos),
        ExprKind::Selected(_, Suffix::Designator(_, pos)) => Some(pos),
        _ => None,
    }
}

pub(crate) fn is_range_expr(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Range(..) | ExprKind::SubtypeRange(..) => true,
        ExprKind::Attribute(_, attr) => attr == "range" || attr == "reverse_range",
        _ => false,
    }
}

impl<'e> EvalContext<'e> {
    pub fn new(env: &'e Environment, scope: DeclRef) -> EvalContext<'e> {
        EvalContext {
            env,
            scope,
            frames: Vec::new(),
            steps: 0,
            in_progress: Vec::new(),
            record: true,
            references: Vec::new(),
        }
    }

    pub fn take_references(&mut self) -> Vec<Reference> {
        std::mem::take(&mut self.references)
    }

    pub(crate) fn reference(&mut self, pos: &SrcPos, target: &DeclRef) {
        if self.record {
            self.references.push(Reference {
                pos: pos.clone(),
                target: target.clone(),
            });
        }
    }

    /// Evaluates an expression only for the references it makes, its errors
    /// are superseded by the caller's own diagnostic
    pub(crate) fn record_references(&mut self, expr: &Expr) {
        self.evaluate(expr, None).ok();
    }

    pub(crate) fn reference_mark(&self) -> usize {
        self.references.len()
    }

    pub(crate) fn references_since(&self, mark: usize) -> &[Reference] {
        self.references.get(mark..).unwrap_or_default()
    }

    /// Forgets references recorded after `mark`
    pub(crate) fn rewind_references(&mut self, mark: usize) {
        self.references.truncate(mark);
    }

    pub fn with_scope<T>(&mut self, scope: DeclRef, f: impl FnOnce(&mut Self) -> T) -> T {
        let outer = std::mem::replace(&mut self.scope, scope);
        let result = f(self);
        self.scope = outer;
        result
    }

    /// Evaluates without recording references
    pub(crate) fn quietly<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let record = std::mem::replace(&mut self.record, false);
        let result = f(self);
        self.record = record;
        result
    }

    /// Runs `f` unless the declaration is already being evaluated
    pub(crate) fn guarded<T>(
        &mut self,
        decl: &DeclRef,
        fallback: T,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        let key = decl.key();
        if self.in_progress.contains(&key) {
            return fallback;
        }
        self.in_progress.push(key);
        let result = f(self);
        self.in_progress.pop();
        result
    }

    /// The declarations a designator denotes: the innermost one, or all
    /// visible overloads when the innermost one is overloadable
    pub fn lookup(&mut self, designator: &Designator, pos: &SrcPos) -> EvalResult<Vec<DeclRef>> {
        let name = designator.normalized();
        let mut found: Vec<DeclRef> = Vec::new();
        for decl in find_name(self.env.registry(), &self.scope, &name) {
            match found.first() {
                None => {}
                Some(first) if is_incomplete(first) => {
                    if matches!(decl.kind(), DeclKind::Type(_)) {
                        found.clear();
                    } else {
                        continue;
                    }
                }
                Some(_) if !decl.kind().is_overloadable() => break,
                Some(_) => {}
            }
            let done = !decl.kind().is_overloadable() && !is_incomplete(&decl);
            found.push(decl);
            if done {
                break;
            }
        }
        if found.is_empty() {
            Err(EvalError::unresolved(designator, pos))
        } else {
            Ok(found)
        }
    }

    fn classify(&mut self, found: Vec<DeclRef>, pos: &SrcPos) -> EvalResult<NameTarget> {
        let Some(first) = found.first().cloned() else {
            return Err(EvalError::new(
                EvalErrorKind::Unresolved,
                "No declaration",
                pos,
            ));
        };
        let target = match first.kind() {
            DeclKind::Object(_) | DeclKind::RecordField(_) => NameTarget::Object(first),
            DeclKind::Type(_) | DeclKind::Subtype(_) => NameTarget::Type(self.type_of_decl(&first)),
            DeclKind::Subprogram(_) | DeclKind::EnumLiteral { .. } => NameTarget::Overloaded(found),
            DeclKind::Library(_) => NameTarget::Library(
                self.env
                    .registry()
                    .library_name(first.source(), &first.decl().designator.normalized()),
            ),
            DeclKind::Alias { target, .. } => {
                let target = target.clone();
                let resolved = match first.parent() {
                    Some(parent) => self.with_scope(parent, |ctx| {
                        ctx.quietly(|ctx| ctx.resolve_name(&target, None))
                    }),
                    None => return Ok(NameTarget::Other(first)),
                };
                match resolved {
                    Ok(NameTarget::Object(_) | NameTarget::Value(_)) => NameTarget::Object(first),
                    Ok(other) => other,
                    Err(_) => NameTarget::Other(first),
                }
            }
            DeclKind::Entity
            | DeclKind::Architecture { .. }
            | DeclKind::Package
            | DeclKind::PackageBody
            | DeclKind::Context
            | DeclKind::Component => NameTarget::Unit(first),
            _ => NameTarget::Other(first),
        };
        Ok(target)
    }

    /// The declaration with a tree path in the latest analysis of a document
    pub(crate) fn decl_by_path(&self, source: &Source, path: &str) -> Option<DeclRef> {
        let snapshot = self.env.registry().snapshot();
        let analysis = snapshot.document(source)?.analysis.clone()?;
        let id = analysis.lookup_path(path)?;
        Some(DeclRef::new(analysis, id))
    }

    pub fn resolve_name(
        &mut self,
        expr: &Expr,
        expected: Option<&TypeRef>,
    ) -> EvalResult<NameTarget> {
        match &expr.kind {
            ExprKind::Name(designator) => {
                let found = self.lookup(designator, &expr.pos)?;
                // Overloads are recorded once the call is resolved
                if let Some(first) = found.first().filter(|decl| !decl.kind().is_overloadable()) {
                    self.reference(&expr.pos, first);
                }
                self.classify(found, &expr.pos)
            }
            ExprKind::Selected(prefix, suffix) => self.selected(prefix, suffix, &expr.pos),
            ExprKind::CallOrIndex(prefix, args) => {
                self.call_or_index(prefix, args, &expr.pos, expected)
            }
            ExprKind::Attribute(prefix, attr) => {
                self.attribute(prefix, attr, &[], &expr.pos)
            }
            _ => Ok(NameTarget::Value(self.evaluate(expr, expected)?)),
        }
    }

    fn selected(&mut self, prefix: &Expr, suffix: &Suffix, pos: &SrcPos) -> EvalResult<NameTarget> {
        let target = self.resolve_name(prefix, None)?;
        let (designator, suffix_pos) = match suffix {
            Suffix::Designator(designator, suffix_pos) => (designator, suffix_pos),
            Suffix::All(_) => {
                return match target {
                    NameTarget::Unit(unit) => Ok(NameTarget::Other(unit)),
                    _ => Ok(NameTarget::Value(Evaluated::new(Type::unknown(), pos))),
                };
            }
        };
        let name = designator.normalized();
        match target {
            NameTarget::Library(library) => {
                let Some(unit) = self.env.registry().resolve_primary(&library, &name) else {
                    return Err(EvalError::new(
                        EvalErrorKind::Unresolved,
                        format!("No primary unit '{designator}' within library '{library}'"),
                        suffix_pos,
                    ));
                };
                self.reference(suffix_pos, &unit);
                Ok(NameTarget::Unit(unit))
            }
            NameTarget::Unit(unit) => {
                let mut found: Vec<DeclRef> = unit.children_named(&name).collect();
                let Some(first) = found.first().cloned() else {
                    return Err(EvalError::new(
                        EvalErrorKind::Unresolved,
                        format!(
                            "No declaration of '{designator}' within {}",
                            unit.decl().describe()
                        ),
                        suffix_pos,
                    ));
                };
                if first.kind().is_overloadable() {
                    found.retain(|decl| decl.kind().is_overloadable());
                } else {
                    self.reference(suffix_pos, &first);
                    found.truncate(1);
                }
                self.classify(found, suffix_pos)
            }
            NameTarget::Type(typ) => Err(EvalError::new(
                EvalErrorKind::MismatchedKinds,
                format!("Cannot select '{designator}' from {typ}"),
                suffix_pos,
            )),
            NameTarget::Other(decl) => Err(EvalError::new(
                EvalErrorKind::MismatchedKinds,
                format!(
                    "Cannot select '{designator}' from {}",
                    decl.decl().describe()
                ),
                suffix_pos,
            )),
            target => {
                let value = self.target_value(target, &prefix.pos, None)?;
                self.select_element(&value, designator, suffix_pos, pos)
            }
        }
    }

    fn select_element(
        &mut self,
        prefix: &Evaluated,
        designator: &Designator,
        suffix_pos: &SrcPos,
        pos: &SrcPos,
    ) -> EvalResult<NameTarget> {
        let base = base_type(&prefix.typ);
        match base.as_ref() {
            Type::Record { key, fields } => {
                let name = designator.normalized();
                let Some((_, typ)) = fields.iter().find(|(field, _)| field.as_ref() == name) else {
                    return Err(EvalError::new(
                        EvalErrorKind::Unresolved,
                        format!("No record element '{designator}' in {}", prefix.typ),
                        suffix_pos,
                    ));
                };
                let path = format!("{}.{name}", key.path);
                if let Some(field) = self.decl_by_path(&key.source, &path) {
                    self.reference(suffix_pos, &field);
                }
                Ok(NameTarget::Value(Evaluated::new(typ.clone(), pos)))
            }
            Type::Unknown | Type::Opaque { .. } => {
                Ok(NameTarget::Value(Evaluated::new(Type::unknown(), pos)))
            }
            _ => Err(EvalError::new(
                EvalErrorKind::MismatchedKinds,
                format!("Cannot select '{designator}' from {}", prefix.typ),
                suffix_pos,
            )),
        }
    }

    fn call_or_index(
        &mut self,
        prefix: &Expr,
        args: &[Assoc],
        pos: &SrcPos,
        expected: Option<&TypeRef>,
    ) -> EvalResult<NameTarget> {
        if let ExprKind::Attribute(inner, attr) = &prefix.kind {
            if takes_argument(attr) {
                return self.attribute(inner, attr, args, pos);
            }
        }
        match self.resolve_name(prefix, None)? {
            NameTarget::Overloaded(candidates) => {
                let name_pos = name_pos(prefix);
                let result = self.call(&candidates, args, expected, pos, name_pos)?;
                Ok(NameTarget::Value(result))
            }
            NameTarget::Type(typ) => self.conversion_or_constraint(typ, args, pos),
            target @ (NameTarget::Object(_) | NameTarget::Value(_)) => {
                let value = self.target_value(target, &prefix.pos, None)?;
                Ok(NameTarget::Value(self.index_or_slice(&value, args, pos)?))
            }
            other => Err(EvalError::new(
                EvalErrorKind::MismatchedKinds,
                format!("{} cannot be called or indexed", other.describe()),
                &prefix.pos,
            )),
        }
    }

    fn conversion_or_constraint(
        &mut self,
        typ: TypeRef,
        args: &[Assoc],
        pos: &SrcPos,
    ) -> EvalResult<NameTarget> {
        if !args.is_empty() && args.iter().all(|arg| is_range_expr(&arg.actual)) {
            let ranges = args
                .iter()
                .map(|arg| Ok(self.discrete_range(&arg.actual)?.1))
                .collect::<EvalResult<Vec<_>>>()?;
            return Ok(NameTarget::Type(Arc::new(Type::IndexConstrained {
                key: None,
                base: typ,
                ranges,
            })));
        }
        let [arg] = args else {
            return Err(EvalError::new(
                EvalErrorKind::WrongArgumentCount,
                "A type conversion has exactly one operand",
                pos,
            ));
        };
        let operand = self.evaluate(&arg.actual, None)?;
        if !is_castable(&operand.typ, &typ) {
            return Err(EvalError::new(
                EvalErrorKind::TypeMismatch,
                format!("Cannot convert {} to {typ}", operand.typ),
                pos,
            ));
        }
        let value = match (typ.scalar_kind(), operand.value) {
            (Some(ScalarKind::Real), Some(value)) => value.as_real().map(Value::Real),
            (Some(ScalarKind::Integer), Some(Value::Real(real))) => {
                Some(Value::Integer(real.round() as i64))
            }
            (_, value) => value,
        };
        Ok(NameTarget::Value(Evaluated::with_value(typ, pos, value)))
    }

    fn index_or_slice(
        &mut self,
        prefix: &Evaluated,
        args: &[Assoc],
        pos: &SrcPos,
    ) -> EvalResult<Evaluated> {
        let typ = prefix.typ.clone();
        if !is_array_like(&typ) {
            if typ.is_unknown() {
                return Ok(Evaluated::new(typ, pos));
            }
            return Err(EvalError::new(
                EvalErrorKind::MismatchedKinds,
                format!("{typ} cannot be indexed"),
                pos,
            ));
        }

        if let [arg] = args {
            if is_range_expr(&arg.actual) {
                let (_, range) = self.discrete_range(&arg.actual)?;
                return Ok(Evaluated::new(
                    Arc::new(Type::Slice { base: typ, range }),
                    pos,
                ));
            }
        }

        if args.len() > dimensions(&typ) {
            return Err(EvalError::new(
                EvalErrorKind::WrongArgumentCount,
                format!("Too many indexes for {typ}"),
                pos,
            ));
        }
        let indexes = index_types(&typ);
        let mut positions = Vec::new();
        for (dim, arg) in args.iter().enumerate() {
            let index = self.evaluate(&arg.actual, indexes.get(dim))?;
            positions.push(index.value.and_then(|value| value.as_integer()));
        }

        let value = match (&prefix.value, positions.as_slice()) {
            (Some(value), [Some(index)]) => {
                let range = index_ranges(&typ).and_then(|ranges| ranges.first()?.known());
                range.and_then(|range| {
                    let offset = if range.ascending {
                        index - range.left
                    } else {
                        range.left - index
                    };
                    value
                        .elements()?
                        .get(usize::try_from(offset).ok()?)
                        .cloned()
                })
            }
            _ => None,
        };
        let element = element_type(&typ).unwrap_or_else(Type::unknown);
        Ok(Evaluated::with_value(element, pos, value))
    }

    /// The value denoted by a name
    pub(crate) fn target_value(
        &mut self,
        target: NameTarget,
        pos: &SrcPos,
        expected: Option<&TypeRef>,
    ) -> EvalResult<Evaluated> {
        match target {
            NameTarget::Object(decl) => {
                let typ = self.object_type(&decl);
                let value = self.object_value(&decl);
                Ok(Evaluated::with_value(typ, pos, value))
            }
            NameTarget::Value(evaluated) => Ok(Evaluated {
                pos: pos.clone(),
                ..evaluated
            }),
            NameTarget::Overloaded(candidates) => {
                self.call(&candidates, &[], expected, pos, Some(pos))
            }
            other => Err(EvalError::new(
                EvalErrorKind::MismatchedKinds,
                format!("{} is not a value", other.describe()),
                pos,
            )),
        }
    }

    /// The value of an interpreter variable or a locally static constant
    pub(crate) fn object_value(&mut self, decl: &DeclRef) -> Option<Value> {
        for frame in self.frames.iter().rev() {
            if let Some(value) = frame.get(decl.tree_path()) {
                return Some(value.clone());
            }
        }
        let DeclKind::Object(object) = decl.kind() else {
            return None;
        };
        if object.class != ObjectClass::Constant || object.role != ObjectRole::Local {
            return None;
        }
        let default = object.default.clone()?;
        let in_subprogram = decl
            .analysis
            .arena()
            .ancestors(decl.id)
            .skip(1)
            .any(|ancestor| matches!(ancestor.kind, DeclKind::Subprogram(_)));
        if !in_subprogram {
            if let Some(cached) = self.env.cached_constant(decl) {
                return cached;
            }
        }
        let typ = self.object_type(decl);
        let parent = decl.parent()?;
        let value = self.guarded(decl, None, |ctx| {
            ctx.with_scope(parent, |ctx| {
                ctx.quietly(|ctx| ctx.evaluate(&default, Some(&typ)).ok()?.value)
            })
        });
        if !in_subprogram {
            self.env.cache_constant(decl, value.clone());
        }
        value
    }

    pub fn evaluate(&mut self, expr: &Expr, expected: Option<&TypeRef>) -> EvalResult<Evaluated> {
        let pos = &expr.pos;
        match &expr.kind {
            ExprKind::Literal(literal) => self.literal(literal, pos, expected),
            ExprKind::Unary(op, operand) => self.unary(*op, operand, pos, expected),
            ExprKind::Binary(op, left, right) => self.binary(*op, left, right, pos, expected),
            ExprKind::Name(_)
            | ExprKind::Selected(..)
            | ExprKind::CallOrIndex(..)
            | ExprKind::Attribute(..) => {
                let target = self.resolve_name(expr, expected)?;
                self.target_value(target, pos, expected)
            }
            ExprKind::Range(..) | ExprKind::SubtypeRange(..) => {
                let (typ, _) = self.discrete_range(expr)?;
                Ok(Evaluated::new(typ, pos))
            }
            ExprKind::Aggregate(assocs) => self.aggregate(assocs, pos, expected),
            ExprKind::Qualified(mark, operand) => {
                let typ = self.type_mark(mark)?;
                let inner = self.evaluate(operand, Some(&typ))?;
                if are_compatible(&inner.typ, &typ).is_no() {
                    return Err(EvalError::new(
                        EvalErrorKind::TypeMismatch,
                        format!("{} does not match {typ}", inner.typ),
                        &operand.pos,
                    ));
                }
                Ok(Evaluated::with_value(typ, pos, inner.value))
            }
            ExprKind::Allocator(inner) => {
                if let ExprKind::Qualified(..) = inner.kind {
                    self.evaluate(inner, None)?;
                }
                let typ = match expected.map(dereference) {
                    Some(typ) if is_access(&typ) => typ,
                    _ => Type::unknown(),
                };
                Ok(Evaluated::new(typ, pos))
            }
            ExprKind::Others | ExprKind::Open | ExprKind::Unknown => {
                Ok(Evaluated::new(Type::unknown(), pos))
            }
        }
    }

    /// The position of a character in the enumeration type expected
    fn character_position(expected: Option<&TypeRef>, chr: char) -> Option<(TypeRef, usize)> {
        let expected = expected?;
        let base = base_type(expected);
        let Type::Enumeration { literals, .. } = base.as_ref() else {
            return None;
        };
        let position = literals
            .iter()
            .position(|literal| *literal == EnumLiteral::Character(chr))?;
        Some((expected.clone(), position))
    }

    fn literal(
        &mut self,
        literal: &Literal,
        pos: &SrcPos,
        expected: Option<&TypeRef>,
    ) -> EvalResult<Evaluated> {
        let (typ, value) = match literal {
            Literal::Integer(value) => (Type::universal_integer(), Some(Value::Integer(*value))),
            Literal::Real(value) => (Type::universal_real(), Some(Value::Real(*value))),
            Literal::Character(chr) => match Self::character_position(expected, *chr) {
                Some((typ, position)) => (typ, Some(Value::Enum(position))),
                None => (Arc::new(Type::CharacterLiteral(*chr)), Some(Value::Char(*chr))),
            },
            Literal::String(text) => (
                Arc::new(Type::StringLiteral(text.clone())),
                Some(Value::Str(text.clone())),
            ),
            Literal::BitString(text) => (
                Arc::new(Type::BitStringLiteral(text.clone())),
                Some(Value::Str(text.clone())),
            ),
            Literal::Physical { value, unit } => {
                let found = self.lookup(unit, pos)?;
                let Some(unit_decl) = found.first().cloned() else {
                    return Err(EvalError::unresolved(unit, pos));
                };
                let DeclKind::PhysicalUnit { ty, .. } = unit_decl.kind() else {
                    return Err(EvalError::new(
                        EvalErrorKind::MismatchedKinds,
                        format!("{} is not a physical unit", unit_decl.decl().describe()),
                        pos,
                    ));
                };
                self.reference(pos, &unit_decl);
                let typ = self.type_of_decl(&unit_decl.with_id(*ty));
                let factor = self.unit_factor(&unit_decl);
                let value =
                    factor.map(|factor| Value::Integer((value * factor as f64).round() as i64));
                (typ, value)
            }
            Literal::Null => (Arc::new(Type::Null), Some(Value::Null)),
        };
        Ok(Evaluated::with_value(typ, pos, value))
    }

    /// The number of primary units in a physical unit
    pub(crate) fn unit_factor(&mut self, unit: &DeclRef) -> Option<i64> {
        let DeclKind::PhysicalUnit { factor, .. } = unit.kind() else {
            return None;
        };
        let Some(factor) = factor.clone() else {
            return Some(1);
        };
        let parent = unit.parent()?;
        self.guarded(unit, None, |ctx| {
            ctx.with_scope(parent, |ctx| {
                ctx.quietly(|ctx| ctx.evaluate(&factor, None).ok()?.value?.as_integer())
            })
        })
    }

    fn aggregate(
        &mut self,
        assocs: &[ElementAssoc],
        pos: &SrcPos,
        expected: Option<&TypeRef>,
    ) -> EvalResult<Evaluated> {
        let expected = expected.filter(|typ| !typ.is_unknown() && !typ.is_literal());

        if let Some(expected) = expected {
            if let Type::Record { fields, .. } = base_type(expected).as_ref() {
                for (index, assoc) in assocs.iter().enumerate() {
                    let field = match assoc.choices.first().and_then(Expr::as_designator) {
                        Some(designator) => {
                            let name = designator.normalized();
                            fields.iter().find(|(field, _)| field.as_ref() == name)
                        }
                        None if assoc.choices.is_empty() => fields.get(index),
                        None => None,
                    };
                    let field_type = field.map(|(_, typ)| typ.clone());
                    self.evaluate(&assoc.value, field_type.as_ref())?;
                }
                return Ok(Evaluated::new(expected.clone(), pos));
            }
        }

        let element = expected
            .filter(|typ| dimensions(typ) == 1)
            .and_then(element_type);
        let mut values = Vec::new();
        let mut length: Option<u64> = Some(0);
        let mut has_others = false;
        let mut first_type = None;

        for assoc in assocs {
            for choice in &assoc.choices {
                match &choice.kind {
                    ExprKind::Others => has_others = true,
                    _ if is_range_expr(choice) => {
                        let (_, range) = self.discrete_range(choice)?;
                        length = length
                            .zip(range.known())
                            .map(|(n, range)| n + range.length());
                    }
                    _ => {
                        self.evaluate(choice, None)?;
                        length = length.map(|n| n + 1);
                    }
                }
            }
            if assoc.choices.is_empty() {
                length = length.map(|n| n + 1);
            }
            let value = self.evaluate(&assoc.value, element.as_ref())?;
            first_type.get_or_insert_with(|| value.typ.clone());
            values.push(value.value);
        }

        if let (true, Some(expected)) = (has_others, expected) {
            return Ok(Evaluated::new(expected.clone(), pos));
        }
        let positional = assocs.iter().all(|assoc| assoc.choices.is_empty());
        let value = if positional {
            values
                .into_iter()
                .collect::<Option<Vec<_>>>()
                .map(Value::Array)
        } else {
            None
        };
        let element = element
            .or(first_type)
            .unwrap_or_else(Type::unknown);
        let length = if has_others { None } else { length };
        Ok(Evaluated::with_value(
            Arc::new(Type::Aggregate { element, length }),
            pos,
            value,
        ))
    }

    /// The standard type used for conditions
    pub fn boolean(&mut self) -> TypeRef {
        self.standard_type("boolean")
    }
}
