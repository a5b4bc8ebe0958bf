// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

//! Visibility of names from a declarative region

use super::Registry;
use crate::analysis::DeclRef;
use crate::data::*;
use crate::declaration::{DeclKind, UseItem};
use fnv::FnvHashSet;
use std::collections::VecDeque;
use std::sync::Arc;

enum Step {
    /// The region itself, its twin, its use clauses and then its parent
    Region(DeclRef),
    /// An entity seen from its architecture or a package seen from its body
    Twin(DeclRef),
    Uses(DeclRef),
    /// Primary units of the other documents of the library
    Siblings(Source),
    Standard,
}

/// Declarations named `name` visible from a region, innermost first.
///
/// The sequence is lazy, callers that only need the innermost declaration
/// never look at outer regions or other documents.
pub struct FindName<'a> {
    registry: &'a Registry,
    name: String,
    steps: VecDeque<Step>,
    found: VecDeque<DeclRef>,
    visited: FnvHashSet<(Source, Arc<str>)>,
    yielded: FnvHashSet<(Source, Arc<str>)>,
}

pub fn find_name<'a>(registry: &'a Registry, scope: &DeclRef, name: &str) -> FindName<'a> {
    FindName {
        registry,
        name: name.to_owned(),
        steps: VecDeque::from([Step::Region(scope.clone()), Step::Standard]),
        found: VecDeque::new(),
        visited: FnvHashSet::default(),
        yielded: FnvHashSet::default(),
    }
}

/// The entity of an architecture or the package of a package body
pub fn twin_of(registry: &Registry, decl: &DeclRef) -> Option<DeclRef> {
    let library = decl.analysis.library.as_ref();
    match decl.kind() {
        DeclKind::Architecture { entity, .. } => registry
            .resolve_primary(library, &entity.normalized())
            .filter(|twin| matches!(twin.kind(), DeclKind::Entity)),
        DeclKind::PackageBody => {
            registry.resolve_package(library, &decl.decl().designator.normalized())
        }
        _ => None,
    }
}

/// The declarations made visible by a use clause.
///
/// `use lib.pkg.all` gives the children of the package, `use lib.pkg.x` the
/// declarations named `x` and `use lib.pkg` the package itself.
pub fn external_declarations(
    registry: &Registry,
    from: &DeclRef,
    item: &UseItem,
    diagnostics: &mut dyn DiagnosticHandler,
) -> Vec<DeclRef> {
    let Some(library) = item.library() else {
        return Vec::new();
    };
    let library_name = registry.library_name(from.source(), &library.item);
    if !registry.has_library(&library_name) {
        diagnostics.error(
            &library.pos,
            format!("No such library '{}'", library.item),
            ErrorCode::NoSuchLibrary,
        );
        return Vec::new();
    }
    let Some(unit_name) = item.unit() else {
        return Vec::new();
    };
    let Some(unit) = registry.resolve_primary(&library_name, &unit_name.item) else {
        diagnostics.error(
            &unit_name.pos,
            format!(
                "No primary unit '{}' within library '{}'",
                unit_name.item, library.item
            ),
            ErrorCode::NoPrimaryUnit,
        );
        return Vec::new();
    };
    match (item.item(), item.all) {
        (Some(name), _) => {
            let found: Vec<DeclRef> = unit.children_named(&name.item).collect();
            if found.is_empty() {
                diagnostics.push(Diagnostic::not_declared(&name.pos, &name.item));
            }
            found
        }
        (None, true) => unit
            .decl()
            .children
            .iter()
            .map(|id| unit.with_id(*id))
            .collect(),
        (None, false) => vec![unit],
    }
}

impl FindName<'_> {
    fn push(&mut self, decl: DeclRef) {
        if self.yielded.insert(decl.key()) {
            self.found.push_back(decl);
        }
    }

    fn push_children(&mut self, region: &DeclRef) {
        let found: Vec<DeclRef> = region.children_named(&self.name).collect();
        for decl in found {
            self.push(decl);
        }
    }

    /// Problems of the clause are reported by the deep analysis of its region
    fn imported(&self, region: &DeclRef, item: &UseItem) -> Vec<DeclRef> {
        external_declarations(self.registry, region, item, &mut NullDiagnostics)
    }

    fn uses(&mut self, region: &DeclRef) -> Vec<Step> {
        let mut steps = Vec::new();
        for item in region.analysis.use_clauses(region.id) {
            if item.is_context {
                // The clauses of a context apply as if written in place
                steps.extend(self.imported(region, item).into_iter().map(Step::Twin));
                continue;
            }
            match (item.item(), item.all) {
                (Some(selected), _) if selected.item == self.name => {
                    for decl in self.imported(region, item) {
                        self.push(decl);
                    }
                }
                (None, true) => {
                    let (Some(library), Some(unit)) = (item.library(), item.unit()) else {
                        continue;
                    };
                    let library = self.registry.library_name(region.source(), &library.item);
                    if let Some(unit) = self.registry.resolve_primary(&library, &unit.item) {
                        self.push_children(&unit);
                    }
                }
                (None, false) => {
                    for unit in self.imported(region, item) {
                        if unit.decl().designator.normalized() == self.name {
                            self.push(unit);
                        }
                    }
                }
                _ => {}
            }
        }
        steps
    }

    fn step(&mut self, step: Step) {
        match step {
            Step::Region(region) => {
                if !self.visited.insert(region.key()) {
                    return;
                }
                self.push_children(&region);
                let mut next = Vec::new();
                if let Some(twin) = twin_of(self.registry, &region) {
                    next.push(Step::Twin(twin));
                }
                next.push(Step::Uses(region.clone()));
                match region.parent() {
                    Some(parent) => next.push(Step::Region(parent)),
                    None => next.push(Step::Siblings(region.source().clone())),
                }
                for step in next.into_iter().rev() {
                    self.steps.push_front(step);
                }
            }
            Step::Twin(twin) => {
                if !self.visited.insert(twin.key()) {
                    return;
                }
                self.push_children(&twin);
                self.steps.push_front(Step::Uses(twin));
            }
            Step::Uses(region) => {
                for step in self.uses(&region).into_iter().rev() {
                    self.steps.push_front(step);
                }
            }
            Step::Siblings(source) => {
                for analysis in self.registry.sibling_documents(&source) {
                    if let Some(id) = analysis.primary_unit(&self.name) {
                        self.push(DeclRef::new(analysis, id));
                    }
                }
            }
            Step::Standard => {
                if let Some(standard) = self.registry.resolve_package("std", "standard") {
                    if self.visited.insert(standard.key()) {
                        self.push_children(&standard);
                    }
                }
            }
        }
    }
}

impl Iterator for FindName<'_> {
    type Item = DeclRef;

    fn next(&mut self) -> Option<DeclRef> {
        loop {
            if let Some(decl) = self.found.pop_front() {
                return Some(decl);
            }
            let step = self.steps.pop_front()?;
            self.step(step);
        }
    }
}
