// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

use super::checks::Checker;
use super::results::*;
use crate::data::*;
use crate::declaration::*;
use crate::expression::Environment;
use crate::resolve::{external_declarations, twin_of};
use fnv::FnvHashMap;
use parking_lot::Mutex;
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// An independent unit of work of the deep analysis
#[derive(Clone, Copy, Debug)]
enum WorkItem {
    Declaration(DeclId),
    /// The statements of a region
    Region(DeclId),
}

fn needs_checks(kind: &DeclKind) -> bool {
    matches!(
        kind,
        DeclKind::Library(..)
            | DeclKind::Object(..)
            | DeclKind::Type(..)
            | DeclKind::Subtype(..)
            | DeclKind::RecordField(..)
            | DeclKind::PhysicalUnit { .. }
            | DeclKind::Subprogram(..)
            | DeclKind::Alias { .. }
            | DeclKind::Attribute { .. }
    )
}

#[derive(Default)]
struct Collected {
    twins: FnvHashMap<DeclId, DeclRef>,
    references: Vec<Reference>,
    diagnostics: Vec<Diagnostic>,
}

impl Collected {
    fn reference(&mut self, pos: &SrcPos, target: DeclRef) {
        self.references.push(Reference {
            pos: pos.clone(),
            target,
        });
    }
}

/// Runs one piece of work, a panic becomes an internal error at `pos`
fn isolated(pos: &SrcPos, what: &str, work: impl FnOnce() -> Collected) -> Collected {
    match panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(collected) => collected,
        Err(_) => {
            log::error!(
                "Analysis of {what} in {} panicked",
                pos.source.file_name().display()
            );
            let mut collected = Collected::default();
            collected.diagnostics.push(Diagnostic::internal(
                pos,
                format!("Internal error when analyzing {what}"),
            ));
            collected
        }
    }
}

/// Links architectures, package bodies, subprogram bodies and use clauses
/// to the declarations they refer to
fn resolve_links(env: &Environment, analysis: &Arc<AnalysisResult>, collected: &mut Collected) {
    for link in analysis.table.to_resolve.iter() {
        let result = match link {
            ToResolve::Twin(id) | ToResolve::SubprogramBody(id) => {
                let decl = analysis.get(*id);
                isolated(decl.decl_pos(), &decl.describe(), || {
                    resolve_link(env, analysis, link)
                })
            }
            ToResolve::UseClause { scope, index } => {
                let Some(item) = analysis.use_clauses(*scope).get(*index) else {
                    continue;
                };
                isolated(&item.pos, "use clause", || resolve_link(env, analysis, link))
            }
        };
        collected.twins.extend(result.twins);
        collected.references.extend(result.references);
        collected.diagnostics.extend(result.diagnostics);
    }
}

fn resolve_link(env: &Environment, analysis: &Arc<AnalysisResult>, link: &ToResolve) -> Collected {
    let registry = env.registry();
    let mut collected = Collected::default();
    match link {
        ToResolve::Twin(id) => {
            let decl = DeclRef::new(analysis.clone(), *id);
            match (twin_of(registry, &decl), decl.kind()) {
                (Some(twin), DeclKind::Architecture { entity_pos, .. }) => {
                    collected.reference(entity_pos, twin.clone());
                    collected.twins.insert(*id, twin);
                }
                (Some(twin), _) => {
                    if let Some(pos) = &decl.decl().name_span {
                        collected.reference(pos, twin.clone());
                    }
                    collected.twins.insert(*id, twin);
                }
                (None, DeclKind::Architecture { entity, entity_pos }) => {
                    collected.diagnostics.push(Diagnostic::error(
                        entity_pos,
                        format!(
                            "No entity '{entity}' within library '{}'",
                            analysis.library
                        ),
                        ErrorCode::NoPrimaryUnit,
                    ));
                }
                (None, _) => {
                    collected.diagnostics.push(Diagnostic::error(
                        decl.decl().decl_pos(),
                        format!(
                            "No package '{}' within library '{}'",
                            decl.decl().designator,
                            analysis.library
                        ),
                        ErrorCode::NoPrimaryUnit,
                    ));
                }
            }
        }
        ToResolve::SubprogramBody(id) => {
            let body = DeclRef::new(analysis.clone(), *id);
            if let Some(declaration) = subprogram_declaration(env, &body) {
                if let Some(pos) = &body.decl().name_span {
                    collected.reference(pos, declaration);
                }
            }
        }
        ToResolve::UseClause { scope, index } => {
            if let Some(item) = analysis.use_clauses(*scope).get(*index) {
                let from = DeclRef::new(analysis.clone(), *scope);
                let found =
                    external_declarations(registry, &from, item, &mut collected.diagnostics);
                use_clause_references(env, &from, item, found, &mut collected);
            }
        }
    }
    collected
}

fn use_clause_references(
    env: &Environment,
    from: &DeclRef,
    item: &UseItem,
    found: Vec<DeclRef>,
    collected: &mut Collected,
) {
    let registry = env.registry();
    let (Some(library), Some(unit_name)) = (item.library(), item.unit()) else {
        return;
    };
    let library = registry.library_name(from.source(), &library.item);
    if let Some(unit) = registry.resolve_primary(&library, &unit_name.item) {
        collected.reference(&unit_name.pos, unit);
    }
    if let Some(name) = item.item() {
        for decl in found {
            collected.reference(&name.pos, decl);
        }
    }
}

/// The declaration of a subprogram body in the same region or in the
/// package of a package body
fn subprogram_declaration(env: &Environment, body: &DeclRef) -> Option<DeclRef> {
    let signature = &body.kind().as_subprogram()?.signature;
    let name = body.decl().designator.normalized();
    let matching = |decl: &DeclRef| {
        decl.kind()
            .as_subprogram()
            .is_some_and(|other| !other.is_body && &other.signature == signature)
    };
    let parent = body.parent()?;
    if let Some(found) = parent.children_named(&name).find(|decl| matching(decl)) {
        return Some(found);
    }
    if matches!(parent.kind(), DeclKind::PackageBody) {
        let package = twin_of(env.registry(), &parent)?;
        return package.children_named(&name).find(|decl| matching(decl));
    }
    None
}

fn work_items(analysis: &AnalysisResult) -> Vec<WorkItem> {
    let mut items: Vec<WorkItem> = analysis
        .arena()
        .iter()
        .filter(|decl| needs_checks(&decl.kind))
        .map(|decl| WorkItem::Declaration(decl.id))
        .collect();
    let mut regions: Vec<DeclId> = analysis.table.bodies.keys().copied().collect();
    regions.sort_by_key(|id| id.index());
    items.extend(regions.into_iter().map(WorkItem::Region));
    items
}

fn run_item(env: &Environment, analysis: &Arc<AnalysisResult>, item: WorkItem) -> Collected {
    let mut collected = Collected::default();
    let references = match item {
        WorkItem::Declaration(id) => {
            let decl = DeclRef::new(analysis.clone(), id);
            let Some(scope) = decl.parent() else {
                return collected;
            };
            let mut checker = Checker::new(env, scope, &mut collected.diagnostics);
            checker.declaration(&decl);
            checker.finish()
        }
        WorkItem::Region(id) => {
            let region = DeclRef::new(analysis.clone(), id);
            let mut checker = Checker::new(env, region.clone(), &mut collected.diagnostics);
            checker.region(&region, analysis.body(id));
            checker.finish()
        }
    };
    collected.references = references;
    collected
}

/// Resolves every name of a document and checks its declarations and
/// statements.
///
/// Work items run in parallel. A link or work item that panics is reported
/// as an internal error on the declaration it was checking and does not
/// affect the others. The result has version zero until a pipeline
/// publishes it.
pub fn deep_analyze(env: &Environment, analysis: &Arc<AnalysisResult>) -> DeepAnalysisResult {
    let mut collected = Collected {
        diagnostics: analysis.table.diagnostics.clone(),
        ..Collected::default()
    };
    resolve_links(env, analysis, &mut collected);

    let items = work_items(analysis);
    let results = Mutex::new(Vec::with_capacity(items.len()));
    items.par_iter().for_each(|item| {
        let id = match item {
            WorkItem::Declaration(id) | WorkItem::Region(id) => *id,
        };
        let decl = analysis.get(id);
        let result = isolated(decl.decl_pos(), &decl.describe(), || {
            run_item(env, analysis, *item)
        });
        results.lock().push(result);
    });

    for result in results.into_inner() {
        collected.references.extend(result.references);
        collected.diagnostics.extend(result.diagnostics);
    }

    let Collected {
        twins,
        mut references,
        mut diagnostics,
    } = collected;
    references.sort_by(|a, b| {
        a.pos
            .cmp(&b.pos)
            .then_with(|| a.target.tree_path().cmp(b.target.tree_path()))
    });
    references.dedup();
    diagnostics.sort_by(|a, b| a.pos.cmp(&b.pos).then_with(|| a.message.cmp(&b.message)));
    diagnostics.dedup_by(|a, b| a.pos == b.pos && a.message == b.message);

    log::debug!(
        "Deep analysis of {} version {}: {} diagnostics, {} references",
        analysis.source.file_name().display(),
        analysis.source_version,
        diagnostics.len(),
        references.len()
    );

    DeepAnalysisResult {
        source: analysis.source.clone(),
        version: 0,
        source_version: analysis.source_version,
        analysis: analysis.clone(),
        twins,
        references,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::Code;
    use pretty_assertions::assert_eq;

    #[test]
    fn panicking_work_becomes_internal_error() {
        let code = Code::new("constant c : integer := 0;");
        let pos = code.s1("c").pos();
        let collected = isolated(&pos, "constant 'c'", || panic!("broken check"));
        assert_eq!(collected.references, vec![]);
        assert_eq!(collected.diagnostics.len(), 1);
        let diagnostic = &collected.diagnostics[0];
        assert_eq!(diagnostic.category(), Category::Internal);
        assert_eq!(diagnostic.default_severity, Severity::Error);
        assert_eq!(diagnostic.pos, pos);
        assert_eq!(
            diagnostic.message,
            "Internal error when analyzing constant 'c'"
        );
    }

    #[test]
    fn finished_work_is_kept() {
        let code = Code::new("x");
        let collected = isolated(&code.pos(), "x", || {
            let mut collected = Collected::default();
            collected
                .diagnostics
                .push(Diagnostic::hint(code.pos(), "kept", ErrorCode::UnsureCompatibility));
            collected
        });
        assert_eq!(collected.diagnostics.len(), 1);
        assert_eq!(collected.diagnostics[0].message, "kept");
    }
}
