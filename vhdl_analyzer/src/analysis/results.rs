// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

//! The immutable results published by each stage of the pipeline

use crate::data::*;
use crate::declaration::*;
use crate::statement::Stmt;
use fnv::FnvHashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use vhdl_syntax::SyntaxNode;

/// Every result carries two versions. `version` counts the results published
/// by the pipeline of the document and increases with each of them.
/// `source_version` is the version of the text the result was computed from.
pub struct ParseResult {
    pub source: Source,
    pub version: u64,
    pub source_version: u64,
    pub contents: Arc<Contents>,
    pub root: SyntaxNode,
    pub diagnostics: Vec<Diagnostic>,
}

impl fmt::Debug for ParseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseResult")
            .field("source", &self.source.file_name())
            .field("version", &self.version)
            .field("source_version", &self.source_version)
            .field("diagnostics", &self.diagnostics.len())
            .finish()
    }
}

pub struct AnalysisResult {
    pub source: Source,
    pub version: u64,
    pub source_version: u64,
    /// The normalized name of the library of the document
    pub library: Arc<str>,
    pub contents: Arc<Contents>,
    pub table: DeclarationTable,
    /// Declarations opening a region, sorted by start position
    pub scopes: Vec<DeclId>,
    /// `(library, package)` pairs this document depends on, `std.standard` included
    pub used_packages: Vec<(String, String)>,
}

impl AnalysisResult {
    /// A result outside of any pipeline, its `version` is zero
    pub fn new(
        source: Source,
        source_version: u64,
        library: Arc<str>,
        contents: Arc<Contents>,
        table: DeclarationTable,
    ) -> AnalysisResult {
        let mut scopes: Vec<DeclId> = table
            .arena
            .iter()
            .filter(|decl| decl.kind.is_scope())
            .map(|decl| decl.id)
            .collect();
        scopes.sort_by_key(|id| {
            let span = &table.arena.get(*id).byte_span;
            (span.start, std::cmp::Reverse(span.end))
        });

        let mut used_packages = table.used_packages();
        for (used_library, _) in used_packages.iter_mut() {
            if used_library == "work" {
                *used_library = library.to_string();
            }
        }
        used_packages.push(("std".to_owned(), "standard".to_owned()));
        used_packages.sort();
        used_packages.dedup();

        AnalysisResult {
            source,
            version: 0,
            source_version,
            library,
            contents,
            table,
            scopes,
            used_packages,
        }
    }

    pub fn arena(&self) -> &DeclArena {
        &self.table.arena
    }

    pub fn get(&self, id: DeclId) -> &Declaration {
        self.table.arena.get(id)
    }

    pub fn root(&self) -> DeclId {
        self.table.arena.root()
    }

    pub fn lookup_path(&self, path: &str) -> Option<DeclId> {
        self.table.by_path.get(path).copied()
    }

    pub fn children_named(&self, scope: DeclId, name: &str) -> &[DeclId] {
        self.table
            .children_by_name
            .get(&(scope, name.to_owned()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn use_clauses(&self, scope: DeclId) -> &[UseItem] {
        self.table
            .use_clauses
            .get(&scope)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn body(&self, id: DeclId) -> &[Stmt] {
        self.table
            .bodies
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Design units declared directly in the file
    pub fn units(&self) -> impl Iterator<Item = &Declaration> + '_ {
        self.get(self.root())
            .children
            .iter()
            .map(|id| self.get(*id))
            .filter(|decl| !matches!(decl.kind, DeclKind::Library(..)))
    }

    pub fn primary_unit(&self, name: &str) -> Option<DeclId> {
        self.children_named(self.root(), name)
            .iter()
            .copied()
            .find(|id| self.get(*id).kind.is_primary_unit())
    }

    pub fn package_body(&self, name: &str) -> Option<DeclId> {
        self.children_named(self.root(), name)
            .iter()
            .copied()
            .find(|id| matches!(self.get(*id).kind, DeclKind::PackageBody))
    }

    /// The innermost region containing the byte offset
    pub fn scope_at(&self, offset: usize) -> DeclId {
        self.scopes
            .iter()
            .rev()
            .copied()
            .find(|id| self.get(*id).byte_span.contains(&offset))
            .unwrap_or_else(|| self.root())
    }
}

impl fmt::Debug for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisResult")
            .field("source", &self.source.file_name())
            .field("version", &self.version)
            .field("source_version", &self.source_version)
            .field("library", &self.library)
            .finish()
    }
}

/// A handle to a declaration of a published analysis result.
///
/// Two handles are equal when they denote the same tree path of the same
/// document, regardless of the version they were taken from.
#[derive(Clone)]
pub struct DeclRef {
    pub analysis: Arc<AnalysisResult>,
    pub id: DeclId,
}

impl DeclRef {
    pub fn new(analysis: Arc<AnalysisResult>, id: DeclId) -> DeclRef {
        DeclRef { analysis, id }
    }

    pub fn root(analysis: &Arc<AnalysisResult>) -> DeclRef {
        DeclRef::new(analysis.clone(), analysis.root())
    }

    pub fn decl(&self) -> &Declaration {
        self.analysis.get(self.id)
    }

    pub fn kind(&self) -> &DeclKind {
        &self.decl().kind
    }

    pub fn source(&self) -> &Source {
        &self.analysis.source
    }

    pub fn tree_path(&self) -> &Arc<str> {
        &self.decl().tree_path
    }

    pub fn with_id(&self, id: DeclId) -> DeclRef {
        DeclRef::new(self.analysis.clone(), id)
    }

    pub fn parent(&self) -> Option<DeclRef> {
        self.decl().parent.map(|id| self.with_id(id))
    }

    pub fn children_named(&self, name: &str) -> impl Iterator<Item = DeclRef> + '_ {
        self.analysis
            .children_named(self.id, name)
            .iter()
            .map(|id| self.with_id(*id))
    }

    /// The design unit this declaration belongs to
    pub fn design_unit(&self) -> Option<DeclRef> {
        self.analysis
            .arena()
            .design_unit(self.id)
            .map(|decl| self.with_id(decl.id))
    }

    pub fn key(&self) -> (Source, Arc<str>) {
        (self.source().clone(), self.tree_path().clone())
    }
}

impl PartialEq for DeclRef {
    fn eq(&self, other: &Self) -> bool {
        self.source() == other.source() && self.tree_path() == other.tree_path()
    }
}

impl Eq for DeclRef {}

impl Hash for DeclRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source().hash(state);
        self.tree_path().hash(state);
    }
}

impl fmt::Debug for DeclRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DeclRef({}:{})",
            self.source().file_name().display(),
            self.tree_path()
        )
    }
}

/// A name in the source bound to the declaration it denotes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reference {
    pub pos: SrcPos,
    pub target: DeclRef,
}

pub struct DeepAnalysisResult {
    pub source: Source,
    pub version: u64,
    pub source_version: u64,
    pub analysis: Arc<AnalysisResult>,
    /// Entity of each architecture and package of each package body
    pub twins: FnvHashMap<DeclId, DeclRef>,
    /// Sorted by position
    pub references: Vec<Reference>,
    pub diagnostics: Vec<Diagnostic>,
}

impl DeepAnalysisResult {
    /// The innermost reference at the position
    pub fn reference_at(&self, pos: Position) -> Option<&Reference> {
        self.references
            .iter()
            .filter(|reference| reference.pos.contains(pos))
            .max_by_key(|reference| reference.pos.start())
    }
}

impl fmt::Debug for DeepAnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeepAnalysisResult")
            .field("source", &self.source.file_name())
            .field("version", &self.version)
            .field("source_version", &self.source_version)
            .field("diagnostics", &self.diagnostics.len())
            .finish()
    }
}
