// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

use crate::analysis::{AnalysisResult, DeclRef, DirtyFlags};
use crate::data::{Source, SymbolTable};
use crate::declaration::DeclKind;
use fnv::FnvHashMap;
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Clone)]
pub struct DocumentEntry {
    pub source: Source,
    /// Normalized library name
    pub library: Arc<str>,
    /// The latest published analysis
    pub analysis: Option<Arc<AnalysisResult>>,
    pub flags: Arc<DirtyFlags>,
    /// `(library, unit)` pairs named by the use clauses of the document
    pub dependencies: Vec<(String, String)>,
}

impl DocumentEntry {
    fn depends_on(&self, library: &str, units: &[String]) -> bool {
        self.dependencies
            .iter()
            .any(|(dep_library, unit)| dep_library == library && units.contains(unit))
    }
}

#[derive(Clone, Default)]
pub struct RegistrySnapshot {
    documents: FnvHashMap<Source, DocumentEntry>,
}

impl RegistrySnapshot {
    pub fn document(&self, source: &Source) -> Option<&DocumentEntry> {
        self.documents.get(source)
    }

    /// Analyzed documents of a library sorted by file name
    pub fn library_documents(&self, library: &str) -> Vec<Arc<AnalysisResult>> {
        let mut documents: Vec<_> = self
            .documents
            .values()
            .filter(|entry| entry.library.as_ref() == library)
            .filter_map(|entry| entry.analysis.clone())
            .collect();
        documents.sort_by(|a, b| a.source.cmp(&b.source));
        documents
    }

    pub fn has_library(&self, library: &str) -> bool {
        self.documents
            .values()
            .any(|entry| entry.library.as_ref() == library)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// The libraries of a project and the documents they consist of.
///
/// Readers take a snapshot, writers replace it. Changes never trigger analysis
/// directly, they only mark affected documents dirty.
pub struct Registry {
    snapshot: RwLock<Arc<RegistrySnapshot>>,
    symbols: Arc<SymbolTable>,
}

impl Registry {
    pub fn new(symbols: Arc<SymbolTable>) -> Registry {
        Registry {
            snapshot: RwLock::new(Arc::new(RegistrySnapshot::default())),
            symbols,
        }
    }

    pub fn symbols(&self) -> &Arc<SymbolTable> {
        &self.symbols
    }

    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.snapshot.read().clone()
    }

    fn modify<T>(&self, f: impl FnOnce(&mut RegistrySnapshot) -> T) -> T {
        let mut guard = self.snapshot.write();
        let mut next = RegistrySnapshot::clone(&guard);
        let result = f(&mut next);
        *guard = Arc::new(next);
        result
    }

    pub fn add(&self, source: Source, library: &str, flags: Arc<DirtyFlags>) {
        let library: Arc<str> = Arc::from(library.to_lowercase());
        log::debug!(
            "Adding {} to library {library}",
            source.file_name().display()
        );
        self.modify(|snapshot| {
            snapshot.documents.insert(
                source.clone(),
                DocumentEntry {
                    source,
                    library,
                    analysis: None,
                    flags,
                    dependencies: Vec::new(),
                },
            );
        });
    }

    /// Publishes a new analysis of a document and marks its dependents dirty
    pub fn update(&self, analysis: Arc<AnalysisResult>) {
        let source = analysis.source.clone();
        let found = self.modify(|snapshot| match snapshot.documents.get_mut(&source) {
            Some(entry) => {
                entry.dependencies = analysis.used_packages.clone();
                entry.analysis = Some(analysis);
                true
            }
            None => false,
        });
        if found {
            self.document_changed(&source);
        } else {
            log::warn!(
                "Ignoring analysis of unregistered document {}",
                source.file_name().display()
            );
        }
    }

    pub fn remove(&self, source: &Source) {
        self.document_changed(source);
        self.modify(|snapshot| snapshot.documents.remove(source));
    }

    /// Marks every document of a library for deep analysis
    pub fn library_changed(&self, library: &str) {
        let snapshot = self.snapshot();
        for entry in snapshot.documents.values() {
            if entry.library.as_ref() == library {
                entry.flags.mark(DirtyFlags::DEEP);
            }
        }
    }

    /// Marks the documents that may see the units of a document for deep analysis
    pub fn document_changed(&self, source: &Source) {
        let snapshot = self.snapshot();
        let Some(changed) = snapshot.documents.get(source) else {
            return;
        };
        let units: Vec<String> = changed
            .analysis
            .iter()
            .flat_map(|analysis| analysis.units().map(|unit| unit.designator.normalized()))
            .collect();
        for entry in snapshot.documents.values() {
            if entry.source == *source {
                continue;
            }
            if entry.library == changed.library || entry.depends_on(&changed.library, &units) {
                entry.flags.mark(DirtyFlags::DEEP);
            }
        }
    }

    /// True when the handle was taken from the latest published analysis of its document
    pub fn is_current(&self, decl: &DeclRef) -> bool {
        self.snapshot()
            .document(decl.source())
            .and_then(|entry| entry.analysis.as_ref())
            .is_some_and(|analysis| Arc::ptr_eq(analysis, &decl.analysis))
    }

    /// The library name used by a document, `work` denotes the library of the document itself
    pub fn library_name(&self, from: &Source, library: &str) -> String {
        if library == "work" {
            if let Some(entry) = self.snapshot().document(from) {
                return entry.library.to_string();
            }
        }
        library.to_owned()
    }

    pub fn has_library(&self, library: &str) -> bool {
        self.snapshot().has_library(library)
    }

    pub fn resolve_primary(&self, library: &str, name: &str) -> Option<DeclRef> {
        self.snapshot()
            .library_documents(library)
            .into_iter()
            .find_map(|analysis| {
                let id = analysis.primary_unit(name)?;
                Some(DeclRef::new(analysis, id))
            })
    }

    pub fn resolve_package(&self, library: &str, package: &str) -> Option<DeclRef> {
        self.resolve_primary(library, package)
            .filter(|decl| matches!(decl.kind(), DeclKind::Package | DeclKind::Context))
    }

    pub fn resolve_body(&self, library: &str, package: &str) -> Option<DeclRef> {
        self.snapshot()
            .library_documents(library)
            .into_iter()
            .find_map(|analysis| {
                let id = analysis.package_body(package)?;
                Some(DeclRef::new(analysis, id))
            })
    }

    /// The other analyzed documents of the library of a document
    pub fn sibling_documents(&self, source: &Source) -> Vec<Arc<AnalysisResult>> {
        let snapshot = self.snapshot();
        let Some(entry) = snapshot.document(source) else {
            return Vec::new();
        };
        snapshot
            .library_documents(&entry.library)
            .into_iter()
            .filter(|analysis| analysis.source != *source)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tests::analyze_into;
    use crate::test_util::Code;

    fn setup() -> (Registry, Arc<DirtyFlags>, Arc<DirtyFlags>, Code, Code) {
        let registry = Registry::new(Arc::new(SymbolTable::new()));
        let pkg = Code::new("package pkg is constant c : integer := 0; end package;");
        let user = Code::new("use work.pkg.all; entity ent is end entity;");
        let pkg_flags = Arc::new(DirtyFlags::new());
        let user_flags = Arc::new(DirtyFlags::new());
        registry.add(pkg.source().clone(), "lib", pkg_flags.clone());
        registry.add(user.source().clone(), "lib", user_flags.clone());
        (registry, pkg_flags, user_flags, pkg, user)
    }

    #[test]
    fn resolves_units_of_library() {
        let (registry, _, _, pkg, user) = setup();
        registry.update(analyze_into(&registry, &pkg, "lib"));
        registry.update(analyze_into(&registry, &user, "lib"));

        let package = registry.resolve_package("lib", "pkg").unwrap();
        assert_eq!(package.tree_path().as_ref(), "pkg");
        assert!(registry.resolve_package("lib", "ent").is_none());
        assert!(registry.resolve_primary("lib", "ent").is_some());
        assert!(registry.resolve_primary("other", "ent").is_none());
        assert_eq!(registry.library_name(user.source(), "work"), "lib");
        assert_eq!(registry.sibling_documents(user.source()).len(), 1);
    }

    #[test]
    fn update_marks_dependents_dirty() {
        let (registry, pkg_flags, user_flags, pkg, user) = setup();
        registry.update(analyze_into(&registry, &user, "lib"));
        pkg_flags.clear();
        user_flags.clear();

        registry.update(analyze_into(&registry, &pkg, "lib"));
        assert!(user_flags.contains(DirtyFlags::DEEP));
        assert!(!user_flags.contains(DirtyFlags::PARSE));
        assert!(!pkg_flags.is_dirty());
    }

    #[test]
    fn stale_handles_are_not_current() {
        let (registry, _, _, pkg, _) = setup();
        registry.update(analyze_into(&registry, &pkg, "lib"));
        let first = registry.resolve_package("lib", "pkg").unwrap();
        assert!(registry.is_current(&first));

        registry.update(analyze_into(&registry, &pkg, "lib"));
        let second = registry.resolve_package("lib", "pkg").unwrap();
        assert!(!registry.is_current(&first));
        assert!(registry.is_current(&second));
        assert_eq!(first, second);
    }

    #[test]
    fn removed_documents_are_not_resolved() {
        let (registry, _, user_flags, pkg, _) = setup();
        registry.update(analyze_into(&registry, &pkg, "lib"));
        user_flags.clear();
        registry.remove(pkg.source());
        assert!(registry.resolve_package("lib", "pkg").is_none());
        assert!(user_flags.contains(DirtyFlags::DEEP));
    }

    #[test]
    fn library_change_marks_its_documents() {
        let (registry, pkg_flags, user_flags, _, _) = setup();
        let other = Code::new("package other is end package;");
        let other_flags = Arc::new(DirtyFlags::new());
        registry.add(other.source().clone(), "other", other_flags.clone());
        for flags in [&pkg_flags, &user_flags, &other_flags] {
            flags.clear();
        }

        registry.library_changed("lib");
        assert!(pkg_flags.contains(DirtyFlags::DEEP));
        assert!(user_flags.contains(DirtyFlags::DEEP));
        assert!(!other_flags.is_dirty());
    }
}
