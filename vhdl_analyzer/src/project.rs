// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

use crate::analysis::{
    declaration_at, enclosing_declaration, find_all_references, DeclRef, DocumentPipeline,
    RunOutcome,
};
use crate::config::{AnalysisConfig, Config};
use crate::data::*;
use crate::resolve::Registry;
use crate::standard::add_builtin_libraries;
use fnv::FnvHashMap;
use rayon::prelude::*;
use std::collections::hash_map::Entry;
use std::path::Path;
use std::sync::Arc;

/// The documents of every configured library sharing one registry
pub struct Project {
    registry: Arc<Registry>,
    config: AnalysisConfig,
    pipelines: Vec<DocumentPipeline>,
}

impl Project {
    /// An empty project that only knows the builtin libraries
    pub fn new(config: AnalysisConfig) -> Project {
        let registry = Arc::new(Registry::new(Arc::new(SymbolTable::new())));
        add_builtin_libraries(&registry, |_| true);
        Project {
            registry,
            config,
            pipelines: Vec::new(),
        }
    }

    /// Create instance from given configuration.
    /// Files referred by configuration are read into corresponding libraries.
    /// A builtin library is left out when the configuration defines a library
    /// with the same name.
    pub fn from_config(config: &Config, messages: &mut dyn MessageHandler) -> Project {
        let registry = Arc::new(Registry::new(Arc::new(SymbolTable::new())));
        add_builtin_libraries(&registry, |library| config.get_library(library).is_none());
        let mut project = Project {
            registry,
            config: config.analysis(),
            pipelines: Vec::new(),
        };

        let mut files: FnvHashMap<PathBuf, String> = FnvHashMap::default();
        let mut ordered = Vec::new();
        for library in config.iter_libraries() {
            for file_name in library.file_names(messages) {
                match files.entry(file_name.clone()) {
                    Entry::Occupied(entry) => messages.push(Message::file_error(
                        format!(
                            "File is already part of library '{}', ignoring it in library '{}'",
                            entry.get(),
                            library.name()
                        ),
                        &file_name,
                    )),
                    Entry::Vacant(entry) => {
                        entry.insert(library.name().to_owned());
                        ordered.push((file_name, library.name().to_owned()));
                    }
                }
            }
        }

        let read: Vec<_> = ordered
            .into_par_iter()
            .map(|(file_name, library)| {
                let result = Source::from_latin1_file(&file_name);
                (file_name, library, result)
            })
            .collect();
        for (file_name, library, result) in read {
            match result {
                Ok(source) => project.add_source(source, &library),
                Err(err) => messages.push(Message::file_error(err, &file_name)),
            }
        }
        project
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Adds a document to a library, replacing an earlier document of the same file
    pub fn add_source(&mut self, source: Source, library: &str) {
        self.remove_source(source.file_name());
        self.pipelines.push(DocumentPipeline::new(
            source,
            library,
            self.registry.clone(),
            self.config.clone(),
        ));
    }

    pub fn remove_source(&mut self, file_name: &Path) {
        self.pipelines
            .retain(|pipeline| pipeline.source().file_name() != file_name);
    }

    pub fn get_source(&self, file_name: &Path) -> Option<Source> {
        self.pipeline(file_name)
            .map(|pipeline| pipeline.source().clone())
    }

    pub fn pipeline(&self, file_name: &Path) -> Option<&DocumentPipeline> {
        self.pipelines
            .iter()
            .find(|pipeline| pipeline.source().file_name() == file_name)
    }

    pub fn pipelines(&self) -> impl Iterator<Item = &DocumentPipeline> {
        self.pipelines.iter()
    }

    /// Runs the pipelines of all documents until none of them has work left
    /// and returns the diagnostics of every document
    pub fn analyse(&self) -> Vec<Diagnostic> {
        let mut rounds = 0;
        loop {
            let progress = self
                .pipelines
                .par_iter()
                .map(|pipeline| pipeline.run_once() == RunOutcome::Completed)
                .reduce(|| false, |a, b| a || b);
            if !progress {
                break;
            }
            rounds += 1;
        }
        log::debug!(
            "Analysed {} documents in {rounds} rounds",
            self.pipelines.len()
        );

        let mut diagnostics: Vec<Diagnostic> = self
            .pipelines
            .iter()
            .flat_map(|pipeline| pipeline.diagnostics())
            .collect();
        diagnostics.sort_by(|a, b| a.pos.cmp(&b.pos).then_with(|| a.message.cmp(&b.message)));
        diagnostics
    }

    /// The declaration referenced or declared at the cursor
    pub fn find_declaration(&self, source: &Source, cursor: Position) -> Option<DeclRef> {
        let deep = self.pipeline(source.file_name())?.deep_analysis()?;
        declaration_at(&deep, cursor)
    }

    pub fn enclosing_declaration(&self, source: &Source, cursor: Position) -> Option<DeclRef> {
        let analysis = self.pipeline(source.file_name())?.analysis()?;
        enclosing_declaration(&analysis, cursor)
    }

    /// Search for all references to the declaration in every document
    pub fn find_all_references(&self, decl: &DeclRef) -> Vec<SrcPos> {
        let mut found: Vec<SrcPos> = self
            .pipelines
            .iter()
            .filter_map(DocumentPipeline::deep_analysis)
            .flat_map(|deep| find_all_references(&deep, decl))
            .collect();
        found.sort();
        found.dedup();
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn write(parent: &Path, file_name: &str, contents: &str) -> PathBuf {
        let path = parent.join(file_name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn quiet() -> AnalysisConfig {
        AnalysisConfig {
            debounce: std::time::Duration::ZERO,
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn analyses_documents_of_configured_libraries() {
        let tempdir = tempfile::tempdir().unwrap();
        let root = tempdir.path();
        write(
            root,
            "pkg.vhd",
            "\
package pkg is
  constant width : natural := 8;
end package;
",
        );
        write(
            root,
            "ent.vhd",
            "\
library ieee;
use ieee.std_logic_1164.all;
use work.pkg.all;

entity ent is
  port (d : in std_logic_vector(width - 1 downto 0));
end entity;
",
        );
        let config = Config::from_str("[libraries]\nlib.files = ['*.vhd']\n", root).unwrap();
        let mut messages = Vec::new();
        let project = Project::from_config(&config, &mut messages);
        assert_eq!(messages, vec![]);
        assert_eq!(project.pipelines().count(), 2);
        assert_eq!(project.analyse(), vec![]);
    }

    #[test]
    fn diagnostics_follow_dependencies() {
        let mut project = Project::new(quiet());
        let pkg = Source::inline(
            Path::new("pkg.vhd"),
            "package pkg is constant c : integer := 0; end package;",
        );
        let user = Source::inline(
            Path::new("user.vhd"),
            "use work.pkg.all;\npackage user is constant d : integer := c; end package;",
        );
        project.add_source(user.clone(), "lib");
        assert!(!project.analyse().is_empty());

        project.add_source(pkg, "lib");
        assert_eq!(project.analyse(), vec![]);

        let decl = project
            .find_declaration(&user, Position::new(1, 40))
            .unwrap();
        assert_eq!(decl.decl().designator.normalized(), "c");
        assert_eq!(project.find_all_references(&decl).len(), 2);

        let package = project
            .enclosing_declaration(&user, Position::new(1, 40))
            .unwrap();
        assert_eq!(package.decl().designator.normalized(), "user");
        assert_eq!(project.get_source(Path::new("user.vhd")), Some(user));
    }

    #[test]
    fn configured_library_replaces_builtin_one() {
        let tempdir = tempfile::tempdir().unwrap();
        let root = tempdir.path();
        write(root, "mine.vhd", "package mine is end package;");
        let config = Config::from_str("[libraries]\nieee.files = ['mine.vhd']\n", root).unwrap();
        let project = Project::from_config(&config, &mut Vec::new());
        assert_eq!(project.analyse(), vec![]);
        assert!(project.registry().resolve_package("ieee", "mine").is_some());
        assert!(project
            .registry()
            .resolve_package("ieee", "std_logic_1164")
            .is_none());
        assert!(project.registry().resolve_package("std", "standard").is_some());
    }

    #[test]
    fn file_in_two_libraries_is_reported() {
        let tempdir = tempfile::tempdir().unwrap();
        let root = tempdir.path();
        write(root, "pkg.vhd", "package pkg is end package;");
        let config = Config::from_str(
            "[libraries]\na.files = ['pkg.vhd']\nb.files = ['pkg.vhd']\n",
            root,
        )
        .unwrap();
        let mut messages = Vec::new();
        let project = Project::from_config(&config, &mut messages);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message_type, MessageType::Error);
        assert_eq!(project.pipelines().count(), 1);
    }
}
