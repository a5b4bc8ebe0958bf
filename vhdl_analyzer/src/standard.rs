// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

//! The `std` and `ieee` packages shipped with the analyzer

use crate::analysis::{AnalysisResult, DirtyFlags};
use crate::data::*;
use crate::declaration::build_declarations;
use crate::resolve::Registry;
use std::path::Path;
use std::sync::Arc;

pub struct BuiltinFile {
    pub library: &'static str,
    pub file_name: &'static str,
    pub text: &'static str,
}

pub const BUILTIN_FILES: [BuiltinFile; 3] = [
    BuiltinFile {
        library: "std",
        file_name: "vhdl_libraries/std/standard.vhd",
        text: include_str!("../vhdl_libraries/std/standard.vhd"),
    },
    BuiltinFile {
        library: "ieee",
        file_name: "vhdl_libraries/ieee/std_logic_1164.vhd",
        text: include_str!("../vhdl_libraries/ieee/std_logic_1164.vhd"),
    },
    BuiltinFile {
        library: "ieee",
        file_name: "vhdl_libraries/ieee/numeric_std.vhd",
        text: include_str!("../vhdl_libraries/ieee/numeric_std.vhd"),
    },
];

/// Parses and analyzes one document outside of any pipeline
pub fn analyze_source(
    source: &Source,
    library: &str,
    symbols: &SymbolTable,
) -> (Arc<AnalysisResult>, Vec<Diagnostic>) {
    let (version, contents) = source.snapshot();
    let (root, errors) = vhdl_syntax::parse(contents.text());
    let diagnostics = errors
        .iter()
        .map(|error| {
            let range = contents.range_of(error.text_pos..error.text_pos + error.text_len);
            Diagnostic::syntax_error(SrcPos::new(source.clone(), range), error.to_string())
        })
        .collect();
    let table = build_declarations(source, &contents, &root, symbols);
    let analysis = AnalysisResult::new(
        source.clone(),
        version,
        Arc::from(library.to_lowercase()),
        Arc::new(contents),
        table,
    );
    (Arc::new(analysis), diagnostics)
}

/// Registers the builtin packages of every library for which `include` is true.
///
/// The packages are analyzed once and never change, their flags are never
/// looked at.
pub fn add_builtin_libraries(registry: &Registry, include: impl Fn(&str) -> bool) {
    for file in BUILTIN_FILES.iter().filter(|file| include(file.library)) {
        let source = Source::inline(Path::new(file.file_name), file.text);
        registry.add(source.clone(), file.library, Arc::new(DirtyFlags::new()));
        let (analysis, diagnostics) = analyze_source(&source, file.library, registry.symbols());
        for diagnostic in diagnostics.iter().chain(&analysis.table.diagnostics) {
            log::warn!("Builtin {}: {}", file.file_name, diagnostic.show());
        }
        registry.update(analysis);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::deep_analyze;
    use crate::config::AnalysisConfig;
    use crate::expression::Environment;
    use pretty_assertions::assert_eq;

    #[test]
    fn builtin_files_are_free_of_errors() {
        let registry = Arc::new(Registry::new(Arc::new(SymbolTable::new())));
        add_builtin_libraries(&registry, |_| true);
        let env = Environment::new(registry.clone(), AnalysisConfig::default());
        for file in BUILTIN_FILES.iter() {
            let source = Source::inline(Path::new(file.file_name), file.text);
            let (analysis, parse_errors) =
                analyze_source(&source, file.library, registry.symbols());
            assert_eq!(parse_errors, vec![], "{}", file.file_name);
            let deep = deep_analyze(&env, &analysis);
            assert_eq!(deep.diagnostics, vec![], "{}", file.file_name);
        }
    }

    #[test]
    fn builtin_libraries_can_be_left_out() {
        let registry = Registry::new(Arc::new(SymbolTable::new()));
        add_builtin_libraries(&registry, |library| library == "std");
        assert!(registry.resolve_package("std", "standard").is_some());
        assert!(!registry.has_library("ieee"));
    }
}
