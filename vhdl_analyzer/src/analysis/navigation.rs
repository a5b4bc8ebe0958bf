// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

//! Position based queries on published analysis results

use super::results::*;
use crate::data::*;
use std::sync::Arc;

/// The declaration denoted by the name at the position, or the declaration
/// whose name is at the position
pub fn declaration_at(deep: &DeepAnalysisResult, position: Position) -> Option<DeclRef> {
    let end = deep
        .references
        .partition_point(|reference| reference.pos.start() <= position);
    let reference = deep.references[..end]
        .iter()
        .rev()
        .find(|reference| reference.pos.contains(position));
    if let Some(reference) = reference {
        return Some(reference.target.clone());
    }

    deep.analysis
        .arena()
        .iter()
        .find(|decl| {
            decl.name_span
                .as_ref()
                .is_some_and(|span| span.contains(position))
        })
        .map(|decl| DeclRef::new(deep.analysis.clone(), decl.id))
}

/// The innermost declarative region containing the position, `None` outside
/// of every design unit
pub fn enclosing_declaration(
    analysis: &Arc<AnalysisResult>,
    position: Position,
) -> Option<DeclRef> {
    let offset = analysis.contents.offset_at(position);
    let id = analysis.scope_at(offset);
    if id == analysis.root() {
        None
    } else {
        Some(DeclRef::new(analysis.clone(), id))
    }
}

/// The name of the declaration followed by every reference to it in the document
pub fn find_all_references(deep: &DeepAnalysisResult, decl: &DeclRef) -> Vec<SrcPos> {
    let mut found = Vec::new();
    if decl.source() == &deep.source {
        if let Some(pos) = &decl.decl().name_span {
            found.push(pos.clone());
        }
    }
    found.extend(
        deep.references
            .iter()
            .filter(|reference| &reference.target == decl)
            .map(|reference| reference.pos.clone()),
    );
    found.sort();
    found.dedup();
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tests::LibraryBuilder;
    use crate::declaration::DeclKind;
    use pretty_assertions::assert_eq;

    const DESIGN: &str = "\
library ieee;
use ieee.std_logic_1164.all;

entity ent is
  port (a : in std_logic; b : out std_logic);
end entity;

architecture rtl of ent is
  signal s : std_logic;
begin
  s <= a;

  process (s)
  begin
    b <= not s;
  end process;
end architecture;
";

    #[test]
    fn declaration_of_a_reference() {
        let mut builder = LibraryBuilder::new();
        let code = builder.in_file("ent.vhd", DESIGN);
        assert_eq!(builder.analyze(), vec![]);
        let deep = builder.deep(&code);

        let decl = declaration_at(&deep, code.s1("s <= a").start()).unwrap();
        assert_eq!(decl.decl().name_span, Some(code.sa("signal ", "s").pos()));

        let port = declaration_at(&deep, code.sa("<= ", "a").start()).unwrap();
        assert_eq!(port.decl().name_span, Some(code.sa("port (", "a").pos()));

        let logic = declaration_at(&deep, code.sa("s : ", "std_logic").start()).unwrap();
        assert_eq!(logic.decl().designator.normalized(), "std_logic");
        assert!(logic.source() != code.source());
    }

    #[test]
    fn declaration_of_its_own_name() {
        let mut builder = LibraryBuilder::new();
        let code = builder.in_file("ent.vhd", DESIGN);
        builder.analyze();
        let deep = builder.deep(&code);
        let decl = declaration_at(&deep, code.sa("signal ", "s").start()).unwrap();
        assert_eq!(decl.decl().name_span, Some(code.sa("signal ", "s").pos()));
        assert_eq!(declaration_at(&deep, Position::new(2, 0)), None);
    }

    #[test]
    fn enclosing_declarations() {
        let mut builder = LibraryBuilder::new();
        let code = builder.in_file("ent.vhd", DESIGN);
        builder.analyze();
        let analysis = builder.analysis(&code);

        let process = enclosing_declaration(&analysis, code.s1("not s").start()).unwrap();
        assert!(matches!(process.kind(), DeclKind::Process(..)));

        let architecture = enclosing_declaration(&analysis, code.s1("s <= a").start()).unwrap();
        assert_eq!(architecture.decl().designator.normalized(), "rtl");

        let entity = enclosing_declaration(&analysis, code.s1("port").start()).unwrap();
        assert!(matches!(entity.kind(), DeclKind::Entity));

        assert_eq!(
            enclosing_declaration(&analysis, code.s1("library").start()),
            None
        );
    }

    #[test]
    fn all_references_of_a_signal() {
        let mut builder = LibraryBuilder::new();
        let code = builder.in_file("ent.vhd", DESIGN);
        builder.analyze();
        let deep = builder.deep(&code);
        let decl = declaration_at(&deep, code.sa("signal ", "s").start()).unwrap();
        assert_eq!(
            find_all_references(&deep, &decl),
            vec![
                code.sa("signal ", "s").pos(),
                code.sb("s", " <= a").pos(),
                code.sa("process (", "s").pos(),
                code.sa("not ", "s").pos(),
            ]
        );
    }
}
