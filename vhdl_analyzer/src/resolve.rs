// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

mod registry;
mod scope;

pub use registry::{DocumentEntry, Registry, RegistrySnapshot};
pub use scope::{external_declarations, find_name, twin_of, FindName};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tests::LibraryBuilder;
    use crate::analysis::DeclRef;
    use pretty_assertions::assert_eq;

    fn paths(found: impl Iterator<Item = DeclRef>) -> Vec<String> {
        found
            .map(|decl| {
                format!(
                    "{}:{}",
                    decl.source().file_name().display(),
                    decl.tree_path()
                )
            })
            .collect()
    }

    fn scope_of(builder: &LibraryBuilder, code: &crate::test_util::Code, path: &str) -> DeclRef {
        let analysis = builder.analysis(code);
        let id = analysis.lookup_path(path).unwrap();
        DeclRef::new(analysis, id)
    }

    #[test]
    fn inner_declarations_shadow_outer() {
        let mut builder = LibraryBuilder::new();
        builder.in_file(
            "pkg.vhd",
            "package pkg is constant c : integer := 0; end package;",
        );
        let code = builder.in_file(
            "ent.vhd",
            "\
use work.pkg.all;
entity ent is end entity;
architecture a of ent is
  constant c : boolean := true;
begin
  main: process
    constant c : bit := '0';
  begin
    wait;
  end process;
end architecture;
",
        );
        builder.analyze();

        let process = scope_of(&builder, &code, "a.main");
        assert_eq!(
            paths(find_name(builder.registry(), &process, "c")),
            vec!["ent.vhd:a.main.c", "ent.vhd:a.c", "pkg.vhd:pkg.c"]
        );
        let arch = scope_of(&builder, &code, "a");
        assert_eq!(
            find_name(builder.registry(), &arch, "c")
                .next()
                .unwrap()
                .tree_path()
                .as_ref(),
            "a.c"
        );
    }

    #[test]
    fn entity_is_visible_from_architecture() {
        let mut builder = LibraryBuilder::new();
        builder.in_file(
            "ent.vhd",
            "\
entity ent is
  generic (width : natural := 4);
end entity;
",
        );
        let arch = builder.in_file(
            "arch.vhd",
            "\
architecture a of ent is
begin
end architecture;
",
        );
        builder.analyze();
        let scope = scope_of(&builder, &arch, "a");
        assert_eq!(
            paths(find_name(builder.registry(), &scope, "width")),
            vec!["ent.vhd:ent.width"]
        );
        assert_eq!(
            paths(find_name(builder.registry(), &scope, "ent")),
            vec!["ent.vhd:ent"]
        );
    }

    #[test]
    fn standard_is_searched_last() {
        let mut builder = LibraryBuilder::new();
        let code = builder.in_file(
            "pkg.vhd",
            "package pkg is subtype natural is integer range 0 to 7; end package;",
        );
        builder.analyze();
        let scope = scope_of(&builder, &code, "pkg");
        let found: Vec<String> = find_name(builder.registry(), &scope, "natural")
            .map(|decl| decl.tree_path().to_string())
            .collect();
        assert_eq!(found, vec!["pkg.natural", "standard.natural"]);
        assert_eq!(find_name(builder.registry(), &scope, "missing").count(), 0);
    }

    #[test]
    fn use_of_a_single_item() {
        let mut builder = LibraryBuilder::new();
        builder.in_file(
            "pkg.vhd",
            "package pkg is constant a : integer := 0; constant b : integer := 1; end package;",
        );
        let code = builder.in_file(
            "user.vhd",
            "use work.pkg.a; entity ent is end entity;",
        );
        builder.analyze();
        let scope = scope_of(&builder, &code, "ent");
        assert_eq!(find_name(builder.registry(), &scope, "a").count(), 1);
        assert_eq!(find_name(builder.registry(), &scope, "b").count(), 0);
    }
}
