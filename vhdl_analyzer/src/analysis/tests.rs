// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2019, Olof Kraigher olof.kraigher@gmail.com

use super::*;
use crate::config::{AnalysisConfig, UnsurePolicy};
use crate::data::*;
use crate::declaration::DeclKind;
use crate::resolve::Registry;
use crate::standard::{add_builtin_libraries, analyze_source};
use crate::test_util::Code;
use pretty_assertions::assert_eq;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Analysis settings without debouncing
pub fn quiet_config() -> AnalysisConfig {
    AnalysisConfig {
        debounce: Duration::ZERO,
        ..AnalysisConfig::default()
    }
}

/// A registry with the builtin `std` and `ieee` libraries
pub fn standard_registry() -> Arc<Registry> {
    let registry = Arc::new(Registry::new(Arc::new(SymbolTable::new())));
    add_builtin_libraries(&registry, |_| true);
    registry
}

/// Analyzes code without publishing the result
pub fn analyze_into(registry: &Registry, code: &Code, library: &str) -> Arc<AnalysisResult> {
    analyze_source(code.source(), library, registry.symbols()).0
}

/// Documents of a project analyzed together
pub struct LibraryBuilder {
    registry: Arc<Registry>,
    config: AnalysisConfig,
    pipelines: Vec<DocumentPipeline>,
}

impl LibraryBuilder {
    pub fn new() -> LibraryBuilder {
        LibraryBuilder::with_config(quiet_config())
    }

    pub fn with_config(config: AnalysisConfig) -> LibraryBuilder {
        LibraryBuilder {
            registry: standard_registry(),
            config,
            pipelines: Vec::new(),
        }
    }

    pub fn in_library(&mut self, library: &str, file_name: &str, code: &str) -> Code {
        let code = Code::with_file_name(Path::new(file_name), code);
        self.pipelines.push(DocumentPipeline::new(
            code.source().clone(),
            library,
            self.registry.clone(),
            self.config.clone(),
        ));
        code
    }

    /// Adds a document to library `lib`
    pub fn in_file(&mut self, file_name: &str, code: &str) -> Code {
        self.in_library("lib", file_name, code)
    }

    /// Wraps declarations and concurrent statements in an architecture
    pub fn in_architecture(&mut self, declarations: &str, statements: &str) -> Code {
        self.in_file(
            "arch.vhd",
            &format!(
                "\
library ieee;
use ieee.std_logic_1164.all;
use ieee.numeric_std.all;

entity ent is
end entity;

architecture rtl of ent is
{declarations}
begin
{statements}
end architecture;
"
            ),
        )
    }

    /// Runs every document until nothing is dirty and returns the diagnostics of all of them
    pub fn analyze(&self) -> Vec<Diagnostic> {
        loop {
            let mut progress = false;
            for pipeline in self.pipelines.iter() {
                if pipeline.run_once() == RunOutcome::Completed {
                    progress = true;
                }
            }
            if !progress {
                break;
            }
        }
        let mut diagnostics: Vec<Diagnostic> = self
            .pipelines
            .iter()
            .flat_map(|pipeline| pipeline.diagnostics())
            .collect();
        diagnostics.sort_by(|a, b| a.pos.cmp(&b.pos));
        diagnostics
    }

    fn pipeline(&self, code: &Code) -> &DocumentPipeline {
        self.pipelines
            .iter()
            .find(|pipeline| pipeline.source() == code.source())
            .unwrap()
    }

    pub fn analysis(&self, code: &Code) -> Arc<AnalysisResult> {
        self.pipeline(code).analysis().unwrap()
    }

    pub fn deep(&self, code: &Code) -> Arc<DeepAnalysisResult> {
        self.pipeline(code).deep_analysis().unwrap()
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }
}

pub fn codes(diagnostics: &[Diagnostic]) -> Vec<ErrorCode> {
    diagnostics
        .iter()
        .map(|diagnostic| diagnostic.code)
        .collect()
}

fn reference_paths(deep: &DeepAnalysisResult) -> Vec<(SrcPos, String)> {
    deep.references
        .iter()
        .map(|reference| (reference.pos.clone(), reference.target.tree_path().to_string()))
        .collect()
}

#[test]
fn logical_operator_on_std_logic() {
    let mut builder = LibraryBuilder::new();
    let code = builder.in_architecture("signal a, b, x : std_logic;", "x <= a and b;");
    assert_eq!(builder.analyze(), vec![]);

    let deep = builder.deep(&code);
    let body = code.s1("x <= a and b");
    for (name, path) in [("x", "rtl.x"), ("a", "rtl.a"), ("b", "rtl.b")] {
        let target = deep.reference_at(body.s1(name).start()).unwrap();
        assert_eq!(target.target.tree_path().as_ref(), path);
    }
}

#[test]
fn same_text_gives_same_results_after_reparse() {
    let mut builder = LibraryBuilder::new();
    let code = builder.in_architecture(
        "signal a, b : std_logic; signal n : natural; signal v : unsigned(3 downto 0);",
        "\
  a <= b and a;
  n <= a;
  v <= v + n;",
    );
    let first = builder.analyze();
    assert_eq!(codes(&first), vec![ErrorCode::TypeMismatch]);
    let first_deep = builder.deep(&code);

    builder.pipeline(&code).edit(None, &code.source().text());
    let second = builder.analyze();
    let second_deep = builder.deep(&code);
    assert!(second_deep.version > first_deep.version);
    assert_eq!(second, first);
    assert_eq!(reference_paths(&second_deep), reference_paths(&first_deep));
}

#[test]
fn unconstrained_signal() {
    let mut builder = LibraryBuilder::new();
    let code = builder.in_architecture("signal s : std_logic_vector;", "");
    let diagnostics = builder.analyze();
    assert_eq!(codes(&diagnostics), vec![ErrorCode::UnconstrainedType]);
    assert_eq!(diagnostics[0].pos, code.s1("s :").s1("s").pos());
}

#[test]
fn constrained_signal() {
    let mut builder = LibraryBuilder::new();
    builder.in_architecture(
        "signal s : std_logic_vector(7 downto 0) := (others => '0');",
        "s <= x\"ff\";",
    );
    assert_eq!(builder.analyze(), vec![]);
}

#[test]
fn unconstrained_constant_and_port_are_allowed() {
    let mut builder = LibraryBuilder::new();
    builder.in_file(
        "ent.vhd",
        "\
entity ent is
  port (v : in bit_vector);
end entity;

architecture rtl of ent is
  constant c : bit_vector := \"0101\";
begin
end architecture;
",
    );
    assert_eq!(builder.analyze(), vec![]);
}

#[test]
fn overloads_differing_in_return_type() {
    let mut builder = LibraryBuilder::new();
    let code = builder.in_file(
        "pkg.vhd",
        "\
package pkg is
  function f return integer;
  function f return boolean;
  constant i : integer := f;
  constant b : boolean := f;
end package;
",
    );
    assert_eq!(builder.analyze(), vec![]);

    let deep = builder.deep(&code);
    let return_type = |pos: Position| {
        let target = deep.reference_at(pos).unwrap().target.clone();
        let subprogram = target.kind().as_subprogram().unwrap();
        subprogram.return_type.as_ref().unwrap().mark_text()
    };
    assert_eq!(return_type(code.sa("integer := ", "f").start()), "integer");
    assert_eq!(return_type(code.sa("boolean := ", "f").start()), "boolean");
}

#[test]
fn type_mismatch_in_default_value() {
    let mut builder = LibraryBuilder::new();
    let code = builder.in_file(
        "pkg.vhd",
        "package pkg is constant c : integer := true; end package;",
    );
    let diagnostics = builder.analyze();
    assert_eq!(codes(&diagnostics), vec![ErrorCode::TypeMismatch]);
    assert_eq!(diagnostics[0].pos, code.s1("true").pos());
}

#[test]
fn unsure_compatibility_is_never_an_error() {
    let declarations = "\
  constant w : natural;
  signal s : bit_vector(w - 1 downto 0);";
    let statements = "s <= \"101\";";

    let mut builder = LibraryBuilder::new();
    builder.in_architecture(declarations, statements);
    assert_eq!(builder.analyze(), vec![]);

    let mut builder = LibraryBuilder::with_config(AnalysisConfig {
        unsure: UnsurePolicy::Hint,
        ..quiet_config()
    });
    builder.in_architecture(declarations, statements);
    let diagnostics = builder.analyze();
    assert_eq!(codes(&diagnostics), vec![ErrorCode::UnsureCompatibility]);
    assert_eq!(diagnostics[0].default_severity, Severity::Hint);
}

const CHILD: &str = "\
entity child is
  port (
    clk : in bit;
    d : in bit := '0';
    q : out bit;
    rst : in bit
  );
end entity;

architecture rtl of child is
begin
  q <= d;
end architecture;
";

fn instantiate(port_map: &str) -> (LibraryBuilder, Code) {
    let mut builder = LibraryBuilder::new();
    builder.in_file("child.vhd", CHILD);
    let code = builder.in_file(
        "top.vhd",
        &format!(
            "\
entity top is
end entity;

architecture rtl of top is
  signal c, r, o : bit;
begin
  inst: entity work.child port map ({port_map});
end architecture;
"
        ),
    );
    (builder, code)
}

#[test]
fn fully_associated_instance() {
    let (builder, code) = instantiate("clk => c, rst => r, q => o");
    assert_eq!(builder.analyze(), vec![]);

    let deep = builder.deep(&code);
    let target = deep
        .reference_at(code.s1("clk").start())
        .unwrap()
        .target
        .clone();
    assert_eq!(target.tree_path().as_ref(), "child.clk");
}

#[test]
fn positional_associations() {
    let (builder, _) = instantiate("c, '1', o, r");
    assert_eq!(builder.analyze(), vec![]);
}

#[test]
fn named_port_that_does_not_exist() {
    let (builder, code) = instantiate("clk => c, rst => r, q => o, nonexistent => o");
    let diagnostics = builder.analyze();
    assert_eq!(codes(&diagnostics), vec![ErrorCode::InvalidFormal]);
    assert_eq!(diagnostics[0].pos, code.s1("nonexistent").pos());
    assert!(diagnostics[0].message.contains("'nonexistent'"));
}

#[test]
fn missing_input_port_is_an_error() {
    let (builder, code) = instantiate("clk => c, q => o");
    let diagnostics = builder.analyze();
    assert_eq!(codes(&diagnostics), vec![ErrorCode::Unassociated]);
    assert_eq!(diagnostics[0].default_severity, Severity::Error);
    assert_eq!(diagnostics[0].pos, code.s1("inst").pos());
    assert!(diagnostics[0].message.contains("'rst'"));
}

#[test]
fn missing_output_port_is_a_warning() {
    let (builder, _) = instantiate("clk => c, rst => r");
    let diagnostics = builder.analyze();
    assert_eq!(codes(&diagnostics), vec![ErrorCode::Unassociated]);
    assert_eq!(diagnostics[0].default_severity, Severity::Warning);
}

#[test]
fn open_output_port() {
    let (builder, _) = instantiate("clk => c, rst => r, q => open");
    assert_eq!(builder.analyze(), vec![]);
}

#[test]
fn too_many_positional_associations() {
    let (builder, _) = instantiate("c, '1', o, r, c");
    assert_eq!(codes(&builder.analyze()), vec![ErrorCode::TooManyArguments]);
}

#[test]
fn port_type_mismatch() {
    let (builder, code) = instantiate("clk => c, rst => r, q => o, d => 5");
    let diagnostics = builder.analyze();
    assert_eq!(codes(&diagnostics), vec![ErrorCode::TypeMismatch]);
    assert_eq!(diagnostics[0].pos, code.s1("5").pos());
}

#[test]
fn missing_architecture_of_instantiated_entity() {
    let mut builder = LibraryBuilder::new();
    builder.in_file("child.vhd", CHILD);
    let code = builder.in_file(
        "top.vhd",
        "\
entity top is
end entity;

architecture rtl of top is
  signal c, r : bit;
begin
  inst: entity work.child(other) port map (clk => c, rst => r, q => open);
end architecture;
",
    );
    let diagnostics = builder.analyze();
    assert_eq!(codes(&diagnostics), vec![ErrorCode::NoPrimaryUnit]);
    assert_eq!(diagnostics[0].pos, code.s1("other").pos());
}

#[test]
fn component_instance() {
    let mut builder = LibraryBuilder::new();
    builder.in_architecture(
        "\
  component comp is
    generic (width : natural);
    port (a : in std_logic; b : out std_logic);
  end component;
  signal x : std_logic;",
        "inst: comp generic map (width => 4) port map (a => x, b => open);",
    );
    assert_eq!(builder.analyze(), vec![]);
}

#[test]
fn missing_generic_is_an_error() {
    let mut builder = LibraryBuilder::new();
    builder.in_architecture(
        "\
  component comp is
    generic (width : natural);
  end component;",
        "inst: comp;",
    );
    assert_eq!(codes(&builder.analyze()), vec![ErrorCode::Unassociated]);
}

#[test]
fn instance_without_map_aspects_reports_every_port() {
    let mut builder = LibraryBuilder::new();
    let code = builder.in_architecture(
        "\
  component comp is
    port (a : in std_logic; b : out std_logic);
  end component;",
        "inst: comp;",
    );
    let diagnostics = builder.analyze();
    assert_eq!(
        codes(&diagnostics),
        vec![ErrorCode::Unassociated, ErrorCode::Unassociated]
    );
    let severities: Vec<_> = diagnostics
        .iter()
        .map(|diag| diag.default_severity)
        .collect();
    assert_eq!(severities, vec![Severity::Error, Severity::Warning]);
    assert_eq!(diagnostics[0].pos, code.sb("inst", ": comp;").pos());
    assert_eq!(diagnostics[0].message, "No association of port 'a'");
    assert_eq!(diagnostics[1].message, "No association of port 'b'");
}

#[test]
fn labelled_concurrent_procedure_call() {
    let mut builder = LibraryBuilder::new();
    builder.in_architecture(
        "\
  procedure tick is
  begin
  end procedure;",
        "call: tick;",
    );
    assert_eq!(builder.analyze(), vec![]);
}

#[test]
fn architecture_without_entity() {
    let mut builder = LibraryBuilder::new();
    let code = builder.in_file(
        "arch.vhd",
        "architecture rtl of missing is begin end architecture;",
    );
    let diagnostics = builder.analyze();
    assert_eq!(codes(&diagnostics), vec![ErrorCode::NoPrimaryUnit]);
    assert_eq!(diagnostics[0].pos, code.s1("missing").pos());
}

#[test]
fn architecture_refers_to_entity() {
    let mut builder = LibraryBuilder::new();
    let ent = builder.in_file("ent.vhd", "entity ent is end entity;");
    let arch = builder.in_file(
        "arch.vhd",
        "architecture rtl of ent is begin end architecture;",
    );
    assert_eq!(builder.analyze(), vec![]);

    let deep = builder.deep(&arch);
    let twin = deep.twins.values().next().unwrap();
    assert_eq!(twin.source(), ent.source());
    let target = deep.reference_at(arch.s1("ent").start()).unwrap();
    assert_eq!(&target.target, twin);
}

#[test]
fn no_such_library() {
    let mut builder = LibraryBuilder::new();
    let code = builder.in_file("ent.vhd", "library foo; entity ent is end entity;");
    let diagnostics = builder.analyze();
    assert_eq!(codes(&diagnostics), vec![ErrorCode::NoSuchLibrary]);
    assert_eq!(diagnostics[0].pos, code.s1("foo").pos());
}

#[test]
fn use_of_missing_package() {
    let mut builder = LibraryBuilder::new();
    let code = builder.in_file("ent.vhd", "use work.missing.all; entity ent is end entity;");
    let diagnostics = builder.analyze();
    assert_eq!(codes(&diagnostics), vec![ErrorCode::NoPrimaryUnit]);
    assert_eq!(diagnostics[0].pos, code.s1("missing").pos());
}

#[test]
fn duplicate_declarations() {
    let mut builder = LibraryBuilder::new();
    let code = builder.in_file(
        "pkg.vhd",
        "package pkg is constant c : integer := 0; signal c : bit; end package;",
    );
    let diagnostics = builder.analyze();
    assert_eq!(codes(&diagnostics), vec![ErrorCode::DuplicateDeclaration]);
    assert_eq!(diagnostics[0].pos, code.sa("signal ", "c").pos());
}

#[test]
fn illegal_assignment_targets() {
    let mut builder = LibraryBuilder::new();
    let code = builder.in_file(
        "ent.vhd",
        "\
entity ent is
  port (i : in bit; o : out bit);
end entity;

architecture rtl of ent is
  constant k : bit := '0';
  signal s : bit;
begin
  i <= '1';
  k <= '1';
  o <= s;
  process
    variable v : bit;
  begin
    s := '1';
    v := i;
    v <= '0';
    wait;
  end process;
end architecture;
",
    );
    let diagnostics = builder.analyze();
    assert_eq!(
        diagnostics
            .iter()
            .map(|diagnostic| (diagnostic.code, diagnostic.pos.clone()))
            .collect::<Vec<_>>(),
        vec![
            (ErrorCode::IllegalTarget, code.sb("i", " <= '1'").pos()),
            (ErrorCode::IllegalTarget, code.sb("k", " <= '1'").pos()),
            (ErrorCode::IllegalTarget, code.sb("s", " := '1'").pos()),
            (ErrorCode::IllegalTarget, code.sb("v", " <= '0'").pos()),
        ]
    );
}

#[test]
fn conditions_must_be_boolean() {
    let mut builder = LibraryBuilder::new();
    let code = builder.in_architecture(
        "signal clk, d, q : std_logic;",
        "\
  process (clk)
  begin
    if rising_edge(clk) then
      q <= d;
    end if;
    if clk then
      q <= '0';
    end if;
    if 1 then
      q <= '1';
    end if;
  end process;",
    );
    let diagnostics = builder.analyze();
    assert_eq!(codes(&diagnostics), vec![ErrorCode::TypeMismatch]);
    assert_eq!(diagnostics[0].pos, code.sa("if ", "1").pos());
}

#[test]
fn unread_signal_in_sensitivity_list() {
    let mut builder = LibraryBuilder::new();
    let code = builder.in_architecture(
        "signal clk, unused, d, q : std_logic;",
        "\
  process (clk, unused)
  begin
    if rising_edge(clk) then
      q <= d;
    end if;
  end process;",
    );
    let diagnostics = builder.analyze();
    assert_eq!(codes(&diagnostics), vec![ErrorCode::UnusedSensitivity]);
    assert_eq!(diagnostics[0].default_severity, Severity::Warning);
    assert_eq!(diagnostics[0].pos, code.sa("(clk, ", "unused").pos());
}

#[test]
fn sensitivity_list_names_must_be_signals() {
    let mut builder = LibraryBuilder::new();
    builder.in_architecture(
        "constant k : std_logic := '0'; signal q : std_logic;",
        "\
  process (k)
  begin
    q <= k;
  end process;",
    );
    assert_eq!(codes(&builder.analyze()), vec![ErrorCode::MismatchedKinds]);
}

#[test]
fn written_signal_is_not_read() {
    let mut builder = LibraryBuilder::new();
    builder.in_architecture(
        "signal a, q : std_logic;",
        "\
  process (a, q)
  begin
    q <= a;
  end process;",
    );
    assert_eq!(
        codes(&builder.analyze()),
        vec![ErrorCode::UnusedSensitivity]
    );
}

#[test]
fn return_statements() {
    let mut builder = LibraryBuilder::new();
    let code = builder.in_file(
        "pkg.vhd",
        "\
package pkg is
end package;

package body pkg is
  function f return integer is
  begin
    return;
  end function;

  function g return integer is
  begin
    return true;
  end function;

  procedure p is
  begin
    return 1;
  end procedure;

  procedure ok is
  begin
    return;
  end procedure;
end package body;
",
    );
    let diagnostics = builder.analyze();
    assert_eq!(
        codes(&diagnostics),
        vec![
            ErrorCode::VoidReturn,
            ErrorCode::TypeMismatch,
            ErrorCode::NonVoidReturn
        ]
    );
    assert_eq!(diagnostics[1].pos, code.s1("true").pos());
}

#[test]
fn return_outside_of_subprogram() {
    let mut builder = LibraryBuilder::new();
    builder.in_architecture(
        "",
        "\
  process
  begin
    return;
  end process;",
    );
    assert_eq!(codes(&builder.analyze()), vec![ErrorCode::IllegalReturn]);
}

#[test]
fn loop_control() {
    let mut builder = LibraryBuilder::new();
    let code = builder.in_architecture(
        "",
        "\
  process
  begin
    outer: for i in 0 to 3 loop
      while true loop
        next outer when i = 2;
        exit;
      end loop;
      exit other;
    end loop;
    next;
    wait;
  end process;",
    );
    let diagnostics = builder.analyze();
    assert_eq!(
        codes(&diagnostics),
        vec![ErrorCode::ExitOutsideLoop, ErrorCode::NextOutsideLoop]
    );
    assert_eq!(diagnostics[0].pos, code.s1("other").pos());

    let deep = builder.deep(&code);
    let target = deep
        .reference_at(code.sa("next ", "outer").start())
        .unwrap();
    assert!(matches!(target.target.kind(), DeclKind::LoopScope));
}

#[test]
fn procedure_calls() {
    let mut builder = LibraryBuilder::new();
    builder.in_file(
        "pkg.vhd",
        "\
package pkg is
  procedure p (x : in integer);
  constant k : integer := 0;
end package;

package body pkg is
  procedure p (x : in integer) is
  begin
  end procedure;

  procedure user is
  begin
    p(1);
    p(true);
    k(1);
  end procedure;
end package body;
",
    );
    assert_eq!(
        codes(&builder.analyze()),
        vec![ErrorCode::TypeMismatch, ErrorCode::MismatchedKinds]
    );
}

#[test]
fn subprogram_body_refers_to_declaration() {
    let mut builder = LibraryBuilder::new();
    let code = builder.in_file(
        "pkg.vhd",
        "\
package pkg is
  function f (x : integer) return integer;
end package;

package body pkg is
  function f (x : integer) return integer is
  begin
    return x;
  end function;
end package body;
",
    );
    assert_eq!(builder.analyze(), vec![]);
    let deep = builder.deep(&code);
    let body = code.sb("f", " (x : integer) return integer is");
    let target = deep.reference_at(body.start()).unwrap();
    assert_eq!(target.target.tree_path().as_ref(), "pkg.f");
}

#[test]
fn numeric_std_operators() {
    let mut builder = LibraryBuilder::new();
    builder.in_architecture(
        "signal count : unsigned(7 downto 0); signal n : natural;",
        "\
  count <= count + 1;
  n <= to_integer(count);
  count <= to_unsigned(n, 8) when count = 3 else count;",
    );
    assert_eq!(builder.analyze(), vec![]);
}

#[test]
fn undeclared_names() {
    let mut builder = LibraryBuilder::new();
    let code = builder.in_architecture("signal q : std_logic;", "q <= missing;");
    let diagnostics = builder.analyze();
    assert_eq!(codes(&diagnostics), vec![ErrorCode::NotDeclared]);
    assert_eq!(diagnostics[0].pos, code.s1("missing").pos());
}
