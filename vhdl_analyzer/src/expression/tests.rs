// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

use super::*;
use crate::analysis::tests::{codes, LibraryBuilder};
use crate::analysis::DeclRef;
use crate::config::AnalysisConfig;
use crate::data::ErrorCode;
use crate::test_util::Code;
use crate::types::{is_named, Type};
use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

/// Evaluates the default value of a constant of package `pkg`
fn evaluate_constant(
    builder: &LibraryBuilder,
    code: &Code,
    name: &str,
    typed: bool,
) -> EvalResult<Evaluated> {
    let analysis = builder.analysis(code);
    let package = DeclRef::new(analysis.clone(), analysis.primary_unit("pkg").unwrap());
    let constant = package.children_named(name).next().unwrap();
    let default = constant
        .kind()
        .as_object()
        .unwrap()
        .default
        .clone()
        .unwrap();
    let env = Environment::new(builder.registry().clone(), builder.config().clone());
    let mut ctx = EvalContext::new(&env, package);
    let expected = typed.then(|| ctx.object_type(&constant));
    ctx.evaluate(&default, expected.as_ref())
}

fn package(builder: &mut LibraryBuilder, declarations: &str) -> Code {
    builder.in_file(
        "pkg.vhd",
        &format!("package pkg is\n{declarations}\nend package;\n"),
    )
}

#[test]
fn concatenation_of_literals_is_a_string_literal() {
    let mut builder = LibraryBuilder::new();
    let code = package(&mut builder, "constant s : string := \"101\" & '0';");
    builder.analyze();
    let evaluated = evaluate_constant(&builder, &code, "s", false).unwrap();
    assert_matches!(evaluated.typ.as_ref(), Type::StringLiteral(text) if text == "1010");
    assert_eq!(evaluated.value, Some(Value::Str("1010".to_owned())));
}

#[test]
fn folds_constant_arithmetic() {
    let mut builder = LibraryBuilder::new();
    let code = package(
        &mut builder,
        "\
constant a : integer := 3;
constant b : integer := a * 4 + 2;
constant c : integer := (-b) mod 5;
constant r : real := 1.5 * 2.0;",
    );
    assert_eq!(builder.analyze(), vec![]);
    let value = |name| {
        evaluate_constant(&builder, &code, name, true)
            .unwrap()
            .value
    };
    assert_eq!(value("b"), Some(Value::Integer(14)));
    assert_eq!(value("c"), Some(Value::Integer(1)));
    assert_eq!(value("r"), Some(Value::Real(3.0)));
}

#[test]
fn relational_operators_are_boolean() {
    let mut builder = LibraryBuilder::new();
    let code = package(
        &mut builder,
        "\
constant a : integer := 3;
constant b : boolean := a < 4 and a /= 0;",
    );
    assert_eq!(builder.analyze(), vec![]);
    let evaluated = evaluate_constant(&builder, &code, "b", true).unwrap();
    assert!(is_named(&evaluated.typ, "standard", "boolean"));
    assert_eq!(evaluated.value, Some(Value::boolean(true)));
}

#[test]
fn interprets_function_calls() {
    let mut builder = LibraryBuilder::new();
    let code = builder.in_file(
        "pkg.vhd",
        "\
package pkg is
  function double (x : integer) return integer;
  function clog2 (x : natural) return natural;
  constant d : integer := double(21);
  constant w : natural := clog2(100);
end package;

package body pkg is
  function double (x : integer) return integer is
  begin
    return x * 2;
  end function;

  function clog2 (x : natural) return natural is
    variable result : natural := 0;
  begin
    while 2 ** result < x loop
      result := result + 1;
    end loop;
    return result;
  end function;
end package body;
",
    );
    assert_eq!(builder.analyze(), vec![]);
    let value = |name| {
        evaluate_constant(&builder, &code, name, true)
            .unwrap()
            .value
    };
    assert_eq!(value("d"), Some(Value::Integer(42)));
    assert_eq!(value("w"), Some(Value::Integer(7)));
}

#[test]
fn recursion_is_bounded_by_the_call_depth() {
    let mut builder = LibraryBuilder::with_config(AnalysisConfig {
        max_call_depth: 4,
        ..crate::analysis::tests::quiet_config()
    });
    let code = builder.in_file(
        "pkg.vhd",
        "\
package pkg is
  function forever (x : integer) return integer;
  constant c : integer := forever(1);
end package;

package body pkg is
  function forever (x : integer) return integer is
  begin
    return forever(x + 1);
  end function;
end package body;
",
    );
    assert_eq!(codes(&builder.analyze()), vec![ErrorCode::RecursionLimit]);
    let err = evaluate_constant(&builder, &code, "c", true).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::RecursionLimit);
    assert_eq!(err.pos, code.s1("forever(1)").pos());
}

#[test]
fn array_attributes() {
    let mut builder = LibraryBuilder::new();
    let code = package(
        &mut builder,
        "\
constant v : bit_vector(7 downto 0) := (others => '0');
constant l : integer := v'length;
constant lft : integer := v'left;
constant lo : integer := v'low;
constant up : boolean := v'ascending;",
    );
    assert_eq!(builder.analyze(), vec![]);
    let value = |name| {
        evaluate_constant(&builder, &code, name, true)
            .unwrap()
            .value
    };
    assert_eq!(value("l"), Some(Value::Integer(8)));
    assert_eq!(value("lft"), Some(Value::Integer(7)));
    assert_eq!(value("lo"), Some(Value::Integer(0)));
    assert_eq!(value("up"), Some(Value::boolean(false)));
}

#[test]
fn length_of_a_scalar_is_illegal() {
    let mut builder = LibraryBuilder::new();
    let code = package(
        &mut builder,
        "\
constant i : integer := 0;
constant l : integer := i'length;",
    );
    let diagnostics = builder.analyze();
    assert_eq!(codes(&diagnostics), vec![ErrorCode::IllegalAttribute]);
    assert_eq!(diagnostics[0].pos, code.s1("i'length").pos());
}

#[test]
fn user_defined_operator() {
    let mut builder = LibraryBuilder::new();
    let code = package(
        &mut builder,
        "\
type level is (low, high);
function \"+\" (l, r : level) return level;
constant c : level := low + high;",
    );
    assert_eq!(builder.analyze(), vec![]);
    let evaluated = evaluate_constant(&builder, &code, "c", true).unwrap();
    assert!(is_named(&evaluated.typ, "pkg", "level"));
}

#[test]
fn operator_without_candidates() {
    let mut builder = LibraryBuilder::new();
    let code = package(&mut builder, "constant c : integer := 1 + true;");
    let diagnostics = builder.analyze();
    assert_eq!(codes(&diagnostics), vec![ErrorCode::OperatorNotApplicable]);
    assert_eq!(diagnostics[0].pos, code.s1("1 + true").pos());
}

#[test]
fn expected_type_selects_among_enumeration_literals() {
    let mut builder = LibraryBuilder::new();
    let code = package(
        &mut builder,
        "\
type color is (red, green);
type light is (green, off);
constant c : color := green;
constant l : light := green;",
    );
    assert_eq!(builder.analyze(), vec![]);
    let c = evaluate_constant(&builder, &code, "c", true).unwrap();
    let l = evaluate_constant(&builder, &code, "l", true).unwrap();
    assert!(is_named(&c.typ, "pkg", "color"));
    assert_eq!(c.value, Some(Value::Enum(1)));
    assert!(is_named(&l.typ, "pkg", "light"));
    assert_eq!(l.value, Some(Value::Enum(0)));
}
