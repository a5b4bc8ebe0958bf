// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

use crate::data::{Diagnostic, Severity, SrcPos};
use std::fmt;

/// The stage and nature of a diagnostic
#[derive(PartialEq, Debug, Clone, Copy, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Syntax,
    Semantic,
    Lint,
    Internal,
}

#[derive(PartialEq, Debug, Clone, Copy, Eq, Hash)]
pub enum ErrorCode {
    /// A syntax error happens during tokenization or parsing.
    ///
    /// # Example
    /// ```vhdl
    /// entity foo is
    ///     port (
    ///         clk: in bit;
    ///                    ^ Last interface element may not end with ';'
    ///     );
    /// end entity;
    /// ```
    SyntaxError,
    // Analysis
    /// No primary unit exists within a library
    ///
    /// # Example
    /// ```vhdl
    /// entity foo is
    /// end entity foo;
    ///
    /// architecture baz of bar is
    /// begin               ~~~ Does not exist within the current library
    /// end architecture;
    /// ```
    NoPrimaryUnit,
    /// Library not found
    NoSuchLibrary,
    /// No declaration of some designator was found
    NotDeclared,
    /// A declaration was already declared previously
    DuplicateDeclaration,
    /// An expression does not have the expected type
    ///
    /// # Example
    /// ```vhdl
    /// signal x : integer := '1';
    /// ```
    TypeMismatch,
    /// More than one overloaded subprogram matches a call
    AmbiguousCall,
    /// No overloaded subprogram matches a call
    NoOverloadCandidates,
    /// A call or instance has more actuals than formals
    TooManyArguments,
    /// A formal without a default value is not associated
    ///
    /// # Example
    /// ```vhdl
    /// entity foo is
    ///     port (
    ///         bar: in bit
    ///     );
    /// end entity;
    ///
    /// foo_inst: entity work.foo;
    /// ~~~~~~~~~ No association of port 'bar'
    /// ```
    Unassociated,
    /// A named association with a formal that does not exist
    InvalidFormal,
    /// An unconstrained array type where a constrained type is required
    ///
    /// # Example
    /// ```vhdl
    /// signal s : std_logic_vector;
    /// ```
    UnconstrainedType,
    /// A name denotes a different kind of declaration than required,
    /// such as a signal where a type was expected
    MismatchedKinds,
    /// An object may not be the target of an assignment
    ///
    /// # Example
    /// ```vhdl
    /// architecture a of ent is
    ///   constant foo : boolean := true;
    /// begin
    ///   foo <= false;
    /// end architecture;
    /// ```
    IllegalTarget,
    /// An attribute was used on an element that it cannot be used on
    IllegalAttribute,
    /// A function returns without a value
    VoidReturn,
    /// A procedure or process returns a value
    NonVoidReturn,
    /// A return statement outside of a subprogram
    IllegalReturn,
    /// An exit statement outside of a loop
    ExitOutsideLoop,
    /// A next statement outside of a loop
    NextOutsideLoop,
    /// No operator or builtin operation accepts the operand types
    OperatorNotApplicable,
    /// The evaluation of a function exceeded the call depth
    RecursionLimit,
    // Linting
    /// A signal in the sensitivity list of a process that is never read by the process
    ///
    /// # Example
    /// ```vhdl
    /// process (clk, unused)
    /// begin
    ///     if rising_edge(clk) then
    ///     end if;
    /// end process;
    /// ```
    UnusedSensitivity,
    /// The compatibility of two types cannot be decided statically
    UnsureCompatibility,
    /// An internal error that signifies that some precondition of the analysis wasn't met.
    Internal,
    /// A related error message. This error code is never generated directly and only used
    /// as 'drop-in' when related messages are drained from a bigger error message
    Related,
}

impl ErrorCode {
    pub fn category(&self) -> Category {
        use ErrorCode::*;
        match self {
            SyntaxError => Category::Syntax,
            UnusedSensitivity | UnsureCompatibility => Category::Lint,
            Internal => Category::Internal,
            _ => Category::Semantic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        use ErrorCode::*;
        match self {
            SyntaxError => "syntax_error",
            NoPrimaryUnit => "no_primary_unit",
            NoSuchLibrary => "no_such_library",
            NotDeclared => "not_declared",
            DuplicateDeclaration => "duplicate_declaration",
            TypeMismatch => "type_mismatch",
            AmbiguousCall => "ambiguous_call",
            NoOverloadCandidates => "no_overload_candidates",
            TooManyArguments => "too_many_arguments",
            Unassociated => "unassociated",
            InvalidFormal => "invalid_formal",
            UnconstrainedType => "unconstrained_type",
            MismatchedKinds => "mismatched_kinds",
            IllegalTarget => "illegal_target",
            IllegalAttribute => "illegal_attribute",
            VoidReturn => "void_return",
            NonVoidReturn => "non_void_return",
            IllegalReturn => "illegal_return",
            ExitOutsideLoop => "exit_outside_loop",
            NextOutsideLoop => "next_outside_loop",
            OperatorNotApplicable => "operator_not_applicable",
            RecursionLimit => "recursion_limit",
            UnusedSensitivity => "unused_sensitivity",
            UnsureCompatibility => "unsure_compatibility",
            Internal => "internal",
            Related => "related",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Specialized diagnostics with pre-defined messages and error codes
impl Diagnostic {
    pub fn syntax_error(item: impl AsRef<SrcPos>, msg: impl Into<String>) -> Diagnostic {
        Self::new(item, msg, Severity::Error, ErrorCode::SyntaxError)
    }

    pub fn internal(item: impl AsRef<SrcPos>, msg: impl Into<String>) -> Diagnostic {
        Self::new(item, msg, Severity::Error, ErrorCode::Internal)
    }

    pub fn not_declared(item: impl AsRef<SrcPos>, name: impl fmt::Display) -> Diagnostic {
        Self::new(
            item,
            format!("No declaration of '{name}'"),
            Severity::Error,
            ErrorCode::NotDeclared,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        assert_eq!(ErrorCode::SyntaxError.category(), Category::Syntax);
        assert_eq!(ErrorCode::TypeMismatch.category(), Category::Semantic);
        assert_eq!(ErrorCode::UnusedSensitivity.category(), Category::Lint);
        assert_eq!(ErrorCode::Internal.category(), Category::Internal);
    }
}
