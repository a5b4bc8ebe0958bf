// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

use super::SrcPos;
use crate::data::error_codes::{Category, ErrorCode};
use std::fmt;

#[derive(PartialEq, Debug, Clone, Copy, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Hint,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Hint => "hint",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(name)
    }
}

/// A problem found in a document, located at `pos`
#[must_use]
#[derive(PartialEq, Debug, Clone, Eq, Hash)]
pub struct Diagnostic {
    pub pos: SrcPos,
    pub message: String,
    pub default_severity: Severity,
    /// Other locations that explain the problem, such as a declaration
    pub related: Vec<(SrcPos, String)>,
    pub code: ErrorCode,
}

impl Diagnostic {
    pub fn new(
        item: impl AsRef<SrcPos>,
        msg: impl Into<String>,
        severity: Severity,
        code: ErrorCode,
    ) -> Diagnostic {
        Diagnostic {
            pos: item.as_ref().clone(),
            message: msg.into(),
            default_severity: severity,
            related: Vec::new(),
            code,
        }
    }

    pub fn error(item: impl AsRef<SrcPos>, msg: impl Into<String>, code: ErrorCode) -> Diagnostic {
        Self::new(item, msg, Severity::Error, code)
    }

    pub fn warning(
        item: impl AsRef<SrcPos>,
        msg: impl Into<String>,
        code: ErrorCode,
    ) -> Diagnostic {
        Self::new(item, msg, Severity::Warning, code)
    }

    pub fn hint(item: impl AsRef<SrcPos>, msg: impl Into<String>, code: ErrorCode) -> Diagnostic {
        Self::new(item, msg, Severity::Hint, code)
    }

    pub fn category(&self) -> Category {
        self.code.category()
    }

    pub fn related(mut self, item: impl AsRef<SrcPos>, message: impl Into<String>) -> Diagnostic {
        self.related.push((item.as_ref().clone(), message.into()));
        self
    }

    /// Related locations first, then the diagnostic itself
    pub fn show(&self) -> String {
        let related = self
            .related
            .iter()
            .map(|(pos, message)| pos.show(&format!("related: {message}")) + "\n");
        let own = self.pos.show(&format!(
            "{}[{}]: {}",
            self.default_severity, self.code, self.message
        ));
        related.chain(std::iter::once(own)).collect()
    }
}

/// Receives the diagnostics of an analysis step
pub trait DiagnosticHandler {
    fn push(&mut self, diagnostic: Diagnostic);
}

impl<'a> dyn DiagnosticHandler + 'a {
    pub fn error(&mut self, item: impl AsRef<SrcPos>, msg: impl Into<String>, code: ErrorCode) {
        self.push(Diagnostic::error(item, msg, code));
    }

    pub fn warning(&mut self, item: impl AsRef<SrcPos>, msg: impl Into<String>, code: ErrorCode) {
        self.push(Diagnostic::warning(item, msg, code));
    }

    pub fn hint(&mut self, item: impl AsRef<SrcPos>, msg: impl Into<String>, code: ErrorCode) {
        self.push(Diagnostic::hint(item, msg, code));
    }
}

impl DiagnosticHandler for Vec<Diagnostic> {
    fn push(&mut self, diagnostic: Diagnostic) {
        Vec::push(self, diagnostic)
    }
}

/// Drops every diagnostic
pub struct NullDiagnostics;

impl DiagnosticHandler for NullDiagnostics {
    fn push(&mut self, _diagnostic: Diagnostic) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::Code;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    #[test]
    fn show_names_severity_and_code() {
        let code = Code::with_file_name(Path::new("top.vhd"), "signal s : bit;\ns <= '1';\n");
        let diagnostic =
            Diagnostic::warning(code.s1("s <="), "Never read", ErrorCode::UnusedSensitivity);
        assert_eq!(
            diagnostic.show(),
            "\
warning[unused_sensitivity]: Never read
  --> top.vhd:2
   |
1  |  signal s : bit;
2 --> s <= '1';
   |  ~~~~
"
        );
    }

    #[test]
    fn related_locations_are_shown_first() {
        let code = Code::with_file_name(
            Path::new("top.vhd"),
            "port (a : in bit);\n-- body\na <= '0';\n",
        );
        let diagnostic = Diagnostic::error(
            code.s1("a <= '0'"),
            "Port 'a' is an input and cannot be assigned",
            ErrorCode::IllegalTarget,
        )
        .related(code.s1("a : in bit"), "Defined here");
        assert_eq!(
            diagnostic.show(),
            "\
related: Defined here
  --> top.vhd:1
   |
1 --> port (a : in bit);
   |        ~~~~~~~~~~
2  |  -- body
3  |  a <= '0';

error[illegal_target]: Port 'a' is an input and cannot be assigned
  --> top.vhd:3
   |
1  |  port (a : in bit);
2  |  -- body
3 --> a <= '0';
   |  ~~~~~~~~
"
        );
    }

    #[test]
    fn handlers() {
        let code = Code::new("x");
        let mut diagnostics = Vec::new();
        {
            let handler: &mut dyn DiagnosticHandler = &mut diagnostics;
            handler.hint(code.s1("x"), "unsure", ErrorCode::UnsureCompatibility);
            handler.push(Diagnostic::internal(code.s1("x"), "oops"));
        }
        let severities: Vec<_> = diagnostics
            .iter()
            .map(|diag| diag.default_severity)
            .collect();
        assert_eq!(severities, vec![Severity::Hint, Severity::Error]);
        assert_eq!(diagnostics[0].category(), Category::Lint);
        assert_eq!(diagnostics[1].category(), Category::Internal);

        let handler: &mut dyn DiagnosticHandler = &mut NullDiagnostics;
        handler.error(code.s1("x"), "dropped", ErrorCode::Internal);
    }
}
