// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c)  2024, Lukas Scheller lukasscheller@icloud.com

//! Lossless concrete syntax trees for VHDL.
//!
//! Every byte of the input, including whitespace, comments and erroneous
//! text, is part of the tree returned by [parse]. Printing the root node
//! reproduces the input exactly.

pub mod parser;
pub mod syntax;
pub mod tokens;

pub use parser::diagnostics::{ParserDiagnostic, ParserError};
pub use syntax::{NodeKind, SyntaxElement, SyntaxNode, SyntaxToken};
pub use tokens::{Keyword, TokenKind};

use tokens::{IntoTokenStream, Tokenize};

/// Parses a complete design file.
pub fn parse(text: &str) -> (SyntaxNode, Vec<ParserDiagnostic>) {
    parser::Parser::new(text.tokenize().into_token_stream()).parse()
}
