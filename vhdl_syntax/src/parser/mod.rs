//! Facilities for parsing an input file or string into a [SyntaxNode]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c)  2024, Lukas Scheller lukasscheller@icloud.com
use crate::parser::diagnostics::ParserDiagnostic;
use crate::syntax::node::SyntaxNode;
use crate::syntax::node_kind::NodeKind;
use crate::tokens::TokenStream;

mod builder;
mod concurrent;
mod declarations;
mod design;
pub mod diagnostics;
mod expressions;
mod sequential;
mod types;
mod util;

/// The parser turns a token stream, produced by a [TokenStream] into
/// [Syntax Nodes](SyntaxNode) that form a Concrete Syntax Tree.
///
/// Parsing never fails. Unexpected input is reported as a [ParserDiagnostic]
/// and skipped into a [NodeKind::Error](crate::syntax::NodeKind::Error) node
/// so that every byte of the input is part of the tree.
pub struct Parser<T: TokenStream> {
    tokenizer: T,
    builder: builder::NodeBuilder,
    diagnostics: Vec<ParserDiagnostic>,
    unexpected_eof: bool,
}

impl<T: TokenStream> Parser<T> {
    pub fn new(tokenizer: T) -> Parser<T> {
        Parser {
            tokenizer,
            builder: builder::NodeBuilder::new(),
            diagnostics: Vec::default(),
            unexpected_eof: false,
        }
    }

    pub fn diagnostics(&self) -> &[ParserDiagnostic] {
        &self.diagnostics
    }

    /// Parses a design file and returns the root node.
    pub fn parse(mut self) -> (SyntaxNode, Vec<ParserDiagnostic>) {
        self.design_file();
        self.finish()
    }

    fn finish(self) -> (SyntaxNode, Vec<ParserDiagnostic>) {
        (SyntaxNode::new_root(self.builder.end()), self.diagnostics)
    }

    fn finish_fragment(self) -> (SyntaxNode, Vec<ParserDiagnostic>) {
        (
            SyntaxNode::new_root(self.builder.end_fragment()),
            self.diagnostics,
        )
    }
}

/// Generic trait for all token streams that can be parsed into a node.
/// The function commonly is a reference to a parser function
/// such as [Parser::expression] that defines the content of the node.
pub trait CanParse<T: TokenStream> {
    fn parse_with(self, func: impl FnOnce(&mut Parser<T>)) -> (SyntaxNode, Vec<ParserDiagnostic>);
}

impl<T: TokenStream> CanParse<T> for T {
    fn parse_with(self, func: impl FnOnce(&mut Parser<T>)) -> (SyntaxNode, Vec<ParserDiagnostic>) {
        let mut parser = Parser::new(self);
        parser.start_node(NodeKind::DesignFile);
        func(&mut parser);
        parser.finish_fragment()
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;
    use crate::tokens::{IntoTokenStream, Tokenize};
    use std::collections::VecDeque;

    pub fn parse_fn(
        code: &str,
        func: impl FnOnce(&mut Parser<VecDeque<crate::tokens::Token>>),
    ) -> (SyntaxNode, Vec<ParserDiagnostic>) {
        code.tokenize().into_token_stream().parse_with(func)
    }

    /// Tree dump of a fragment that is expected to parse without errors
    pub fn tree(
        code: &str,
        func: impl FnOnce(&mut Parser<VecDeque<crate::tokens::Token>>),
    ) -> String {
        let (node, diagnostics) = parse_fn(code, func);
        assert_eq!(diagnostics, vec![], "unexpected diagnostics for {code}");
        node.test_text()
    }
}
