// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c)  2024, Lukas Scheller lukasscheller@icloud.com
/// (private) utility functions used when parsing
use crate::parser::builder::Checkpoint;
use crate::parser::diagnostics::ParserDiagnostic;
use crate::parser::diagnostics::ParserError::{self, *};
use crate::parser::Parser;
use crate::syntax::node_kind::NodeKind;
use crate::tokens::{Keyword as Kw, TokenKind, TokenStream};

impl<T: TokenStream> Parser<T> {
    pub(crate) fn peek_kind(&self) -> Option<TokenKind> {
        self.tokenizer.peek_kind(0)
    }

    pub(crate) fn nth(&self, n: usize) -> Option<TokenKind> {
        self.tokenizer.peek_kind(n)
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    pub(crate) fn at_kw(&self, kw: Kw) -> bool {
        self.at(TokenKind::Keyword(kw))
    }

    pub(crate) fn nth_is_kw(&self, n: usize, kw: Kw) -> bool {
        self.nth(n) == Some(TokenKind::Keyword(kw))
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.tokenizer.at_eof()
    }

    /// Pushes the next token, whatever it is. Never consumes the end-of-file token.
    pub(crate) fn skip(&mut self) {
        if self.at_eof() {
            return;
        }
        if let Some(token) = self.tokenizer.next() {
            self.builder.push(token);
        }
    }

    pub(crate) fn expect_token(&mut self, kind: TokenKind) -> bool {
        if self.opt_token(kind) {
            return true;
        }
        self.expect_tokens_err([kind]);
        false
    }

    pub(crate) fn expect_kw(&mut self, kw: Kw) -> bool {
        self.expect_token(TokenKind::Keyword(kw))
    }

    pub(crate) fn expect_one_of(&mut self, kinds: &[TokenKind]) -> bool {
        if let Some(token) = self
            .tokenizer
            .next_if(|token| kinds.contains(&token.kind()))
        {
            self.builder.push(token);
            return true;
        }
        self.expect_tokens_err(kinds.to_vec());
        false
    }

    pub(crate) fn opt_token(&mut self, kind: TokenKind) -> bool {
        if let Some(token) = self.tokenizer.next_if(|token| token.kind() == kind) {
            self.builder.push(token);
            true
        } else {
            false
        }
    }

    pub(crate) fn opt_kw(&mut self, kw: Kw) -> bool {
        self.opt_token(TokenKind::Keyword(kw))
    }

    pub(crate) fn opt_identifier(&mut self) -> bool {
        self.opt_token(TokenKind::Identifier)
    }

    pub(crate) fn start_node(&mut self, kind: NodeKind) {
        self.builder.start_node(kind)
    }

    pub(crate) fn end_node(&mut self) {
        self.builder.end_node()
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        self.builder.checkpoint()
    }

    pub(crate) fn start_node_at(&mut self, checkpoint: Checkpoint, kind: NodeKind) {
        self.builder.start_node_at(checkpoint, kind)
    }

    /// Amount of text consumed so far, used to detect whether a rule made progress
    pub(crate) fn position(&self) -> usize {
        self.builder.text_len()
    }

    pub(crate) fn error(&mut self, error: ParserError) {
        if self.at_eof() {
            return self.eof_err();
        }
        let (pos, len) = match self.tokenizer.peek(0) {
            Some(token) => (
                self.builder.text_len() + token.leading_trivia().byte_len(),
                token.text_len(),
            ),
            None => (self.builder.text_len(), 0),
        };
        self.diagnostics
            .push(ParserDiagnostic::new(pos, len, error));
    }

    pub(crate) fn eof_err(&mut self) {
        if !self.unexpected_eof {
            self.unexpected_eof = true;
            let pos = self.builder.text_len()
                + self
                    .tokenizer
                    .peek(0)
                    .map(|token| token.leading_trivia().byte_len())
                    .unwrap_or(0);
            self.diagnostics.push(ParserDiagnostic::new(pos, 0, Eof))
        }
    }

    pub(crate) fn expect_tokens_err(&mut self, tokens: impl Into<Box<[TokenKind]>>) {
        self.error(ExpectingTokens(tokens.into()));
    }

    /// Skips tokens into an error node until one of `stops` (or the end of the file) is found.
    pub(crate) fn recover_to(&mut self, stops: &[TokenKind]) {
        if self.at_eof() || self.peek_kind().is_some_and(|kind| stops.contains(&kind)) {
            return;
        }
        self.start_node(NodeKind::Error);
        while !self.at_eof() && !self.peek_kind().is_some_and(|kind| stops.contains(&kind)) {
            self.skip();
        }
        self.end_node();
    }

    /// Skips tokens that are valid but not structured in the tree.
    pub(crate) fn skip_until(&mut self, stops: &[TokenKind]) {
        while !self.at_eof() && !self.peek_kind().is_some_and(|kind| stops.contains(&kind)) {
            self.skip();
        }
    }

    /// Skips a single token into an error node. Used to guarantee progress in loops.
    pub(crate) fn skip_erroneous_token(&mut self) {
        self.start_node(NodeKind::Error);
        self.skip();
        self.end_node();
    }

    /// Skips to and including the next semicolon, stopping early at block keywords.
    pub(crate) fn recover_statement(&mut self) {
        self.recover_to(&[
            TokenKind::SemiColon,
            TokenKind::Keyword(Kw::End),
            TokenKind::Keyword(Kw::Begin),
        ]);
        self.opt_token(TokenKind::SemiColon);
    }

    /// Skips a parenthesized group, including nested parentheses.
    pub(crate) fn skip_balanced_parens(&mut self) {
        if !self.at(TokenKind::LeftPar) {
            return;
        }
        let mut depth = 0usize;
        while !self.at_eof() {
            match self.peek_kind() {
                Some(TokenKind::LeftPar) => depth += 1,
                Some(TokenKind::RightPar) => {
                    depth -= 1;
                    if depth == 0 {
                        self.skip();
                        return;
                    }
                }
                _ => {}
            }
            self.skip();
        }
    }

    /// Looks for `target` between the next token and the closing parenthesis or
    /// comma at nesting depth zero, without consuming anything.
    pub(crate) fn lookahead_at_depth_zero(&self, target: TokenKind) -> bool {
        let mut depth = 0usize;
        let mut n = 0;
        loop {
            match self.nth(n) {
                None | Some(TokenKind::Eof) | Some(TokenKind::SemiColon) => return false,
                Some(TokenKind::LeftPar) => depth += 1,
                Some(TokenKind::RightPar) => {
                    if depth == 0 {
                        return false;
                    }
                    depth -= 1;
                }
                Some(TokenKind::Comma) if depth == 0 => return false,
                Some(kind) if depth == 0 && kind == target => return true,
                _ => {}
            }
            n += 1;
        }
    }
}
