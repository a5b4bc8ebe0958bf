// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c)  2024, Lukas Scheller lukasscheller@icloud.com

use crate::tokens::{TokenKind, Trivia};
use std::fmt::{Display, Formatter};

/// A source-code token together with the trivia in front of it.
///
/// All trivia is leading trivia. Trivia at the end of a file is carried
/// by a final token of kind [TokenKind::Eof] with empty text, so that the
/// concatenation of all tokens reproduces the input exactly.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) leading_trivia: Trivia,
    pub(crate) text: String,
}

impl Token {
    pub fn new(kind: TokenKind, leading_trivia: Trivia, text: impl Into<String>) -> Token {
        Token {
            kind,
            leading_trivia,
            text: text.into(),
        }
    }

    pub fn simple(kind: TokenKind, text: impl Into<String>) -> Token {
        Token::new(kind, Trivia::default(), text)
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn leading_trivia(&self) -> &Trivia {
        &self.leading_trivia
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The length of the token text in bytes, without trivia
    pub fn text_len(&self) -> usize {
        self.text.len()
    }

    /// The length of this token including trivia
    pub fn byte_len(&self) -> usize {
        self.leading_trivia.byte_len() + self.text_len()
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.leading_trivia, self.text)
    }
}
