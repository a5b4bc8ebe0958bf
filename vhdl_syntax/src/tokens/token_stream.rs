// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c)  2024, Lukas Scheller lukasscheller@icloud.com

use crate::tokens::{Token, TokenKind};
use std::collections::VecDeque;

/// A Token stream is similar to an `Iterator`, however the stream has arbitrary amount of
/// lookahead by using [TokenStream::peek]
pub trait TokenStream {
    /// Consumes and returns the next token.
    fn next(&mut self) -> Option<Token>;

    /// Peek `n` tokens in advance where `n == 0` means the next token
    fn peek(&self, n: usize) -> Option<&Token>;

    fn peek_kind(&self, n: usize) -> Option<TokenKind> {
        self.peek(n).map(Token::kind)
    }

    /// Returns `true` when only the end-of-file token (or nothing) is left
    fn at_eof(&self) -> bool {
        matches!(self.peek_kind(0), None | Some(TokenKind::Eof))
    }

    fn next_if(&mut self, cond: impl FnOnce(&Token) -> bool) -> Option<Token> {
        if cond(self.peek(0)?) {
            self.next()
        } else {
            None
        }
    }
}

impl TokenStream for VecDeque<Token> {
    fn next(&mut self) -> Option<Token> {
        self.pop_front()
    }

    fn peek(&self, n: usize) -> Option<&Token> {
        self.get(n)
    }
}

/// Collects a producer of tokens into a stream with unbounded lookahead.
/// ```
/// use vhdl_syntax::tokens::{IntoTokenStream, Keyword, TokenKind, TokenStream, Tokenize};
///
/// let mut stream = "entity foo".tokenize().into_token_stream();
///
/// assert_eq!(stream.peek_kind(1), Some(TokenKind::Identifier));
/// assert_eq!(stream.next().unwrap().kind(), TokenKind::Keyword(Keyword::Entity));
/// assert_eq!(stream.next().unwrap().kind(), TokenKind::Identifier);
/// assert_eq!(stream.next().unwrap().kind(), TokenKind::Eof);
/// assert_eq!(stream.next(), None);
/// ```
pub trait IntoTokenStream {
    fn into_token_stream(self) -> VecDeque<Token>;
}

impl<I> IntoTokenStream for I
where
    I: Iterator<Item = Token>,
{
    fn into_token_stream(self) -> VecDeque<Token> {
        VecDeque::from_iter(self)
    }
}
