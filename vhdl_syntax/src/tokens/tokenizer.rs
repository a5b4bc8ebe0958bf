// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c)  2024, Lukas Scheller lukasscheller@icloud.com

use crate::tokens::TokenKind::*;
use crate::tokens::{Keyword as Kw, Token, TokenKind, Trivia, TriviaPiece};

pub trait Tokenize {
    fn tokenize(&self) -> Tokenizer<'_>;
}

impl Tokenize for str {
    fn tokenize(&self) -> Tokenizer<'_> {
        Tokenizer::new(self)
    }
}

impl Tokenize for String {
    fn tokenize(&self) -> Tokenizer<'_> {
        Tokenizer::new(self)
    }
}

/// The Tokenizer is an iterator over the tokens of a piece of text.
///
/// Every byte of the input ends up in exactly one token, either as token text
/// or as leading trivia. The last token is always of kind [TokenKind::Eof].
/// ```
/// use vhdl_syntax::tokens::{Keyword, TokenKind, Tokenizer};
///
/// let mut tokenizer = Tokenizer::new("entity foo");
/// assert_eq!(tokenizer.next().unwrap().kind(), TokenKind::Keyword(Keyword::Entity));
/// assert_eq!(tokenizer.next().unwrap().kind(), TokenKind::Identifier);
/// assert_eq!(tokenizer.next().unwrap().kind(), TokenKind::Eof);
/// assert_eq!(tokenizer.next(), None);
/// ```
pub struct Tokenizer<'a> {
    text: &'a str,
    pos: usize,
    /// The last token kind observed, used to decide whether a tick starts
    /// a character literal or an attribute
    last_token_kind: Option<TokenKind>,
    done: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(text: &'a str) -> Tokenizer<'a> {
        Tokenizer {
            text,
            pos: 0,
            last_token_kind: None,
            done: false,
        }
    }

    fn byte_at(&self, offset: usize) -> Option<u8> {
        self.text.as_bytes().get(self.pos + offset).copied()
    }

    fn current(&self) -> Option<u8> {
        self.byte_at(0)
    }

    /// Advances by one (possibly multi-byte) character.
    fn bump(&mut self) {
        if let Some(ch) = self.text[self.pos..].chars().next() {
            self.pos += ch.len_utf8();
        }
    }

    fn bump_n(&mut self, n: usize) {
        for _ in 0..n {
            self.bump()
        }
    }

    fn bump_while(&mut self, cond: impl Fn(u8) -> bool) {
        while self.current().is_some_and(&cond) {
            self.bump();
        }
    }

    fn count_while(&mut self, byte: u8) -> usize {
        let start = self.pos;
        self.bump_while(|b| b == byte);
        self.pos - start
    }

    fn trivia_piece(&mut self) -> Option<TriviaPiece> {
        let piece = match self.current()? {
            b' ' => TriviaPiece::Spaces(self.count_while(b' ')),
            b'\t' => TriviaPiece::Tabs(self.count_while(b'\t')),
            b'\n' => TriviaPiece::LineFeeds(self.count_while(b'\n')),
            b'\r' => TriviaPiece::CarriageReturns(self.count_while(b'\r')),
            0x0B | 0x0C => {
                let start = self.pos;
                self.bump_while(|b| matches!(b, 0x0B | 0x0C));
                TriviaPiece::Other(self.text[start..self.pos].to_string())
            }
            b'-' if self.byte_at(1) == Some(b'-') => {
                self.pos += 2;
                let start = self.pos;
                self.bump_while(|b| !matches!(b, b'\n' | b'\r'));
                TriviaPiece::LineComment(self.text[start..self.pos].to_string())
            }
            b'/' if self.byte_at(1) == Some(b'*') => {
                self.pos += 2;
                let start = self.pos;
                let end = match self.text[start..].find("*/") {
                    Some(len) => start + len,
                    None => self.text.len(),
                };
                let comment = self.text[start..end].to_string();
                self.pos = (end + 2).min(self.text.len());
                if end == self.text.len() {
                    // An unterminated block comment swallows the rest of the text
                    return Some(TriviaPiece::Other(self.text[start - 2..].to_string()));
                }
                TriviaPiece::BlockComment(comment)
            }
            _ if self.text[self.pos..].starts_with('\u{a0}') => {
                let start = self.pos;
                while self.text[self.pos..].starts_with('\u{a0}') {
                    self.bump();
                }
                TriviaPiece::Other(self.text[start..self.pos].to_string())
            }
            _ => return None,
        };
        Some(piece)
    }

    fn trivia(&mut self) -> Trivia {
        let mut trivia = Trivia::default();
        while let Some(piece) = self.trivia_piece() {
            trivia.push(piece);
        }
        trivia
    }

    /// Consumes a quoted sequence where the quote is escaped by repeating it.
    /// Quoted sequences never span multiple lines.
    fn quoted(&mut self, quote: u8) -> bool {
        self.pos += 1;
        loop {
            match self.current() {
                None | Some(b'\n') | Some(b'\r') => return false,
                Some(b) if b == quote => {
                    self.pos += 1;
                    if self.current() == Some(quote) {
                        self.pos += 1;
                    } else {
                        return true;
                    }
                }
                Some(_) => self.bump(),
            }
        }
    }

    fn is_base_specifier(text: &str) -> bool {
        matches!(
            text.to_ascii_lowercase().as_str(),
            "b" | "o" | "x" | "d" | "ub" | "uo" | "ux" | "sb" | "so" | "sx"
        )
    }

    /// identifier, keyword or bit string literal with a base specifier prefix
    fn word(&mut self) -> TokenKind {
        let start = self.pos;
        self.bump_while(|b| b.is_ascii_alphanumeric() || b == b'_');
        let word = &self.text[start..self.pos];
        if self.current() == Some(b'"') && Self::is_base_specifier(word) {
            return self.bit_string_value();
        }
        match Kw::from_identifier(word) {
            Some(kw) => Keyword(kw),
            None => Identifier,
        }
    }

    fn bit_string_value(&mut self) -> TokenKind {
        if self.quoted(b'"') {
            BitStringLiteral
        } else {
            Unterminated
        }
    }

    fn digits(&mut self) {
        self.bump_while(|b| b.is_ascii_digit() || b == b'_')
    }

    fn opt_exponent(&mut self) {
        if !matches!(self.current(), Some(b'e' | b'E')) {
            return;
        }
        let digit_at = match self.byte_at(1) {
            Some(b'+' | b'-') => 2,
            _ => 1,
        };
        if self.byte_at(digit_at).is_some_and(|b| b.is_ascii_digit()) {
            self.pos += digit_at;
            self.digits();
        }
    }

    /// ```ebnf
    /// decimal_literal ::= integer [ . integer ] [ exponent ]
    /// based_literal ::= integer # based_integer [ . based_integer ] # [ exponent ]
    /// bit_string_literal ::= [ integer ] base_specifier " [ bit_value ] "
    /// ```
    fn abstract_literal(&mut self) -> TokenKind {
        self.digits();
        match self.current() {
            Some(b'.') if self.byte_at(1).is_some_and(|b| b.is_ascii_digit()) => {
                self.pos += 1;
                self.digits();
                self.opt_exponent();
            }
            Some(b'#') => {
                self.pos += 1;
                self.bump_while(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'.');
                if self.current() != Some(b'#') {
                    return Unterminated;
                }
                self.pos += 1;
                self.opt_exponent();
            }
            Some(b) if b.is_ascii_alphabetic() => {
                let rest = &self.text[self.pos..];
                let prefix_len = rest
                    .bytes()
                    .take_while(|b| b.is_ascii_alphabetic())
                    .count();
                if rest.as_bytes().get(prefix_len) == Some(&b'"')
                    && Self::is_base_specifier(&rest[..prefix_len])
                {
                    self.pos += prefix_len;
                    return self.bit_string_value();
                }
                self.opt_exponent();
            }
            _ => {}
        }
        AbstractLiteral
    }

    fn tick_or_character(&mut self) -> TokenKind {
        let rest = &self.text[self.pos + 1..];
        let mut chars = rest.chars();
        if can_be_char(self.last_token_kind) {
            if let (Some(ch), Some('\'')) = (chars.next(), chars.next()) {
                self.pos += 2 + ch.len_utf8();
                return CharacterLiteral;
            }
        }
        self.pos += 1;
        Tick
    }

    /// Consumes the punctuation token starting at the current position.
    fn delimiter(&mut self, first: u8) -> TokenKind {
        let second = self.byte_at(1);
        let third = self.byte_at(2);
        let (kind, len) = match (first, second) {
            (b':', Some(b'=')) => (ColonEq, 2),
            (b':', _) => (Colon, 1),
            (b'=', Some(b'>')) => (RightArrow, 2),
            (b'=', _) => (EQ, 1),
            (b'<', Some(b'=')) => (LTE, 2),
            (b'<', Some(b'>')) => (BOX, 2),
            (b'<', Some(b'<')) => (LtLt, 2),
            (b'<', _) => (LT, 1),
            (b'>', Some(b'=')) => (GTE, 2),
            (b'>', Some(b'>')) => (GtGt, 2),
            (b'>', _) => (GT, 1),
            (b'/', Some(b'=')) => (NE, 2),
            (b'/', _) => (Div, 1),
            (b'*', Some(b'*')) => (Pow, 2),
            (b'*', _) => (Times, 1),
            (b'?', Some(b'?')) => (QueQue, 2),
            (b'?', Some(b'=')) => (QueEQ, 2),
            (b'?', Some(b'/')) if third == Some(b'=') => (QueNE, 3),
            (b'?', Some(b'<')) if third == Some(b'=') => (QueLTE, 3),
            (b'?', Some(b'<')) => (QueLT, 2),
            (b'?', Some(b'>')) if third == Some(b'=') => (QueGTE, 3),
            (b'?', Some(b'>')) => (QueGT, 2),
            (b'?', _) => (Que, 1),
            (b'-', _) => (Minus, 1),
            (b'+', _) => (Plus, 1),
            (b';', _) => (SemiColon, 1),
            (b'(', _) => (LeftPar, 1),
            (b')', _) => (RightPar, 1),
            (b'[', _) => (LeftSquare, 1),
            (b']', _) => (RightSquare, 1),
            (b'.', _) => (Dot, 1),
            (b'&', _) => (Concat, 1),
            (b',', _) => (Comma, 1),
            (b'|', _) => (Bar, 1),
            (b'^', _) => (Circ, 1),
            (b'@', _) => (CommAt, 1),
            _ => {
                self.bump();
                return Unknown;
            }
        };
        self.pos += len;
        kind
    }

    fn token_kind(&mut self, first: u8) -> TokenKind {
        match first {
            b'a'..=b'z' | b'A'..=b'Z' => self.word(),
            b'0'..=b'9' => self.abstract_literal(),
            b'\'' => self.tick_or_character(),
            b'"' => {
                if self.quoted(b'"') {
                    StringLiteral
                } else {
                    Unterminated
                }
            }
            b'\\' => {
                if self.quoted(b'\\') {
                    Identifier
                } else {
                    Unterminated
                }
            }
            b'`' => {
                self.bump_while(|b| !matches!(b, b'\n' | b'\r'));
                ToolDirective
            }
            _ => self.delimiter(first),
        }
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.done {
            return None;
        }
        let leading_trivia = self.trivia();
        let start = self.pos;
        let Some(first) = self.current() else {
            self.done = true;
            return Some(Token::new(Eof, leading_trivia, ""));
        };
        let kind = self.token_kind(first);
        if self.pos == start {
            // Never stall on input the rules above do not consume
            self.bump_n(1);
        }
        self.last_token_kind = Some(kind);
        Some(Token::new(kind, leading_trivia, &self.text[start..self.pos]))
    }
}

/// A character literal may not follow `]`, `)`, `all` or an identifier,
/// in which case the tick denotes an attribute or qualified expression.
fn can_be_char(last_token_kind: Option<TokenKind>) -> bool {
    !matches!(
        last_token_kind,
        Some(RightSquare | RightPar | Keyword(Kw::All) | Identifier)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(code: &str) -> Vec<TokenKind> {
        code.tokenize()
            .map(|tok| tok.kind())
            .filter(|kind| *kind != Eof)
            .collect()
    }

    fn texts(code: &str) -> Vec<String> {
        code.tokenize()
            .filter(|tok| tok.kind() != Eof)
            .map(|tok| tok.text().to_string())
            .collect()
    }

    #[test]
    fn keywords_ignore_case() {
        assert_eq!(
            kinds("Architecture ENTITY is"),
            vec![
                Keyword(Kw::Architecture),
                Keyword(Kw::Entity),
                Keyword(Kw::Is)
            ]
        );
    }

    #[test]
    fn identifiers() {
        assert_eq!(kinds("foo_bar2 \\ext id\\"), vec![Identifier, Identifier]);
        assert_eq!(texts("\\a\\\\b\\"), vec!["\\a\\\\b\\"]);
    }

    #[test]
    fn abstract_literals() {
        assert_eq!(
            texts("1 1_000 1.5 2.0e-3 16#FF# 2#1010#e2 1e3"),
            vec!["1", "1_000", "1.5", "2.0e-3", "16#FF#", "2#1010#e2", "1e3"]
        );
        assert!(kinds("1 1.5 16#FF#").iter().all(|k| *k == AbstractLiteral));
    }

    #[test]
    fn physical_literal_without_space() {
        assert_eq!(kinds("10ns"), vec![AbstractLiteral, Identifier]);
    }

    #[test]
    fn string_and_bit_string_literals() {
        assert_eq!(
            kinds("\"hello\" x\"FF\" 12UX\"0F\" b\"0101\" \"a\"\"b\""),
            vec![
                StringLiteral,
                BitStringLiteral,
                BitStringLiteral,
                BitStringLiteral,
                StringLiteral
            ]
        );
        assert_eq!(texts("\"a\"\"b\""), vec!["\"a\"\"b\""]);
    }

    #[test]
    fn unterminated_string_stops_at_line_end() {
        assert_eq!(kinds("\"abc\nfoo"), vec![Unterminated, Identifier]);
    }

    #[test]
    fn character_literals_and_ticks() {
        assert_eq!(
            kinds("'a' foo'length bar'('1') (')')"),
            vec![
                CharacterLiteral,
                Identifier,
                Tick,
                Identifier,
                Identifier,
                Tick,
                LeftPar,
                CharacterLiteral,
                RightPar,
                LeftPar,
                CharacterLiteral,
                RightPar
            ]
        );
        assert_eq!(
            kinds("all'x'"),
            vec![Keyword(Kw::All), Tick, Identifier, Tick]
        );
    }

    #[test]
    fn compound_delimiters() {
        assert_eq!(
            kinds(":= => <= >= /= ** <> ?= ?/= ?< ?<= ?> ?>= ?? << >>"),
            vec![
                ColonEq, RightArrow, LTE, GTE, NE, Pow, BOX, QueEQ, QueNE, QueLT, QueLTE, QueGT,
                QueGTE, QueQue, LtLt, GtGt
            ]
        );
    }

    #[test]
    fn comments_are_trivia() {
        let tokens: Vec<Token> = "-- first\nfoo /* block */ bar -- last".tokenize().collect();
        assert_eq!(tokens.len(), 3);
        assert_eq!(
            tokens[0].leading_trivia(),
            &Trivia::new([
                TriviaPiece::LineComment(" first".to_string()),
                TriviaPiece::LineFeeds(1)
            ])
        );
        assert_eq!(
            tokens[1].leading_trivia(),
            &Trivia::new([
                TriviaPiece::Spaces(1),
                TriviaPiece::BlockComment(" block ".to_string()),
                TriviaPiece::Spaces(1)
            ])
        );
        assert_eq!(tokens[2].kind(), Eof);
        assert_eq!(
            tokens[2].leading_trivia(),
            &Trivia::new([
                TriviaPiece::Spaces(1),
                TriviaPiece::LineComment(" last".to_string())
            ])
        );
    }

    #[test]
    fn tokens_reproduce_the_input() {
        let code = "entity ent is\r\n  port (a : in bit := '1'); -- c\n\tend; \u{a0}x\"f\" ä $";
        let joined: String = code.tokenize().map(|tok| tok.to_string()).collect();
        assert_eq!(joined, code);
    }

    #[test]
    fn unknown_characters() {
        assert_eq!(kinds("a $ b"), vec![Identifier, Unknown, Identifier]);
    }
}
