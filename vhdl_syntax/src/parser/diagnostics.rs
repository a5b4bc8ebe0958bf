// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c)  2024, Lukas Scheller lukasscheller@icloud.com

use crate::tokens::TokenKind;
use std::fmt::{Display, Formatter};

/// Errors that occur during parsing.
/// These are not stringified so that downstream listeners
/// can react dynamically without having to parse the message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserError {
    /// One of the provided token kinds was expected
    ExpectingTokens(Box<[TokenKind]>),
    ExpectingExpression,
    ExpectingDeclaration,
    ExpectingStatement,
    ExpectingDesignUnit,
    /// An unexpected End-of file was detected
    Eof,
}

impl Display for ParserError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ParserError::ExpectingTokens(kinds) => {
                write!(f, "Expecting ")?;
                for (i, kind) in kinds.iter().enumerate() {
                    if i + 1 == kinds.len() && i > 0 {
                        write!(f, " or ")?;
                    } else if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{kind}")?;
                }
                Ok(())
            }
            ParserError::ExpectingExpression => write!(f, "Expecting expression"),
            ParserError::ExpectingDeclaration => write!(f, "Expecting declaration"),
            ParserError::ExpectingStatement => write!(f, "Expecting statement"),
            ParserError::ExpectingDesignUnit => write!(f, "Expecting design unit"),
            ParserError::Eof => write!(f, "Unexpected end of file"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserDiagnostic {
    /// Byte offset of the offending token text
    pub text_pos: usize,
    /// Length of the offending token text
    pub text_len: usize,
    pub error: ParserError,
}

impl ParserDiagnostic {
    pub fn new(text_pos: usize, text_len: usize, error: ParserError) -> ParserDiagnostic {
        ParserDiagnostic {
            text_pos,
            text_len,
            error,
        }
    }
}

impl Display for ParserDiagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}
