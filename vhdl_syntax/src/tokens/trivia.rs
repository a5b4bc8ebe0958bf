// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c)  2024, Lukas Scheller lukasscheller@icloud.com

use std::fmt::{Display, Formatter};

/// A single run of text that carries no meaning for the analysis.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum TriviaPiece {
    Spaces(usize),
    Tabs(usize),
    LineFeeds(usize),
    CarriageReturns(usize),
    /// A comment starting with `--`, without the leading dashes and the line break
    LineComment(String),
    /// A comment enclosed in `/*` and `*/`, without the delimiters
    BlockComment(String),
    /// Any other format effector, such as form feeds or vertical tabs
    Other(String),
}

impl TriviaPiece {
    pub fn byte_len(&self) -> usize {
        use TriviaPiece::*;
        match self {
            Spaces(n) | Tabs(n) | LineFeeds(n) | CarriageReturns(n) => *n,
            LineComment(text) => 2 + text.len(),
            BlockComment(text) => 4 + text.len(),
            Other(text) => text.len(),
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(
            self,
            TriviaPiece::LineComment(_) | TriviaPiece::BlockComment(_)
        )
    }
}

impl Display for TriviaPiece {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use TriviaPiece::*;
        match self {
            Spaces(n) => write!(f, "{}", " ".repeat(*n)),
            Tabs(n) => write!(f, "{}", "\t".repeat(*n)),
            LineFeeds(n) => write!(f, "{}", "\n".repeat(*n)),
            CarriageReturns(n) => write!(f, "{}", "\r".repeat(*n)),
            LineComment(text) => write!(f, "--{text}"),
            BlockComment(text) => write!(f, "/*{text}*/"),
            Other(text) => write!(f, "{text}"),
        }
    }
}

/// Whitespace and comments preceding a token.
#[derive(Eq, PartialEq, Debug, Default, Clone)]
pub struct Trivia {
    pub pieces: Vec<TriviaPiece>,
}

impl Trivia {
    pub fn new(pieces: impl Into<Vec<TriviaPiece>>) -> Trivia {
        Trivia {
            pieces: pieces.into(),
        }
    }

    pub fn byte_len(&self) -> usize {
        self.pieces.iter().map(TriviaPiece::byte_len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn push(&mut self, piece: TriviaPiece) {
        self.pieces.push(piece)
    }

    pub fn comments(&self) -> impl Iterator<Item = &TriviaPiece> {
        self.pieces.iter().filter(|piece| piece.is_comment())
    }
}

impl Display for Trivia {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for piece in &self.pieces {
            write!(f, "{piece}")?;
        }
        Ok(())
    }
}
