// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

use crate::data::{Position, Source, SrcPos};
use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;
use std::ops;
use std::path::{Path, PathBuf};

/// A window into a source used to refer to substrings in tests
#[derive(Clone, Debug)]
pub struct Code {
    pos: SrcPos,
    span: ops::Range<usize>,
}

impl Code {
    /// The file name is derived from the contents so that different code gets different sources
    pub fn new(code: &str) -> Code {
        let mut hasher = DefaultHasher::new();
        hasher.write(code.as_bytes());
        let file_name = PathBuf::from(format!("{}.vhd", hasher.finish()));
        Code::with_file_name(&file_name, code)
    }

    pub fn with_file_name(file_name: &Path, code: &str) -> Code {
        Code::from_source(Source::inline(file_name, code))
    }

    pub fn from_source(source: Source) -> Code {
        let len = source.contents().text().len();
        let pos = source.pos(Position::default(), source.contents().end());
        Code { pos, span: 0..len }
    }

    fn in_span(&self, span: ops::Range<usize>) -> Code {
        let range = self.source().contents().range_of(span.clone());
        Code {
            pos: SrcPos::new(self.source().clone(), range),
            span,
        }
    }

    /// Create new Code from n:th occurence of substr
    pub fn s(&self, substr: &str, occurence: usize) -> Code {
        let text = self.source().text();
        let window = &text[self.span.clone()];
        let mut start = None;
        let mut from = 0;
        for _ in 0..occurence {
            match window[from..].find(substr) {
                Some(idx) => {
                    start = Some(from + idx);
                    from += idx + 1;
                }
                None => panic!("Could not find occurence {occurence} of {substr:?}"),
            }
        }
        let start = self.span.start + start.unwrap();
        self.in_span(start..start + substr.len())
    }

    /// Create new Code from first occurence of substr
    pub fn s1(&self, substr: &str) -> Code {
        self.s(substr, 1)
    }

    /// The first occurence of before + substr at the position of substr
    pub fn sa(&self, before: &str, substr: &str) -> Code {
        let code = self.s1(&format!("{before}{substr}"));
        code.in_span(code.span.start + before.len()..code.span.end)
    }

    /// The first occurence of substr + after at the position of substr
    pub fn sb(&self, substr: &str, after: &str) -> Code {
        self.s1(&format!("{substr}{after}")).s1(substr)
    }

    pub fn pos(&self) -> SrcPos {
        self.pos.clone()
    }

    pub fn start(&self) -> Position {
        self.pos.start()
    }

    pub fn end(&self) -> Position {
        self.pos.end()
    }

    pub fn source(&self) -> &Source {
        &self.pos.source
    }
}

impl AsRef<SrcPos> for Code {
    fn as_ref(&self) -> &SrcPos {
        &self.pos
    }
}

#[test]
fn code_substrings() {
    let code = Code::new("foo bar baz bar");
    assert_eq!(code.s1("bar").start(), Position::new(0, 4));
    assert_eq!(code.s("bar", 2).start(), Position::new(0, 12));
    assert_eq!(code.sa("baz ", "bar").start(), Position::new(0, 12));
    assert_eq!(code.sb("ba", "z").start(), Position::new(0, 8));
}
