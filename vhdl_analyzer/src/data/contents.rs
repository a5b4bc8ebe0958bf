// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2019, Olof Kraigher olof.kraigher@gmail.com

use super::source::{Position, Range};
use std::fs::File;
use std::io;
use std::io::prelude::Read;
use std::path::Path;

/// The text of a document together with the byte offset of every line start.
///
/// The syntax tree addresses text by byte offset while editors address it by
/// line and utf-16 column. `Contents` converts between the two.
#[derive(Debug, Clone)]
pub struct Contents {
    text: String,
    line_starts: Vec<usize>,
}

impl Contents {
    /// VHDL files are Latin-1 encoded, every byte is one character.
    pub fn from_latin1_file(file_name: &Path) -> io::Result<Contents> {
        let mut file = File::open(file_name)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        let text: String = bytes.into_iter().map(char::from).collect();
        Ok(Contents::from_str(&text))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(code: &str) -> Contents {
        let text = code.to_owned();
        let line_starts = line_starts(&text);
        Contents { text, line_starts }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn start(&self) -> Position {
        Position::default()
    }

    pub fn end(&self) -> Position {
        self.position_at(self.text.len())
    }

    /// The empty remainder after a final line break does not count as a line
    pub fn num_lines(&self) -> usize {
        match self.line_starts.last() {
            Some(&start) if start == self.text.len() && self.line_starts.len() > 1 => {
                self.line_starts.len() - 1
            }
            _ => self.line_starts.len(),
        }
    }

    /// The text of a line including its line break
    pub fn get_line(&self, lineno: usize) -> Option<&str> {
        if lineno >= self.num_lines() {
            return None;
        }
        let start = *self.line_starts.get(lineno)?;
        let end = self
            .line_starts
            .get(lineno + 1)
            .copied()
            .unwrap_or(self.text.len());
        self.text.get(start..end)
    }

    /// The position of a byte offset. Offsets past the end map to the end.
    pub fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next.saturating_sub(1),
        };
        let line_start = self.line_starts.get(line).copied().unwrap_or(0);
        let character = self
            .text
            .get(line_start..offset)
            .map(|prefix| prefix.chars().map(char::len_utf16).sum::<usize>())
            .unwrap_or(0);
        Position::new(line as u32, character as u32)
    }

    /// The byte offset of a position. Columns past the end of a line map to the line end.
    pub fn offset_at(&self, pos: Position) -> usize {
        let Some(line) = self.get_line(pos.line as usize) else {
            return self.text.len();
        };
        let line_start = self
            .line_starts
            .get(pos.line as usize)
            .copied()
            .unwrap_or(0);
        let mut character = 0;
        for (idx, chr) in line.char_indices() {
            if character >= pos.character as usize || chr == '\n' || chr == '\r' {
                return line_start + idx;
            }
            character += chr.len_utf16();
        }
        line_start + line.len()
    }

    pub fn range_of(&self, span: std::ops::Range<usize>) -> Range {
        Range::new(self.position_at(span.start), self.position_at(span.end))
    }

    /// Replaces the text within `range` by `content`
    pub fn change(&mut self, range: &Range, content: &str) {
        let start = self.offset_at(range.start);
        let end = self.offset_at(range.end).max(start);
        self.text.replace_range(start..end, content);
        self.line_starts = line_starts(&self.text);
    }
}

/// A line ends after `\n`, after `\r\n` or after a lone `\r`
fn line_starts(text: &str) -> Vec<usize> {
    let bytes = text.as_bytes();
    let mut starts = vec![0];
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => starts.push(i + 1),
            b'\r' => {
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                starts.push(i + 1);
            }
            _ => {}
        }
        i += 1;
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn new(code: &str) -> Contents {
        Contents::from_str(code)
    }

    #[test]
    fn empty_contents() {
        let contents = new("");
        assert_eq!(contents.num_lines(), 1);
        assert_eq!(contents.get_line(0), Some(""));
        assert_eq!(contents.end(), Position::new(0, 0));
    }

    #[test]
    fn lines_keep_line_breaks() {
        let contents = new("hello\r\nworld\rline\n");
        assert_eq!(contents.num_lines(), 3);
        assert_eq!(contents.get_line(0), Some("hello\r\n"));
        assert_eq!(contents.get_line(1), Some("world\r"));
        assert_eq!(contents.get_line(2), Some("line\n"));
        assert_eq!(contents.get_line(3), None);
    }

    #[test]
    fn position_of_offset() {
        let contents = new("ab\ncd\n");
        assert_eq!(contents.position_at(0), Position::new(0, 0));
        assert_eq!(contents.position_at(2), Position::new(0, 2));
        assert_eq!(contents.position_at(3), Position::new(1, 0));
        assert_eq!(contents.position_at(4), Position::new(1, 1));
        assert_eq!(contents.position_at(100), Position::new(2, 0));
    }

    #[test]
    fn position_counts_utf16_code_units() {
        let contents = new("åä\u{1F4A3}x");
        let offset = contents.text().find('x').unwrap();
        assert_eq!(contents.position_at(offset), Position::new(0, 4));
        assert_eq!(contents.offset_at(Position::new(0, 4)), offset);
    }

    #[test]
    fn offset_of_position_is_clamped_to_line() {
        let contents = new("ab\ncd");
        assert_eq!(contents.offset_at(Position::new(0, 10)), 2);
        assert_eq!(contents.offset_at(Position::new(1, 1)), 4);
        assert_eq!(contents.offset_at(Position::new(5, 0)), 5);
    }

    #[test]
    fn change_within_line() {
        let mut contents = new("hello world\n");
        contents.change(
            &Range::new(Position::new(0, 6), Position::new(0, 11)),
            "there",
        );
        assert_eq!(contents.text(), "hello there\n");
    }

    #[test]
    fn change_across_lines() {
        let mut contents = new("hello\nworld\nline\n");
        contents.change(
            &Range::new(Position::new(0, 2), Position::new(2, 2)),
            "X\nY",
        );
        assert_eq!(contents.text(), "heX\nYne\n");
        assert_eq!(contents.num_lines(), 2);
        assert_eq!(contents.get_line(1), Some("Yne\n"));
    }

    #[test]
    fn change_insert_at_end() {
        let mut contents = new("a");
        let end = contents.end();
        contents.change(&Range::new(end, end), "\nb");
        assert_eq!(contents.text(), "a\nb");
    }

    #[test]
    fn from_latin1_file() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[b'a', 0xE5, b'\n']).unwrap();
        let contents = Contents::from_latin1_file(file.path()).unwrap();
        assert_eq!(contents.text(), "aå\n");
    }
}
