// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

use super::contents::Contents;
use parking_lot::{RwLock, RwLockReadGuard};
use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::convert::AsRef;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io;
use std::iter;
pub use std::path::{Path, PathBuf};
use std::sync::atomic::{self, AtomicU64};
use std::sync::Arc;

/// The state shared by every handle to the same file
struct SourceData {
    file_name: PathBuf,
    /// Hash of `file_name`, compared before the name itself
    name_hash: u64,
    contents: RwLock<Contents>,
    version: AtomicU64,
}

/// A thread-safe handle to a source file.
/// Handles are equal when they name the same file.
#[derive(Clone)]
pub struct Source {
    data: Arc<SourceData>,
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("file_name", &self.file_name())
            .field("version", &self.version())
            .finish()
    }
}

impl PartialEq for Source {
    fn eq(&self, other: &Self) -> bool {
        self.data.name_hash == other.data.name_hash && self.data.file_name == other.data.file_name
    }
}

impl Eq for Source {}

impl PartialOrd for Source {
    fn partial_cmp(&self, other: &Source) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Source {
    fn cmp(&self, other: &Source) -> Ordering {
        self.file_name().cmp(other.file_name())
    }
}

impl Hash for Source {
    fn hash<H: Hasher>(&self, hasher: &mut H) {
        hasher.write_u64(self.data.name_hash)
    }
}

impl Source {
    /// Creates a source from a (virtual) name and in-memory contents.
    ///
    /// Note: For differing values of `contents`, the value of `file_name`
    /// *must* differ as well.
    pub fn inline(file_name: &Path, contents: &str) -> Source {
        Source::from_contents(file_name, Contents::from_str(contents))
    }

    pub fn from_latin1_file(file_name: &Path) -> io::Result<Source> {
        Ok(Source::from_contents(
            file_name,
            Contents::from_latin1_file(file_name)?,
        ))
    }

    pub fn from_contents(file_name: &Path, contents: Contents) -> Source {
        let mut hasher = DefaultHasher::new();
        file_name.hash(&mut hasher);
        Source {
            data: Arc::new(SourceData {
                file_name: file_name.to_owned(),
                name_hash: hasher.finish(),
                contents: RwLock::new(contents),
                version: AtomicU64::new(0),
            }),
        }
    }

    pub fn contents(&self) -> RwLockReadGuard<'_, Contents> {
        self.data.contents.read()
    }

    /// A copy of the current text together with the version it belongs to.
    pub fn snapshot(&self) -> (u64, Contents) {
        let contents = self.contents();
        (self.version(), contents.clone())
    }

    pub fn text(&self) -> String {
        self.contents().text().to_owned()
    }

    /// Incremented on every change of the contents
    pub fn version(&self) -> u64 {
        self.data.version.load(atomic::Ordering::Acquire)
    }

    pub fn file_name(&self) -> &Path {
        &self.data.file_name
    }

    pub fn pos(&self, start: Position, end: Position) -> SrcPos {
        SrcPos {
            source: self.clone(),
            range: Range { start, end },
        }
    }

    /// Replaces `range` by `content`, or the whole text when there is no range.
    pub fn change(&self, range: Option<&Range>, content: &str) {
        let mut contents = self.data.contents.write();
        if let Some(range) = range {
            contents.change(range, content);
        } else {
            *contents = Contents::from_str(content);
        }
        self.data.version.fetch_add(1, atomic::Ordering::AcqRel);
    }
}

/// Columns a character takes up when a code context is shown
fn display_width(chr: char) -> usize {
    if chr == '\t' {
        4
    } else {
        1
    }
}

/// A lexical position (line, column) in a source.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Debug, Default)]
pub struct Position {
    /// Line (zero-based).
    pub line: u32,
    /// Column (zero-based), counted in utf-16 code units.
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Position {
        Position { line, character }
    }
}

/// A lexical range in a source.
#[derive(PartialEq, Eq, Clone, Copy, Hash, Debug)]
pub struct Range {
    /// Start of the range (inclusive).
    pub start: Position,
    /// End of the range (exclusive).
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Range {
        Range { start, end }
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos <= self.end
    }
}

/// A lexical range within a specific source file.
#[derive(PartialEq, Clone, Debug, Eq, Hash)]
pub struct SrcPos {
    /// The referenced source file.
    pub source: Source,
    pub range: Range,
}

impl Ord for SrcPos {
    fn cmp(&self, other: &Self) -> Ordering {
        self.source
            .cmp(&other.source)
            .then_with(|| self.range.start.cmp(&other.range.start))
            .then_with(|| self.range.end.cmp(&other.range.end))
    }
}

impl PartialOrd for SrcPos {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A generic object with an associated source file and lexical range.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct WithPos<T> {
    pub item: T,
    pub pos: SrcPos,
}

impl<T> WithPos<T> {
    pub fn new(item: T, pos: impl AsRef<SrcPos>) -> WithPos<T> {
        WithPos {
            item,
            pos: pos.as_ref().clone(),
        }
    }
}

impl<T> AsRef<SrcPos> for WithPos<T> {
    fn as_ref(&self) -> &SrcPos {
        &self.pos
    }
}

impl AsRef<SrcPos> for SrcPos {
    fn as_ref(&self) -> &SrcPos {
        self
    }
}

impl<T> From<WithPos<T>> for SrcPos {
    fn from(with_pos: WithPos<T>) -> SrcPos {
        with_pos.pos
    }
}

impl SrcPos {
    const LINE_CONTEXT: u32 = 2;

    pub fn new(source: Source, range: Range) -> SrcPos {
        SrcPos { source, range }
    }

    fn overlaps_line(&self, lineno: u32) -> bool {
        (self.range.start.line..=self.range.end.line).contains(&lineno)
    }

    /// Lines around the range, numbered from zero
    fn context_lines<'a>(&self, contents: &'a Contents) -> Vec<(u32, &'a str)> {
        let first = self.range.start.line.saturating_sub(Self::LINE_CONTEXT);
        let last = self.range.end.line + Self::LINE_CONTEXT;
        let lines: Vec<_> = (first..=last)
            .filter_map(|lineno| Some((lineno, contents.get_line(lineno as usize)?)))
            .collect();
        if lines.is_empty() {
            vec![(self.range.start.line, "")]
        } else {
            lines
        }
    }

    /// Width of the line number column, lines are shown 1-indexed
    fn gutter_width(&self) -> usize {
        (self.range.start.line + Self::LINE_CONTEXT + 1)
            .to_string()
            .len()
    }

    /// The `~~~` marking the part of `line` that is within the range
    fn markers(&self, lineno: u32, line: &str) -> String {
        let mut markers = String::new();
        let mut pos = Position::new(lineno, 0);
        for chr in line.chars() {
            if pos >= self.range.end {
                break;
            }
            let marker = if pos < self.range.start { ' ' } else { '~' };
            markers.extend(iter::repeat_n(marker, display_width(chr)));
            pos.character += chr.len_utf16() as u32;
        }
        if lineno == self.range.end.line && pos < self.range.end {
            let missing = self.range.end.character - pos.character;
            markers.extend(iter::repeat_n('~', missing as usize));
        }
        markers
    }

    fn render_context(&self, contents: &Contents) -> String {
        use pad::{Alignment, PadStr};

        let width = self.gutter_width();
        let mut result = String::new();
        for (lineno, line) in self.context_lines(contents) {
            let line = line.trim_end_matches(['\n', '\r']);
            let number = (lineno + 1)
                .to_string()
                .pad_to_width_with_alignment(width, Alignment::Right);
            let shown: String = line
                .trim_end()
                .chars()
                .flat_map(|chr| {
                    let shown = if chr == '\t' { ' ' } else { chr };
                    iter::repeat_n(shown, display_width(chr))
                })
                .collect();
            if self.overlaps_line(lineno) {
                result.push_str(&format!("{number} --> {shown}\n"));
                result.push_str(&format!(
                    "{:width$}  |  {}\n",
                    "",
                    self.markers(lineno, line)
                ));
            } else {
                result.push_str(&format!("{number}  |  {shown}\n"));
            }
        }
        result
    }

    /// The lines around the range with the range underlined
    pub fn code_context(&self) -> String {
        self.render_context(&self.source.contents())
    }

    pub fn show(&self, message: &str) -> String {
        let width = self.gutter_width();
        format!(
            "{message}\n{:width$} --> {}:{}\n{:width$}  |\n{}",
            "",
            self.file_name().to_string_lossy(),
            self.range.start.line + 1,
            "",
            self.code_context()
        )
    }

    pub fn start(&self) -> Position {
        self.range.start
    }

    pub fn end(&self) -> Position {
        self.range.end
    }

    pub fn range(&self) -> Range {
        self.range
    }

    pub fn file_name(&self) -> &Path {
        self.source.file_name()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.range.contains(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::Code;
    use pretty_assertions::assert_eq;

    #[test]
    fn change_increments_version() {
        let source = Source::inline(Path::new("a.vhd"), "hello");
        assert_eq!(source.version(), 0);
        source.change(None, "world");
        assert_eq!(source.version(), 1);
        source.change(
            Some(&Range::new(Position::new(0, 0), Position::new(0, 1))),
            "W",
        );
        assert_eq!(source.version(), 2);
        assert_eq!(source.text(), "World");
    }

    #[test]
    fn sources_are_equal_by_file_name() {
        let a = Source::inline(Path::new("a.vhd"), "hello");
        let b = Source::inline(Path::new("a.vhd"), "hello");
        let c = Source::inline(Path::new("c.vhd"), "hello");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn file_contents_are_latin1() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"-- caf\xe9\nentity e is end;\n").unwrap();
        let source = Source::from_latin1_file(file.path()).unwrap();
        assert_eq!(source.text(), "-- caf\u{e9}\nentity e is end;\n");
        assert_eq!(
            source
                .pos(Position::new(1, 7), Position::new(1, 8))
                .code_context(),
            "\
1  |  -- caf\u{e9}
2 --> entity e is end;
   |         ~
"
        );
    }

    #[test]
    fn underline_counts_utf16_and_expands_tabs() {
        let code = Code::new("\tx <= \"\u{e5}\u{e4}\u{f6}\";");
        assert_eq!(
            code.s1("\"\u{e5}\u{e4}\u{f6}\"").pos().code_context(),
            "\
1 -->     x <= \"\u{e5}\u{e4}\u{f6}\";
   |           ~~~~~
"
        );
    }

    #[test]
    fn range_over_several_lines() {
        let code = Code::new("process\nbegin\nend process;\n-- done\n");
        let pos = code.s1("begin\nend").pos();
        assert_eq!(
            pos.code_context(),
            "\
1  |  process
2 --> begin
   |  ~~~~~
3 --> end process;
   |  ~~~
4  |  -- done
"
        );
    }

    #[test]
    fn gutter_grows_with_line_numbers() {
        let text: String = (1..=12).map(|i| format!("-- {i}\n")).collect();
        let code = Code::new(&text);
        assert_eq!(
            code.s1("-- 9").pos().show("Comment"),
            format!(
                "\
Comment
   --> {}:9
    |
 7  |  -- 7
 8  |  -- 8
 9 --> -- 9
    |  ~~~~
10  |  -- 10
11  |  -- 11
",
                code.source().file_name().to_string_lossy()
            )
        );
    }

    #[test]
    fn positions_order_by_file_then_range() {
        let a = Source::inline(Path::new("a.vhd"), "abc\ndef");
        let b = Source::inline(Path::new("b.vhd"), "abc");
        let mut positions = vec![
            b.pos(Position::new(0, 0), Position::new(0, 1)),
            a.pos(Position::new(1, 0), Position::new(1, 1)),
            a.pos(Position::new(0, 0), Position::new(0, 2)),
            a.pos(Position::new(0, 0), Position::new(0, 1)),
        ];
        positions.sort();
        let ranges: Vec<_> = positions
            .iter()
            .map(|pos| (pos.file_name().to_owned(), pos.start(), pos.end()))
            .collect();
        assert_eq!(
            ranges,
            vec![
                (PathBuf::from("a.vhd"), Position::new(0, 0), Position::new(0, 1)),
                (PathBuf::from("a.vhd"), Position::new(0, 0), Position::new(0, 2)),
                (PathBuf::from("a.vhd"), Position::new(1, 0), Position::new(1, 1)),
                (PathBuf::from("b.vhd"), Position::new(0, 0), Position::new(0, 1)),
            ]
        );
    }
}
