// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c)  2024, Lukas Scheller lukasscheller@icloud.com

use std::fmt::{Display, Formatter};

/// Reserved words of VHDL-2008.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
pub enum Keyword {
    Abs,
    Access,
    After,
    Alias,
    All,
    And,
    Architecture,
    Array,
    Assert,
    Attribute,
    Begin,
    Block,
    Body,
    Buffer,
    Bus,
    Case,
    Component,
    Configuration,
    Constant,
    Context,
    Disconnect,
    Downto,
    Else,
    Elsif,
    End,
    Entity,
    Exit,
    File,
    For,
    Force,
    Function,
    Generate,
    Generic,
    Group,
    Guarded,
    If,
    Impure,
    In,
    Inertial,
    Inout,
    Is,
    Label,
    Library,
    Linkage,
    Literal,
    Loop,
    Map,
    Mod,
    Nand,
    New,
    Next,
    Nor,
    Not,
    Null,
    Of,
    On,
    Open,
    Or,
    Others,
    Out,
    Package,
    Parameter,
    Port,
    Postponed,
    Procedure,
    Process,
    Protected,
    Pure,
    Range,
    Record,
    Register,
    Reject,
    Release,
    Rem,
    Report,
    Return,
    Rol,
    Ror,
    Select,
    Severity,
    Shared,
    Signal,
    Sla,
    Sll,
    Sra,
    Srl,
    Subtype,
    Then,
    To,
    Transport,
    Type,
    Unaffected,
    Units,
    Until,
    Use,
    Variable,
    Wait,
    When,
    While,
    With,
    Xnor,
    Xor,
}

impl Keyword {
    /// Looks up the keyword for an identifier, ignoring case.
    pub fn from_identifier(text: &str) -> Option<Keyword> {
        use Keyword::*;
        Some(match text.to_ascii_lowercase().as_str() {
            "abs" => Abs,
            "access" => Access,
            "after" => After,
            "alias" => Alias,
            "all" => All,
            "and" => And,
            "architecture" => Architecture,
            "array" => Array,
            "assert" => Assert,
            "attribute" => Attribute,
            "begin" => Begin,
            "block" => Block,
            "body" => Body,
            "buffer" => Buffer,
            "bus" => Bus,
            "case" => Case,
            "component" => Component,
            "configuration" => Configuration,
            "constant" => Constant,
            "context" => Context,
            "disconnect" => Disconnect,
            "downto" => Downto,
            "else" => Else,
            "elsif" => Elsif,
            "end" => End,
            "entity" => Entity,
            "exit" => Exit,
            "file" => File,
            "for" => For,
            "force" => Force,
            "function" => Function,
            "generate" => Generate,
            "generic" => Generic,
            "group" => Group,
            "guarded" => Guarded,
            "if" => If,
            "impure" => Impure,
            "in" => In,
            "inertial" => Inertial,
            "inout" => Inout,
            "is" => Is,
            "label" => Label,
            "library" => Library,
            "linkage" => Linkage,
            "literal" => Literal,
            "loop" => Loop,
            "map" => Map,
            "mod" => Mod,
            "nand" => Nand,
            "new" => New,
            "next" => Next,
            "nor" => Nor,
            "not" => Not,
            "null" => Null,
            "of" => Of,
            "on" => On,
            "open" => Open,
            "or" => Or,
            "others" => Others,
            "out" => Out,
            "package" => Package,
            "parameter" => Parameter,
            "port" => Port,
            "postponed" => Postponed,
            "procedure" => Procedure,
            "process" => Process,
            "protected" => Protected,
            "pure" => Pure,
            "range" => Range,
            "record" => Record,
            "register" => Register,
            "reject" => Reject,
            "release" => Release,
            "rem" => Rem,
            "report" => Report,
            "return" => Return,
            "rol" => Rol,
            "ror" => Ror,
            "select" => Select,
            "severity" => Severity,
            "shared" => Shared,
            "signal" => Signal,
            "sla" => Sla,
            "sll" => Sll,
            "sra" => Sra,
            "srl" => Srl,
            "subtype" => Subtype,
            "then" => Then,
            "to" => To,
            "transport" => Transport,
            "type" => Type,
            "unaffected" => Unaffected,
            "units" => Units,
            "until" => Until,
            "use" => Use,
            "variable" => Variable,
            "wait" => Wait,
            "when" => When,
            "while" => While,
            "with" => With,
            "xnor" => Xnor,
            "xor" => Xor,
            _ => return None,
        })
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format!("{self:?}").to_ascii_lowercase())
    }
}

#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
pub enum TokenKind {
    Keyword(Keyword),
    Identifier,
    AbstractLiteral,
    StringLiteral,
    BitStringLiteral,
    CharacterLiteral,
    ToolDirective,

    Tick,
    LeftPar,
    RightPar,
    LeftSquare,
    RightSquare,
    SemiColon,
    Colon,
    Bar,
    Dot,
    BOX,
    LtLt,
    GtGt,
    Circ,
    CommAt,
    Concat,
    Comma,
    ColonEq,
    RightArrow,

    Plus,
    Minus,
    Times,
    Pow,
    Div,
    EQ,
    NE,
    LT,
    LTE,
    GT,
    GTE,
    QueQue,
    QueEQ,
    QueNE,
    QueLT,
    QueLTE,
    QueGT,
    QueGTE,
    Que,

    /// A string, character or extended identifier that misses its closing quote
    Unterminated,
    /// Any character that cannot start a token
    Unknown,
    /// Zero-width token that carries the trivia at the end of the text
    Eof,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use TokenKind::*;
        let text = match self {
            Keyword(kw) => return write!(f, "'{kw}'"),
            Identifier => "identifier",
            AbstractLiteral => "abstract literal",
            StringLiteral => "string literal",
            BitStringLiteral => "bit string literal",
            CharacterLiteral => "character literal",
            ToolDirective => "tool directive",
            Tick => "'''",
            LeftPar => "'('",
            RightPar => "')'",
            LeftSquare => "'['",
            RightSquare => "']'",
            SemiColon => "';'",
            Colon => "':'",
            Bar => "'|'",
            Dot => "'.'",
            BOX => "'<>'",
            LtLt => "'<<'",
            GtGt => "'>>'",
            Circ => "'^'",
            CommAt => "'@'",
            Concat => "'&'",
            Comma => "','",
            ColonEq => "':='",
            RightArrow => "'=>'",
            Plus => "'+'",
            Minus => "'-'",
            Times => "'*'",
            Pow => "'**'",
            Div => "'/'",
            EQ => "'='",
            NE => "'/='",
            LT => "'<'",
            LTE => "'<='",
            GT => "'>'",
            GTE => "'>='",
            QueQue => "'??'",
            QueEQ => "'?='",
            QueNE => "'?/='",
            QueLT => "'?<'",
            QueLTE => "'?<='",
            QueGT => "'?>'",
            QueGTE => "'?>='",
            Que => "'?'",
            Unterminated => "unterminated literal",
            Unknown => "unknown character",
            Eof => "end of file",
        };
        write!(f, "{text}")
    }
}
