// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

use crate::data::SrcPos;
use crate::declaration::Designator;
use std::fmt;

#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
pub enum Operator {
    And,
    Or,
    Nand,
    Nor,
    Xor,
    Xnor,
    EQ,
    NE,
    LT,
    LTE,
    GT,
    GTE,
    QueEQ,
    QueNE,
    QueLT,
    QueLTE,
    QueGT,
    QueGTE,
    /// The condition operator `??`
    QueQue,
    Sll,
    Srl,
    Sla,
    Sra,
    Rol,
    Ror,
    Plus,
    Minus,
    Concat,
    Times,
    Div,
    Mod,
    Rem,
    Pow,
    Abs,
    Not,
}

impl Operator {
    /// The designator of user defined functions for this operator
    pub fn symbol(&self) -> &'static str {
        use Operator::*;
        match self {
            And => "and",
            Or => "or",
            Nand => "nand",
            Nor => "nor",
            Xor => "xor",
            Xnor => "xnor",
            EQ => "=",
            NE => "/=",
            LT => "<",
            LTE => "<=",
            GT => ">",
            GTE => ">=",
            QueEQ => "?=",
            QueNE => "?/=",
            QueLT => "?<",
            QueLTE => "?<=",
            QueGT => "?>",
            QueGTE => "?>=",
            QueQue => "??",
            Sll => "sll",
            Srl => "srl",
            Sla => "sla",
            Sra => "sra",
            Rol => "rol",
            Ror => "ror",
            Plus => "+",
            Minus => "-",
            Concat => "&",
            Times => "*",
            Div => "/",
            Mod => "mod",
            Rem => "rem",
            Pow => "**",
            Abs => "abs",
            Not => "not",
        }
    }

    pub fn is_logical(&self) -> bool {
        use Operator::*;
        matches!(self, And | Or | Nand | Nor | Xor | Xnor)
    }

    pub fn is_relational(&self) -> bool {
        use Operator::*;
        matches!(self, EQ | NE | LT | LTE | GT | GTE)
    }

    pub fn is_matching_relational(&self) -> bool {
        use Operator::*;
        matches!(self, QueEQ | QueNE | QueLT | QueLTE | QueGT | QueGTE)
    }

    pub fn is_shift(&self) -> bool {
        use Operator::*;
        matches!(self, Sll | Srl | Sla | Sra | Rol | Ror)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.symbol())
    }
}

#[derive(PartialEq, Clone, Debug)]
pub enum Literal {
    Integer(i64),
    Real(f64),
    Character(char),
    /// The contents of a string literal, without quotes
    String(String),
    /// The value of a bit string literal, expanded to one character per bit
    BitString(String),
    Physical { value: f64, unit: Designator },
    Null,
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Clone, Debug)]
pub struct Assoc {
    pub formal: Option<Expr>,
    /// [ExprKind::Open] for `open`
    pub actual: Expr,
}

#[derive(Clone, Debug)]
pub struct ElementAssoc {
    /// Empty for positional associations
    pub choices: Vec<Expr>,
    pub value: Expr,
}

#[derive(Clone, Debug)]
pub enum ExprKind {
    Literal(Literal),
    Unary(Operator, Box<Expr>),
    Binary(Operator, Box<Expr>, Box<Expr>),
    Name(Designator),
    Selected(Box<Expr>, Suffix),
    CallOrIndex(Box<Expr>, Vec<Assoc>),
    Range(Box<Expr>, Direction, Box<Expr>),
    /// The attribute designator is stored in lower case
    Attribute(Box<Expr>, String),
    Aggregate(Vec<ElementAssoc>),
    Qualified(Box<Expr>, Box<Expr>),
    /// `integer range 0 to 7` used as a discrete range
    SubtypeRange(Box<Expr>, Box<Expr>),
    Allocator(Box<Expr>),
    Others,
    Open,
    /// Erroneous or unsupported syntax, such as external names
    Unknown,
}

#[derive(Clone, Debug)]
pub enum Suffix {
    Designator(Designator, SrcPos),
    All(SrcPos),
}

#[derive(Clone, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub pos: SrcPos,
}

impl Expr {
    pub fn new(kind: ExprKind, pos: SrcPos) -> Expr {
        Expr { kind, pos }
    }

    /// The designator of a simple name
    pub fn as_designator(&self) -> Option<&Designator> {
        if let ExprKind::Name(designator) = &self.kind {
            Some(designator)
        } else {
            None
        }
    }

    /// The prefix-most simple name of a name, `a` in `a.b(0)`
    pub fn base_name(&self) -> Option<(&Designator, &SrcPos)> {
        match &self.kind {
            ExprKind::Name(designator) => Some((designator, &self.pos)),
            ExprKind::Selected(prefix, _)
            | ExprKind::CallOrIndex(prefix, _)
            | ExprKind::Attribute(prefix, _) => prefix.base_name(),
            _ => None,
        }
    }

    /// A textual form of names used to compare type marks
    pub fn mark_text(&self) -> String {
        match &self.kind {
            ExprKind::Name(designator) => designator.normalized(),
            ExprKind::Selected(prefix, Suffix::Designator(designator, _)) => {
                format!("{}.{}", prefix.mark_text(), designator.normalized())
            }
            ExprKind::Selected(prefix, Suffix::All(_)) => format!("{}.all", prefix.mark_text()),
            ExprKind::CallOrIndex(prefix, _) => prefix.mark_text(),
            ExprKind::Attribute(prefix, attr) => format!("{}'{}", prefix.mark_text(), attr),
            _ => "?".to_owned(),
        }
    }
}

impl AsRef<crate::data::SrcPos> for Expr {
    fn as_ref(&self) -> &SrcPos {
        &self.pos
    }
}

#[derive(Clone, Debug)]
pub enum Constraint {
    Range(Expr),
    Index(Vec<Expr>),
}

#[derive(Clone, Debug)]
pub struct SubtypeInd {
    pub type_mark: Expr,
    pub resolution: Option<Expr>,
    pub constraint: Option<Constraint>,
    pub pos: SrcPos,
}

impl SubtypeInd {
    pub fn mark_text(&self) -> String {
        let mark = self.type_mark.mark_text();
        // Pair `a.b.t` with `t` by using the last segment
        match mark.rsplit_once('.') {
            Some((_, last)) if last != "all" => last.to_owned(),
            _ => mark,
        }
    }
}
