// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

use crate::data::{SrcPos, Symbol};
use crate::expression::ast::{Expr, SubtypeInd};
use std::fmt;
use std::ops;
use std::sync::Arc;

/// Index of a declaration within the arena of one analysis result
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub(crate) usize);

impl DeclId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// The undecorated name of a declaration
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Designator {
    Identifier(Symbol),
    /// `"and"`, `"+"`, stored in lower case without quotes
    OperatorSymbol(Arc<str>),
    Character(char),
    /// Unlabeled processes, generates and loops
    Anonymous,
}

impl Designator {
    /// The key used in tree paths and name lookup
    pub fn normalized(&self) -> String {
        match self {
            Designator::Identifier(sym) if sym.is_extended() => sym.name().to_owned(),
            Designator::Identifier(sym) => sym.name().to_lowercase(),
            Designator::OperatorSymbol(op) => format!("\"{op}\""),
            Designator::Character(chr) => format!("'{chr}'"),
            Designator::Anonymous => String::new(),
        }
    }
}

impl fmt::Display for Designator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Designator::Identifier(sym) => write!(f, "{sym}"),
            Designator::OperatorSymbol(op) => write!(f, "\"{op}\""),
            Designator::Character(chr) => write!(f, "'{chr}'"),
            Designator::Anonymous => write!(f, "<anonymous>"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    In,
    Out,
    Inout,
    Buffer,
    Linkage,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Mode::In => "in",
            Mode::Out => "out",
            Mode::Inout => "inout",
            Mode::Buffer => "buffer",
            Mode::Linkage => "linkage",
        };
        write!(f, "{text}")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectClass {
    Signal,
    Constant,
    Variable,
    SharedVariable,
    File,
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ObjectClass::Signal => "signal",
            ObjectClass::Constant => "constant",
            ObjectClass::Variable => "variable",
            ObjectClass::SharedVariable => "shared variable",
            ObjectClass::File => "file",
        };
        write!(f, "{text}")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectRole {
    Local,
    Port(Mode),
    Generic,
    Parameter(Mode),
    LoopParameter,
}

#[derive(Clone, Debug)]
pub struct ObjectDecl {
    pub class: ObjectClass,
    pub role: ObjectRole,
    /// `None` for loop and generate parameters
    pub subtype: Option<SubtypeInd>,
    pub default: Option<Expr>,
    /// The discrete range of a loop or generate parameter
    pub range: Option<Expr>,
}

impl ObjectDecl {
    pub fn mode(&self) -> Option<Mode> {
        match self.role {
            ObjectRole::Port(mode) | ObjectRole::Parameter(mode) => Some(mode),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub enum IndexDef {
    /// `natural range <>`
    Unconstrained(Expr),
    Constrained(Expr),
}

#[derive(Clone, Debug)]
pub enum TypeDef {
    Enumeration(Vec<DeclId>),
    /// An integer or floating point type, decided by the bounds
    Range(Expr),
    Physical { range: Expr, units: Vec<DeclId> },
    Array { indexes: Vec<IndexDef>, element: SubtypeInd },
    Record(Vec<DeclId>),
    Access(SubtypeInd),
    File(Expr),
    Protected,
    /// `type t;`
    Incomplete,
}

#[derive(Clone, Debug)]
pub struct SubprogramDecl {
    pub is_function: bool,
    pub is_body: bool,
    pub params: Vec<DeclId>,
    pub return_type: Option<Expr>,
    /// The type marks of the parameters and the return type, used to pair bodies with declarations
    pub signature: String,
}

#[derive(Clone, Debug)]
pub enum Sensitivity {
    None,
    All,
    List(Vec<Expr>),
}

#[derive(Clone, Debug)]
pub enum DeclKind {
    /// The root of every document
    File,
    /// `library ieee;` and the implicit `std` and `work` libraries
    Library(Symbol),
    Entity,
    Architecture { entity: Designator, entity_pos: SrcPos },
    Package,
    PackageBody,
    Context,
    Object(ObjectDecl),
    Type(TypeDef),
    Subtype(SubtypeInd),
    EnumLiteral { ty: DeclId, ordinal: usize },
    PhysicalUnit { ty: DeclId, factor: Option<Expr> },
    Subprogram(SubprogramDecl),
    Alias { subtype: Option<SubtypeInd>, target: Expr },
    Attribute { type_mark: Expr },
    Component,
    RecordField(SubtypeInd),
    Process(Sensitivity),
    Block,
    Generate,
    Instance,
    LoopScope,
}

impl DeclKind {
    pub fn describe(&self) -> &'static str {
        match self {
            DeclKind::File => "file",
            DeclKind::Library(..) => "library",
            DeclKind::Entity => "entity",
            DeclKind::Architecture { .. } => "architecture",
            DeclKind::Package => "package",
            DeclKind::PackageBody => "package body",
            DeclKind::Context => "context",
            DeclKind::Object(object) => match (object.role, object.class) {
                (ObjectRole::Port(_), _) => "port",
                (ObjectRole::Generic, _) => "generic",
                (ObjectRole::Parameter(_), _) => "parameter",
                (ObjectRole::LoopParameter, _) => "loop parameter",
                (_, ObjectClass::Signal) => "signal",
                (_, ObjectClass::Constant) => "constant",
                (_, ObjectClass::Variable) => "variable",
                (_, ObjectClass::SharedVariable) => "shared variable",
                (_, ObjectClass::File) => "file",
            },
            DeclKind::Type(..) => "type",
            DeclKind::Subtype(..) => "subtype",
            DeclKind::EnumLiteral { .. } => "enumeration literal",
            DeclKind::PhysicalUnit { .. } => "physical unit",
            DeclKind::Subprogram(subprogram) => {
                if subprogram.is_function {
                    "function"
                } else {
                    "procedure"
                }
            }
            DeclKind::Alias { .. } => "alias",
            DeclKind::Attribute { .. } => "attribute",
            DeclKind::Component => "component",
            DeclKind::RecordField(..) => "record element",
            DeclKind::Process(..) => "process",
            DeclKind::Block => "block",
            DeclKind::Generate => "generate",
            DeclKind::Instance => "instance",
            DeclKind::LoopScope => "loop",
        }
    }

    /// Overloadable declarations do not hide each other
    pub fn is_overloadable(&self) -> bool {
        matches!(self, DeclKind::Subprogram(..) | DeclKind::EnumLiteral { .. })
    }

    /// Declarations that open a declarative region
    pub fn is_scope(&self) -> bool {
        matches!(
            self,
            DeclKind::File
                | DeclKind::Entity
                | DeclKind::Architecture { .. }
                | DeclKind::Package
                | DeclKind::PackageBody
                | DeclKind::Subprogram(..)
                | DeclKind::Component
                | DeclKind::Process(..)
                | DeclKind::Block
                | DeclKind::Generate
                | DeclKind::LoopScope
                | DeclKind::Type(TypeDef::Record(..))
        )
    }

    pub fn is_primary_unit(&self) -> bool {
        matches!(
            self,
            DeclKind::Entity | DeclKind::Package | DeclKind::Context
        )
    }

    pub fn as_object(&self) -> Option<&ObjectDecl> {
        if let DeclKind::Object(object) = self {
            Some(object)
        } else {
            None
        }
    }

    pub fn as_subprogram(&self) -> Option<&SubprogramDecl> {
        if let DeclKind::Subprogram(subprogram) = self {
            Some(subprogram)
        } else {
            None
        }
    }
}

/// A named entity in the declaration tree of one document
#[derive(Clone, Debug)]
pub struct Declaration {
    pub id: DeclId,
    /// The designator decorated with `@declaration`, `@body` or `@N` to be unique within its parent
    pub name: Arc<str>,
    pub designator: Designator,
    /// Dot-joined names of the ancestors and this declaration
    pub tree_path: Arc<str>,
    pub kind: DeclKind,
    pub span: SrcPos,
    pub name_span: Option<SrcPos>,
    /// Byte range of the declaring syntax node
    pub byte_span: ops::Range<usize>,
    pub parent: Option<DeclId>,
    pub children: Vec<DeclId>,
}

impl Declaration {
    /// The position to report diagnostics about this declaration on
    pub fn decl_pos(&self) -> &SrcPos {
        self.name_span.as_ref().unwrap_or(&self.span)
    }

    pub fn describe(&self) -> String {
        match self.designator {
            Designator::Anonymous => self.kind.describe().to_owned(),
            _ => format!("{} '{}'", self.kind.describe(), self.designator),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SymbolTable;

    #[test]
    fn normalized_designators() {
        let symbols = SymbolTable::new();
        assert_eq!(
            Designator::Identifier(symbols.insert("Foo")).normalized(),
            "foo"
        );
        assert_eq!(
            Designator::Identifier(symbols.insert("\\Foo\\")).normalized(),
            "\\Foo\\"
        );
        assert_eq!(
            Designator::OperatorSymbol(Arc::from("and")).normalized(),
            "\"and\""
        );
        assert_eq!(Designator::Character('0').normalized(), "'0'");
    }
}
