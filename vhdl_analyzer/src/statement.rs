// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

//! Concurrent and sequential statements lowered from the syntax tree.
//!
//! Statements that open a declarative region refer to their declaration,
//! the statements of the region are stored with the analysis result.

use crate::data::{SrcPos, WithPos};
use crate::declaration::{DeclId, Designator};
use crate::expression::ast::{Assoc, Expr};

#[derive(Clone, Debug)]
pub struct WaveformElement {
    pub value: Expr,
    pub after: Option<Expr>,
}

#[derive(Clone, Debug)]
pub struct ConditionalWaveform {
    /// Empty for `unaffected`
    pub waveform: Vec<WaveformElement>,
    pub condition: Option<Expr>,
}

#[derive(Clone, Debug)]
pub struct SelectedWaveform {
    pub waveform: Vec<WaveformElement>,
    pub choices: Vec<Expr>,
}

#[derive(Clone, Debug)]
pub enum InstantiatedUnit {
    Component(Expr),
    Entity(Expr),
    Configuration(Expr),
}

#[derive(Clone, Debug)]
pub struct GenerateBranch {
    /// `None` for the `else` branch of an if-generate
    pub condition: Option<Expr>,
    pub choices: Vec<Expr>,
    pub decl: DeclId,
}

#[derive(Clone, Debug)]
pub enum LoopScheme {
    Infinite,
    While(Expr),
    /// The loop parameter declaration
    For(DeclId),
}

#[derive(Clone, Debug)]
pub enum StmtKind {
    Process(DeclId),
    Block(DeclId),
    ForGenerate(DeclId),
    IfGenerate(Vec<GenerateBranch>),
    CaseGenerate {
        selector: Expr,
        branches: Vec<GenerateBranch>,
    },
    Instance {
        unit: InstantiatedUnit,
        generic_map: Vec<Assoc>,
        port_map: Vec<Assoc>,
    },
    SignalAssignment {
        target: Expr,
        waveforms: Vec<ConditionalWaveform>,
    },
    SelectedAssignment {
        selector: Expr,
        target: Expr,
        alternatives: Vec<SelectedWaveform>,
    },
    Assert {
        condition: Expr,
        report: Option<Expr>,
        severity: Option<Expr>,
    },
    ProcedureCall(Expr),
    VariableAssignment {
        target: Expr,
        /// The value and condition of every alternative
        values: Vec<(Expr, Option<Expr>)>,
    },
    Report {
        report: Expr,
        severity: Option<Expr>,
    },
    If(Vec<(Option<Expr>, Vec<Stmt>)>),
    Case {
        selector: Expr,
        alternatives: Vec<(Vec<Expr>, Vec<Stmt>)>,
    },
    Loop {
        scope: DeclId,
        scheme: LoopScheme,
        body: Vec<Stmt>,
    },
    Next {
        loop_label: Option<WithPos<Designator>>,
        condition: Option<Expr>,
    },
    Exit {
        loop_label: Option<WithPos<Designator>>,
        condition: Option<Expr>,
    },
    Return(Option<Expr>),
    Null,
    Wait {
        on: Vec<Expr>,
        until: Option<Expr>,
        timeout: Option<Expr>,
    },
}

#[derive(Clone, Debug)]
pub struct Stmt {
    pub label: Option<WithPos<Designator>>,
    pub kind: StmtKind,
    pub pos: SrcPos,
}

impl AsRef<SrcPos> for Stmt {
    fn as_ref(&self) -> &SrcPos {
        &self.pos
    }
}
