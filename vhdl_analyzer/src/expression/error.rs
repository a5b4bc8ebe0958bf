// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

use crate::data::{Diagnostic, ErrorCode, SrcPos};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    OperatorNotApplicable,
    AmbiguousCall,
    WrongArgumentCount,
    NoCandidates,
    Unresolved,
    RecursionLimit,
    IllegalAttribute,
    /// A name denotes something else than a value, such as a type or a library
    MismatchedKinds,
    TypeMismatch,
}

impl EvalErrorKind {
    pub fn code(&self) -> ErrorCode {
        match self {
            EvalErrorKind::OperatorNotApplicable => ErrorCode::OperatorNotApplicable,
            EvalErrorKind::AmbiguousCall => ErrorCode::AmbiguousCall,
            EvalErrorKind::WrongArgumentCount => ErrorCode::TooManyArguments,
            EvalErrorKind::NoCandidates => ErrorCode::NoOverloadCandidates,
            EvalErrorKind::Unresolved => ErrorCode::NotDeclared,
            EvalErrorKind::RecursionLimit => ErrorCode::RecursionLimit,
            EvalErrorKind::IllegalAttribute => ErrorCode::IllegalAttribute,
            EvalErrorKind::MismatchedKinds => ErrorCode::MismatchedKinds,
            EvalErrorKind::TypeMismatch => ErrorCode::TypeMismatch,
        }
    }
}

/// A failure to evaluate an expression, reported on the expression
#[derive(Clone, Debug, Error)]
#[error("{message}")]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub message: String,
    pub pos: SrcPos,
}

pub type EvalResult<T> = Result<T, EvalError>;

impl EvalError {
    pub fn new(
        kind: EvalErrorKind,
        message: impl Into<String>,
        pos: impl AsRef<SrcPos>,
    ) -> EvalError {
        EvalError {
            kind,
            message: message.into(),
            pos: pos.as_ref().clone(),
        }
    }

    pub fn unresolved(name: impl std::fmt::Display, pos: impl AsRef<SrcPos>) -> EvalError {
        EvalError::new(
            EvalErrorKind::Unresolved,
            format!("No declaration of '{name}'"),
            pos,
        )
    }

    pub fn into_diagnostic(self) -> Diagnostic {
        Diagnostic::error(&self.pos, self.message, self.kind.code())
    }
}

impl From<EvalError> for Diagnostic {
    fn from(error: EvalError) -> Diagnostic {
        error.into_diagnostic()
    }
}
