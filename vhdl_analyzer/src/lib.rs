// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com
#![allow(clippy::upper_case_acronyms)]

pub mod analysis;
mod config;
pub mod data;
pub mod declaration;
pub mod expression;
mod project;
pub mod resolve;
mod standard;
pub mod statement;
pub mod types;

#[cfg(test)]
mod test_util;

pub use crate::config::{
    AnalysisConfig, Config, ConfigError, LibraryConfig, UnsurePolicy, CONFIG_ENV_VAR,
    CONFIG_FILE_NAME,
};
pub use crate::data::{
    Category, Diagnostic, DiagnosticHandler, ErrorCode, Message, MessageHandler, MessageLogger,
    MessageType, NullDiagnostics, Position, Range, Severity, Source, SrcPos,
};

pub use crate::analysis::{
    declaration_at, deep_analyze, enclosing_declaration, find_all_references, AnalysisResult,
    DeclRef, DeepAnalysisResult, DirtyFlags, DocumentPipeline, DocumentWorker, ParseResult,
    PipelineEvent, PipelineListener, Reference, RunOutcome,
};
pub use crate::project::Project;
pub use crate::resolve::Registry;
pub use crate::standard::{add_builtin_libraries, analyze_source, BuiltinFile, BUILTIN_FILES};
