// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2019, Olof Kraigher olof.kraigher@gmail.com

mod checks;
mod deep;
mod navigation;
mod pipeline;
mod results;
mod worker;

#[cfg(test)]
pub(crate) mod tests;

pub use deep::deep_analyze;
pub use navigation::{declaration_at, enclosing_declaration, find_all_references};
pub use pipeline::{
    DirtyFlags, DocumentPipeline, PipelineEvent, PipelineListener, RunOutcome, RunningGuard,
};
pub use results::{AnalysisResult, DeclRef, DeepAnalysisResult, ParseResult, Reference};
pub use worker::DocumentWorker;
