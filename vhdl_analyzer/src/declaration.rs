// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

//! The declaration tree of a document.
//!
//! Every named entity gets a [Declaration] in an arena owned by the analysis
//! result. Declarations are identified across versions of a document by their
//! tree path, the dot-joined decorated names from the design file root.

mod arena;
mod builder;
mod kind;
pub(crate) mod lower;

pub use arena::DeclArena;
pub use builder::{build_declarations, DeclarationTable, ToResolve, UseItem};
pub use kind::*;
