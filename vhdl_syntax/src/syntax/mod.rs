//! Syntax nodes, syntax tokens and methods to traverse them.
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c)  2024, Lukas Scheller lukasscheller@icloud.com
pub mod child;
pub(crate) mod green;
pub mod node;
pub mod node_kind;
pub mod visitor;

pub use child::Child;
pub use node::{SyntaxElement, SyntaxNode, SyntaxToken};
pub use node_kind::NodeKind;
pub use visitor::{Preorder, WalkEvent};
