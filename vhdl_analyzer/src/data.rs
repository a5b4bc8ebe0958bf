// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2019, Olof Kraigher olof.kraigher@gmail.com

mod contents;
mod diagnostic;
pub mod error_codes;
mod message;
mod source;
mod symbol_table;

pub use contents::*;
pub use diagnostic::*;
pub use error_codes::{Category, ErrorCode};
pub use message::*;
pub use source::*;
pub use symbol_table::*;
