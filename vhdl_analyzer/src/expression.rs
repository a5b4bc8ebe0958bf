// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

//! Typing and static evaluation of expressions

pub mod ast;
mod attribute;
mod builtin;
mod environment;
mod error;
mod evaluate;
mod interpret;
mod overload;
mod typing;
mod value;

pub use environment::Environment;
pub use error::{EvalError, EvalErrorKind, EvalResult};
pub use evaluate::{EvalContext, Evaluated, NameTarget};
pub(crate) use evaluate::{is_range_expr, name_pos};
pub use value::Value;

#[cfg(test)]
mod tests;
