// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c)  2025, Lukas Scheller lukasscheller@icloud.com

/// A child that is either a Token or a Node.
///
/// Generic over the representation so that both the internal green children
/// and the public red elements share the type.
#[derive(Debug, Eq, PartialEq, Clone)]
pub enum Child<N, T> {
    Node(N),
    Token(T),
}

impl<N, T> Child<N, T> {
    pub fn into_node(self) -> Option<N> {
        match self {
            Child::Node(node) => Some(node),
            Child::Token(_) => None,
        }
    }

    pub fn into_token(self) -> Option<T> {
        match self {
            Child::Token(token) => Some(token),
            Child::Node(_) => None,
        }
    }
}
