//! Positioned views of the green tree.
//!
//! A [SyntaxNode] or [SyntaxToken] pairs an immutable green element with its absolute
//! byte offset and its parent, so the analyzer can walk upwards from a token to the
//! enclosing declaration and map any element back to a source range.
//! Views are created lazily while iterating and are cheap to clone.
//!
//! ```vhdl
//! package pkg is
//!   constant c : bit := '0';
//! end package;
//! ```
//!
//! Here the token `c` has the ancestors `IdentifierList`, `ConstantDeclaration`,
//! `DeclarativePart`, `PackageDeclaration`, `DesignUnit` and `DesignFile`.
//! Printing any node yields exactly the text it was parsed from, trivia included.
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c)  2025, Lukas Scheller lukasscheller@icloud.com

use crate::syntax::child::Child;
use crate::syntax::green::{GreenNode, GreenToken};
use crate::syntax::node_kind::NodeKind;
use crate::syntax::visitor::{Preorder, WalkEvent};
use crate::tokens::{TokenKind, Trivia};
use std::fmt::{Display, Formatter};
use std::iter;
use std::ops::Range;
use std::sync::Arc;

pub type SyntaxElement = Child<SyntaxNode, SyntaxToken>;

#[derive(Clone, Debug)]
pub struct SyntaxToken(Arc<SyntaxTokenData>);

#[derive(Debug)]
struct SyntaxTokenData {
    offset: usize,
    parent: SyntaxNode,
    green: GreenToken,
}

impl SyntaxToken {
    fn new(offset: usize, parent: SyntaxNode, green: GreenToken) -> SyntaxToken {
        SyntaxToken(Arc::new(SyntaxTokenData {
            offset,
            parent,
            green,
        }))
    }

    pub fn kind(&self) -> TokenKind {
        self.0.green.kind()
    }

    pub fn text(&self) -> &str {
        self.0.green.text()
    }

    pub fn leading_trivia(&self) -> &Trivia {
        self.0.green.leading_trivia()
    }

    pub fn parent(&self) -> SyntaxNode {
        self.0.parent.clone()
    }

    pub fn ancestors(&self) -> impl Iterator<Item = SyntaxNode> {
        iter::successors(Some(self.parent()), SyntaxNode::parent)
    }

    /// Offset of the token including its leading trivia
    pub fn offset(&self) -> usize {
        self.0.offset
    }

    pub fn byte_len(&self) -> usize {
        self.0.green.byte_len()
    }

    /// Byte range of the token text, excluding trivia
    pub fn text_range(&self) -> Range<usize> {
        let start = self.0.offset + self.leading_trivia().byte_len();
        start..start + self.text().len()
    }
}

impl PartialEq for SyntaxToken {
    fn eq(&self, other: &Self) -> bool {
        self.0.offset == other.0.offset && self.0.green == other.0.green
    }
}

impl Eq for SyntaxToken {}

impl Display for SyntaxToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.green)
    }
}

#[derive(Clone, Debug)]
pub struct SyntaxNode(Arc<SyntaxNodeData>);

#[derive(Debug)]
struct SyntaxNodeData {
    offset: usize,
    index: usize,
    parent: Option<SyntaxNode>,
    green: GreenNode,
}

impl PartialEq for SyntaxNode {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.offset == other.0.offset
                && self.0.index == other.0.index
                && self.0.green == other.0.green)
    }
}

impl Eq for SyntaxNode {}

impl SyntaxNode {
    pub(crate) fn new_root(green: GreenNode) -> SyntaxNode {
        SyntaxNode(Arc::new(SyntaxNodeData {
            offset: 0,
            index: 0,
            parent: None,
            green,
        }))
    }

    fn new_child(offset: usize, index: usize, parent: SyntaxNode, green: GreenNode) -> SyntaxNode {
        SyntaxNode(Arc::new(SyntaxNodeData {
            offset,
            index,
            parent: Some(parent),
            green,
        }))
    }

    pub fn kind(&self) -> NodeKind {
        self.0.green.kind()
    }

    pub fn parent(&self) -> Option<SyntaxNode> {
        self.0.parent.clone()
    }

    pub fn ancestors(&self) -> impl Iterator<Item = SyntaxNode> {
        iter::successors(Some(self.clone()), SyntaxNode::parent)
    }

    /// Offset of the node including the leading trivia of its first token
    pub fn offset(&self) -> usize {
        self.0.offset
    }

    pub fn byte_len(&self) -> usize {
        self.0.green.byte_len()
    }

    /// Byte range of the node text, excluding the leading trivia of the first token
    pub fn text_range(&self) -> Range<usize> {
        let end = self.offset() + self.byte_len();
        match self.first_token() {
            Some(token) => token.text_range().start.min(end)..end,
            None => end..end,
        }
    }

    pub fn children_with_tokens(&self) -> impl Iterator<Item = SyntaxElement> + use<'_> {
        self.0
            .green
            .children()
            .enumerate()
            .map(|(index, child)| match child {
                Child::Token((rel_offset, token)) => Child::Token(SyntaxToken::new(
                    self.offset() + rel_offset,
                    self.clone(),
                    token.clone(),
                )),
                Child::Node((rel_offset, node)) => Child::Node(SyntaxNode::new_child(
                    self.offset() + rel_offset,
                    index,
                    self.clone(),
                    node.clone(),
                )),
            })
    }

    pub fn children(&self) -> impl Iterator<Item = SyntaxNode> + use<'_> {
        self.children_with_tokens().filter_map(Child::into_node)
    }

    pub fn tokens(&self) -> impl Iterator<Item = SyntaxToken> + use<'_> {
        self.children_with_tokens().filter_map(Child::into_token)
    }

    pub fn first_child(&self) -> Option<SyntaxNode> {
        self.children().next()
    }

    pub fn child_of_kind(&self, kind: NodeKind) -> Option<SyntaxNode> {
        self.children().find(|child| child.kind() == kind)
    }

    pub fn children_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = SyntaxNode> + use<'_> {
        self.children().filter(move |child| child.kind() == kind)
    }

    pub fn token_of_kind(&self, kind: TokenKind) -> Option<SyntaxToken> {
        self.tokens().find(|token| token.kind() == kind)
    }

    pub fn has_token(&self, kind: TokenKind) -> bool {
        self.token_of_kind(kind).is_some()
    }

    /// The first token of this node in textual order, descending into sub-nodes
    pub fn first_token(&self) -> Option<SyntaxToken> {
        self.children_with_tokens().find_map(|child| match child {
            Child::Token(token) => Some(token),
            Child::Node(node) => node.first_token(),
        })
    }

    pub fn next_sibling(&self) -> Option<SyntaxNode> {
        self.parent()?
            .children_with_tokens()
            .skip(self.0.index + 1)
            .find_map(Child::into_node)
    }

    /// All nodes below and including this node in pre-order
    pub fn descendants(&self) -> impl Iterator<Item = SyntaxNode> {
        Preorder::new(self.clone()).filter_map(|event| match event {
            WalkEvent::Enter(node) => Some(node),
            WalkEvent::Leave(_) => None,
        })
    }

    pub fn walk(&self) -> Preorder {
        Preorder::new(self.clone())
    }

    pub(crate) fn green(&self) -> &GreenNode {
        &self.0.green
    }

    #[cfg(test)]
    pub(crate) fn test_text(&self) -> String {
        self.green().test_text(0)
    }
}

impl Display for SyntaxNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.green)
    }
}

impl SyntaxElement {
    pub fn offset(&self) -> usize {
        match self {
            Child::Token(token) => token.offset(),
            Child::Node(node) => node.offset(),
        }
    }

    pub fn text_range(&self) -> Range<usize> {
        match self {
            Child::Token(token) => token.text_range(),
            Child::Node(node) => node.text_range(),
        }
    }
}
